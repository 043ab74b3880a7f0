//! Image payloads for icon and avatar fields

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encoded image formats accepted by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }

    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type.split(';').next()?.trim() {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }
}

/// Requested edge length of a CDN image; the served image is at most this large
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ImageSize {
    Size16 = 16,
    Size32 = 32,
    Size64 = 64,
    Size128 = 128,
    Size256 = 256,
    Size512 = 512,
    Size1024 = 1024,
    Size2048 = 2048,
    Size4096 = 4096,
}

impl ImageSize {
    pub fn max_res(self) -> u32 {
        self as u32
    }
}

/// Raw image bytes with their format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub data: Vec<u8>,
    pub format: ImageFormat,
}

impl Image {
    pub fn raw(data: impl Into<Vec<u8>>, format: ImageFormat) -> Self {
        Self {
            data: data.into(),
            format,
        }
    }

    /// `data:` URI form expected by icon and avatar fields
    pub fn data_uri(&self) -> String {
        format!(
            "data:image/{};base64,{}",
            self.format.extension(),
            STANDARD.encode(&self.data)
        )
    }
}
