//! # chat-rest
//!
//! REST side of the client: routes and their rate-limit buckets, the exclusion request
//! handler that enforces those buckets and retries 429s and server errors, a reqwest
//! transport, and typed services for guilds, users and gateway discovery.

pub mod config;
pub mod error;
pub mod handler;
pub mod image;
pub mod json;
pub mod request;
pub mod response;
pub mod route;
pub mod service;
pub mod transport;

pub use config::RestConfig;
pub use error::{RestError, RestResult};
pub use handler::{ExclusionRequestHandler, RequestHandler, GLOBAL_KEY};
pub use image::{Image, ImageFormat, ImageSize};
pub use json::{
    GatewayBotResponse, GuildCreateRequest, MemberResponse, PositionModifyRequest,
    RoleModifyRequest, SessionStartLimit,
};
pub use request::{Request, AUDIT_LOG_REASON};
pub use response::{HttpResponse, RateLimitInfo};
pub use route::Route;
pub use service::{GatewayService, GuildService, RestClient, UserService};
pub use transport::{HttpRequest, HttpTransport, ReqwestTransport, TransportError};
