//! # chat-client
//!
//! The application-facing side of the runtime.
//!
//! ## Features
//!
//! - **EventInterceptor**: applies every gateway dispatch to the cache before publishing it
//! - **EventBus**: conflating fan-out, one single-event slot per subscriber
//! - **ChatClient**: gateway discovery, shard startup, REST services and shutdown in one place
//!
//! ## Example
//!
//! ```ignore
//! use chat_client::ChatClient;
//! use chat_common::ClientConfig;
//!
//! let client = ChatClient::new(ClientConfig::from_env()?).await?;
//! let mut events = client.subscribe();
//! client.connect()?;
//! while let Some(event) = events.recv().await {
//!     println!("{} on shard {}", event.event_type(), event.shard());
//! }
//! ```

pub mod bus;
pub mod client;
pub mod error;
pub mod interceptor;

pub use bus::{EventBus, Subscription};
pub use client::{ChatClient, ClientBuilder};
pub use error::{ClientError, ClientResult};
pub use interceptor::EventInterceptor;
