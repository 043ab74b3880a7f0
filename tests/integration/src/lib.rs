//! Integration test utilities for the chat client
//!
//! Scripted stand-ins for both remote surfaces: an HTTP transport answering canned
//! responses per path, and a gateway driving in-memory shard sockets.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
