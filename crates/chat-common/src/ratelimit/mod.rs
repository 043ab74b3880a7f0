//! Token-bucket admission control shared by the gateway and REST pipelines

mod bucket;
mod limiter;

pub use bucket::BucketSnapshot;
pub use limiter::{Permit, RateLimiter};
