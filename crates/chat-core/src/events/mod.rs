//! Domain events published to application code

mod domain_event;

pub use domain_event::*;
