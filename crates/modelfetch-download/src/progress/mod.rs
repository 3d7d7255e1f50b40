//! Progress tracking and throttling.
//!
//! This module handles rate-limiting and publication of download progress
//! events.

mod broadcaster;
mod throttle;

pub use broadcaster::ProgressBroadcaster;
pub use throttle::ProgressThrottle;
