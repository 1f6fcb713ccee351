//! Tracing/logging setup shared by the dishcost crates.

/// Subscriber configuration (filters, JSON layer).
pub mod subscriber;

pub use subscriber::{DEFAULT_FILTER, init, init_with_filter};
