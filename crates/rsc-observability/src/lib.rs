//! Observability for the navigation runtime.
//!
//! This crate provides:
//! - `init_logging` - `tracing-subscriber` setup with JSON, compact and pretty output
//! - `NavigationMetrics` - Lifecycle counters and commit latency

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;
