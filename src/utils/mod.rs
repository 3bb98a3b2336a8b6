//! # Utility Modules
//!
//! Supporting utilities for pooling, logging, and observability.
//!
//! ## Components
//! - **Array Pool**: power-of-two bucketed byte arrays backing buffers
//! - **Logging**: Structured logging configuration
//! - **Metrics**: Per-allocator pool counters

pub mod array_pool;
pub mod logging;
pub mod metrics;

pub use array_pool::ArrayPool;
pub use metrics::{MetricsSnapshot, PoolMetrics};
