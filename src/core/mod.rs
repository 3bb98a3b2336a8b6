//! # Core Buffer Components
//!
//! Pooled byte buffers, the allocators that own them, and the cursor that
//! writes into them.
//!
//! ## Components
//! - **Buffer**: position-tracked window over rented storage
//! - **Allocator**: handle-based pooling with ownership and release checks
//! - **Cursor**: write session that grows a buffer through its allocator
//!
//! ## Buffer Layout
//! ```text
//! [written 0..length) [free length..capacity)
//!        ^ position may sit anywhere in 0..=capacity
//! ```
//!
//! ## Guarantees
//! - A write either fully succeeds or leaves the buffer untouched
//! - Growth keeps bytes `0..length` at the same offsets
//! - A handle is honoured by exactly one allocator, for one acquisition

pub mod allocator;
pub mod buffer;
pub mod cursor;

pub use allocator::{AllocatorId, BufferAllocator, BufferHandle, PoolingAllocator};
pub use buffer::{Buffer, BufferState, RawStorage};
pub use cursor::BufferCursor;
