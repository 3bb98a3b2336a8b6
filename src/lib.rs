//! # wire-buffers
//!
//! Pooled byte buffers and bit-exact binary codecs for network message
//! serialization.
//!
//! ## Modules
//! - [`codec`]: min/max, power-of-two rounding, byte swapping, fixed-width
//!   values at any offset, strict UTF-8 over UTF-16 code units
//! - [`core`]: [`Buffer`], the [`BufferAllocator`] trait, the default
//!   [`PoolingAllocator`] and the growth-aware [`BufferCursor`]
//! - [`registry`]: generation-checked arena for pooled objects with leak audits
//! - [`message`]: pooled [`MessageWriter`] / [`MessageReader`]
//! - [`manager`]: [`BufferManager`], the per-instance context tying it together
//! - [`config`], [`error`], [`utils`]: configuration, errors, pooling and logging support
//!
//! ## Quick Start
//! ```rust
//! use wire_buffers::BufferManager;
//!
//! let mut manager = BufferManager::new();
//! let handle = manager.acquire_buffer(16).unwrap();
//! {
//!     let mut cursor = manager.cursor(handle);
//!     cursor.write_u32(0xC0FFEE).unwrap();
//!     cursor.write_str("hello").unwrap();
//! }
//! let bytes = manager.buffer(handle).unwrap().to_bytes();
//! assert_eq!(&bytes[..4], &[0xEE, 0xFF, 0xC0, 0x00]);
//! manager.release_buffer(handle).unwrap();
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod codec;
pub mod config;
pub mod core;
pub mod error;
pub mod manager;
pub mod message;
pub mod registry;
pub mod utils;

pub use crate::config::BufferConfig;
pub use crate::core::{
    AllocatorId, Buffer, BufferAllocator, BufferCursor, BufferHandle, PoolingAllocator,
};
pub use crate::error::{BufferError, Result};
pub use crate::manager::{BufferManager, ReaderHandle, WriterHandle};
pub use crate::message::{MessageReader, MessageWriter};
