//! # Error Types
//!
//! Error handling for buffer allocation, cursor movement and binary encoding.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side is
//! [`BufferError`]. The three core categories are kept as their own enums so
//! callers can match on the exact misuse:
//!
//! ## Error Categories
//! - **Range**: cursor would go negative, a region is too small, or capacity is
//!   exhausted while dynamic growth is disabled
//! - **Ownership**: a handle was issued by another allocator, was already
//!   released, or is unknown to a pooled-object registry
//! - **Encoding**: malformed UTF-16 input to the UTF-8 encoder, or malformed
//!   UTF-8 input to the decoder
//! - **Config / I/O**: configuration loading and validation failures
//!
//! Errors are reported synchronously to the immediate caller. Nothing is
//! retried and a failed operation leaves the buffer state untouched.
//!
//! ## Example Usage
//! ```rust
//! use wire_buffers::error::{BufferError, RangeError};
//! use wire_buffers::codec;
//!
//! let mut region = [0u8; 2];
//! match codec::write(&mut region, 0, 7u32) {
//!     Err(BufferError::Range(RangeError::OutOfBounds { .. })) => {}
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Misuse reported as a warning when pedantic checks are off
    pub const ERR_DOUBLE_RELEASE: &str = "buffer released twice";
    pub const ERR_USE_AFTER_RELEASE: &str = "buffer used after it was released";
}

/// Cursor and region bounds violations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RangeError {
    #[error("buffer cursor position cannot be negative (position {position}, moved back {by})")]
    NegativePosition { position: usize, by: usize },

    #[error("buffer cursor position cannot be greater than buffer capacity (needed {needed}, capacity {capacity})")]
    CapacityExceeded { needed: usize, capacity: usize },

    #[error("access of {len} bytes at offset {offset} exceeds region of {region} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        region: usize,
    },

    #[error("requested size {requested} exceeds the addressable maximum {max}")]
    SizeOverflow { requested: usize, max: usize },
}

/// Allocator and registry ownership violations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OwnershipError {
    #[error("buffer was acquired from allocator {owner}, not allocator {allocator}")]
    ForeignBuffer { owner: u64, allocator: u64 },

    #[error("buffer slot {slot} released twice")]
    DoubleRelease { slot: u32 },

    #[error("buffer slot {slot} used after it was released")]
    UseAfterRelease { slot: u32 },

    #[error("buffer handle for slot {slot} is stale (generation {generation}, current {current})")]
    StaleHandle {
        slot: u32,
        generation: u32,
        current: u32,
    },

    #[error("buffer slot {slot} does not exist in allocator {allocator}")]
    UnknownBuffer { slot: u32, allocator: u64 },

    #[error("pooled object {index} (generation {generation}) is not live in this registry")]
    UnknownObject { index: u32, generation: u32 },
}

/// Malformed text handed to the UTF-8 codec.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodingError {
    #[error("missing expected high surrogate before low surrogate at unit {index}")]
    UnpairedLowSurrogate { index: usize },

    #[error("string ended on partial surrogate at unit {index}")]
    TrailingHighSurrogate { index: usize },

    #[error("missing expected low surrogate after high surrogate at unit {index}")]
    MissingLowSurrogate { index: usize },

    #[error("invalid UTF-8 lead byte {byte:#04x} at byte {index}")]
    InvalidLeadByte { index: usize, byte: u8 },

    #[error("invalid UTF-8 continuation byte at byte {index}")]
    InvalidContinuation { index: usize },

    #[error("truncated UTF-8 sequence at byte {index}")]
    TruncatedSequence { index: usize },

    #[error("overlong or out-of-range UTF-8 sequence at byte {index}")]
    InvalidCodePoint { index: usize },
}

/// BufferError is the primary error type for all buffer operations
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum BufferError {
    #[error("Range error: {0}")]
    Range(#[from] RangeError),

    #[error("Ownership error: {0}")]
    Ownership(#[from] OwnershipError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("I/O error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl BufferError {
    /// True for any [`RangeError`].
    pub fn is_range(&self) -> bool {
        matches!(self, BufferError::Range(_))
    }

    /// True for any [`OwnershipError`].
    pub fn is_ownership(&self) -> bool {
        matches!(self, BufferError::Ownership(_))
    }

    /// True for any [`EncodingError`].
    pub fn is_encoding(&self) -> bool {
        matches!(self, BufferError::Encoding(_))
    }
}

/// Type alias for Results using BufferError
pub type Result<T> = std::result::Result<T, BufferError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_predicates() {
        let range: BufferError = RangeError::NegativePosition { position: 0, by: 1 }.into();
        assert!(range.is_range());
        assert!(!range.is_ownership());

        let owner: BufferError = OwnershipError::DoubleRelease { slot: 3 }.into();
        assert!(owner.is_ownership());

        let enc: BufferError = EncodingError::MissingLowSurrogate { index: 2 }.into();
        assert!(enc.is_encoding());
    }

    #[test]
    fn test_messages_carry_context() {
        let err: BufferError = RangeError::CapacityExceeded {
            needed: 20,
            capacity: 16,
        }
        .into();
        let text = err.to_string();
        assert!(text.contains("needed 20"));
        assert!(text.contains("capacity 16"));
    }
}
