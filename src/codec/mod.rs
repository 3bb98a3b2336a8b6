//! # Binary Codecs
//!
//! Stateless, allocation-free helpers that every buffer write routes through.
//!
//! ## Components
//! - **Bits**: branch-free `min`/`max`, `next_pow2` rounding, `swap_bytes`
//! - **Fixed**: fixed-width values at arbitrary (unaligned) byte offsets
//! - **UTF-8**: strict encoder over UTF-16 code units and a strict decoder
//!
//! ## Byte Order
//! ```text
//! write(region, 1, 0x12345678u32)  ->  [.., 78, 56, 34, 12, ..]   (little-endian)
//! write_be(region, 1, 0x12345678u32) -> [.., 12, 34, 56, 78, ..]  (network order)
//! ```
//! Little-endian is the wire default on every platform. Layers above must use
//! the same functions on both ends.

pub mod bits;
pub mod fixed;
pub mod utf8;

pub use bits::{max, min, next_pow2, swap_bytes, Integer, SwapBytes};
pub use fixed::{read, read_be, read_bytes, write, write_be, write_bytes, FixedWidth};
pub use utf8::{
    code_point_from_surrogates, max_utf8_len, read_utf8, read_utf8_units, utf8_len, write_utf8,
    MAX_UTF8_BYTES_PER_UNIT,
};
