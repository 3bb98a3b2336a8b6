//! Fixed-width values at arbitrary byte offsets.
//!
//! Values are assembled and disassembled byte by byte over a bounds-checked
//! subslice, so any offset works regardless of alignment and bytes outside
//! `[offset, offset + SIZE)` are never touched. The default byte order is
//! little-endian on every platform; the `_be` variants use network order.

use crate::error::{RangeError, Result};

mod sealed {
    pub trait Sealed {}
}

/// A value with a fixed encoded size.
pub trait FixedWidth: Copy + sealed::Sealed {
    /// Encoded size in bytes.
    const SIZE: usize;

    /// Encode into `dst`, which is exactly [`Self::SIZE`] bytes long.
    fn encode_le(self, dst: &mut [u8]);

    /// Decode from `src`, which is exactly [`Self::SIZE`] bytes long.
    fn decode_le(src: &[u8]) -> Self;

    /// Big-endian counterpart of [`FixedWidth::encode_le`].
    fn encode_be(self, dst: &mut [u8]);

    /// Big-endian counterpart of [`FixedWidth::decode_le`].
    fn decode_be(src: &[u8]) -> Self;
}

macro_rules! impl_fixed {
    ($($t:ty),* $(,)?) => {$(
        impl sealed::Sealed for $t {}

        impl FixedWidth for $t {
            const SIZE: usize = std::mem::size_of::<$t>();

            #[inline]
            fn encode_le(self, dst: &mut [u8]) {
                dst.copy_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn decode_le(src: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(src);
                <$t>::from_le_bytes(raw)
            }

            #[inline]
            fn encode_be(self, dst: &mut [u8]) {
                dst.copy_from_slice(&self.to_be_bytes());
            }

            #[inline]
            fn decode_be(src: &[u8]) -> Self {
                let mut raw = [0u8; std::mem::size_of::<$t>()];
                raw.copy_from_slice(src);
                <$t>::from_be_bytes(raw)
            }
        }
    )*};
}

impl_fixed!(i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

impl sealed::Sealed for bool {}

impl FixedWidth for bool {
    const SIZE: usize = 1;

    #[inline]
    fn encode_le(self, dst: &mut [u8]) {
        dst[0] = u8::from(self);
    }

    #[inline]
    fn decode_le(src: &[u8]) -> Self {
        src[0] != 0
    }

    #[inline]
    fn encode_be(self, dst: &mut [u8]) {
        self.encode_le(dst);
    }

    #[inline]
    fn decode_be(src: &[u8]) -> Self {
        Self::decode_le(src)
    }
}

/// Resolve `[offset, offset + len)` inside a region of `region` bytes.
#[inline]
pub(crate) fn span(region: usize, offset: usize, len: usize) -> Result<std::ops::Range<usize>> {
    match offset.checked_add(len) {
        Some(end) if end <= region => Ok(offset..end),
        _ => Err(RangeError::OutOfBounds {
            offset,
            len,
            region,
        }
        .into()),
    }
}

/// Write `value` little-endian at `offset`, returning the bytes written.
#[inline]
pub fn write<T: FixedWidth>(region: &mut [u8], offset: usize, value: T) -> Result<usize> {
    let range = span(region.len(), offset, T::SIZE)?;
    value.encode_le(&mut region[range]);
    Ok(T::SIZE)
}

/// Read a little-endian value at `offset`, returning it with the bytes consumed.
#[inline]
pub fn read<T: FixedWidth>(region: &[u8], offset: usize) -> Result<(T, usize)> {
    let range = span(region.len(), offset, T::SIZE)?;
    Ok((T::decode_le(&region[range]), T::SIZE))
}

/// Write `value` big-endian (network order) at `offset`.
#[inline]
pub fn write_be<T: FixedWidth>(region: &mut [u8], offset: usize, value: T) -> Result<usize> {
    let range = span(region.len(), offset, T::SIZE)?;
    value.encode_be(&mut region[range]);
    Ok(T::SIZE)
}

/// Read a big-endian (network order) value at `offset`.
#[inline]
pub fn read_be<T: FixedWidth>(region: &[u8], offset: usize) -> Result<(T, usize)> {
    let range = span(region.len(), offset, T::SIZE)?;
    Ok((T::decode_be(&region[range]), T::SIZE))
}

/// Copy all of `src` into `dst` at `dst_offset`.
pub fn write_bytes(dst: &mut [u8], dst_offset: usize, src: &[u8]) -> Result<usize> {
    let range = span(dst.len(), dst_offset, src.len())?;
    dst[range].copy_from_slice(src);
    Ok(src.len())
}

/// Fill all of `dst` from `src` starting at `src_offset`.
pub fn read_bytes(src: &[u8], src_offset: usize, dst: &mut [u8]) -> Result<usize> {
    let range = span(src.len(), src_offset, dst.len())?;
    dst.copy_from_slice(&src[range]);
    Ok(dst.len())
}
