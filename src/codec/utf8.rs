//! Strict UTF-8 codec over UTF-16 code units.
//!
//! The encoder walks 16-bit code units directly: BMP units become 1, 2 or 3
//! byte sequences and a high/low surrogate pair becomes a single 4-byte
//! sequence. Malformed input is rejected, never replaced, and each kind of
//! malformation has its own [`EncodingError`] variant. The input is validated
//! and sized before the destination is touched, so a failed encode writes
//! nothing.

use super::fixed::span;
use crate::error::{EncodingError, Result};

/// Upper bound of UTF-8 bytes produced per UTF-16 code unit.
pub const MAX_UTF8_BYTES_PER_UNIT: usize = 3;

const HIGH_SURROGATES: std::ops::RangeInclusive<u16> = 0xD800..=0xDBFF;
const LOW_SURROGATES: std::ops::RangeInclusive<u16> = 0xDC00..=0xDFFF;

/// Upper bound on the encoded size of `units` code units.
#[inline]
pub fn max_utf8_len(units: usize) -> usize {
    units.saturating_mul(MAX_UTF8_BYTES_PER_UNIT)
}

/// Combine a surrogate pair into its code point (RFC 2781, section 2.2).
#[inline]
pub fn code_point_from_surrogates(high: u16, low: u16) -> u32 {
    let h = (u32::from(high) & 0x3FF) << 10;
    let l = u32::from(low) & 0x3FF;
    (h | l) + 0x10000
}

/// Code points of a UTF-16 sequence, failing on the first malformed unit.
struct CodePoints<'a> {
    units: &'a [u16],
    index: usize,
}

impl Iterator for CodePoints<'_> {
    type Item = Result<u32>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.index;
        let unit = *self.units.get(index)?;
        self.index += 1;

        if LOW_SURROGATES.contains(&unit) {
            return Some(Err(EncodingError::UnpairedLowSurrogate { index }.into()));
        }
        if !HIGH_SURROGATES.contains(&unit) {
            return Some(Ok(u32::from(unit)));
        }

        let Some(&low) = self.units.get(self.index) else {
            return Some(Err(EncodingError::TrailingHighSurrogate { index }.into()));
        };
        if !LOW_SURROGATES.contains(&low) {
            return Some(Err(EncodingError::MissingLowSurrogate { index: self.index }.into()));
        }
        self.index += 1;
        Some(Ok(code_point_from_surrogates(unit, low)))
    }
}

#[inline]
fn encoded_width(code_point: u32) -> usize {
    match code_point {
        0..=0x7F => 1,
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        _ => 4,
    }
}

/// Exact UTF-8 size of `units`, validating surrogate pairing on the way.
pub fn utf8_len(units: &[u16]) -> Result<usize> {
    let mut len = 0;
    for code_point in (CodePoints { units, index: 0 }) {
        len += encoded_width(code_point?);
    }
    Ok(len)
}

/// Encode `units` as UTF-8 into `dst` at `dst_offset`, returning the bytes written.
pub fn write_utf8(dst: &mut [u8], dst_offset: usize, units: &[u16]) -> Result<usize> {
    let len = utf8_len(units)?;
    let range = span(dst.len(), dst_offset, len)?;
    let out = &mut dst[range];

    let mut at = 0;
    for code_point in (CodePoints { units, index: 0 }) {
        let cp = code_point?;
        match encoded_width(cp) {
            1 => {
                out[at] = cp as u8;
            }
            2 => {
                out[at] = 0xC0 | (cp >> 6) as u8;
                out[at + 1] = 0x80 | (cp & 0x3F) as u8;
            }
            3 => {
                out[at] = 0xE0 | (cp >> 12) as u8;
                out[at + 1] = 0x80 | ((cp >> 6) & 0x3F) as u8;
                out[at + 2] = 0x80 | (cp & 0x3F) as u8;
            }
            _ => {
                out[at] = 0xF0 | (cp >> 18) as u8;
                out[at + 1] = 0x80 | ((cp >> 12) & 0x3F) as u8;
                out[at + 2] = 0x80 | ((cp >> 6) & 0x3F) as u8;
                out[at + 3] = 0x80 | (cp & 0x3F) as u8;
            }
        }
        at += encoded_width(cp);
    }
    Ok(len)
}

/// Decode one scalar starting at `bytes[at]`, returning it with its width.
fn decode_scalar(bytes: &[u8], at: usize, base: usize) -> Result<(u32, usize)> {
    let lead = bytes[at];
    let (width, initial, min) = match lead {
        0x00..=0x7F => return Ok((u32::from(lead), 1)),
        0xC2..=0xDF => (2, u32::from(lead & 0x1F), 0x80),
        0xE0..=0xEF => (3, u32::from(lead & 0x0F), 0x800),
        0xF0..=0xF4 => (4, u32::from(lead & 0x07), 0x10000),
        _ => {
            return Err(EncodingError::InvalidLeadByte {
                index: base + at,
                byte: lead,
            }
            .into())
        }
    };

    if at + width > bytes.len() {
        return Err(EncodingError::TruncatedSequence { index: base + at }.into());
    }

    let mut cp = initial;
    for k in 1..width {
        let byte = bytes[at + k];
        if byte & 0xC0 != 0x80 {
            return Err(EncodingError::InvalidContinuation { index: base + at + k }.into());
        }
        cp = (cp << 6) | u32::from(byte & 0x3F);
    }

    if cp < min || cp > 0x10FFFF || (0xD800..=0xDFFF).contains(&cp) {
        return Err(EncodingError::InvalidCodePoint { index: base + at }.into());
    }
    Ok((cp, width))
}

/// Decode `len` UTF-8 bytes at `src_offset` back into UTF-16 code units.
pub fn read_utf8_units(src: &[u8], src_offset: usize, len: usize) -> Result<Vec<u16>> {
    let bytes = &src[span(src.len(), src_offset, len)?];
    let mut units = Vec::with_capacity(len);
    let mut at = 0;
    while at < bytes.len() {
        let (cp, width) = decode_scalar(bytes, at, src_offset)?;
        if cp >= 0x10000 {
            let v = cp - 0x10000;
            units.push(0xD800 | (v >> 10) as u16);
            units.push(0xDC00 | (v & 0x3FF) as u16);
        } else {
            units.push(cp as u16);
        }
        at += width;
    }
    Ok(units)
}

/// Decode `len` UTF-8 bytes at `src_offset` into a `String`.
pub fn read_utf8(src: &[u8], src_offset: usize, len: usize) -> Result<String> {
    let bytes = &src[span(src.len(), src_offset, len)?];
    let mut out = String::with_capacity(len);
    let mut at = 0;
    while at < bytes.len() {
        let (cp, width) = decode_scalar(bytes, at, src_offset)?;
        let ch = char::from_u32(cp).ok_or(EncodingError::InvalidCodePoint {
            index: src_offset + at,
        })?;
        out.push(ch);
        at += width;
    }
    Ok(out)
}
