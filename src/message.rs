//! # Message Writer and Reader
//!
//! Pooled objects for assembling and walking message bodies.
//!
//! [`MessageWriter`] appends little-endian values to a growable body;
//! [`MessageReader`] walks a received body with a cursor. Both route every
//! value through [`crate::codec`], so a body written by one is read back
//! byte-for-byte by the other. Instances are recycled through
//! [`crate::manager::BufferManager`] and reset on reuse.

use bytes::{Bytes, BytesMut};

use crate::codec::{self, FixedWidth};
use crate::error::Result;

/// Append-only message body builder
#[derive(Debug, Default)]
pub struct MessageWriter {
    buf: BytesMut,
}

impl MessageWriter {
    /// Empty writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty writer with room for `capacity` bytes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Extend the body by `len` zeroed bytes, returning where they start
    fn extend(&mut self, len: usize) -> usize {
        let at = self.buf.len();
        self.buf.resize(at + len, 0);
        at
    }

    /// Append a little-endian value.
    pub fn write<T: FixedWidth>(&mut self, value: T) -> Result<usize> {
        let at = self.extend(T::SIZE);
        codec::write(&mut self.buf, at, value)
    }

    /// Append a big-endian value.
    pub fn write_be<T: FixedWidth>(&mut self, value: T) -> Result<usize> {
        let at = self.extend(T::SIZE);
        codec::write_be(&mut self.buf, at, value)
    }

    /// Append a byte run
    pub fn write_bytes(&mut self, src: &[u8]) -> Result<usize> {
        self.buf.extend_from_slice(src);
        Ok(src.len())
    }

    /// Append the UTF-8 bytes of `text`
    pub fn write_str(&mut self, text: &str) -> Result<usize> {
        self.write_bytes(text.as_bytes())
    }

    /// Append UTF-16 code units as UTF-8. Nothing is appended on failure.
    pub fn write_utf16(&mut self, units: &[u16]) -> Result<usize> {
        let len = codec::utf8_len(units)?;
        let at = self.extend(len);
        codec::write_utf8(&mut self.buf, at, units)
    }

    /// Empty the body, keeping its allocation
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written since the last reset
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The body written so far
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// Immutable copy of the body
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.buf)
    }
}

/// Cursor over a received message body
#[derive(Debug, Default)]
pub struct MessageReader {
    data: Bytes,
    position: usize,
}

impl MessageReader {
    /// Reader positioned at the start of `data`
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            position: 0,
        }
    }

    /// Load a new body and rewind to its start
    pub fn reset(&mut self, data: Bytes) {
        self.data = data;
        self.position = 0;
    }

    /// Read a little-endian value and advance.
    pub fn read<T: FixedWidth>(&mut self) -> Result<T> {
        let (value, consumed) = codec::read(&self.data, self.position)?;
        self.position += consumed;
        Ok(value)
    }

    /// Read a big-endian value and advance.
    pub fn read_be<T: FixedWidth>(&mut self) -> Result<T> {
        let (value, consumed) = codec::read_be(&self.data, self.position)?;
        self.position += consumed;
        Ok(value)
    }

    /// Decode `len` UTF-8 bytes and advance.
    pub fn read_str(&mut self, len: usize) -> Result<String> {
        let text = codec::read_utf8(&self.data, self.position, len)?;
        self.position += len;
        Ok(text)
    }

    /// Take `len` bytes as a zero-copy slice of the body and advance.
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        let range = codec::fixed::span(self.data.len(), self.position, len)?;
        self.position = range.end;
        Ok(self.data.slice(range))
    }

    /// Bytes consumed so far
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left after the cursor
    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }

    /// Whether every byte has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::error::{BufferError, RangeError};

    #[test]
    fn test_writer_reader_agree() {
        let mut writer = MessageWriter::new();
        writer.write(0x1234u16).unwrap();
        writer.write(-7i64).unwrap();
        writer.write_be(0xCAFEu16).unwrap();
        writer.write(true).unwrap();
        writer.write(1.5f32).unwrap();
        writer.write_str("hi").unwrap();
        assert_eq!(writer.len(), 2 + 8 + 2 + 1 + 4 + 2);
        assert_eq!(&writer.as_slice()[..2], &[0x34, 0x12]);

        let mut reader = MessageReader::new(writer.to_bytes());
        assert_eq!(reader.read::<u16>().unwrap(), 0x1234);
        assert_eq!(reader.read::<i64>().unwrap(), -7);
        assert_eq!(reader.read_be::<u16>().unwrap(), 0xCAFE);
        assert!(reader.read::<bool>().unwrap());
        assert_eq!(reader.read::<f32>().unwrap(), 1.5);
        assert_eq!(reader.read_str(2).unwrap(), "hi");
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_read_past_end_keeps_position() {
        let mut reader = MessageReader::new(vec![1u8, 2, 3]);
        assert_eq!(reader.read::<u16>().unwrap(), 0x0201);
        let err = reader.read::<u16>().unwrap_err();
        assert!(matches!(
            err,
            BufferError::Range(RangeError::OutOfBounds {
                offset: 2,
                len: 2,
                region: 3
            })
        ));
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn test_read_bytes_is_zero_copy_slice() {
        let body = Bytes::from_static(b"headerpayload");
        let mut reader = MessageReader::new(body.clone());
        assert_eq!(&reader.read_bytes(6).unwrap()[..], b"header");
        let payload = reader.read_bytes(7).unwrap();
        assert_eq!(&payload[..], b"payload");
        assert!(reader.read_bytes(1).is_err());
    }

    #[test]
    fn test_bad_utf16_appends_nothing() {
        let mut writer = MessageWriter::new();
        writer.write(1u8).unwrap();
        assert!(writer.write_utf16(&[0xDC00]).is_err());
        assert_eq!(writer.len(), 1);

        let units: Vec<u16> = "€".encode_utf16().collect();
        assert_eq!(writer.write_utf16(&units).unwrap(), 3);
        assert_eq!(writer.len(), 4);
    }

    #[test]
    fn test_reset() {
        let mut writer = MessageWriter::with_capacity(64);
        writer.write(9u32).unwrap();
        writer.reset();
        assert!(writer.is_empty());

        let mut reader = MessageReader::new(vec![1u8]);
        reader.read::<u8>().unwrap();
        reader.reset(Bytes::from_static(&[2, 3]));
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read::<u8>().unwrap(), 2);
    }
}
