//! # Buffer
//!
//! A cursor over a window of rented storage.
//!
//! ```text
//! storage: [ .... | offset ............................ offset+capacity | .... ]
//!                   ^ 0        ^ position      ^ length            ^ capacity
//! ```
//!
//! `position` is where the next write lands, `length` is the high-water mark of
//! bytes ever written, `capacity` is the window size. A `Buffer` never grows by
//! itself: writes that do not fit fail with [`RangeError::CapacityExceeded`]
//! and leave every field untouched. Growth is the allocator's job, see
//! [`crate::core::BufferCursor`].

use bytes::{Bytes, BytesMut};

use crate::codec::{self, FixedWidth};
use crate::error::{RangeError, Result};

/// Contiguous byte region rented from an allocator's array pool.
#[derive(Debug)]
pub struct RawStorage {
    bytes: BytesMut,
}

impl RawStorage {
    /// Allocate `len` zeroed bytes.
    pub fn zeroed(len: usize) -> Self {
        Self {
            bytes: BytesMut::zeroed(len),
        }
    }

    /// Size of the region in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the region has zero length.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The whole region, including bytes left by previous borrowers.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable view of the whole region.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Overwrite the whole region with zeros.
    pub fn clear(&mut self) {
        self.bytes.fill(0);
    }
}

/// Binding state of a [`Buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// No storage attached.
    Unbound,
    /// Attached to storage, cursor live.
    Bound,
}

/// Position-tracked view over a [`RawStorage`] window.
#[derive(Debug, Default)]
pub struct Buffer {
    storage: Option<RawStorage>,
    offset: usize,
    position: usize,
    length: usize,
    capacity: usize,
}

impl Buffer {
    /// A buffer with no storage attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to `storage[offset..offset + capacity]` with the cursor at 0.
    ///
    /// Returns the previously bound storage, if any.
    pub fn setup(
        &mut self,
        storage: RawStorage,
        offset: usize,
        capacity: usize,
    ) -> Result<Option<RawStorage>> {
        codec::fixed::span(storage.len(), offset, capacity)?;
        let previous = self.storage.replace(storage);
        self.offset = offset;
        self.capacity = capacity;
        self.position = 0;
        self.length = 0;
        Ok(previous)
    }

    /// Move to larger storage, keeping bytes `0..length` and the cursor.
    ///
    /// The new window starts at offset 0 and spans all of `storage`, which
    /// must hold both the written bytes and the cursor. On error nothing
    /// changes.
    pub fn rebind(&mut self, mut storage: RawStorage) -> Result<Option<RawStorage>> {
        let needed = self.position.max(self.length);
        if storage.len() < needed {
            return Err(RangeError::CapacityExceeded {
                needed,
                capacity: storage.len(),
            }
            .into());
        }
        storage.as_mut_slice()[..self.length].copy_from_slice(self.as_slice());
        let previous = self.storage.replace(storage);
        self.offset = 0;
        self.capacity = self.storage.as_ref().map_or(0, RawStorage::len);
        Ok(previous)
    }

    /// Detach the storage and return to [`BufferState::Unbound`].
    pub fn unbind(&mut self) -> Option<RawStorage> {
        self.offset = 0;
        self.position = 0;
        self.length = 0;
        self.capacity = 0;
        self.storage.take()
    }

    /// Current binding state.
    pub fn state(&self) -> BufferState {
        if self.storage.is_some() {
            BufferState::Bound
        } else {
            BufferState::Unbound
        }
    }

    /// Shorthand for `state() == BufferState::Bound`.
    pub fn is_bound(&self) -> bool {
        self.storage.is_some()
    }

    /// Offset of the next write, relative to the window start.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of valid bytes, the high-water mark of all writes.
    pub fn length(&self) -> usize {
        self.length
    }

    /// Size of the window in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes left between the cursor and the end of the window.
    pub fn remaining(&self) -> usize {
        self.capacity - self.position
    }

    /// Verify that `size` more bytes fit at the cursor.
    pub fn check_position(&self, size: usize) -> Result<()> {
        match self.position.checked_add(size) {
            Some(end) if end <= self.capacity => Ok(()),
            Some(end) => Err(RangeError::CapacityExceeded {
                needed: end,
                capacity: self.capacity,
            }
            .into()),
            None => Err(RangeError::SizeOverflow {
                requested: size,
                max: usize::MAX - self.position,
            }
            .into()),
        }
    }

    /// Advance past a write of `size` bytes made at the cursor.
    ///
    /// A write that starts beyond `length` turns the skipped gap into valid
    /// bytes, so the gap is zeroed first. Rented storage still carries the
    /// previous borrower's data there.
    #[inline]
    fn update_position(&mut self, size: usize) {
        if self.position > self.length {
            let (from, to) = (self.length, self.position);
            self.window_mut()[from..to].fill(0);
        }
        self.position += size;
        if self.position > self.length {
            self.length = self.position;
        }
    }

    fn window(&self) -> &[u8] {
        match &self.storage {
            Some(storage) => &storage.as_slice()[self.offset..self.offset + self.capacity],
            None => &[],
        }
    }

    fn window_mut(&mut self) -> &mut [u8] {
        let (offset, capacity) = (self.offset, self.capacity);
        match &mut self.storage {
            Some(storage) => &mut storage.as_mut_slice()[offset..offset + capacity],
            None => &mut [],
        }
    }

    /// Write a little-endian value at the cursor and advance it.
    pub fn put<T: FixedWidth>(&mut self, value: T) -> Result<usize> {
        self.check_position(T::SIZE)?;
        let at = self.position;
        let written = codec::write(self.window_mut(), at, value)?;
        self.update_position(written);
        Ok(written)
    }

    /// Write a big-endian value at the cursor and advance it.
    pub fn put_be<T: FixedWidth>(&mut self, value: T) -> Result<usize> {
        self.check_position(T::SIZE)?;
        let at = self.position;
        let written = codec::write_be(self.window_mut(), at, value)?;
        self.update_position(written);
        Ok(written)
    }

    /// Copy a byte run at the cursor and advance it.
    pub fn put_bytes(&mut self, src: &[u8]) -> Result<usize> {
        self.check_position(src.len())?;
        let at = self.position;
        let written = codec::write_bytes(self.window_mut(), at, src)?;
        self.update_position(written);
        Ok(written)
    }

    /// Encode UTF-16 code units as UTF-8 at the cursor and advance it.
    pub fn put_utf16(&mut self, units: &[u16]) -> Result<usize> {
        self.check_position(codec::utf8_len(units)?)?;
        let at = self.position;
        let written = codec::write_utf8(self.window_mut(), at, units)?;
        self.update_position(written);
        Ok(written)
    }

    /// Write the UTF-8 bytes of `text` at the cursor and advance it.
    pub fn put_str(&mut self, text: &str) -> Result<usize> {
        self.put_bytes(text.as_bytes())
    }

    /// Move the cursor to an absolute position inside the window.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.capacity {
            return Err(RangeError::CapacityExceeded {
                needed: position,
                capacity: self.capacity,
            }
            .into());
        }
        self.position = position;
        Ok(())
    }

    /// Move the cursor back by `by` bytes.
    pub fn rewind(&mut self, by: usize) -> Result<()> {
        match self.position.checked_sub(by) {
            Some(position) => {
                self.position = position;
                Ok(())
            }
            None => Err(RangeError::NegativePosition {
                position: self.position,
                by,
            }
            .into()),
        }
    }

    /// Forget all written bytes, keeping the storage bound.
    pub fn reset(&mut self) {
        self.position = 0;
        self.length = 0;
    }

    /// The written bytes, `0..length`.
    pub fn as_slice(&self) -> &[u8] {
        &self.window()[..self.length]
    }

    /// Read a little-endian value from the written bytes.
    pub fn read_at<T: FixedWidth>(&self, offset: usize) -> Result<T> {
        codec::read(self.as_slice(), offset).map(|(value, _)| value)
    }

    /// Read a big-endian value from the written bytes.
    pub fn read_be_at<T: FixedWidth>(&self, offset: usize) -> Result<T> {
        codec::read_be(self.as_slice(), offset).map(|(value, _)| value)
    }

    /// Decode `len` UTF-8 bytes at `offset` from the written bytes.
    pub fn read_str_at(&self, offset: usize, len: usize) -> Result<String> {
        codec::read_utf8(self.as_slice(), offset, len)
    }

    /// Immutable copy of the written bytes for handing to a transport.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.as_slice())
    }
}
