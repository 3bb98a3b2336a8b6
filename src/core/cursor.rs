//! # Buffer Cursor
//!
//! Growth-aware writer over a buffer held by an allocator.
//!
//! A [`Buffer`](crate::core::Buffer) on its own refuses writes past its
//! capacity. The cursor borrows the owning allocator for the duration of a
//! write session and, before every write, asks it for room via
//! [`BufferAllocator::ensure_capacity`]. With dynamic growth enabled the
//! capacity doubles until the write fits and the bytes already written are
//! carried over; with growth disabled the write fails with a range error and
//! nothing changes.
//!
//! ## Example
//! ```rust
//! use wire_buffers::core::{BufferAllocator, BufferCursor, PoolingAllocator};
//!
//! let mut allocator = PoolingAllocator::new();
//! let handle = allocator.acquire(16).unwrap();
//! let mut cursor = BufferCursor::new(&mut allocator, handle);
//! for i in 0..5 {
//!     cursor.write_i32(i).unwrap();
//! }
//! assert_eq!(cursor.capacity().unwrap(), 32);
//! ```

use crate::codec::{self, FixedWidth};
use crate::core::allocator::{BufferAllocator, BufferHandle};
use crate::core::buffer::Buffer;
use crate::error::Result;

/// Write session over one buffer, growing it through its allocator
#[derive(Debug)]
pub struct BufferCursor<'a, A: ?Sized + BufferAllocator = dyn BufferAllocator> {
    allocator: &'a mut A,
    handle: BufferHandle,
}

macro_rules! write_methods {
    ($($name:ident => $t:ty),* $(,)?) => {$(
        #[doc = concat!("Write a little-endian `", stringify!($t), "` at the cursor.")]
        #[inline]
        pub fn $name(&mut self, value: $t) -> Result<usize> {
            self.write(value)
        }
    )*};
}

impl<'a, A: ?Sized + BufferAllocator> BufferCursor<'a, A> {
    /// Open a session on `handle`, which must belong to `allocator`.
    pub fn new(allocator: &'a mut A, handle: BufferHandle) -> Self {
        Self { allocator, handle }
    }

    /// Current handle; changes if the allocator reissued it during growth
    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    fn reserve(&mut self, size: usize) -> Result<&mut Buffer> {
        self.handle = self.allocator.ensure_capacity(self.handle, size)?;
        self.allocator.buffer_mut(self.handle)
    }

    /// The buffer behind the current handle.
    pub fn buffer(&self) -> Result<&Buffer> {
        self.allocator.buffer(self.handle)
    }

    /// Write a little-endian value, growing the buffer if needed.
    pub fn write<T: FixedWidth>(&mut self, value: T) -> Result<usize> {
        self.reserve(T::SIZE)?.put(value)
    }

    /// Write a big-endian value, growing the buffer if needed.
    pub fn write_be<T: FixedWidth>(&mut self, value: T) -> Result<usize> {
        self.reserve(T::SIZE)?.put_be(value)
    }

    write_methods! {
        write_bool => bool,
        write_i8 => i8,
        write_u8 => u8,
        write_i16 => i16,
        write_u16 => u16,
        write_i32 => i32,
        write_u32 => u32,
        write_i64 => i64,
        write_u64 => u64,
        write_f32 => f32,
        write_f64 => f64,
    }

    /// Copy a byte run, growing the buffer if needed.
    pub fn write_bytes(&mut self, src: &[u8]) -> Result<usize> {
        self.reserve(src.len())?.put_bytes(src)
    }

    /// Write the UTF-8 bytes of `text`, growing the buffer if needed.
    pub fn write_str(&mut self, text: &str) -> Result<usize> {
        self.reserve(text.len())?.put_str(text)
    }

    /// Encode UTF-16 code units as UTF-8. Sized exactly before growing.
    pub fn write_utf16(&mut self, units: &[u16]) -> Result<usize> {
        let len = codec::utf8_len(units)?;
        self.reserve(len)?.put_utf16(units)
    }

    /// Move to an absolute position. Never grows the buffer.
    pub fn seek(&mut self, position: usize) -> Result<()> {
        self.allocator.buffer_mut(self.handle)?.seek(position)
    }

    /// Move back by `by` bytes.
    pub fn rewind(&mut self, by: usize) -> Result<()> {
        self.allocator.buffer_mut(self.handle)?.rewind(by)
    }

    /// See [`Buffer::position`].
    pub fn position(&self) -> Result<usize> {
        self.buffer().map(Buffer::position)
    }

    /// See [`Buffer::length`].
    pub fn length(&self) -> Result<usize> {
        self.buffer().map(Buffer::length)
    }

    /// See [`Buffer::capacity`].
    pub fn capacity(&self) -> Result<usize> {
        self.buffer().map(Buffer::capacity)
    }
}
