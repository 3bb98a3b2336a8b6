//! # Buffer Manager
//!
//! Explicitly constructed context that owns the active allocator and the
//! pooled writer/reader registries. Create one per server or client instance
//! and pass it where buffers are needed; nothing here is global.
//!
//! ## Dispatch
//! ```text
//! acquire_buffer ─► custom allocator (if registered) ─┐
//!                └► default PoolingAllocator ─────────┴► BufferHandle
//! ```
//! Buffer calls always go to the currently active allocator. A handle issued
//! by an allocator that has since been swapped out is rejected with
//! [`OwnershipError::ForeignBuffer`](crate::error::OwnershipError::ForeignBuffer).
//!
//! ## Concurrency
//! All operations take `&mut self`. Confine a manager to one task or wrap it
//! in a lock.

use bytes::Bytes;
use tracing::{debug, info};

use crate::config::BufferConfig;
use crate::core::{
    AllocatorId, Buffer, BufferAllocator, BufferCursor, BufferHandle, PoolingAllocator,
};
use crate::error::Result;
use crate::message::{MessageReader, MessageWriter};
use crate::registry::{AuditReport, ObjectRegistry, PoolHandle};

/// Handle to a pooled [`MessageWriter`]
pub type WriterHandle = PoolHandle<MessageWriter>;

/// Handle to a pooled [`MessageReader`]
pub type ReaderHandle = PoolHandle<MessageReader>;

/// Owner of the active allocator and the pooled writer/reader registries
#[derive(Debug)]
pub struct BufferManager {
    default: PoolingAllocator,
    custom: Option<Box<dyn BufferAllocator>>,
    writers: ObjectRegistry<MessageWriter>,
    readers: ObjectRegistry<MessageReader>,
    config: BufferConfig,
}

impl BufferManager {
    /// Manager with the default configuration
    pub fn new() -> Self {
        Self::with_config(BufferConfig::default())
    }

    /// Manager built from `config`; the default allocator and both registries follow it
    pub fn with_config(config: BufferConfig) -> Self {
        let manager = Self {
            default: PoolingAllocator::with_config(&config.allocator),
            custom: None,
            writers: ObjectRegistry::new("writers", &config.registry),
            readers: ObjectRegistry::new("readers", &config.registry),
            config,
        };
        info!(
            allocator = %manager.default.id(),
            pedantic = manager.config.allocator.pedantic,
            dynamic_growth = manager.config.allocator.dynamic_growth,
            "Buffer manager created"
        );
        manager
    }

    /// Configuration the manager was built with
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// The built-in allocator, active whenever no custom one is registered
    pub fn default_allocator(&self) -> &PoolingAllocator {
        &self.default
    }

    /// The allocator buffer calls currently go to
    pub fn allocator(&self) -> &dyn BufferAllocator {
        match &self.custom {
            Some(custom) => custom.as_ref(),
            None => &self.default,
        }
    }

    fn allocator_mut(&mut self) -> &mut (dyn BufferAllocator + 'static) {
        match &mut self.custom {
            Some(custom) => custom.as_mut(),
            None => &mut self.default,
        }
    }

    /// Route buffer calls to `allocator`, returning the custom allocator it replaces
    pub fn register_allocator(
        &mut self,
        allocator: Box<dyn BufferAllocator>,
    ) -> Option<Box<dyn BufferAllocator>> {
        debug!(allocator = %allocator.id(), "Custom allocator registered");
        self.custom.replace(allocator)
    }

    /// Restore the default allocator if `id` names the active custom one
    ///
    /// Returns the unregistered allocator, or `None` when `id` is not active.
    pub fn unregister_allocator(&mut self, id: AllocatorId) -> Option<Box<dyn BufferAllocator>> {
        if self.custom.as_ref().map(|custom| custom.id()) != Some(id) {
            return None;
        }
        debug!(allocator = %id, "Custom allocator unregistered");
        self.custom.take()
    }

    /// Acquire a buffer of at least `min_size` bytes from the active allocator
    pub fn acquire_buffer(&mut self, min_size: usize) -> Result<BufferHandle> {
        self.allocator_mut().acquire(min_size)
    }

    /// Acquire a buffer of the configured default size
    pub fn acquire_default_buffer(&mut self) -> Result<BufferHandle> {
        let size = self.config.allocator.default_buffer_size;
        self.acquire_buffer(size)
    }

    /// Grow a buffer to at least `new_min_size` bytes, keeping its contents
    pub fn reacquire_buffer(
        &mut self,
        handle: BufferHandle,
        new_min_size: usize,
    ) -> Result<BufferHandle> {
        self.allocator_mut().reacquire(handle, new_min_size)
    }

    /// Return a buffer and its array to the active allocator
    pub fn release_buffer(&mut self, handle: BufferHandle) -> Result<()> {
        self.allocator_mut().release(handle)
    }

    /// Read access to a live buffer
    pub fn buffer(&self, handle: BufferHandle) -> Result<&Buffer> {
        self.allocator().buffer(handle)
    }

    /// Direct mutable access to a live buffer.
    ///
    /// Writes through the returned [`Buffer`] never grow it: a `put` that does
    /// not fit fails with `RangeError::CapacityExceeded` whatever the
    /// allocator's `dynamic_growth` setting. Use [`cursor`](Self::cursor) for
    /// writes that should grow the buffer.
    pub fn buffer_mut(&mut self, handle: BufferHandle) -> Result<&mut Buffer> {
        self.allocator_mut().buffer_mut(handle)
    }

    /// Open a growth-aware write session on `handle`
    pub fn cursor(&mut self, handle: BufferHandle) -> BufferCursor<'_> {
        BufferCursor::new(self.allocator_mut(), handle)
    }

    /// Take a pooled writer with an empty body
    #[track_caller]
    pub fn acquire_writer(&mut self) -> Result<WriterHandle> {
        let capacity = self.config.allocator.default_buffer_size;
        self.writers
            .acquire_with(MessageWriter::reset, || MessageWriter::with_capacity(capacity))
    }

    /// Take a pooled reader positioned at the start of `initial_bytes`
    #[track_caller]
    pub fn acquire_reader(&mut self, initial_bytes: impl Into<Bytes>) -> Result<ReaderHandle> {
        let data = initial_bytes.into();
        let reload = data.clone();
        self.readers
            .acquire_with(move |reader| reader.reset(reload), move || MessageReader::new(data))
    }

    /// Read access to a live writer
    pub fn writer(&self, handle: WriterHandle) -> Result<&MessageWriter> {
        self.writers.get(handle)
    }

    /// Mutable access to a live writer
    pub fn writer_mut(&mut self, handle: WriterHandle) -> Result<&mut MessageWriter> {
        self.writers.get_mut(handle)
    }

    /// Read access to a live reader
    pub fn reader(&self, handle: ReaderHandle) -> Result<&MessageReader> {
        self.readers.get(handle)
    }

    /// Mutable access to a live reader
    pub fn reader_mut(&mut self, handle: ReaderHandle) -> Result<&mut MessageReader> {
        self.readers.get_mut(handle)
    }

    /// Return a writer to the pool; its handle becomes stale
    pub fn release_writer(&mut self, handle: WriterHandle) -> Result<()> {
        self.writers.release(handle)
    }

    /// Return a reader to the pool; its handle becomes stale
    pub fn release_reader(&mut self, handle: ReaderHandle) -> Result<()> {
        self.readers.release(handle)
    }

    /// Writers still live
    pub fn live_writers(&self) -> usize {
        self.writers.live_count()
    }

    /// Readers still live
    pub fn live_readers(&self) -> usize {
        self.readers.live_count()
    }

    /// List and log every writer not yet released
    pub fn audit_writers(&self) -> AuditReport {
        self.writers.audit()
    }

    /// List and log every reader not yet released
    pub fn audit_readers(&self) -> AuditReport {
        self.readers.audit()
    }
}

impl Default for BufferManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::error::{BufferError, OwnershipError};

    #[test]
    fn test_default_allocator_is_active() {
        let mut manager = BufferManager::new();
        let handle = manager.acquire_default_buffer().unwrap();
        assert_eq!(handle.allocator(), manager.default_allocator().id());
        assert_eq!(manager.buffer(handle).unwrap().capacity(), 1024);
        manager.release_buffer(handle).unwrap();
    }

    #[test]
    fn test_cursor_grows_through_manager() {
        let mut manager = BufferManager::new();
        let handle = manager.acquire_buffer(16).unwrap();
        {
            let mut cursor = manager.cursor(handle);
            for i in 0..5 {
                cursor.write_i32(i).unwrap();
            }
        }
        let buffer = manager.buffer(handle).unwrap();
        assert_eq!(buffer.capacity(), 32);
        assert_eq!(buffer.read_at::<i32>(16).unwrap(), 4);
    }

    #[test]
    fn test_register_and_unregister() {
        let mut manager = BufferManager::new();
        let custom = PoolingAllocator::new();
        let custom_id = custom.id();

        assert!(manager.register_allocator(Box::new(custom)).is_none());
        assert_eq!(manager.allocator().id(), custom_id);
        let handle = manager.acquire_buffer(16).unwrap();
        assert_eq!(handle.allocator(), custom_id);

        // only the active allocator can be unregistered
        assert!(manager
            .unregister_allocator(manager.default_allocator().id())
            .is_none());
        let removed = manager.unregister_allocator(custom_id).unwrap();
        assert_eq!(removed.id(), custom_id);

        let err = manager.release_buffer(handle).unwrap_err();
        assert!(matches!(
            err,
            BufferError::Ownership(OwnershipError::ForeignBuffer { .. })
        ));
    }

    #[test]
    fn test_writer_pool_roundtrip() {
        let mut manager = BufferManager::new();
        let handle = manager.acquire_writer().unwrap();
        manager.writer_mut(handle).unwrap().write(42u32).unwrap();
        let body = manager.writer(handle).unwrap().to_bytes();
        manager.release_writer(handle).unwrap();

        let again = manager.acquire_writer().unwrap();
        assert!(manager.writer(again).unwrap().is_empty());
        assert_eq!(manager.live_writers(), 1);

        let reader = manager.acquire_reader(body).unwrap();
        assert_eq!(manager.reader_mut(reader).unwrap().read::<u32>().unwrap(), 42);
    }

    #[test]
    fn test_reused_reader_sees_new_bytes() {
        let mut manager = BufferManager::new();
        let first = manager.acquire_reader(vec![1u8, 0, 0, 0]).unwrap();
        manager.reader_mut(first).unwrap().read::<u32>().unwrap();
        manager.release_reader(first).unwrap();

        let second = manager.acquire_reader(vec![9u8, 0]).unwrap();
        assert_eq!(second.index(), first.index());
        let reader = manager.reader_mut(second).unwrap();
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.read::<u16>().unwrap(), 9);
    }

    #[test]
    fn test_release_unknown_reader() {
        let mut manager = BufferManager::new();
        let handle = manager.acquire_reader(Bytes::new()).unwrap();
        manager.release_reader(handle).unwrap();
        assert!(manager.release_reader(handle).unwrap_err().is_ownership());
    }

    #[test]
    fn test_audit_reports_leaks() {
        let mut manager = BufferManager::new();
        let _leaked = manager.acquire_writer().unwrap();
        let report = manager.audit_writers();
        assert_eq!(report.live.len(), 1);
        assert!(manager.audit_readers().is_clean());
    }
}
