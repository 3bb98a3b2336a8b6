//! # Buffer Allocators
//!
//! Allocators own every [`Buffer`] they hand out. Callers hold a
//! [`BufferHandle`], a small `Copy` token naming the allocator, the wrapper
//! slot and the slot generation, and go through the allocator to reach the
//! buffer itself.
//!
//! ## Lifecycle
//! ```text
//! acquire(min) ──► Acquired ──reacquire(larger)──► Acquired (storage swapped, bytes kept)
//!                     │
//!                  release
//!                     ▼
//!                  Released ──acquire──► Acquired (generation + 1)
//! ```
//!
//! ## Misuse
//! - Handle from another allocator: [`OwnershipError::ForeignBuffer`], always
//! - Handle from an earlier generation of the slot: [`OwnershipError::StaleHandle`], always
//! - Release or reacquire of a released buffer: an error in pedantic mode,
//!   otherwise logged with `warn!` and ignored
//! - Reading or writing a released buffer: [`OwnershipError::UseAfterRelease`], always

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace, warn};

use crate::config::AllocatorConfig;
use crate::core::buffer::Buffer;
use crate::error::{constants, OwnershipError, RangeError, Result};
use crate::utils::array_pool::ArrayPool;
use crate::utils::metrics::PoolMetrics;

static NEXT_ALLOCATOR_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique allocator identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AllocatorId(u64);

impl AllocatorId {
    /// Draw a fresh id. Custom allocators call this once at construction.
    pub fn next() -> Self {
        Self(NEXT_ALLOCATOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric id
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AllocatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "allocator#{}", self.0)
    }
}

/// Token for a buffer held by an allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle {
    allocator: AllocatorId,
    slot: u32,
    generation: u32,
}

impl BufferHandle {
    /// Assemble a handle. Only allocators should need this.
    pub fn new(allocator: AllocatorId, slot: u32, generation: u32) -> Self {
        Self {
            allocator,
            slot,
            generation,
        }
    }

    /// Allocator that issued the handle
    pub fn allocator(&self) -> AllocatorId {
        self.allocator
    }

    /// Slot index inside that allocator
    pub fn slot(&self) -> u32 {
        self.slot
    }

    /// Slot generation at issue time
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Source of pooled, growable buffers
///
/// Implementations must reject handles they did not issue with
/// [`OwnershipError::ForeignBuffer`], and must keep bytes `0..length` readable
/// at the same offsets across [`BufferAllocator::reacquire`].
pub trait BufferAllocator: Send + fmt::Debug {
    /// Identity stamped into every handle this allocator issues
    fn id(&self) -> AllocatorId;

    /// Hand out a buffer with capacity of at least `min_size` bytes
    fn acquire(&mut self, min_size: usize) -> Result<BufferHandle>;

    /// Ensure the buffer has capacity of at least `new_min_size` bytes
    ///
    /// The returned handle replaces `handle` for all further calls.
    fn reacquire(&mut self, handle: BufferHandle, new_min_size: usize) -> Result<BufferHandle>;

    /// Return the buffer and its storage to the pool
    fn release(&mut self, handle: BufferHandle) -> Result<()>;

    fn buffer(&self, handle: BufferHandle) -> Result<&Buffer>;

    fn buffer_mut(&mut self, handle: BufferHandle) -> Result<&mut Buffer>;

    /// Whether writes past capacity grow the buffer
    fn dynamic_growth(&self) -> bool {
        true
    }

    /// Make room for `additional` bytes at the cursor, doubling capacity
    /// until the write fits
    fn ensure_capacity(&mut self, handle: BufferHandle, additional: usize) -> Result<BufferHandle> {
        let buffer = self.buffer(handle)?;
        let (position, capacity) = (buffer.position(), buffer.capacity());
        let needed = position
            .checked_add(additional)
            .ok_or(RangeError::SizeOverflow {
                requested: additional,
                max: usize::MAX - position,
            })?;
        if needed <= capacity {
            return Ok(handle);
        }
        if !self.dynamic_growth() {
            return Err(RangeError::CapacityExceeded { needed, capacity }.into());
        }

        let mut target = capacity.max(1);
        while target < needed {
            target = target.checked_mul(2).ok_or(RangeError::SizeOverflow {
                requested: needed,
                max: usize::MAX,
            })?;
        }
        self.reacquire(handle, target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Acquired,
    Released,
}

#[derive(Debug)]
struct Slot {
    buffer: Buffer,
    generation: u32,
    state: SlotState,
}

/// Default allocator: recycled wrapper slots over a bucketed array pool
#[derive(Debug)]
pub struct PoolingAllocator {
    id: AllocatorId,
    slots: Vec<Slot>,
    free: Vec<u32>,
    arrays: ArrayPool,
    metrics: PoolMetrics,
    default_buffer_size: usize,
    dynamic_growth: bool,
    pedantic: bool,
}

impl PoolingAllocator {
    /// Allocator with the default [`AllocatorConfig`]
    pub fn new() -> Self {
        Self::with_config(&AllocatorConfig::default())
    }

    /// Allocator following `config`
    pub fn with_config(config: &AllocatorConfig) -> Self {
        let id = AllocatorId::next();
        debug!(
            allocator = %id,
            pedantic = config.pedantic,
            dynamic_growth = config.dynamic_growth,
            "Pooling allocator created"
        );
        Self {
            id,
            slots: Vec::new(),
            free: Vec::new(),
            arrays: ArrayPool::new(config),
            metrics: PoolMetrics::new(),
            default_buffer_size: config.default_buffer_size,
            dynamic_growth: config.dynamic_growth,
            pedantic: config.pedantic,
        }
    }

    /// Acquire a buffer of the configured default size
    pub fn acquire_default(&mut self) -> Result<BufferHandle> {
        self.acquire(self.default_buffer_size)
    }

    /// Counters for this allocator
    pub fn metrics(&self) -> &PoolMetrics {
        &self.metrics
    }

    /// Whether misuse is reported as an error
    pub fn is_pedantic(&self) -> bool {
        self.pedantic
    }

    /// Buffers currently acquired
    pub fn outstanding(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Released wrapper slots waiting for reuse
    pub fn free_slots(&self) -> usize {
        self.free.len()
    }

    /// Arrays waiting in the pool
    pub fn pooled_arrays(&self) -> usize {
        self.arrays.available()
    }

    /// Resolve `handle` to its slot index, reporting whether the slot is live
    fn locate(&self, handle: BufferHandle) -> Result<(usize, bool)> {
        if handle.allocator != self.id {
            return Err(OwnershipError::ForeignBuffer {
                owner: handle.allocator.get(),
                allocator: self.id.get(),
            }
            .into());
        }
        let index = handle.slot as usize;
        let slot = self.slots.get(index).ok_or(OwnershipError::UnknownBuffer {
            slot: handle.slot,
            allocator: self.id.get(),
        })?;
        if slot.generation != handle.generation {
            return Err(OwnershipError::StaleHandle {
                slot: handle.slot,
                generation: handle.generation,
                current: slot.generation,
            }
            .into());
        }
        Ok((index, slot.state == SlotState::Acquired))
    }

    /// Report misuse of a released buffer; only pedantic mode fails
    fn misuse(&self, error: OwnershipError, message: &'static str) -> Result<()> {
        self.metrics.misuse();
        if self.pedantic {
            return Err(error.into());
        }
        warn!(allocator = %self.id, %error, "{message}, ignoring");
        Ok(())
    }

    fn live_index(&self, handle: BufferHandle) -> Result<usize> {
        match self.locate(handle)? {
            (index, true) => Ok(index),
            (_, false) => {
                self.metrics.misuse();
                Err(OwnershipError::UseAfterRelease { slot: handle.slot }.into())
            }
        }
    }
}

impl Default for PoolingAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferAllocator for PoolingAllocator {
    fn id(&self) -> AllocatorId {
        self.id
    }

    fn acquire(&mut self, min_size: usize) -> Result<BufferHandle> {
        let storage = self.arrays.rent(min_size, &self.metrics)?;
        let capacity = storage.len();

        let (index, fresh) = match self.free.pop() {
            Some(index) => (index, false),
            None => {
                let index = u32::try_from(self.slots.len()).map_err(|_| RangeError::SizeOverflow {
                    requested: self.slots.len(),
                    max: u32::MAX as usize,
                })?;
                self.slots.push(Slot {
                    buffer: Buffer::new(),
                    generation: 0,
                    state: SlotState::Released,
                });
                (index, true)
            }
        };

        let slot = &mut self.slots[index as usize];
        if let Err(e) = slot.buffer.setup(storage, 0, capacity) {
            self.free.push(index);
            return Err(e);
        }
        if !fresh {
            slot.generation = slot.generation.wrapping_add(1);
        }
        slot.state = SlotState::Acquired;
        let generation = slot.generation;

        self.metrics.buffer_acquired(fresh);
        trace!(allocator = %self.id, slot = index, generation, capacity, "Buffer acquired");
        Ok(BufferHandle::new(self.id, index, generation))
    }

    #[instrument(level = "debug", skip(self), fields(allocator = %self.id))]
    fn reacquire(&mut self, handle: BufferHandle, new_min_size: usize) -> Result<BufferHandle> {
        let (index, live) = self.locate(handle)?;
        if !live {
            self.misuse(
                OwnershipError::UseAfterRelease { slot: handle.slot },
                constants::ERR_USE_AFTER_RELEASE,
            )?;
            return Ok(handle);
        }

        let capacity = self.slots[index].buffer.capacity();
        if new_min_size <= capacity {
            return Ok(handle);
        }

        let storage = self.arrays.rent(new_min_size, &self.metrics)?;
        let buffer = &mut self.slots[index].buffer;
        let copied = buffer.length();
        if let Some(old) = buffer.rebind(storage)? {
            self.arrays.give_back(old, &self.metrics);
        }
        let grown = self.slots[index].buffer.capacity();

        self.metrics.buffer_grown(copied);
        debug!(from = capacity, to = grown, copied, "Buffer grown");
        Ok(handle)
    }

    fn release(&mut self, handle: BufferHandle) -> Result<()> {
        let (index, live) = self.locate(handle)?;
        if !live {
            return self.misuse(
                OwnershipError::DoubleRelease { slot: handle.slot },
                constants::ERR_DOUBLE_RELEASE,
            );
        }

        let slot = &mut self.slots[index];
        slot.state = SlotState::Released;
        if let Some(storage) = slot.buffer.unbind() {
            self.arrays.give_back(storage, &self.metrics);
        }
        self.free.push(handle.slot);

        self.metrics.buffer_released();
        trace!(allocator = %self.id, slot = handle.slot, "Buffer released");
        Ok(())
    }

    fn buffer(&self, handle: BufferHandle) -> Result<&Buffer> {
        let index = self.live_index(handle)?;
        Ok(&self.slots[index].buffer)
    }

    fn buffer_mut(&mut self, handle: BufferHandle) -> Result<&mut Buffer> {
        let index = self.live_index(handle)?;
        Ok(&mut self.slots[index].buffer)
    }

    fn dynamic_growth(&self) -> bool {
        self.dynamic_growth
    }
}
