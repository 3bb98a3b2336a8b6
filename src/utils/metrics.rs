//! Pool Metrics
//!
//! Counters describing how an allocator uses its pools: how often buffers are
//! handed out and returned, how often storage had to be freshly allocated and
//! how much copying growth caused.
//!
//! Uses relaxed atomic counters so recording only needs `&self`. Each
//! allocator owns its own instance; there is no process-wide collector.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Counters for one allocator and its array pool
#[derive(Debug)]
pub struct PoolMetrics {
    /// Buffers handed out by `acquire`
    pub buffers_acquired: AtomicU64,
    /// Buffers returned by `release`
    pub buffers_released: AtomicU64,
    /// Buffer wrapper slots created because the free stack was empty
    pub wrappers_created: AtomicU64,
    /// `reacquire` calls that moved a buffer to larger storage
    pub growth_events: AtomicU64,
    /// Bytes copied from old to new storage during growth
    pub bytes_copied: AtomicU64,
    /// Arrays handed out by the array pool
    pub arrays_rented: AtomicU64,
    /// Arrays that had to be freshly allocated
    pub arrays_allocated: AtomicU64,
    /// Arrays accepted back into the pool
    pub arrays_returned: AtomicU64,
    /// Arrays dropped instead of pooled (too large or bucket full)
    pub arrays_discarded: AtomicU64,
    /// Double releases and use-after-release attempts that were detected
    pub misuse_detected: AtomicU64,
    start_time: Instant,
}

impl PoolMetrics {
    /// Create a zeroed metrics collector
    pub fn new() -> Self {
        Self {
            buffers_acquired: AtomicU64::new(0),
            buffers_released: AtomicU64::new(0),
            wrappers_created: AtomicU64::new(0),
            growth_events: AtomicU64::new(0),
            bytes_copied: AtomicU64::new(0),
            arrays_rented: AtomicU64::new(0),
            arrays_allocated: AtomicU64::new(0),
            arrays_returned: AtomicU64::new(0),
            arrays_discarded: AtomicU64::new(0),
            misuse_detected: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a buffer leaving the allocator
    pub fn buffer_acquired(&self, new_wrapper: bool) {
        self.buffers_acquired.fetch_add(1, Ordering::Relaxed);
        if new_wrapper {
            self.wrappers_created.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a buffer coming back to the allocator
    pub fn buffer_released(&self) {
        self.buffers_released.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a growth event and the bytes it copied
    pub fn buffer_grown(&self, copied: usize) {
        self.growth_events.fetch_add(1, Ordering::Relaxed);
        self.bytes_copied.fetch_add(copied as u64, Ordering::Relaxed);
    }

    /// Record an array rental, `fresh` when it missed the pool
    pub fn array_rented(&self, fresh: bool) {
        self.arrays_rented.fetch_add(1, Ordering::Relaxed);
        if fresh {
            self.arrays_allocated.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record an array handed back, `pooled` when it was kept
    pub fn array_returned(&self, pooled: bool) {
        if pooled {
            self.arrays_returned.fetch_add(1, Ordering::Relaxed);
        } else {
            self.arrays_discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a detected misuse
    pub fn misuse(&self) {
        self.misuse_detected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            buffers_acquired: self.buffers_acquired.load(Ordering::Relaxed),
            buffers_released: self.buffers_released.load(Ordering::Relaxed),
            wrappers_created: self.wrappers_created.load(Ordering::Relaxed),
            growth_events: self.growth_events.load(Ordering::Relaxed),
            bytes_copied: self.bytes_copied.load(Ordering::Relaxed),
            arrays_rented: self.arrays_rented.load(Ordering::Relaxed),
            arrays_allocated: self.arrays_allocated.load(Ordering::Relaxed),
            arrays_returned: self.arrays_returned.load(Ordering::Relaxed),
            arrays_discarded: self.arrays_discarded.load(Ordering::Relaxed),
            misuse_detected: self.misuse_detected.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            buffers_acquired = snapshot.buffers_acquired,
            buffers_released = snapshot.buffers_released,
            buffers_outstanding = snapshot.outstanding(),
            wrappers_created = snapshot.wrappers_created,
            growth_events = snapshot.growth_events,
            bytes_copied = snapshot.bytes_copied,
            arrays_rented = snapshot.arrays_rented,
            arrays_allocated = snapshot.arrays_allocated,
            arrays_returned = snapshot.arrays_returned,
            arrays_discarded = snapshot.arrays_discarded,
            misuse_detected = snapshot.misuse_detected,
            uptime_seconds = snapshot.uptime_seconds,
            "Buffer pool metrics snapshot"
        );
    }
}

impl Default for PoolMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub buffers_acquired: u64,
    pub buffers_released: u64,
    pub wrappers_created: u64,
    pub growth_events: u64,
    pub bytes_copied: u64,
    pub arrays_rented: u64,
    pub arrays_allocated: u64,
    pub arrays_returned: u64,
    pub arrays_discarded: u64,
    pub misuse_detected: u64,
    pub uptime_seconds: u64,
}

impl MetricsSnapshot {
    /// Buffers acquired and not yet released
    pub fn outstanding(&self) -> u64 {
        self.buffers_acquired.saturating_sub(self.buffers_released)
    }

    /// Fraction of rentals served from the pool, 0.0 when nothing was rented
    pub fn pool_hit_rate(&self) -> f64 {
        if self.arrays_rented == 0 {
            return 0.0;
        }
        (self.arrays_rented - self.arrays_allocated) as f64 / self.arrays_rented as f64
    }
}
