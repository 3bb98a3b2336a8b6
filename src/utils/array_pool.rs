//! # Array Pool
//!
//! Power-of-two bucketed pool of [`RawStorage`] arrays backing pooled buffers.
//!
//! Rentals are rounded up to the next power of two so a returned array can
//! serve any later request that maps to the same bucket. Arrays above
//! `max_pooled_array_size`, or returned to a bucket that is already full, are
//! dropped instead of kept.
//!
//! ## Usage
//! ```rust
//! use wire_buffers::config::AllocatorConfig;
//! use wire_buffers::utils::array_pool::ArrayPool;
//! use wire_buffers::utils::metrics::PoolMetrics;
//!
//! let metrics = PoolMetrics::new();
//! let mut pool = ArrayPool::new(&AllocatorConfig::default());
//! let storage = pool.rent(100, &metrics).unwrap();
//! assert_eq!(storage.len(), 128);
//! pool.give_back(storage, &metrics);
//! assert_eq!(pool.available(), 1);
//! ```

use std::collections::BTreeMap;

use tracing::trace;

use crate::codec;
use crate::config::AllocatorConfig;
use crate::core::buffer::RawStorage;
use crate::error::{RangeError, Result};
use crate::utils::metrics::PoolMetrics;

/// Bucketed pool of byte arrays
#[derive(Debug)]
pub struct ArrayPool {
    buckets: BTreeMap<usize, Vec<RawStorage>>,
    min_array_size: usize,
    max_pooled_array_size: usize,
    max_arrays_per_bucket: usize,
    max_array_size: usize,
    zero_on_release: bool,
}

impl ArrayPool {
    /// Create an empty pool sized by `config`
    pub fn new(config: &AllocatorConfig) -> Self {
        Self {
            buckets: BTreeMap::new(),
            min_array_size: config.min_array_size.max(1),
            max_pooled_array_size: config.max_pooled_array_size,
            max_arrays_per_bucket: config.max_arrays_per_bucket,
            max_array_size: config.max_buffer_size,
            zero_on_release: config.zero_on_release,
        }
    }

    /// Array size a rental of `min_size` bytes maps to
    pub fn bucket_size(&self, min_size: usize) -> Result<usize> {
        let size = codec::next_pow2(min_size.max(self.min_array_size));
        if size == 0 || size > self.max_array_size {
            return Err(RangeError::SizeOverflow {
                requested: min_size,
                max: self.max_array_size,
            }
            .into());
        }
        Ok(size)
    }

    /// Rent an array of at least `min_size` bytes
    pub fn rent(&mut self, min_size: usize, metrics: &PoolMetrics) -> Result<RawStorage> {
        let size = self.bucket_size(min_size)?;
        if let Some(storage) = self.buckets.get_mut(&size).and_then(Vec::pop) {
            metrics.array_rented(false);
            return Ok(storage);
        }

        trace!(size, "Array pool miss, allocating");
        metrics.array_rented(true);
        Ok(RawStorage::zeroed(size))
    }

    /// Return an array, keeping it when its bucket has room
    ///
    /// Returns `true` when the array was pooled.
    pub fn give_back(&mut self, mut storage: RawStorage, metrics: &PoolMetrics) -> bool {
        let size = storage.len();
        let poolable = size.is_power_of_two()
            && size >= self.min_array_size
            && size <= self.max_pooled_array_size;
        if !poolable {
            metrics.array_returned(false);
            return false;
        }

        let bucket = self.buckets.entry(size).or_default();
        if bucket.len() >= self.max_arrays_per_bucket {
            metrics.array_returned(false);
            return false;
        }

        if self.zero_on_release {
            storage.clear();
        }
        bucket.push(storage);
        metrics.array_returned(true);
        true
    }

    /// Get the current number of pooled arrays across all buckets
    pub fn available(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Drop every pooled array
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn pool_with(per_bucket: usize, max_pooled: usize) -> ArrayPool {
        ArrayPool::new(&AllocatorConfig {
            min_array_size: 16,
            max_arrays_per_bucket: per_bucket,
            max_pooled_array_size: max_pooled,
            ..AllocatorConfig::default()
        })
    }

    #[test]
    fn test_rent_rounds_to_power_of_two() {
        let metrics = PoolMetrics::new();
        let mut pool = pool_with(4, 4096);
        assert_eq!(pool.rent(0, &metrics).unwrap().len(), 16);
        assert_eq!(pool.rent(17, &metrics).unwrap().len(), 32);
        assert_eq!(pool.rent(64, &metrics).unwrap().len(), 64);
        assert_eq!(metrics.snapshot().arrays_allocated, 3);
    }

    #[test]
    fn test_returned_array_is_reused() {
        let metrics = PoolMetrics::new();
        let mut pool = pool_with(4, 4096);
        let storage = pool.rent(100, &metrics).unwrap();
        assert!(pool.give_back(storage, &metrics));
        assert_eq!(pool.available(), 1);

        let again = pool.rent(128, &metrics).unwrap();
        assert_eq!(again.len(), 128);
        assert_eq!(pool.available(), 0);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.arrays_rented, 2);
        assert_eq!(snapshot.arrays_allocated, 1);
    }

    #[test]
    fn test_bucket_limit() {
        let metrics = PoolMetrics::new();
        let mut pool = pool_with(1, 4096);
        let a = pool.rent(32, &metrics).unwrap();
        let b = pool.rent(32, &metrics).unwrap();
        assert!(pool.give_back(a, &metrics));
        assert!(!pool.give_back(b, &metrics));
        assert_eq!(pool.available(), 1);
        assert_eq!(metrics.snapshot().arrays_discarded, 1);
    }

    #[test]
    fn test_size_limit() {
        let metrics = PoolMetrics::new();
        let mut pool = pool_with(4, 64);
        let large = pool.rent(65, &metrics).unwrap();
        assert!(!pool.give_back(large, &metrics));
        assert_eq!(pool.available(), 0);
    }

    #[test]
    fn test_oversized_rental_fails() {
        let metrics = PoolMetrics::new();
        let mut pool = ArrayPool::new(&AllocatorConfig {
            max_buffer_size: 1024,
            ..AllocatorConfig::default()
        });
        assert!(pool.rent(1024, &metrics).is_ok());
        let err = pool.rent(1025, &metrics).unwrap_err();
        assert!(err.is_range());
        assert!(pool.rent(usize::MAX, &metrics).is_err());
    }

    #[test]
    fn test_zero_on_release() {
        let metrics = PoolMetrics::new();
        let mut pool = ArrayPool::new(&AllocatorConfig {
            zero_on_release: true,
            min_array_size: 16,
            ..AllocatorConfig::default()
        });
        let mut storage = pool.rent(16, &metrics).unwrap();
        storage.as_mut_slice().fill(0xAB);
        pool.give_back(storage, &metrics);
        let storage = pool.rent(16, &metrics).unwrap();
        assert!(storage.as_slice().iter().all(|&b| b == 0));
    }
}
