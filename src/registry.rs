//! # Pooled-Object Registry
//!
//! Arena of reusable objects addressed by `(index, generation)` handles.
//!
//! Acquiring pops a released slot (reusing the object it still holds) or
//! appends a new one. Each acquisition records where it happened and when, so
//! [`ObjectRegistry::audit`] can list every object that was never given back.
//! Releasing bumps nothing; the generation advances when the slot is reissued,
//! which makes handles from an earlier acquisition fail cleanly.
//!
//! ## Leak Checks
//! - [`ObjectRegistry::live_count`]: O(1), suitable for assertions
//! - [`ObjectRegistry::audit`]: O(slots), logs each live object with `warn!`

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::panic::Location;
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::error::{OwnershipError, RangeError, Result};

/// Handle to an object held by an [`ObjectRegistry<T>`]
pub struct PoolHandle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> PoolHandle<T> {
    fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index inside the registry
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation the slot had when this handle was issued
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl<T> Clone for PoolHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PoolHandle<T> {}

impl<T> PartialEq for PoolHandle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for PoolHandle<T> {}

impl<T> Hash for PoolHandle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for PoolHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolHandle")
            .field("index", &self.index)
            .field("generation", &self.generation)
            .finish()
    }
}

/// Where and when an object was acquired
#[derive(Debug, Clone, Copy)]
pub struct AllocationRecord {
    /// Caller location, when origin tracking is enabled
    pub origin: Option<&'static Location<'static>>,
    pub acquired_at: SystemTime,
}

#[derive(Debug)]
struct Entry<T> {
    value: Option<T>,
    generation: u32,
    record: Option<AllocationRecord>,
}

impl<T> Entry<T> {
    fn is_live(&self) -> bool {
        self.record.is_some()
    }
}

/// An object that was still live during an audit
#[derive(Debug, Clone)]
pub struct LeakedObject {
    pub index: u32,
    pub generation: u32,
    pub record: AllocationRecord,
}

impl fmt::Display for LeakedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "object {} (generation {})", self.index, self.generation)?;
        match self.record.origin {
            Some(origin) => write!(f, " acquired at {origin}"),
            None => write!(f, " acquired at unknown location"),
        }
    }
}

/// Result of [`ObjectRegistry::audit`]
#[derive(Debug, Clone)]
pub struct AuditReport {
    pub registry: &'static str,
    pub live: Vec<LeakedObject>,
    /// Released objects waiting for reuse
    pub idle: usize,
}

impl AuditReport {
    /// True when nothing is outstanding
    pub fn is_clean(&self) -> bool {
        self.live.is_empty()
    }
}

/// Arena of pooled objects with leak tracking
#[derive(Debug)]
pub struct ObjectRegistry<T> {
    name: &'static str,
    entries: Vec<Entry<T>>,
    free: Vec<u32>,
    idle: usize,
    track_origins: bool,
    max_free_objects: usize,
}

impl<T> ObjectRegistry<T> {
    /// Empty registry; `name` tags log lines and audit reports
    pub fn new(name: &'static str, config: &RegistryConfig) -> Self {
        Self {
            name,
            entries: Vec::new(),
            free: Vec::new(),
            idle: 0,
            track_origins: config.track_origins,
            max_free_objects: config.max_free_objects,
        }
    }

    /// Name given at construction
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Take an object, recycling a released one through `reuse` or building
    /// one with `create`
    #[track_caller]
    pub fn acquire_with<R, C>(&mut self, reuse: R, create: C) -> Result<PoolHandle<T>>
    where
        R: FnOnce(&mut T),
        C: FnOnce() -> T,
    {
        let origin = if self.track_origins {
            Some(Location::caller())
        } else {
            None
        };
        let record = AllocationRecord {
            origin,
            acquired_at: SystemTime::now(),
        };

        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            entry.generation = entry.generation.wrapping_add(1);
            entry.record = Some(record);
            if let Some(value) = entry.value.as_mut() {
                self.idle -= 1;
                reuse(value);
            } else {
                entry.value = Some(create());
            }
            return Ok(PoolHandle::new(index, entry.generation));
        }

        let index = u32::try_from(self.entries.len()).map_err(|_| RangeError::SizeOverflow {
            requested: self.entries.len(),
            max: u32::MAX as usize,
        })?;
        self.entries.push(Entry {
            value: Some(create()),
            generation: 0,
            record: Some(record),
        });
        debug!(registry = self.name, index, "Pooled object created");
        Ok(PoolHandle::new(index, 0))
    }

    fn live_entry(&self, handle: PoolHandle<T>) -> Result<usize> {
        let index = handle.index as usize;
        match self.entries.get(index) {
            Some(entry) if entry.generation == handle.generation && entry.is_live() => Ok(index),
            _ => Err(OwnershipError::UnknownObject {
                index: handle.index,
                generation: handle.generation,
            }
            .into()),
        }
    }

    /// Give an object back for reuse
    ///
    /// Unknown, stale or already released handles are an
    /// [`OwnershipError::UnknownObject`].
    pub fn release(&mut self, handle: PoolHandle<T>) -> Result<()> {
        let index = self.live_entry(handle)?;
        let entry = &mut self.entries[index];
        entry.record = None;
        if self.idle < self.max_free_objects {
            self.idle += 1;
        } else {
            entry.value = None;
        }
        self.free.push(handle.index);
        Ok(())
    }

    /// Borrow a live object
    pub fn get(&self, handle: PoolHandle<T>) -> Result<&T> {
        let index = self.live_entry(handle)?;
        self.entries[index]
            .value
            .as_ref()
            .ok_or_else(|| unknown(handle))
    }

    /// Mutably borrow a live object
    pub fn get_mut(&mut self, handle: PoolHandle<T>) -> Result<&mut T> {
        let index = self.live_entry(handle)?;
        self.entries[index]
            .value
            .as_mut()
            .ok_or_else(|| unknown(handle))
    }

    /// Allocation record of a live object
    pub fn record(&self, handle: PoolHandle<T>) -> Result<AllocationRecord> {
        let index = self.live_entry(handle)?;
        self.entries[index].record.ok_or_else(|| unknown(handle))
    }

    /// Objects acquired and not yet released
    pub fn live_count(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    /// Released objects kept for reuse
    pub fn idle_count(&self) -> usize {
        self.idle
    }

    /// List every live object, logging each as a potential leak
    pub fn audit(&self) -> AuditReport {
        let live: Vec<LeakedObject> = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| {
                entry.record.map(|record| LeakedObject {
                    index: index as u32,
                    generation: entry.generation,
                    record,
                })
            })
            .collect();

        for leaked in &live {
            warn!(registry = self.name, "Pooled object not released: {leaked}");
        }

        AuditReport {
            registry: self.name,
            live,
            idle: self.idle,
        }
    }
}

fn unknown<T>(handle: PoolHandle<T>) -> crate::error::BufferError {
    OwnershipError::UnknownObject {
        index: handle.index,
        generation: handle.generation,
    }
    .into()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::error::BufferError;

    fn registry() -> ObjectRegistry<Vec<u8>> {
        ObjectRegistry::new("test", &RegistryConfig::default())
    }

    fn acquire(registry: &mut ObjectRegistry<Vec<u8>>) -> PoolHandle<Vec<u8>> {
        registry.acquire_with(Vec::clear, Vec::new).unwrap()
    }

    #[test]
    fn test_acquire_is_exclusive() {
        let mut registry = registry();
        let a = acquire(&mut registry);
        let b = acquire(&mut registry);
        assert_ne!(a, b);
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn test_released_object_is_reused() {
        let mut registry = registry();
        let a = acquire(&mut registry);
        registry.get_mut(a).unwrap().extend_from_slice(b"abc");
        registry.release(a).unwrap();
        assert_eq!(registry.idle_count(), 1);

        let b = acquire(&mut registry);
        assert_eq!(b.index(), a.index());
        assert_eq!(b.generation(), a.generation() + 1);
        assert!(registry.get(b).unwrap().is_empty());
        assert!(registry.get(b).unwrap().capacity() >= 3);
    }

    #[test]
    fn test_double_release_is_reported() {
        let mut registry = registry();
        let a = acquire(&mut registry);
        registry.release(a).unwrap();
        let err = registry.release(a).unwrap_err();
        assert!(matches!(
            err,
            BufferError::Ownership(OwnershipError::UnknownObject {
                index: 0,
                generation: 0
            })
        ));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut registry = registry();
        let old = acquire(&mut registry);
        registry.release(old).unwrap();
        let new = acquire(&mut registry);
        assert!(registry.get(old).is_err());
        assert!(registry.release(old).is_err());
        assert!(registry.get(new).is_ok());
    }

    #[test]
    fn test_free_limit_drops_objects() {
        let mut registry = ObjectRegistry::<Vec<u8>>::new(
            "limited",
            &RegistryConfig {
                max_free_objects: 1,
                ..RegistryConfig::default()
            },
        );
        let a = acquire(&mut registry);
        let b = acquire(&mut registry);
        registry.release(a).unwrap();
        registry.release(b).unwrap();
        assert_eq!(registry.idle_count(), 1);

        // both slots come back, one rebuilt
        let mut created = 0;
        for _ in 0..2 {
            registry
                .acquire_with(Vec::clear, || {
                    created += 1;
                    Vec::new()
                })
                .unwrap();
        }
        assert_eq!(created, 1);
        assert_eq!(registry.idle_count(), 0);
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn test_audit_lists_live_objects_with_origin() {
        let mut registry = registry();
        let leaked = acquire(&mut registry);
        let returned = acquire(&mut registry);
        registry.release(returned).unwrap();

        let report = registry.audit();
        assert_eq!(report.registry, "test");
        assert_eq!(report.live.len(), 1);
        assert_eq!(report.live[0].index, leaked.index());
        assert_eq!(report.idle, 1);
        assert!(report.live[0].record.origin.is_some());
        assert!(report.live[0].to_string().contains("registry.rs"));

        registry.release(leaked).unwrap();
        assert!(registry.audit().is_clean());
    }

    #[test]
    fn test_origin_tracking_can_be_disabled() {
        let mut registry = ObjectRegistry::<Vec<u8>>::new(
            "untracked",
            &RegistryConfig {
                track_origins: false,
                ..RegistryConfig::default()
            },
        );
        let handle = acquire(&mut registry);
        assert!(registry.record(handle).unwrap().origin.is_none());
    }
}
