//! Integration tests for pooled writers and readers

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bytes::Bytes;
use wire_buffers::config::BufferConfig;
use wire_buffers::error::{BufferError, OwnershipError};
use wire_buffers::{BufferManager, ReaderHandle, WriterHandle};

fn write_frame(manager: &mut BufferManager, id: u32, body: &str) -> Bytes {
    let handle = manager.acquire_writer().unwrap();
    let writer = manager.writer_mut(handle).unwrap();
    writer.write(id).unwrap();
    writer.write(body.len() as u16).unwrap();
    writer.write_str(body).unwrap();
    let frame = writer.to_bytes();
    manager.release_writer(handle).unwrap();
    frame
}

#[test]
fn test_frames_through_pooled_objects() {
    let mut manager = BufferManager::new();
    let frames: Vec<Bytes> = ["alpha", "beta", "γάμμα"]
        .iter()
        .enumerate()
        .map(|(i, body)| write_frame(&mut manager, i as u32, body))
        .collect();
    assert_eq!(manager.live_writers(), 0);

    for (i, frame) in frames.into_iter().enumerate() {
        let handle = manager.acquire_reader(frame).unwrap();
        let reader = manager.reader_mut(handle).unwrap();
        assert_eq!(reader.read::<u32>().unwrap(), i as u32);
        let len = reader.read::<u16>().unwrap() as usize;
        let body = reader.read_str(len).unwrap();
        assert_eq!(body, ["alpha", "beta", "γάμμα"][i]);
        assert_eq!(reader.remaining(), 0);
        manager.release_reader(handle).unwrap();
    }
    assert_eq!(manager.live_readers(), 0);
}

#[test]
fn test_outstanding_objects_are_distinct() {
    let mut manager = BufferManager::new();
    let writers: Vec<WriterHandle> = (0..8).map(|_| manager.acquire_writer().unwrap()).collect();
    for (i, handle) in writers.iter().enumerate() {
        manager.writer_mut(*handle).unwrap().write(i as u8).unwrap();
    }
    for (i, handle) in writers.iter().enumerate() {
        assert_eq!(manager.writer(*handle).unwrap().as_slice(), &[i as u8]);
    }
    assert_eq!(manager.live_writers(), 8);
}

#[test]
fn test_release_twice_is_ownership_error() {
    let mut manager = BufferManager::new();
    let handle = manager.acquire_writer().unwrap();
    manager.release_writer(handle).unwrap();
    let err = manager.release_writer(handle).unwrap_err();
    assert!(matches!(
        err,
        BufferError::Ownership(OwnershipError::UnknownObject { .. })
    ));
}

#[test]
fn test_stale_reader_handle_cannot_read_new_owner() {
    let mut manager = BufferManager::new();
    let old: ReaderHandle = manager.acquire_reader(vec![1u8]).unwrap();
    manager.release_reader(old).unwrap();
    let new = manager.acquire_reader(vec![2u8]).unwrap();

    assert!(manager.reader(old).is_err());
    assert_eq!(manager.reader_mut(new).unwrap().read::<u8>().unwrap(), 2);
}

#[test]
fn test_registries_are_independent() {
    let mut manager = BufferManager::new();
    let writer = manager.acquire_writer().unwrap();
    let reader = manager.acquire_reader(Bytes::new()).unwrap();
    assert_eq!(writer.index(), reader.index());

    manager.release_writer(writer).unwrap();
    assert_eq!(manager.live_writers(), 0);
    assert_eq!(manager.live_readers(), 1);
}

#[test]
fn test_audit_lists_leaks_with_call_site() {
    let mut manager = BufferManager::new();
    let kept = manager.acquire_reader(vec![0u8; 4]).unwrap();
    let returned = manager.acquire_reader(vec![0u8; 4]).unwrap();
    manager.release_reader(returned).unwrap();

    let report = manager.audit_readers();
    assert_eq!(report.registry, "readers");
    assert_eq!(report.live.len(), 1);
    assert_eq!(report.live[0].index, kept.index());
    let origin = report.live[0].record.origin.expect("origin tracked");
    assert!(origin.file().ends_with("manager_registries.rs"));
    assert!(manager.audit_writers().is_clean());
}

#[test]
fn test_untracked_origins() {
    let config = BufferConfig::default_with_overrides(|c| c.registry.track_origins = false);
    let mut manager = BufferManager::with_config(config);
    manager.acquire_writer().unwrap();
    let report = manager.audit_writers();
    assert_eq!(report.live.len(), 1);
    assert!(report.live[0].record.origin.is_none());
}
