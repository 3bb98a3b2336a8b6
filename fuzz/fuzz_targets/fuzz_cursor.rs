#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use wire_buffers::config::BufferConfig;
use wire_buffers::BufferManager;

#[derive(Debug, Arbitrary)]
enum Op {
    Acquire(u16),
    Release(u8),
    WriteU32(u8, u32),
    WriteBytes(u8, Vec<u8>),
    WriteUtf16(u8, Vec<u16>),
    Rewind(u8, u16),
    Reacquire(u8, u16),
}

#[derive(Debug, Arbitrary)]
struct Script {
    pedantic: bool,
    dynamic_growth: bool,
    ops: Vec<Op>,
}

fuzz_target!(|script: Script| {
    // Arbitrary op sequences must never panic or corrupt written prefixes
    let config = BufferConfig::default_with_overrides(|c| {
        c.allocator.pedantic = script.pedantic;
        c.allocator.dynamic_growth = script.dynamic_growth;
        c.allocator.max_buffer_size = 1 << 20;
        c.allocator.max_pooled_array_size = 1 << 16;
    });
    let mut manager = BufferManager::with_config(config);
    let mut handles = Vec::new();

    for op in script.ops {
        match op {
            Op::Acquire(size) => {
                if let Ok(handle) = manager.acquire_buffer(usize::from(size)) {
                    handles.push(handle);
                }
            }
            Op::Release(i) => {
                if let Some(&handle) = handles.get(usize::from(i)) {
                    let _ = manager.release_buffer(handle);
                }
            }
            Op::WriteU32(i, value) => {
                if let Some(handle) = handles.get_mut(usize::from(i)) {
                    let before = manager.buffer(*handle).map(|b| b.to_bytes()).ok();
                    let mut cursor = manager.cursor(*handle);
                    let written = cursor.write_u32(value).is_ok();
                    *handle = cursor.handle();
                    if let (true, Some(before)) = (written, before) {
                        let buffer = manager.buffer(*handle).expect("written buffer is live");
                        let position = buffer.position();
                        // bytes outside the write are unchanged
                        let prefix = (position - 4).min(before.len());
                        assert_eq!(&buffer.as_slice()[..prefix], &before[..prefix]);
                    }
                }
            }
            Op::WriteBytes(i, bytes) => {
                if let Some(handle) = handles.get_mut(usize::from(i)) {
                    let mut cursor = manager.cursor(*handle);
                    let _ = cursor.write_bytes(&bytes);
                    *handle = cursor.handle();
                }
            }
            Op::WriteUtf16(i, units) => {
                if let Some(handle) = handles.get_mut(usize::from(i)) {
                    let mut cursor = manager.cursor(*handle);
                    let _ = cursor.write_utf16(&units);
                    *handle = cursor.handle();
                }
            }
            Op::Rewind(i, by) => {
                if let Some(&handle) = handles.get(usize::from(i)) {
                    let _ = manager.cursor(handle).rewind(usize::from(by));
                }
            }
            Op::Reacquire(i, size) => {
                if let Some(handle) = handles.get_mut(usize::from(i)) {
                    if let Ok(grown) = manager.reacquire_buffer(*handle, usize::from(size)) {
                        *handle = grown;
                    }
                }
            }
        }
    }
});
