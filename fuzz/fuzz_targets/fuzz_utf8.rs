#![no_main]

use libfuzzer_sys::fuzz_target;
use wire_buffers::codec;

fuzz_target!(|data: &[u8]| {
    // Decoder must agree with std on validity and never panic
    let ours = codec::read_utf8(data, 0, data.len());
    match std::str::from_utf8(data) {
        Ok(text) => assert_eq!(ours.ok().as_deref(), Some(text)),
        Err(_) => assert!(ours.is_err()),
    }

    // Encoder over arbitrary code units: sized exactly, or rejected untouched
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    let mut region = vec![0u8; codec::max_utf8_len(units.len())];
    match codec::write_utf8(&mut region, 0, &units) {
        Ok(written) => {
            let expected = String::from_utf16(&units).ok();
            assert_eq!(codec::read_utf8(&region, 0, written).ok(), expected);
        }
        Err(_) => assert!(region.iter().all(|&b| b == 0)),
    }
});
