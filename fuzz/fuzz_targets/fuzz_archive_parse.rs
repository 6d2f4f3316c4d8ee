#![no_main]
use libfuzzer_sys::fuzz_target;
use pagearc::{Archive, PAGE_SIZE};

// Arbitrary bytes must be rejected or listed, never panic
fuzz_target!(|data: &[u8]| {
    let mut blob = data.to_vec();
    if blob.len() % PAGE_SIZE != 0 {
        blob.resize((blob.len() / PAGE_SIZE + 1) * PAGE_SIZE, 0);
    }

    if let Ok(archive) = Archive::parse(&blob) {
        let _ = archive.list();
    }
});
