#![no_main]

use daily_start::fuzz_api::sanitize_input;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let out = sanitize_input(s, 500);
        assert!(out.chars().count() <= 500);
    }
});
