#![no_main]

use daily_start::fuzz_api::parse_message_document;
use daily_start::message::MessageId;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(raws) = parse_message_document(data) {
        for (i, raw) in raws.iter().enumerate() {
            if let Some(m) = raw.normalize(|| MessageId::Text(format!("msg_{}", i))) {
                assert!(!m.text.trim().is_empty());
            }
        }
    }
});
