#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        // must not panic; rendering a parsed filter must not panic either
        if let Ok(f) = bookstore::query::parse_filter_json(s) {
            let _ = bookstore::query::filter_to_document(&f);
        }
    }
});
