#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 16384 { return; }
    if let Ok(items) = bookstore::seed::parse_items(data) {
        let store = bookstore::store::MemoryStore::new("fuzz");
        let _ = bookstore::seed::seed_store(&store, &items);
    }
});
