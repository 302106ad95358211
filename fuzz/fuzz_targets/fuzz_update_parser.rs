#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(upd) = bookstore::query::parse_update_json(s) {
            let mut d = bson::doc! {"title": "x", "price": 1.5, "meta": {"n": 1}};
            let _ = bookstore::query::apply_update(&mut d, &upd);
        }
    }
});
