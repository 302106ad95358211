#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(filter) = bookstore::query::parse_filter_json(s) {
            let docs = [
                bson::doc! {"title": "A", "published_year": 1997, "price": 20.0},
                bson::doc! {"title": "B", "published_year": 2001_i64, "genre": "Fantasy", "meta": {"z": 3}},
                bson::doc! {"in_stock": true, "tags": ["a", "b"]},
            ];
            for d in &docs {
                let _ = bookstore::query::eval_filter(d, &filter);
            }
        }
    }
});
