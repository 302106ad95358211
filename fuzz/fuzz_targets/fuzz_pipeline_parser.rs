#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 { return; }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(p) = bookstore::aggregate::parse_pipeline_json(s) {
            let docs = vec![
                bson::doc! {"_id": "1", "title": "A", "author": "X", "published_year": 1997, "price": 20.0},
                bson::doc! {"_id": "2", "title": "B", "author": "X", "published_year": i32::MIN, "price": "n/a"},
                bson::doc! {"_id": "3", "published_year": i64::MAX},
            ];
            // errors are fine, panics are not
            let _ = bookstore::aggregate::run_pipeline(docs, &p);
        }
    }
});
