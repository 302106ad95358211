use bookstore::catalog::CatalogItem;
use bookstore::seed::{sample_items, seed_store};
use bookstore::store::MemoryStore;

/// The three-item catalog used throughout the report examples.
pub fn abc_items() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new("A", "Author A", "Fantasy", 1997, 20.0, true),
        CatalogItem::new("B", "Author B", "Fantasy", 2001, 10.0, true),
        CatalogItem::new("C", "Author C", "Sci-Fi", 2012, 30.0, false),
    ]
}

pub fn store_with(items: &[CatalogItem]) -> MemoryStore {
    let store = MemoryStore::new("books");
    seed_store(&store, items).unwrap();
    store
}

pub fn sample_store() -> MemoryStore {
    store_with(&sample_items())
}
