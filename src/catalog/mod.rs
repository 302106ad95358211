//! The bookstore catalog: the item entity and the canned queries run against it.

mod item;
mod queries;

pub use item::{CatalogItem, StoredItem, YEAR_RANGE, validate_price};
pub use queries::{CatalogQueries, DEFAULT_PAGE_SIZE, IndexComparison};

/// Name of the collection the catalog lives in.
pub const COLLECTION: &str = "books";
