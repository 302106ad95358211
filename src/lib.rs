//! Bookstore catalog queries and aggregation reports over a pluggable document store.
//!
//! ```
//! use bookstore::report::ReportBuilder;
//! use bookstore::seed::{sample_items, seed_store};
//! use bookstore::store::MemoryStore;
//!
//! let store = MemoryStore::new("books");
//! seed_store(&store, &sample_items()).unwrap();
//! let top = ReportBuilder::new(&store).top_author_by_count().unwrap();
//! assert_eq!(top.unwrap().author.as_deref(), Some("J.K. Rowling"));
//! ```

pub mod aggregate;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod errors;
pub mod index;
pub mod logger;
pub mod query;
pub mod report;
pub mod seed;
pub mod store;
pub mod types;

pub use errors::DbError;
pub use report::ReportBuilder;
pub use store::{CatalogStore, MemoryStore};
