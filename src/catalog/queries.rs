use bson::{Bson, Document as BsonDocument};
use serde::Serialize;

use super::item::{StoredItem, validate_price};
use crate::errors::DbError;
use crate::index::{ExplainStats, IndexSpec};
use crate::query::{
    DeleteReport, Filter, FindOptions, Order, SortSpec, UpdateDoc, UpdateReport,
};
use crate::store::CatalogStore;

pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Explain output for the same title lookup before and after the title index exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexComparison {
    pub without_index: ExplainStats,
    pub with_index: ExplainStats,
}

/// Canned CRUD and lookup queries over an injected store handle.
pub struct CatalogQueries<'a, S: CatalogStore + ?Sized> {
    store: &'a S,
    page_size: usize,
}

impl<'a, S: CatalogStore + ?Sized> CatalogQueries<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store, page_size: DEFAULT_PAGE_SIZE }
    }

    /// # Errors
    /// Returns `InvalidInput` for a zero page size.
    pub fn with_page_size(mut self, page_size: usize) -> Result<Self, DbError> {
        if page_size == 0 {
            return Err(DbError::InvalidInput("page size must be at least 1".into()));
        }
        self.page_size = page_size;
        Ok(self)
    }

    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    fn find_items(&self, filter: &Filter, opts: &FindOptions) -> Result<Vec<StoredItem>, DbError> {
        self.store.find(filter, opts)?.iter().map(StoredItem::try_from).collect()
    }

    /// # Errors
    /// Propagates store failures.
    pub fn find_by_genre(&self, genre: &str) -> Result<Vec<StoredItem>, DbError> {
        self.find_items(&Filter::eq("genre", genre), &FindOptions::default())
    }

    /// Items with `published_year` strictly greater than `year`.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn find_published_after(&self, year: i32) -> Result<Vec<StoredItem>, DbError> {
        self.find_items(&Filter::gt("published_year", year), &FindOptions::default())
    }

    /// # Errors
    /// Propagates store failures.
    pub fn find_by_author(&self, author: &str) -> Result<Vec<StoredItem>, DbError> {
        self.find_items(&Filter::eq("author", author), &FindOptions::default())
    }

    /// Sets the price of the first item titled `title`.
    ///
    /// # Errors
    /// Returns `InvalidInput` for a negative or non-finite price.
    pub fn update_price(&self, title: &str, price: f64) -> Result<UpdateReport, DbError> {
        validate_price(price)?;
        let update = UpdateDoc { set: vec![("price".into(), Bson::Double(price))], ..UpdateDoc::default() };
        self.store.update_one(&Filter::eq("title", title), &update)
    }

    /// # Errors
    /// Propagates store failures.
    pub fn delete_by_title(&self, title: &str) -> Result<DeleteReport, DbError> {
        self.store.delete_one(&Filter::eq("title", title))
    }

    /// In-stock items published after `year`.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn find_in_stock_after(&self, year: i32) -> Result<Vec<StoredItem>, DbError> {
        let filter = Filter::And(vec![Filter::eq("in_stock", true), Filter::gt("published_year", year)]);
        self.find_items(&filter, &FindOptions::default())
    }

    /// Every item reduced to `title`, `author` and `price`.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn find_with_projection(&self) -> Result<Vec<BsonDocument>, DbError> {
        let opts = FindOptions {
            projection: Some(vec!["title".into(), "author".into(), "price".into()]),
            ..FindOptions::default()
        };
        self.store.find(&Filter::True, &opts)
    }

    /// # Errors
    /// Propagates store failures.
    pub fn sort_by_price(&self, order: Order) -> Result<Vec<StoredItem>, DbError> {
        let opts = FindOptions {
            sort: Some(vec![SortSpec { field: "price".into(), order }]),
            ..FindOptions::default()
        };
        self.find_items(&Filter::True, &opts)
    }

    /// One-based page of items ordered by title.
    ///
    /// # Errors
    /// Returns `InvalidInput` for page 0.
    pub fn page(&self, page: usize) -> Result<Vec<StoredItem>, DbError> {
        if page == 0 {
            return Err(DbError::InvalidInput("pages are numbered from 1".into()));
        }
        let opts = FindOptions {
            sort: Some(vec![SortSpec::asc("title")]),
            skip: Some((page - 1).saturating_mul(self.page_size)),
            limit: Some(self.page_size),
            ..FindOptions::default()
        };
        self.find_items(&Filter::True, &opts)
    }

    /// # Errors
    /// Propagates store failures.
    pub fn create_title_index(&self) -> Result<String, DbError> {
        self.store.create_index(&IndexSpec::single("title", Order::Asc))
    }

    /// # Errors
    /// Propagates store failures.
    pub fn create_author_year_index(&self) -> Result<String, DbError> {
        self.store.create_index(&IndexSpec {
            keys: vec![SortSpec::asc("author"), SortSpec::desc("published_year")],
        })
    }

    /// Explains a title lookup, creates the title index, then explains it again.
    ///
    /// If the index already exists both runs use it.
    ///
    /// # Errors
    /// Propagates store failures.
    pub fn index_comparison(&self, title: &str) -> Result<IndexComparison, DbError> {
        let filter = Filter::eq("title", title);
        let without_index = self.store.explain(&filter)?;
        self.create_title_index()?;
        let with_index = self.store.explain(&filter)?;
        log::debug!(
            "index comparison for {title:?}: {} docs examined without index, {} with",
            without_index.docs_examined,
            with_index.docs_examined
        );
        Ok(IndexComparison { without_index, with_index })
    }
}
