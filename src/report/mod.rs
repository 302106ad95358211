//! Catalog reports: typed aggregation requests run against an injected store.
//!
//! Each report is a [`Report`] value that validates its parameters, renders a
//! read-only [`Pipeline`](crate::aggregate::Pipeline) and decodes the result rows.
//! [`ReportBuilder`] wires them to a [`CatalogStore`].

mod requests;
mod rows;

pub use requests::{AveragePriceByCategory, ItemsByDecade, Report, TopAuthorByCount};
pub use rows::{AuthorCount, CategoryPrice, DecadeBucket};

use bson::Document as BsonDocument;
use std::time::Instant;

use crate::errors::DbError;
use crate::store::CatalogStore;

pub struct ReportBuilder<'a, S: CatalogStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: CatalogStore + ?Sized> ReportBuilder<'a, S> {
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Validates `report`, runs its pipeline and decodes every row.
    ///
    /// # Errors
    /// `InvalidInput` for bad parameters or an item the pipeline cannot evaluate,
    /// `StoreUnavailable` from the store unchanged, `QueryError` for undecodable rows.
    pub fn run<R: Report>(&self, report: &R) -> Result<Vec<R::Row>, DbError> {
        report.validate()?;
        let start = Instant::now();
        let rows = self.store.aggregate(&report.pipeline())?;
        let out = rows.iter().map(|r| report.decode(r)).collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            target: "bookstore::metrics",
            "{{\"bench\":\"report\",\"name\":\"{}\",\"rows\":{},\"duration_ms\":{}}}",
            report.name(),
            out.len(),
            start.elapsed().as_millis()
        );
        Ok(out)
    }

    /// # Errors
    /// See [`ReportBuilder::run`].
    pub fn average_price_by_category(&self) -> Result<Vec<CategoryPrice>, DbError> {
        self.run(&AveragePriceByCategory::default())
    }

    /// The author with the most items, `None` for an empty catalog. Which author wins a
    /// tie is unspecified.
    ///
    /// # Errors
    /// See [`ReportBuilder::run`].
    pub fn top_author_by_count(&self) -> Result<Option<AuthorCount>, DbError> {
        Ok(self.run(&TopAuthorByCount::default())?.into_iter().next())
    }

    /// # Errors
    /// `InvalidInput` if some item has a missing or non-integer `published_year`.
    pub fn items_by_decade(&self) -> Result<Vec<DecadeBucket>, DbError> {
        self.run(&ItemsByDecade::default())
    }
}

/// The declarative pipelines of the three default reports, by report name.
#[must_use]
pub fn describe_all() -> Vec<(&'static str, Vec<BsonDocument>)> {
    fn describe<R: Report>(r: &R) -> (&'static str, Vec<BsonDocument>) {
        (r.name(), r.pipeline().to_bson())
    }
    vec![
        describe(&AveragePriceByCategory::default()),
        describe(&TopAuthorByCount::default()),
        describe(&ItemsByDecade::default()),
    ]
}
