use bson::Document as BsonDocument;
use serde::{Deserialize, Serialize};

use super::rows::{AuthorCount, CategoryPrice, DecadeBucket};
use crate::aggregate::{Accumulator, Expr, Pipeline, ProjectField, check_path};
use crate::errors::DbError;
use crate::query::SortSpec;

/// Output field names shared by the report pipelines.
pub(crate) const AVERAGE_PRICE: &str = "averagePrice";
pub(crate) const BOOK_COUNT: &str = "bookCount";
pub(crate) const BOOKS: &str = "books";
pub(crate) const DECADE: &str = "decade";

/// A typed, read-only aggregation request.
pub trait Report {
    type Row: Serialize;

    fn name(&self) -> &'static str;

    /// Checks the request parameters before anything reaches the store.
    ///
    /// # Errors
    /// Returns `InvalidInput` naming the offending parameter.
    fn validate(&self) -> Result<(), DbError>;

    fn pipeline(&self) -> Pipeline;

    /// # Errors
    /// Returns `QueryError` when a result row lacks an expected field.
    fn decode(&self, row: &BsonDocument) -> Result<Self::Row, DbError>;
}

fn check_field(param: &str, name: &str) -> Result<(), DbError> {
    check_path(name).map_err(|_| DbError::InvalidInput(format!("{param} {name:?} is not a usable field name")))
}

/// Mean price and item count per category, highest mean first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AveragePriceByCategory {
    pub category_field: String,
    pub price_field: String,
}

impl Default for AveragePriceByCategory {
    fn default() -> Self {
        Self { category_field: "genre".into(), price_field: "price".into() }
    }
}

impl Report for AveragePriceByCategory {
    type Row = CategoryPrice;

    fn name(&self) -> &'static str {
        "average_price_by_category"
    }

    fn validate(&self) -> Result<(), DbError> {
        check_field("category_field", &self.category_field)?;
        check_field("price_field", &self.price_field)
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new()
            .group(
                Expr::field(&self.category_field),
                vec![
                    (AVERAGE_PRICE, Accumulator::Avg(Expr::field(&self.price_field))),
                    (BOOK_COUNT, Accumulator::Sum(Expr::literal(1))),
                ],
            )
            .sort(vec![SortSpec::desc(AVERAGE_PRICE)])
    }

    fn decode(&self, row: &BsonDocument) -> Result<CategoryPrice, DbError> {
        CategoryPrice::from_row(row)
    }
}

/// Authors with the most items. Order among equal counts is not guaranteed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopAuthorByCount {
    pub author_field: String,
    pub limit: usize,
}

impl Default for TopAuthorByCount {
    fn default() -> Self {
        Self { author_field: "author".into(), limit: 1 }
    }
}

impl Report for TopAuthorByCount {
    type Row = AuthorCount;

    fn name(&self) -> &'static str {
        "top_author_by_count"
    }

    fn validate(&self) -> Result<(), DbError> {
        check_field("author_field", &self.author_field)?;
        if self.limit == 0 {
            return Err(DbError::InvalidInput("limit must be at least 1".into()));
        }
        Ok(())
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new()
            .group(
                Expr::field(&self.author_field),
                vec![(BOOK_COUNT, Accumulator::Sum(Expr::literal(1)))],
            )
            .sort(vec![SortSpec::desc(BOOK_COUNT)])
            .limit(self.limit)
    }

    fn decode(&self, row: &BsonDocument) -> Result<AuthorCount, DbError> {
        AuthorCount::from_row(row)
    }
}

/// Items bucketed by `year - year % bucket_width`, oldest bucket first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemsByDecade {
    pub year_field: String,
    pub title_field: String,
    pub bucket_width: i32,
}

impl Default for ItemsByDecade {
    fn default() -> Self {
        Self { year_field: "published_year".into(), title_field: "title".into(), bucket_width: 10 }
    }
}

impl Report for ItemsByDecade {
    type Row = DecadeBucket;

    fn name(&self) -> &'static str {
        "items_by_decade"
    }

    fn validate(&self) -> Result<(), DbError> {
        for (param, name) in [("year_field", &self.year_field), ("title_field", &self.title_field)] {
            check_field(param, name)?;
            // projected under their own names, so they must be top-level and distinct from the bucket
            if name.contains('.') || name == DECADE {
                return Err(DbError::InvalidInput(format!("{param} {name:?} must be a top-level field other than {DECADE:?}")));
            }
        }
        if self.year_field == self.title_field {
            return Err(DbError::InvalidInput("year_field and title_field must differ".into()));
        }
        if self.bucket_width <= 0 {
            return Err(DbError::InvalidInput(format!("bucket_width must be positive, got {}", self.bucket_width)));
        }
        Ok(())
    }

    fn pipeline(&self) -> Pipeline {
        let year = || Expr::field(&self.year_field);
        Pipeline::new()
            .project(vec![
                (self.title_field.as_str(), ProjectField::Include),
                (self.year_field.as_str(), ProjectField::Include),
                (DECADE, ProjectField::Computed(Expr::subtract(year(), Expr::modulo(year(), Expr::literal(self.bucket_width))))),
            ])
            .group(
                Expr::field(DECADE),
                vec![
                    (BOOK_COUNT, Accumulator::Sum(Expr::literal(1))),
                    (BOOKS, Accumulator::Push(Expr::field(&self.title_field))),
                ],
            )
            .sort(vec![SortSpec::asc("_id")])
    }

    fn decode(&self, row: &BsonDocument) -> Result<DecadeBucket, DbError> {
        DecadeBucket::from_row(row)
    }
}
