use bson::{Bson, Document as BsonDocument};
use serde::{Deserialize, Serialize};

use crate::errors::DbError;
use crate::query::as_f64;

/// One row of the average-price report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryPrice {
    /// `None` for items with no category.
    pub category: Option<String>,
    /// `None` when no item in the group has a numeric price.
    pub average_price: Option<f64>,
    pub item_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorCount {
    pub author: Option<String>,
    pub item_count: u64,
}

/// Items published within one bucket, titles in scan order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadeBucket {
    pub decade: i64,
    pub item_count: u64,
    pub titles: Vec<String>,
}

impl CategoryPrice {
    pub(crate) fn from_row(row: &BsonDocument) -> Result<Self, DbError> {
        let average_price = match row.get("averagePrice") {
            None | Some(Bson::Null) => None,
            Some(v) => Some(as_f64(v).ok_or_else(|| malformed("averagePrice", row))?),
        };
        Ok(Self { category: group_label(row), average_price, item_count: count(row, "bookCount")? })
    }
}

impl AuthorCount {
    pub(crate) fn from_row(row: &BsonDocument) -> Result<Self, DbError> {
        Ok(Self { author: group_label(row), item_count: count(row, "bookCount")? })
    }
}

impl DecadeBucket {
    pub(crate) fn from_row(row: &BsonDocument) -> Result<Self, DbError> {
        let decade = match row.get("_id") {
            Some(Bson::Int32(i)) => i64::from(*i),
            Some(Bson::Int64(i)) => *i,
            _ => return Err(malformed("_id", row)),
        };
        let titles = match row.get("books") {
            Some(Bson::Array(items)) => items
                .iter()
                .map(|b| b.as_str().map(str::to_string).ok_or_else(|| malformed("books", row)))
                .collect::<Result<Vec<_>, _>>()?,
            _ => return Err(malformed("books", row)),
        };
        Ok(Self { decade, item_count: count(row, "bookCount")?, titles })
    }
}

/// Group key as text; non-string keys are rendered, missing keys become `None`.
fn group_label(row: &BsonDocument) -> Option<String> {
    match row.get("_id") {
        None | Some(Bson::Null) => None,
        Some(Bson::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    }
}

fn count(row: &BsonDocument, field: &str) -> Result<u64, DbError> {
    let n = match row.get(field) {
        Some(Bson::Int32(i)) => i64::from(*i),
        Some(Bson::Int64(i)) => *i,
        _ => return Err(malformed(field, row)),
    };
    u64::try_from(n).map_err(|_| malformed(field, row))
}

fn malformed(field: &str, row: &BsonDocument) -> DbError {
    DbError::QueryError(format!("report row has no usable {field}: {row}"))
}
