use bson::{Bson, Document as BsonDocument, doc};
use serde::{Deserialize, Serialize};

use crate::errors::DbError;
use crate::types::DocumentId;

pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1000..=9999;

/// One book in the catalog, as stored in the `books` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: i32,
    pub price: f64,
    pub in_stock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
}

impl CatalogItem {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        genre: impl Into<String>,
        published_year: i32,
        price: f64,
        in_stock: bool,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            genre: genre.into(),
            published_year,
            price,
            in_stock,
            pages: None,
            publisher: None,
        }
    }

    /// # Errors
    /// Returns `InvalidInput` for an empty title, a year outside four digits, or a
    /// negative or non-finite price.
    pub fn validate(&self) -> Result<(), DbError> {
        if self.title.trim().is_empty() {
            return Err(DbError::InvalidInput("title must not be empty".into()));
        }
        if !YEAR_RANGE.contains(&self.published_year) {
            return Err(DbError::InvalidInput(format!(
                "published_year {} of {:?} is not a 4-digit year",
                self.published_year, self.title
            )));
        }
        validate_price(self.price)
    }

    #[must_use]
    pub fn to_document(&self) -> BsonDocument {
        let mut d = doc! {
            "title": self.title.clone(),
            "author": self.author.clone(),
            "genre": self.genre.clone(),
            "published_year": self.published_year,
            "price": self.price,
            "in_stock": self.in_stock,
        };
        if let Some(p) = self.pages {
            d.insert("pages", p);
        }
        if let Some(p) = &self.publisher {
            d.insert("publisher", p.clone());
        }
        d
    }

    /// # Errors
    /// Returns `InvalidInput` when a required field is missing or has the wrong type.
    pub fn from_document(d: &BsonDocument) -> Result<Self, DbError> {
        let text = |k: &str| match d.get(k) {
            Some(Bson::String(s)) => Ok(s.clone()),
            _ => Err(DbError::InvalidInput(format!("{k} missing or not a string"))),
        };
        let int = |k: &str| match d.get(k) {
            Some(Bson::Int32(i)) => Ok(*i),
            Some(Bson::Int64(i)) => i32::try_from(*i)
                .map_err(|_| DbError::InvalidInput(format!("{k} out of range: {i}"))),
            _ => Err(DbError::InvalidInput(format!("{k} missing or not an integer"))),
        };
        Ok(Self {
            title: text("title")?,
            author: text("author")?,
            genre: text("genre")?,
            published_year: int("published_year")?,
            price: crate::query::as_f64(d.get("price").unwrap_or(&Bson::Null))
                .ok_or_else(|| DbError::InvalidInput("price missing or not a number".into()))?,
            in_stock: d
                .get_bool("in_stock")
                .map_err(|_| DbError::InvalidInput("in_stock missing or not a boolean".into()))?,
            pages: int("pages").ok(),
            publisher: text("publisher").ok(),
        })
    }
}

/// # Errors
/// Returns `InvalidInput` for a negative or non-finite price.
pub fn validate_price(price: f64) -> Result<(), DbError> {
    if !price.is_finite() || price < 0.0 {
        return Err(DbError::InvalidInput(format!("price must be a non-negative number, got {price}")));
    }
    Ok(())
}

/// A catalog item together with its store-assigned id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredItem {
    pub id: DocumentId,
    #[serde(flatten)]
    pub item: CatalogItem,
}

impl TryFrom<&BsonDocument> for StoredItem {
    type Error = DbError;
    fn try_from(d: &BsonDocument) -> Result<Self, Self::Error> {
        let id = d
            .get_str("_id")
            .map_err(|_| DbError::InvalidDocumentId("_id missing or not a string".into()))?
            .parse()?;
        Ok(Self { id, item: CatalogItem::from_document(d)? })
    }
}
