//! The collaborator store: anything that can run queries and aggregation pipelines
//! over a collection of catalog documents.

mod memory;

pub use memory::MemoryStore;

use bson::Document as BsonDocument;

use crate::aggregate::Pipeline;
use crate::catalog::CatalogItem;
use crate::errors::DbError;
use crate::index::{ExplainStats, IndexSpec};
use crate::query::{DeleteReport, Filter, FindOptions, UpdateDoc, UpdateReport};
use crate::types::DocumentId;

/// Handle to one queryable, aggregatable collection.
///
/// Results are plain documents; key order carries no meaning. Implementations report
/// an unreachable backend as `DbError::StoreUnavailable` and do not retry.
pub trait CatalogStore {
    /// Inserts a raw document, assigning `_id` when absent.
    ///
    /// # Errors
    /// `InvalidDocumentId` for a malformed `_id`, `StoreUnavailable` when unreachable.
    fn insert(&self, doc: BsonDocument) -> Result<DocumentId, DbError>;

    /// # Errors
    /// `StoreUnavailable` when unreachable.
    fn find(&self, filter: &Filter, opts: &FindOptions) -> Result<Vec<BsonDocument>, DbError>;

    /// # Errors
    /// `StoreUnavailable` when unreachable.
    fn count(&self, filter: &Filter) -> Result<usize, DbError>;

    /// Runs a read-only pipeline over a snapshot of the collection.
    ///
    /// # Errors
    /// `InvalidInput` when an expression cannot be evaluated, `StoreUnavailable` when
    /// unreachable.
    fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<BsonDocument>, DbError>;

    /// # Errors
    /// `InvalidInput` for an update touching `_id`, `StoreUnavailable` when unreachable.
    fn update_one(&self, filter: &Filter, update: &UpdateDoc) -> Result<UpdateReport, DbError>;

    /// # Errors
    /// `StoreUnavailable` when unreachable.
    fn delete_one(&self, filter: &Filter) -> Result<DeleteReport, DbError>;

    /// Creates an index and returns its name; creating an existing index is a no-op.
    ///
    /// # Errors
    /// `InvalidInput` for a malformed spec, `StoreUnavailable` when unreachable.
    fn create_index(&self, spec: &IndexSpec) -> Result<String, DbError>;

    /// # Errors
    /// `StoreUnavailable` when unreachable.
    fn list_indexes(&self) -> Result<Vec<String>, DbError>;

    /// # Errors
    /// `StoreUnavailable` when unreachable.
    fn explain(&self, filter: &Filter) -> Result<ExplainStats, DbError>;

    /// Validates and inserts a catalog item.
    ///
    /// # Errors
    /// `InvalidInput` if the item breaks a catalog invariant.
    fn insert_item(&self, item: &CatalogItem) -> Result<DocumentId, DbError> {
        item.validate()?;
        self.insert(item.to_document())
    }
}
