use bson::{Bson, Document as BsonDocument};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use super::CatalogStore;
use crate::aggregate::{Pipeline, run_pipeline};
use crate::errors::DbError;
use crate::index::{ExplainStats, IndexManager, IndexSpec};
use crate::query::{
    DeleteReport, Filter, FindOptions, UpdateDoc, UpdateReport, apply_update, count_docs,
    eval_filter, find_docs,
};
use crate::types::DocumentId;

#[derive(Default)]
struct State {
    /// Documents in insertion (scan) order.
    docs: Vec<(DocumentId, BsonDocument)>,
    indexes: IndexManager,
}

impl State {
    /// Candidate documents for `filter` in scan order, plus how they were found.
    fn candidates(&self, filter: &Filter) -> (Vec<BsonDocument>, ExplainStats) {
        let mut stats = ExplainStats::default();
        let planned = self.indexes.plan(filter).and_then(|(name, prefix)| {
            self.indexes.lookup(&name, &prefix).map(|(ids, keys)| (name, ids, keys))
        });
        let docs: Vec<BsonDocument> = match planned {
            Some((name, ids, keys)) => {
                stats.index_used = Some(name);
                stats.keys_examined = keys;
                let wanted: HashSet<DocumentId> = ids.into_iter().collect();
                self.docs.iter().filter(|(id, _)| wanted.contains(id)).map(|(_, d)| d.clone()).collect()
            }
            None => self.docs.iter().map(|(_, d)| d.clone()).collect(),
        };
        stats.docs_examined = docs.len();
        (docs, stats)
    }

    fn first_match(&self, filter: &Filter) -> Option<usize> {
        let (candidates, _) = self.candidates(filter);
        let hit = candidates.into_iter().find(|d| eval_filter(d, filter))?;
        let id = hit.get_str("_id").ok()?.to_string();
        self.docs.iter().position(|(k, _)| k.to_string() == id)
    }
}

/// In-process collaborator store holding one collection.
///
/// Reads clone their candidates while holding the lock and evaluate after releasing
/// it, so reports never observe a half-applied write.
pub struct MemoryStore {
    name: String,
    state: RwLock<State>,
    connected: AtomicBool,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), state: RwLock::new(State::default()), connected: AtomicBool::new(true) }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simulates losing the backend: every operation fails with `StoreUnavailable`
    /// until [`MemoryStore::reconnect`].
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        log::warn!("store {} disconnected", self.name);
    }

    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
        log::info!("store {} reconnected", self.name);
    }

    fn ensure_connected(&self) -> Result<(), DbError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DbError::StoreUnavailable(format!("collection {} is not reachable", self.name)))
        }
    }

    fn snapshot(&self) -> Vec<BsonDocument> {
        self.state.read().docs.iter().map(|(_, d)| d.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().docs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CatalogStore for MemoryStore {
    fn insert(&self, mut doc: BsonDocument) -> Result<DocumentId, DbError> {
        self.ensure_connected()?;
        let id = match doc.remove("_id") {
            None => DocumentId::new(),
            Some(Bson::String(s)) => s.parse()?,
            Some(other) => return Err(DbError::InvalidDocumentId(format!("{other}"))),
        };
        let mut stored = BsonDocument::new();
        stored.insert("_id", id.to_string());
        stored.extend(doc);
        let mut st = self.state.write();
        if st.docs.iter().any(|(k, _)| *k == id) {
            return Err(DbError::InvalidDocumentId(format!("duplicate _id {id}")));
        }
        st.indexes.insert_all(&stored, &id);
        st.docs.push((id.clone(), stored));
        log::info!(target: "bookstore::audit", "insert collection={} id={id}", self.name);
        Ok(id)
    }

    fn find(&self, filter: &Filter, opts: &FindOptions) -> Result<Vec<BsonDocument>, DbError> {
        self.ensure_connected()?;
        let start = Instant::now();
        let (candidates, stats) = self.state.read().candidates(filter);
        let out = find_docs(candidates, filter, opts);
        log::debug!(
            target: "bookstore::metrics",
            "{{\"bench\":\"query\",\"op\":\"find\",\"collection\":\"{}\",\"duration_ms\":{},\"used_index\":{},\"result_count\":{}}}",
            self.name,
            start.elapsed().as_millis(),
            stats.index_used.is_some(),
            out.len()
        );
        Ok(out)
    }

    fn count(&self, filter: &Filter) -> Result<usize, DbError> {
        self.ensure_connected()?;
        let (candidates, _) = self.state.read().candidates(filter);
        Ok(count_docs(&candidates, filter))
    }

    fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<BsonDocument>, DbError> {
        self.ensure_connected()?;
        run_pipeline(self.snapshot(), pipeline)
    }

    fn update_one(&self, filter: &Filter, update: &UpdateDoc) -> Result<UpdateReport, DbError> {
        self.ensure_connected()?;
        let touches_id = update.set.iter().map(|(k, _)| k.as_str())
            .chain(update.inc.iter().map(|(k, _)| k.as_str()))
            .chain(update.unset.iter().map(String::as_str))
            .any(|k| k == "_id");
        if touches_id {
            return Err(DbError::InvalidInput("_id is immutable".into()));
        }
        let mut st = self.state.write();
        let Some(pos) = st.first_match(filter) else {
            return Ok(UpdateReport::default());
        };
        let (id, old) = st.docs[pos].clone();
        let mut new = old.clone();
        let changed = apply_update(&mut new, update);
        if changed {
            st.indexes.remove_all(&old, &id);
            st.indexes.insert_all(&new, &id);
            st.docs[pos].1 = new;
            log::info!(target: "bookstore::audit", "update collection={} id={id}", self.name);
        }
        Ok(UpdateReport { matched: 1, modified: u64::from(changed) })
    }

    fn delete_one(&self, filter: &Filter) -> Result<DeleteReport, DbError> {
        self.ensure_connected()?;
        let mut st = self.state.write();
        let Some(pos) = st.first_match(filter) else {
            return Ok(DeleteReport::default());
        };
        let (id, old) = st.docs.remove(pos);
        st.indexes.remove_all(&old, &id);
        log::info!(target: "bookstore::audit", "delete collection={} id={id}", self.name);
        Ok(DeleteReport { deleted: 1 })
    }

    fn create_index(&self, spec: &IndexSpec) -> Result<String, DbError> {
        self.ensure_connected()?;
        let mut st = self.state.write();
        let State { docs, indexes } = &mut *st;
        let (name, created) = indexes.create_index(spec.clone(), docs.iter().map(|(id, d)| (id, d)))?;
        if created && let Some(idx) = indexes.indexes.get(&name) {
            log::info!(
                target: "bookstore::audit",
                "create_index collection={} index={name} keys={} entries={} build_ms={}",
                self.name,
                idx.stats.keys,
                idx.stats.entries,
                idx.stats.build_time_ms
            );
        }
        Ok(name)
    }

    fn list_indexes(&self) -> Result<Vec<String>, DbError> {
        self.ensure_connected()?;
        Ok(self.state.read().indexes.names())
    }

    fn explain(&self, filter: &Filter) -> Result<ExplainStats, DbError> {
        self.ensure_connected()?;
        let (candidates, mut stats) = self.state.read().candidates(filter);
        stats.n_returned = count_docs(&candidates, filter);
        Ok(stats)
    }
}
