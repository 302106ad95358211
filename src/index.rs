use crate::aggregate::check_path;
use crate::errors::DbError;
use crate::query::{CmpOp, Filter, Order, SortSpec, get_path};
use crate::types::DocumentId;
use bson::{Bson, Document as BsonDocument};
use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Key component of an index entry. All numeric kinds share one ordering so that an
/// `Int32` year and an `Int64` year land on the same key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum IndexKey {
    Null,
    Num(OrderedFloat<f64>),
    Str(String),
    Bool(bool),
    Other(String),
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn key_from_bson(v: Option<&Bson>) -> IndexKey {
    match v {
        None | Some(Bson::Null) => IndexKey::Null,
        Some(Bson::String(s)) => IndexKey::Str(s.clone()),
        Some(Bson::Int32(i)) => IndexKey::Num(OrderedFloat(f64::from(*i))),
        Some(Bson::Int64(i)) => IndexKey::Num(OrderedFloat(*i as f64)),
        Some(Bson::Double(f)) => IndexKey::Num(OrderedFloat(*f)),
        Some(Bson::Boolean(b)) => IndexKey::Bool(*b),
        Some(other) => IndexKey::Other(format!("{other:?}")),
    }
}

/// Scalars an equality lookup can be served for.
fn is_scalar(v: &Bson) -> bool {
    matches!(
        v,
        Bson::Null | Bson::String(_) | Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Boolean(_)
    )
}

/// Ordered list of `(field, direction)` pairs, e.g. `{author: 1, published_year: -1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSpec {
    pub keys: Vec<SortSpec>,
}

impl IndexSpec {
    #[must_use]
    pub fn single(field: &str, order: Order) -> Self {
        Self { keys: vec![SortSpec { field: field.to_string(), order }] }
    }

    /// # Errors
    /// Returns `InvalidInput` for an empty key list, a repeated field or a bad field name.
    pub fn validate(&self) -> Result<(), DbError> {
        if self.keys.is_empty() {
            return Err(DbError::InvalidInput("index needs at least one key".into()));
        }
        let mut seen = BTreeSet::new();
        for k in &self.keys {
            check_path(&k.field)?;
            if !seen.insert(k.field.as_str()) {
                return Err(DbError::InvalidInput(format!("field {:?} repeated in index", k.field)));
            }
        }
        Ok(())
    }

    /// Name in the conventional `field_dir` form, e.g. `author_1_published_year_-1`.
    #[must_use]
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|k| format!("{}_{}", k.field, k.order.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }

    #[must_use]
    pub fn to_document(&self) -> BsonDocument {
        let mut d = BsonDocument::new();
        for k in &self.keys {
            d.insert(k.field.clone(), Bson::Int32(k.order.as_i32()));
        }
        d
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexStats {
    pub keys: usize,
    pub entries: usize,
    pub build_time_ms: u128,
}

/// Lookups only take `&self`, so hit counters are atomics that concurrent readers share.
#[derive(Debug)]
pub struct OrderedIndex {
    pub spec: IndexSpec,
    pub map: BTreeMap<Vec<IndexKey>, BTreeSet<DocumentId>>,
    pub stats: IndexStats,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl OrderedIndex {
    #[must_use]
    pub fn new(spec: IndexSpec) -> Self {
        Self {
            spec,
            map: BTreeMap::new(),
            stats: IndexStats::default(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn key_of(&self, doc: &BsonDocument) -> Vec<IndexKey> {
        self.spec.keys.iter().map(|k| key_from_bson(get_path(doc, &k.field))).collect()
    }

    pub fn insert(&mut self, doc: &BsonDocument, id: &DocumentId) {
        let key = self.key_of(doc);
        if self.map.entry(key).or_default().insert(id.clone()) {
            self.stats.entries += 1;
        }
        self.stats.keys = self.map.len();
    }

    pub fn remove(&mut self, doc: &BsonDocument, id: &DocumentId) {
        let key = self.key_of(doc);
        if let Some(set) = self.map.get_mut(&key) {
            if set.remove(id) {
                self.stats.entries = self.stats.entries.saturating_sub(1);
            }
            if set.is_empty() {
                self.map.remove(&key);
            }
        }
        self.stats.keys = self.map.len();
    }

    /// Ids whose leading key components equal `prefix`, plus the number of index keys
    /// visited.
    pub fn lookup_prefix(&self, prefix: &[Bson]) -> (Vec<DocumentId>, usize) {
        let want: Vec<IndexKey> = prefix.iter().map(|v| key_from_bson(Some(v))).collect();
        let mut ids = Vec::new();
        let mut keys_examined = 0usize;
        for (k, set) in self.map.range(want.clone()..) {
            if !k.starts_with(&want) {
                break;
            }
            keys_examined += 1;
            ids.extend(set.iter().cloned());
        }
        let counter = if ids.is_empty() { &self.misses } else { &self.hits };
        counter.fetch_add(1, Ordering::Relaxed);
        (ids, keys_examined)
    }

    /// `(hits, misses)` of prefix lookups so far.
    #[must_use]
    pub fn lookup_counts(&self) -> (u64, u64) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }
}

/// Indexes of one collection, keyed by index name.
#[derive(Debug, Default)]
pub struct IndexManager {
    pub indexes: BTreeMap<String, OrderedIndex>,
}

impl IndexManager {
    #[must_use]
    pub fn new() -> Self {
        Self { indexes: BTreeMap::new() }
    }

    /// Creates and builds an index over `docs`. Returns the name and whether it was new;
    /// an existing index with the same name is left untouched.
    ///
    /// # Errors
    /// Returns `InvalidInput` if the spec is malformed.
    pub fn create_index<'a, I>(&mut self, spec: IndexSpec, docs: I) -> Result<(String, bool), DbError>
    where
        I: IntoIterator<Item = (&'a DocumentId, &'a BsonDocument)>,
    {
        spec.validate()?;
        let name = spec.name();
        if self.indexes.contains_key(&name) {
            return Ok((name, false));
        }
        let start = Instant::now();
        let mut idx = OrderedIndex::new(spec);
        for (id, doc) in docs {
            idx.insert(doc, id);
        }
        idx.stats.build_time_ms = start.elapsed().as_millis();
        self.indexes.insert(name.clone(), idx);
        Ok((name, true))
    }

    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.indexes.keys().cloned().collect()
    }

    pub fn insert_all(&mut self, doc: &BsonDocument, id: &DocumentId) {
        for idx in self.indexes.values_mut() {
            idx.insert(doc, id);
        }
    }

    pub fn remove_all(&mut self, doc: &BsonDocument, id: &DocumentId) {
        for idx in self.indexes.values_mut() {
            idx.remove(doc, id);
        }
    }

    /// Picks the index whose leading fields are all pinned by top-level equality
    /// clauses, preferring the longest usable prefix.
    #[must_use]
    pub fn plan(&self, filter: &Filter) -> Option<(String, Vec<Bson>)> {
        let mut eqs: Vec<(&str, &Bson)> = Vec::new();
        collect_eq(filter, &mut eqs);
        let mut best: Option<(String, Vec<Bson>)> = None;
        for (name, idx) in &self.indexes {
            let prefix: Vec<Bson> = idx
                .spec
                .keys
                .iter()
                .map_while(|k| eqs.iter().find(|(p, _)| *p == k.field).map(|(_, v)| (*v).clone()))
                .collect();
            if !prefix.is_empty() && best.as_ref().is_none_or(|(_, b)| prefix.len() > b.len()) {
                best = Some((name.clone(), prefix));
            }
        }
        best
    }

    /// Runs an index lookup for a plan produced by [`IndexManager::plan`].
    pub fn lookup(&self, name: &str, prefix: &[Bson]) -> Option<(Vec<DocumentId>, usize)> {
        self.indexes.get(name).map(|idx| idx.lookup_prefix(prefix))
    }
}

fn collect_eq<'a>(filter: &'a Filter, out: &mut Vec<(&'a str, &'a Bson)>) {
    match filter {
        Filter::Cmp { path, op: CmpOp::Eq, value } if is_scalar(value) => {
            out.push((path.as_str(), value));
        }
        Filter::And(fs) => fs.iter().for_each(|f| collect_eq(f, out)),
        _ => {}
    }
}

/// Execution summary of a find, in the spirit of `explain("executionStats")`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExplainStats {
    pub index_used: Option<String>,
    pub keys_examined: usize,
    pub docs_examined: usize,
    pub n_returned: usize,
}
