use bson::{Bson, Document as BsonDocument};

use super::eval::{as_f64, compare_docs, eval_filter, project_fields};
use super::types::{Filter, FindOptions, MAX_PROJECTION_FIELDS, MAX_SORT_FIELDS, UpdateDoc};

/// Runs a find over a snapshot of documents in scan order.
pub fn find_docs<I>(docs: I, filter: &Filter, opts: &FindOptions) -> Vec<BsonDocument>
where
    I: IntoIterator<Item = BsonDocument>,
{
    let mut out: Vec<BsonDocument> = docs.into_iter().filter(|d| eval_filter(d, filter)).collect();

    if let Some(sort) = &opts.sort {
        if sort.len() > MAX_SORT_FIELDS {
            log::warn!("sort spec too long: {}", sort.len());
        }
        out.sort_by(|a, b| compare_docs(a, b, sort));
    }

    let skip = opts.skip.unwrap_or(0);
    let limit = opts.limit.unwrap_or(usize::MAX);
    let mut out: Vec<BsonDocument> = out.into_iter().skip(skip).take(limit).collect();

    if let Some(fields) = &opts.projection {
        let fields: Vec<String> = fields.iter().take(MAX_PROJECTION_FIELDS).cloned().collect();
        for d in &mut out {
            *d = project_fields(d, &fields);
        }
    }
    out
}

#[must_use]
pub fn count_docs(docs: &[BsonDocument], filter: &Filter) -> usize {
    docs.iter().filter(|d| eval_filter(d, filter)).count()
}

/// Applies `$set`, `$inc` and `$unset` in that order. Returns whether the document changed.
pub fn apply_update(doc: &mut BsonDocument, upd: &UpdateDoc) -> bool {
    fn parent_of<'a>(root: &'a mut BsonDocument, path: &str) -> (&'a mut BsonDocument, String) {
        let mut segs: Vec<&str> = path.split('.').collect();
        let last = segs.pop().unwrap_or_default().to_string();
        let mut cur = root;
        for seg in segs {
            let slot =
                cur.entry(seg.to_string()).or_insert_with(|| Bson::Document(BsonDocument::new()));
            if !matches!(slot, Bson::Document(_)) {
                *slot = Bson::Document(BsonDocument::new());
            }
            match slot {
                Bson::Document(d) => cur = d,
                _ => unreachable!(),
            }
        }
        (cur, last)
    }
    fn set_path(root: &mut BsonDocument, path: &str, value: Bson) -> bool {
        let (parent, last) = parent_of(root, path);
        let old = parent.insert(last, value.clone());
        old.as_ref() != Some(&value)
    }
    fn unset_path(root: &mut BsonDocument, path: &str) -> bool {
        let (parent, last) = parent_of(root, path);
        parent.remove(&last).is_some()
    }
    fn inc_path(root: &mut BsonDocument, path: &str, by: &Bson) -> bool {
        let cur = super::eval::get_path(root, path).cloned().unwrap_or(Bson::Int32(0));
        set_path(root, path, add_numbers(&cur, by))
    }

    let mut changed = false;
    for (k, v) in &upd.set {
        changed |= set_path(doc, k, v.clone());
    }
    for (k, by) in &upd.inc {
        changed |= inc_path(doc, k, by);
    }
    for k in &upd.unset {
        changed |= unset_path(doc, k);
    }
    changed
}

/// Integer sums stay integers: `Int32` while both sides are `Int32` and the result
/// fits, `Int64` otherwise. A double on either side, a non-numeric current value or an
/// `Int64` overflow gives a `Double`.
#[allow(clippy::cast_precision_loss)]
fn add_numbers(cur: &Bson, by: &Bson) -> Bson {
    match (cur, by) {
        (Bson::Int32(a), Bson::Int32(b)) => {
            a.checked_add(*b).map_or_else(|| Bson::Int64(i64::from(*a) + i64::from(*b)), Bson::Int32)
        }
        (Bson::Int32(_) | Bson::Int64(_), Bson::Int32(_) | Bson::Int64(_)) => {
            let a = as_i64(cur);
            let b = as_i64(by);
            a.checked_add(b).map_or_else(|| Bson::Double(a as f64 + b as f64), Bson::Int64)
        }
        _ => Bson::Double(as_f64(cur).unwrap_or(0.0) + as_f64(by).unwrap_or(0.0)),
    }
}

fn as_i64(v: &Bson) -> i64 {
    match v {
        Bson::Int32(i) => i64::from(*i),
        Bson::Int64(i) => *i,
        _ => 0,
    }
}
