use bson::{Bson, Document as BsonDocument};
use std::cmp::Ordering;

use super::types::{CmpOp, Filter, MAX_IN_SET, MAX_PATH_DEPTH, MAX_SORT_FIELDS, Order, SortSpec};

pub fn eval_filter(doc: &BsonDocument, filter: &Filter) -> bool {
    match filter {
        Filter::True => true,
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::Or(fs) => fs.iter().any(|f| eval_filter(doc, f)),
        Filter::Not(f) => !eval_filter(doc, f),
        Filter::Exists { path, exists } => get_path(doc, path).is_some() == *exists,
        Filter::In { path, values } => get_path(doc, path).is_some_and(|v| is_in_set(v, values)),
        Filter::Nin { path, values } => !get_path(doc, path).is_some_and(|v| is_in_set(v, values)),
        Filter::Cmp { path, op, value } => {
            let Some(v) = get_path(doc, path) else {
                return false;
            };
            let c = compare_bson(v, value);
            match op {
                CmpOp::Eq => c == Ordering::Equal && comparable(v, value),
                CmpOp::Gt => c == Ordering::Greater && comparable(v, value),
                CmpOp::Gte => c != Ordering::Less && comparable(v, value),
                CmpOp::Lt => c == Ordering::Less && comparable(v, value),
                CmpOp::Lte => c != Ordering::Greater && comparable(v, value),
            }
        }
        #[cfg(feature = "regex")]
        Filter::Regex { path, pattern, case_insensitive } => {
            if let Some(Bson::String(s)) = get_path(doc, path) {
                let mut re = regex::RegexBuilder::new(pattern);
                re.case_insensitive(*case_insensitive);
                re.build().is_ok_and(|r| r.is_match(s))
            } else {
                false
            }
        }
    }
}

/// Range operators only match values of the same kind, e.g. `published_year > 2000`
/// never matches a string year.
fn comparable(a: &Bson, b: &Bson) -> bool {
    (is_num(a) && is_num(b)) || type_rank(a) == type_rank(b)
}

pub fn compare_docs(a: &BsonDocument, b: &BsonDocument, sort: &[SortSpec]) -> Ordering {
    for s in sort.iter().take(MAX_SORT_FIELDS) {
        let ord = match (get_path(a, &s.field), get_path(b, &s.field)) {
            (Some(x), Some(y)) => compare_bson(x, y),
            (Some(_), None) => Ordering::Greater,
            (None, Some(_)) => Ordering::Less,
            (None, None) => Ordering::Equal,
        };
        if ord != Ordering::Equal {
            return if s.order == Order::Asc { ord } else { ord.reverse() };
        }
    }
    Ordering::Equal
}

fn is_in_set(v: &Bson, set: &[Bson]) -> bool {
    set.iter().take(MAX_IN_SET).any(|x| compare_bson(x, v) == Ordering::Equal && comparable(x, v))
}

pub(crate) fn get_path<'a>(doc: &'a BsonDocument, path: &str) -> Option<&'a Bson> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut cur = doc;
    let mut parts = path.split('.').enumerate().peekable();
    while let Some((depth, part)) = parts.next() {
        if depth >= MAX_PATH_DEPTH {
            return None;
        }
        let v = cur.get(part)?;
        if parts.peek().is_none() {
            return Some(v);
        }
        match v {
            Bson::Document(d) => cur = d,
            _ => return None,
        }
    }
    None
}

fn is_num(x: &Bson) -> bool {
    matches!(x, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_) | Bson::Decimal128(_))
}

/// Numeric view of a BSON value; `None` for non-numeric kinds.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn as_f64(x: &Bson) -> Option<f64> {
    match x {
        Bson::Int32(i) => Some(f64::from(*i)),
        Bson::Int64(i) => Some(*i as f64),
        Bson::Double(f) => Some(*f),
        Bson::Decimal128(d) => d.to_string().parse::<f64>().ok(),
        _ => None,
    }
}

pub fn compare_bson(a: &Bson, b: &Bson) -> Ordering {
    if is_num(a) && is_num(b) {
        // Exact integer comparison where possible; floats fall back to total order.
        return match (a, b) {
            (Bson::Int32(x), Bson::Int32(y)) => x.cmp(y),
            (Bson::Int64(x), Bson::Int64(y)) => x.cmp(y),
            (Bson::Int32(x), Bson::Int64(y)) => i64::from(*x).cmp(y),
            (Bson::Int64(x), Bson::Int32(y)) => x.cmp(&i64::from(*y)),
            _ => as_f64(a).unwrap_or(f64::NAN).total_cmp(&as_f64(b).unwrap_or(f64::NAN)),
        };
    }
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => x.cmp(y),
        (Bson::Boolean(x), Bson::Boolean(y)) => x.cmp(y),
        (Bson::Array(x), Bson::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let c = compare_bson(l, r);
                if c != Ordering::Equal {
                    return c;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Cross-type ordering; all numeric kinds share one rank.
fn type_rank(v: &Bson) -> u8 {
    use bson::Bson as T;
    match v {
        T::MinKey => 0,
        T::Undefined => 1,
        T::Null => 2,
        T::Int32(_) | T::Int64(_) | T::Double(_) | T::Decimal128(_) => 3,
        T::Symbol(_) => 4,
        T::String(_) => 5,
        T::Document(_) => 6,
        T::Array(_) => 7,
        T::Binary(_) => 8,
        T::ObjectId(_) => 9,
        T::Boolean(_) => 10,
        T::DateTime(_) => 11,
        T::Timestamp(_) => 12,
        T::RegularExpression(_) => 13,
        T::DbPointer(_) => 14,
        T::JavaScriptCode(_) => 15,
        T::JavaScriptCodeWithScope(_) => 16,
        T::MaxKey => 250,
    }
}

pub fn project_fields(doc: &BsonDocument, fields: &[String]) -> BsonDocument {
    let mut out = BsonDocument::new();
    for f in fields {
        if let Some(v) = doc.get(f) {
            out.insert(f.clone(), v.clone());
        }
    }
    out
}
