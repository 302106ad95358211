use bson::{Bson, Document as BsonDocument};
use std::collections::HashMap;
use std::time::Instant;

use super::expr::eval_expr;
use super::types::{Accumulator, Expr, Pipeline, ProjectField, Stage};
use crate::errors::DbError;
use crate::query::{as_f64, compare_docs, eval_filter, get_path};

/// Runs a validated pipeline over a snapshot of documents in scan order.
///
/// # Errors
/// Returns `InvalidInput` if the pipeline is malformed or an expression cannot be
/// evaluated for some document.
pub fn run_pipeline(docs: Vec<BsonDocument>, pipeline: &Pipeline) -> Result<Vec<BsonDocument>, DbError> {
    pipeline.validate()?;
    let start = Instant::now();
    let input = docs.len();
    let mut cur = docs;
    for stage in &pipeline.stages {
        cur = run_stage(cur, stage)?;
    }
    log::debug!(
        target: "bookstore::metrics",
        "{{\"bench\":\"aggregate\",\"stages\":{},\"input\":{},\"output\":{},\"duration_ms\":{}}}",
        pipeline.stages.len(),
        input,
        cur.len(),
        start.elapsed().as_millis()
    );
    Ok(cur)
}

fn run_stage(docs: Vec<BsonDocument>, stage: &Stage) -> Result<Vec<BsonDocument>, DbError> {
    Ok(match stage {
        Stage::Match(f) => docs.into_iter().filter(|d| eval_filter(d, f)).collect(),
        Stage::Project(fields) => {
            docs.iter().map(|d| project(d, fields)).collect::<Result<_, _>>()?
        }
        Stage::Group { id, fields } => group(&docs, id, fields)?,
        Stage::Sort(specs) => {
            let mut docs = docs;
            // stable: equal keys keep their input order
            docs.sort_by(|a, b| compare_docs(a, b, specs));
            docs
        }
        Stage::Skip(n) => docs.into_iter().skip(*n).collect(),
        Stage::Limit(n) => docs.into_iter().take(*n).collect(),
    })
}

fn project(doc: &BsonDocument, fields: &[(String, ProjectField)]) -> Result<BsonDocument, DbError> {
    let exclusion = fields.iter().all(|(_, pf)| *pf == ProjectField::Exclude);
    if exclusion {
        let mut out = doc.clone();
        for (name, _) in fields {
            out.remove(name);
        }
        return Ok(out);
    }
    let mut out = BsonDocument::new();
    let keep_id = !fields.iter().any(|(n, pf)| n == "_id" && *pf == ProjectField::Exclude);
    if keep_id && let Some(id) = doc.get("_id") {
        out.insert("_id", id.clone());
    }
    for (name, pf) in fields {
        match pf {
            ProjectField::Include => {
                if let Some(v) = get_path(doc, name) {
                    out.insert(name.clone(), v.clone());
                }
            }
            ProjectField::Computed(e) => {
                out.insert(name.clone(), eval_expr(doc, e)?);
            }
            ProjectField::Exclude => {}
        }
    }
    Ok(out)
}

enum AccState {
    Avg { sum: f64, n: u64 },
    Sum { int: i64, float: f64, seen_float: bool, all_i32: bool },
    Push(Vec<Bson>),
}

impl AccState {
    fn new(acc: &Accumulator) -> Self {
        match acc {
            Accumulator::Avg(_) => Self::Avg { sum: 0.0, n: 0 },
            Accumulator::Sum(_) => Self::Sum { int: 0, float: 0.0, seen_float: false, all_i32: true },
            Accumulator::Push(_) => Self::Push(Vec::new()),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn feed(&mut self, v: Bson) {
        match self {
            Self::Avg { sum, n } => {
                if let Some(x) = as_f64(&v) {
                    *sum += x;
                    *n += 1;
                }
            }
            Self::Sum { int, float, seen_float, all_i32 } => match v {
                Bson::Int32(i) => add_int(int, float, seen_float, i64::from(i)),
                Bson::Int64(i) => {
                    *all_i32 = false;
                    add_int(int, float, seen_float, i);
                }
                other => {
                    if let Some(x) = as_f64(&other) {
                        *seen_float = true;
                        *float += x;
                    }
                }
            },
            Self::Push(items) => items.push(v),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(self) -> Bson {
        match self {
            Self::Avg { n: 0, .. } => Bson::Null,
            Self::Avg { sum, n } => Bson::Double(sum / n as f64),
            Self::Sum { int, float, seen_float: true, .. } => Bson::Double(int as f64 + float),
            Self::Sum { int, all_i32: true, .. } => {
                i32::try_from(int).map_or(Bson::Int64(int), Bson::Int32)
            }
            Self::Sum { int, .. } => Bson::Int64(int),
            Self::Push(items) => Bson::Array(items),
        }
    }
}

/// Integer sums spill into the float accumulator on overflow.
#[allow(clippy::cast_precision_loss)]
fn add_int(int: &mut i64, float: &mut f64, seen_float: &mut bool, x: i64) {
    match int.checked_add(x) {
        Some(v) => *int = v,
        None => {
            *seen_float = true;
            *float += x as f64;
        }
    }
}

/// Group keys compare numerically across integer/double kinds. Integers keep their
/// exact value; a whole double shares the key of the equal integer.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn group_key(v: &Bson) -> String {
    match v {
        Bson::Int32(i) => format!("i:{i}"),
        Bson::Int64(i) => format!("i:{i}"),
        Bson::Double(f) if f.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(f) => {
            format!("i:{}", *f as i64)
        }
        Bson::Double(f) => format!("f:{f}"),
        other => format!("{other:?}"),
    }
}

fn group(
    docs: &[BsonDocument],
    id: &Expr,
    fields: &[(String, Accumulator)],
) -> Result<Vec<BsonDocument>, DbError> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(Bson, Vec<AccState>)> = Vec::new();
    for doc in docs {
        let key = eval_expr(doc, id)?;
        let idx = *slots.entry(group_key(&key)).or_insert_with(|| {
            groups.push((key.clone(), fields.iter().map(|(_, a)| AccState::new(a)).collect()));
            groups.len() - 1
        });
        for ((_, acc), state) in fields.iter().zip(groups[idx].1.iter_mut()) {
            if let Accumulator::Push(Expr::Field(path)) = acc
                && get_path(doc, path).is_none()
            {
                // $push skips fields the document does not have
                continue;
            }
            let expr = match acc {
                Accumulator::Avg(e) | Accumulator::Sum(e) | Accumulator::Push(e) => e,
            };
            state.feed(eval_expr(doc, expr)?);
        }
    }
    Ok(groups
        .into_iter()
        .map(|(key, states)| {
            let mut out = BsonDocument::new();
            out.insert("_id", key);
            for ((name, _), state) in fields.iter().zip(states) {
                out.insert(name.clone(), state.finish());
            }
            out
        })
        .collect())
}
