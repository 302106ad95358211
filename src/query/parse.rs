//! JSON parsing of filter and update documents written in the shell style,
//! e.g. `{"genre": "Fantasy"}` or `{"published_year": {"$gt": 2010}, "in_stock": true}`.

use crate::errors::DbError;
use bson::Bson;
use serde_json::{Map, Value};

use super::types::{CmpOp, Filter, MAX_IN_SET, UpdateDoc};

const MAX_UPDATE_FIELDS: usize = 128;

/// # Errors
/// Returns an error if the JSON string is not a valid filter document.
pub fn parse_filter_json(json: &str) -> Result<Filter, DbError> {
    let v: Value = serde_json::from_str(json)?;
    parse_filter_value(&v)
}

/// # Errors
/// Returns an error if the value is not an object or uses an unsupported operator.
pub fn parse_filter_value(v: &Value) -> Result<Filter, DbError> {
    let obj = match v {
        Value::Object(m) => m,
        Value::Bool(true) => return Ok(Filter::True),
        Value::Bool(false) => return Ok(Filter::Not(Box::new(Filter::True))),
        _ => return Err(DbError::QueryError("filter must be a JSON object".into())),
    };
    let mut clauses = Vec::with_capacity(obj.len());
    for (key, val) in obj {
        clauses.push(match key.as_str() {
            "$and" => Filter::And(parse_filter_list(key, val)?),
            "$or" => Filter::Or(parse_filter_list(key, val)?),
            "$nor" => Filter::Not(Box::new(Filter::Or(parse_filter_list(key, val)?))),
            k if k.starts_with('$') => {
                return Err(DbError::QueryError(format!("unknown top-level operator {k}")));
            }
            field => parse_field_clause(field, val)?,
        });
    }
    Ok(match clauses.len() {
        0 => Filter::True,
        1 => clauses.remove(0),
        _ => Filter::And(clauses),
    })
}

fn parse_filter_list(op: &str, v: &Value) -> Result<Vec<Filter>, DbError> {
    let arr =
        v.as_array().ok_or_else(|| DbError::QueryError(format!("{op} requires an array")))?;
    arr.iter().map(parse_filter_value).collect()
}

fn parse_field_clause(field: &str, v: &Value) -> Result<Filter, DbError> {
    let ops = match v {
        Value::Object(m) if m.keys().next().is_some_and(|k| k.starts_with('$')) => m,
        other => return Ok(Filter::eq(field, json_to_bson(other))),
    };
    let mut out = Vec::with_capacity(ops.len());
    for (op, arg) in ops {
        let path = field.to_string();
        out.push(match op.as_str() {
            "$eq" => Filter::Cmp { path, op: CmpOp::Eq, value: json_to_bson(arg) },
            "$ne" => Filter::Not(Box::new(Filter::Cmp {
                path,
                op: CmpOp::Eq,
                value: json_to_bson(arg),
            })),
            "$gt" => Filter::Cmp { path, op: CmpOp::Gt, value: json_to_bson(arg) },
            "$gte" => Filter::Cmp { path, op: CmpOp::Gte, value: json_to_bson(arg) },
            "$lt" => Filter::Cmp { path, op: CmpOp::Lt, value: json_to_bson(arg) },
            "$lte" => Filter::Cmp { path, op: CmpOp::Lte, value: json_to_bson(arg) },
            "$in" => Filter::In { path, values: bson_set(op, arg)? },
            "$nin" => Filter::Nin { path, values: bson_set(op, arg)? },
            "$exists" => Filter::Exists {
                path,
                exists: arg
                    .as_bool()
                    .ok_or_else(|| DbError::QueryError("$exists requires a boolean".into()))?,
            },
            #[cfg(feature = "regex")]
            "$regex" => Filter::Regex {
                path,
                pattern: arg
                    .as_str()
                    .ok_or_else(|| DbError::QueryError("$regex requires a string".into()))?
                    .to_string(),
                case_insensitive: ops
                    .get("$options")
                    .and_then(Value::as_str)
                    .is_some_and(|o| o.contains('i')),
            },
            #[cfg(feature = "regex")]
            "$options" => continue,
            other => {
                return Err(DbError::QueryError(format!("unsupported operator {other} on {field}")));
            }
        });
    }
    Ok(if out.len() == 1 { out.remove(0) } else { Filter::And(out) })
}

fn bson_set(op: &str, v: &Value) -> Result<Vec<Bson>, DbError> {
    let arr =
        v.as_array().ok_or_else(|| DbError::QueryError(format!("{op} requires an array")))?;
    Ok(arr.iter().take(MAX_IN_SET).map(json_to_bson).collect())
}

/// Converts a JSON value into BSON the way the mongo shell types literals:
/// integers that fit in 32 bits become `Int32`, larger ones `Int64`, the rest `Double`.
#[must_use]
pub fn json_to_bson(v: &Value) -> Bson {
    match v {
        Value::Null => Bson::Null,
        Value::Bool(b) => Bson::Boolean(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map_or(Bson::Int64(i), Bson::Int32)
            } else {
                Bson::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Bson::String(s.clone()),
        Value::Array(a) => Bson::Array(a.iter().map(json_to_bson).collect()),
        Value::Object(m) => Bson::Document(json_object_to_document(m)),
    }
}

#[must_use]
pub fn json_object_to_document(m: &Map<String, Value>) -> bson::Document {
    let mut d = bson::Document::new();
    for (k, v) in m {
        d.insert(k.clone(), json_to_bson(v));
    }
    d
}

/// Renders a filter back into its shell form, e.g. for describing a `$match` stage.
#[must_use]
pub fn filter_to_document(f: &Filter) -> bson::Document {
    fn op_doc(path: &str, op: &str, v: Bson) -> bson::Document {
        let mut inner = bson::Document::new();
        inner.insert(op, v);
        let mut d = bson::Document::new();
        d.insert(path, inner);
        d
    }
    fn list(fs: &[Filter]) -> Bson {
        Bson::Array(fs.iter().map(|f| Bson::Document(filter_to_document(f))).collect())
    }
    match f {
        Filter::True => bson::Document::new(),
        Filter::And(fs) => bson::doc! {"$and": list(fs)},
        Filter::Or(fs) => bson::doc! {"$or": list(fs)},
        Filter::Not(inner) => match inner.as_ref() {
            Filter::Or(fs) => bson::doc! {"$nor": list(fs)},
            Filter::Cmp { path, op: CmpOp::Eq, value } => op_doc(path, "$ne", value.clone()),
            other => bson::doc! {"$nor": list(std::slice::from_ref(other))},
        },
        Filter::Exists { path, exists } => op_doc(path, "$exists", Bson::Boolean(*exists)),
        Filter::In { path, values } => op_doc(path, "$in", Bson::Array(values.clone())),
        Filter::Nin { path, values } => op_doc(path, "$nin", Bson::Array(values.clone())),
        Filter::Cmp { path, op, value } => {
            let op = match op {
                CmpOp::Eq => "$eq",
                CmpOp::Gt => "$gt",
                CmpOp::Gte => "$gte",
                CmpOp::Lt => "$lt",
                CmpOp::Lte => "$lte",
            };
            op_doc(path, op, value.clone())
        }
        #[cfg(feature = "regex")]
        Filter::Regex { path, pattern, case_insensitive } => {
            let mut inner = bson::doc! {"$regex": pattern.clone()};
            if *case_insensitive {
                inner.insert("$options", "i");
            }
            let mut d = bson::Document::new();
            d.insert(path.clone(), inner);
            d
        }
    }
}

/// # Errors
/// Returns an error if the JSON string cannot be parsed into an update structure.
pub fn parse_update_json(json: &str) -> Result<UpdateDoc, DbError> {
    let v: Value = serde_json::from_str(json)?;
    let obj = v
        .as_object()
        .ok_or_else(|| DbError::QueryError("update must be a JSON object".into()))?;
    let mut out = UpdateDoc::default();
    for (op, arg) in obj {
        match op.as_str() {
            "$set" => {
                let m = arg
                    .as_object()
                    .ok_or_else(|| DbError::QueryError("$set requires an object".into()))?;
                for (k, v) in m.iter().take(MAX_UPDATE_FIELDS) {
                    out.set.push((k.clone(), json_to_bson(v)));
                }
            }
            "$inc" => {
                let m = arg
                    .as_object()
                    .ok_or_else(|| DbError::QueryError("$inc requires an object".into()))?;
                for (k, v) in m.iter().take(MAX_UPDATE_FIELDS) {
                    let by = json_to_bson(v);
                    if !matches!(by, Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) {
                        return Err(DbError::QueryError("$inc requires numeric".into()));
                    }
                    out.inc.push((k.clone(), by));
                }
            }
            "$unset" => match arg {
                Value::Object(m) => out.unset.extend(m.keys().take(MAX_UPDATE_FIELDS).cloned()),
                Value::Array(a) => out.unset.extend(
                    a.iter().filter_map(Value::as_str).take(MAX_UPDATE_FIELDS).map(String::from),
                ),
                _ => return Err(DbError::QueryError("$unset requires an object or array".into())),
            },
            other => return Err(DbError::QueryError(format!("unsupported update operator {other}"))),
        }
    }
    Ok(out)
}
