use serde_json::Value;

use super::types::{Accumulator, Expr, Pipeline, ProjectField, Stage};
use crate::errors::DbError;
use crate::query::{Order, SortSpec, json_to_bson, parse_filter_value};

/// Parses a JSON array of stage documents, e.g.
/// `[{"$group": {"_id": "$author", "n": {"$sum": 1}}}, {"$sort": {"n": -1}}]`.
///
/// # Errors
/// Returns `QueryError` for unknown stages or operators and malformed arguments.
pub fn parse_pipeline_json(json: &str) -> Result<Pipeline, DbError> {
    let v: Value = serde_json::from_str(json)?;
    let stages = v
        .as_array()
        .ok_or_else(|| DbError::QueryError("pipeline must be a JSON array".into()))?;
    let stages = stages.iter().map(parse_stage).collect::<Result<Vec<_>, _>>()?;
    Ok(Pipeline { stages })
}

fn parse_stage(v: &Value) -> Result<Stage, DbError> {
    let obj = v
        .as_object()
        .filter(|m| m.len() == 1)
        .ok_or_else(|| DbError::QueryError("each stage must be an object with one key".into()))?;
    let Some((name, body)) = obj.iter().next() else {
        return Err(DbError::QueryError("empty stage".into()));
    };
    match name.as_str() {
        "$match" => Ok(Stage::Match(parse_filter_value(body)?)),
        "$project" => {
            let m = body
                .as_object()
                .ok_or_else(|| DbError::QueryError("$project requires an object".into()))?;
            let fields = m
                .iter()
                .map(|(k, v)| -> Result<(String, ProjectField), DbError> {
                    let pf = match v {
                        Value::Bool(true) => ProjectField::Include,
                        Value::Bool(false) => ProjectField::Exclude,
                        Value::Number(n) if n.as_f64() == Some(0.0) => ProjectField::Exclude,
                        Value::Number(_) => ProjectField::Include,
                        other => ProjectField::Computed(parse_expr(other)?),
                    };
                    Ok((k.clone(), pf))
                })
                .collect::<Result<_, DbError>>()?;
            Ok(Stage::Project(fields))
        }
        "$group" => {
            let m = body
                .as_object()
                .ok_or_else(|| DbError::QueryError("$group requires an object".into()))?;
            let id = m
                .get("_id")
                .ok_or_else(|| DbError::QueryError("$group requires an _id".into()))?;
            let fields = m
                .iter()
                .filter(|(k, _)| k.as_str() != "_id")
                .map(|(k, v)| parse_accumulator(v).map(|a| (k.clone(), a)))
                .collect::<Result<_, DbError>>()?;
            Ok(Stage::Group { id: parse_expr(id)?, fields })
        }
        "$sort" => {
            let m = body
                .as_object()
                .ok_or_else(|| DbError::QueryError("$sort requires an object".into()))?;
            let specs = m
                .iter()
                .map(|(k, v)| match v.as_i64() {
                    Some(1) => Ok(SortSpec { field: k.clone(), order: Order::Asc }),
                    Some(-1) => Ok(SortSpec { field: k.clone(), order: Order::Desc }),
                    _ => Err(DbError::QueryError(format!("$sort direction for {k} must be 1 or -1"))),
                })
                .collect::<Result<_, _>>()?;
            Ok(Stage::Sort(specs))
        }
        "$skip" => Ok(Stage::Skip(parse_count(name, body)?)),
        "$limit" => Ok(Stage::Limit(parse_count(name, body)?)),
        other => Err(DbError::QueryError(format!("unsupported stage {other}"))),
    }
}

fn parse_count(name: &str, v: &Value) -> Result<usize, DbError> {
    v.as_u64()
        .and_then(|n| usize::try_from(n).ok())
        .ok_or_else(|| DbError::QueryError(format!("{name} requires a non-negative integer")))
}

fn parse_accumulator(v: &Value) -> Result<Accumulator, DbError> {
    let (op, arg) = single_key(v, "accumulator")?;
    let e = parse_expr(arg)?;
    match op {
        "$avg" => Ok(Accumulator::Avg(e)),
        "$sum" => Ok(Accumulator::Sum(e)),
        "$push" => Ok(Accumulator::Push(e)),
        other => Err(DbError::QueryError(format!("unsupported accumulator {other}"))),
    }
}

/// Parses an expression: `"$field"`, an operator object, or a literal.
///
/// # Errors
/// Returns `QueryError` for unknown operators or wrong arity.
pub fn parse_expr(v: &Value) -> Result<Expr, DbError> {
    match v {
        Value::String(s) if s.starts_with('$') => Ok(Expr::Field(s[1..].to_string())),
        Value::Object(m) if m.keys().next().is_some_and(|k| k.starts_with('$')) => {
            let (op, arg) = single_key(v, "expression")?;
            if op == "$literal" {
                return Ok(Expr::Literal(json_to_bson(arg)));
            }
            let args = arg
                .as_array()
                .filter(|a| a.len() == 2)
                .ok_or_else(|| DbError::QueryError(format!("{op} takes exactly two arguments")))?;
            let (a, b) = (parse_expr(&args[0])?, parse_expr(&args[1])?);
            match op {
                "$subtract" => Ok(Expr::subtract(a, b)),
                "$mod" => Ok(Expr::modulo(a, b)),
                other => Err(DbError::QueryError(format!("unsupported operator {other}"))),
            }
        }
        other => Ok(Expr::Literal(json_to_bson(other))),
    }
}

fn single_key<'a>(v: &'a Value, what: &str) -> Result<(&'a str, &'a Value), DbError> {
    v.as_object()
        .filter(|m| m.len() == 1)
        .and_then(|m| m.iter().next())
        .map(|(k, v)| (k.as_str(), v))
        .ok_or_else(|| DbError::QueryError(format!("{what} must be an object with one operator")))
}
