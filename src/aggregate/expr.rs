use bson::{Bson, Document as BsonDocument};

use super::types::Expr;
use crate::errors::DbError;
use crate::query::get_path;

/// Evaluates an expression against one document.
///
/// # Errors
/// `InvalidInput` when an arithmetic operand has the wrong kind, e.g. `$mod` over a
/// missing or non-integer field.
pub fn eval_expr(doc: &BsonDocument, expr: &Expr) -> Result<Bson, DbError> {
    match expr {
        Expr::Field(path) => Ok(get_path(doc, path).cloned().unwrap_or(Bson::Null)),
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Subtract(a, b) => subtract(eval_expr(doc, a)?, eval_expr(doc, b)?, a, b),
        Expr::Mod(a, b) => modulo(eval_expr(doc, a)?, eval_expr(doc, b)?, a, b),
    }
}

fn describe(e: &Expr) -> String {
    match e {
        Expr::Field(p) => format!("field {p:?}"),
        other => format!("{}", other.to_bson()),
    }
}

fn int_of(v: &Bson) -> Option<(i64, bool)> {
    match v {
        Bson::Int32(i) => Some((i64::from(*i), true)),
        Bson::Int64(i) => Some((*i, false)),
        _ => None,
    }
}

/// Integer results stay `Int32` when both inputs were `Int32` and the value fits.
fn narrow(v: i64, both_i32: bool) -> Bson {
    if both_i32 {
        i32::try_from(v).map_or(Bson::Int64(v), Bson::Int32)
    } else {
        Bson::Int64(v)
    }
}

fn subtract(l: Bson, r: Bson, le: &Expr, re: &Expr) -> Result<Bson, DbError> {
    if matches!(l, Bson::Null) || matches!(r, Bson::Null) {
        return Ok(Bson::Null);
    }
    if let (Some((x, x32)), Some((y, y32))) = (int_of(&l), int_of(&r)) {
        return x.checked_sub(y).map(|v| narrow(v, x32 && y32)).ok_or_else(|| {
            DbError::InvalidInput(format!("$subtract overflow: {x} - {y}"))
        });
    }
    match (crate::query::as_f64(&l), crate::query::as_f64(&r)) {
        (Some(x), Some(y)) => Ok(Bson::Double(x - y)),
        (None, _) => Err(DbError::InvalidInput(format!(
            "$subtract expects numbers, {} is {l}",
            describe(le)
        ))),
        (_, None) => Err(DbError::InvalidInput(format!(
            "$subtract expects numbers, {} is {r}",
            describe(re)
        ))),
    }
}

/// Truncated remainder; the result carries the dividend's sign.
fn modulo(l: Bson, r: Bson, le: &Expr, re: &Expr) -> Result<Bson, DbError> {
    let Some((x, x32)) = int_of(&l) else {
        return Err(match l {
            Bson::Null => DbError::InvalidInput(format!("$mod over missing {}", describe(le))),
            other => DbError::InvalidInput(format!(
                "$mod expects an integer, {} is {other}",
                describe(le)
            )),
        });
    };
    let Some((y, y32)) = int_of(&r) else {
        return Err(DbError::InvalidInput(format!(
            "$mod expects an integer divisor, {} is {r}",
            describe(re)
        )));
    };
    if y == 0 {
        return Err(DbError::InvalidInput("$mod by zero".into()));
    }
    // checked_rem only fails for i64::MIN % -1, whose remainder is zero
    Ok(narrow(x.checked_rem(y).unwrap_or(0), x32 && y32))
}
