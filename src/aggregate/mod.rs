//! Aggregation pipelines: typed stages, their declarative BSON form, and an
//! executor over an in-memory document snapshot.

mod exec;
mod expr;
mod parse;
mod types;

pub use exec::run_pipeline;
pub use expr::eval_expr;
pub use parse::{parse_expr, parse_pipeline_json};
pub use types::{Accumulator, Expr, Pipeline, ProjectField, Stage};
pub(crate) use types::check_path;
