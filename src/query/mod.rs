// Submodules for separation of concerns
mod eval;
mod exec;
mod parse;
mod types;

// Public API re-exports
pub use eval::{compare_bson, compare_docs, eval_filter, project_fields};
pub(crate) use eval::{as_f64, get_path};
pub use exec::{apply_update, count_docs, find_docs};
pub use parse::{
    filter_to_document, json_object_to_document, json_to_bson, parse_filter_json, parse_filter_value,
    parse_update_json,
};
pub use types::{
    CmpOp, DeleteReport, Filter, FindOptions, Order, SortSpec, UpdateDoc, UpdateReport,
};
