use crate::query::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    AvgPrice,
    TopAuthor,
    ByDecade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindBy {
    Genre,
    Author,
    AfterYear,
    InStockAfter,
}

pub enum Command {
    /// Runs the canned queries and reports in script order.
    Demo,
    Report(ReportKind),
    Describe,
    Find { by: FindBy, value: String },
    Project,
    Sort { order: Order },
    Page { number: usize },
    UpdatePrice { title: String, price: f64 },
    Delete { title: String },
    Index,
    Explain { title: String },
    // Ad-hoc shell-style input
    Query { filter_json: String, limit: Option<usize> },
    Aggregate { pipeline_json: String },
    Update { filter_json: String, update_json: String },
}
