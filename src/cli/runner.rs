use serde::Serialize;
use serde_json::{Value, json};
use std::io::Write;

use super::command::{Command, FindBy, ReportKind};
use crate::aggregate::parse_pipeline_json;
use crate::catalog::CatalogQueries;
use crate::errors::DbError;
use crate::query::{FindOptions, Order, parse_filter_json, parse_update_json};
use crate::report::{ReportBuilder, describe_all};
use crate::store::CatalogStore;

/// One titled block of command output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Section {
    pub heading: String,
    pub body: Value,
}

impl Section {
    fn new(heading: impl Into<String>, body: &impl Serialize) -> Result<Self, DbError> {
        Ok(Self { heading: heading.into(), body: serde_json::to_value(body)? })
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OutputMode {
    /// `=== HEADING ===` followed by pretty JSON.
    Human,
    /// One compact JSON object per section.
    Json,
}

/// Executes `cmd` against `store` and returns its output sections.
///
/// # Errors
/// Propagates query, report and store errors.
pub fn run<S: CatalogStore + ?Sized>(store: &S, cmd: Command, page_size: usize) -> Result<Vec<Section>, DbError> {
    let queries = CatalogQueries::new(store).with_page_size(page_size)?;
    let reports = ReportBuilder::new(store);
    let sections = match cmd {
        Command::Demo => demo(&queries, &reports)?,
        Command::Report(ReportKind::AvgPrice) => {
            vec![Section::new("AVERAGE PRICE BY GENRE", &reports.average_price_by_category()?)?]
        }
        Command::Report(ReportKind::TopAuthor) => {
            vec![Section::new("AUTHOR WITH MOST BOOKS", &reports.top_author_by_count()?)?]
        }
        Command::Report(ReportKind::ByDecade) => {
            vec![Section::new("BOOKS BY PUBLICATION DECADE", &reports.items_by_decade()?)?]
        }
        Command::Describe => describe_all()
            .into_iter()
            .map(|(name, stages)| Section::new(name, &stages))
            .collect::<Result<_, _>>()?,
        Command::Find { by, value } => {
            let (heading, items) = match by {
                FindBy::Genre => (format!("BOOKS BY GENRE ({value})"), queries.find_by_genre(&value)?),
                FindBy::Author => (format!("BOOKS BY {value}"), queries.find_by_author(&value)?),
                FindBy::AfterYear => {
                    (format!("BOOKS PUBLISHED AFTER {value}"), queries.find_published_after(parse_year(&value)?)?)
                }
                FindBy::InStockAfter => (
                    format!("IN STOCK AND PUBLISHED AFTER {value}"),
                    queries.find_in_stock_after(parse_year(&value)?)?,
                ),
            };
            vec![Section::new(heading, &items)?]
        }
        Command::Project => {
            vec![Section::new("BOOKS WITH PROJECTION (Title, Author, Price)", &queries.find_with_projection()?)?]
        }
        Command::Sort { order } => {
            let heading = match order {
                Order::Asc => "BOOKS BY PRICE (ascending)",
                Order::Desc => "BOOKS BY PRICE (descending)",
            };
            vec![Section::new(heading, &queries.sort_by_price(order)?)?]
        }
        Command::Page { number } => vec![Section::new(format!("PAGINATION (Page {number})"), &queries.page(number)?)?],
        Command::UpdatePrice { title, price } => {
            vec![Section::new("UPDATING BOOK PRICE", &queries.update_price(&title, price)?)?]
        }
        Command::Delete { title } => vec![Section::new("DELETING A BOOK", &queries.delete_by_title(&title)?)?],
        Command::Index => {
            let names = vec![queries.create_title_index()?, queries.create_author_year_index()?];
            vec![Section::new("INDEXES", &names)?]
        }
        Command::Explain { title } => {
            vec![Section::new("INDEX PERFORMANCE COMPARISON", &queries.index_comparison(&title)?)?]
        }
        Command::Query { filter_json, limit } => {
            let filter = parse_filter_json(&filter_json)?;
            let docs = store.find(&filter, &FindOptions { limit, ..FindOptions::default() })?;
            vec![Section::new("QUERY", &docs)?]
        }
        Command::Aggregate { pipeline_json } => {
            let pipeline = parse_pipeline_json(&pipeline_json)?;
            vec![Section::new("AGGREGATE", &store.aggregate(&pipeline)?)?]
        }
        Command::Update { filter_json, update_json } => {
            let filter = parse_filter_json(&filter_json)?;
            let update = parse_update_json(&update_json)?;
            vec![Section::new("UPDATE", &store.update_one(&filter, &update)?)?]
        }
    };
    Ok(sections)
}

fn parse_year(s: &str) -> Result<i32, DbError> {
    s.trim().parse().map_err(|_| DbError::InvalidInput(format!("{s:?} is not a year")))
}

fn demo<S: CatalogStore + ?Sized>(
    queries: &CatalogQueries<'_, S>,
    reports: &ReportBuilder<'_, S>,
) -> Result<Vec<Section>, DbError> {
    Ok(vec![
        Section::new("BOOKS BY GENRE (Fantasy)", &queries.find_by_genre("Fantasy")?)?,
        Section::new("BOOKS PUBLISHED AFTER 2000", &queries.find_published_after(2000)?)?,
        Section::new("BOOKS BY J.K. ROWLING", &queries.find_by_author("J.K. Rowling")?)?,
        Section::new("IN STOCK AND PUBLISHED AFTER 2010", &queries.find_in_stock_after(2010)?)?,
        Section::new("BOOKS WITH PROJECTION (Title, Author, Price)", &queries.find_with_projection()?)?,
        Section::new("AVERAGE PRICE BY GENRE", &reports.average_price_by_category()?)?,
        Section::new("AUTHOR WITH MOST BOOKS", &reports.top_author_by_count()?)?,
        Section::new("BOOKS BY PUBLICATION DECADE", &reports.items_by_decade()?)?,
        Section::new("PAGINATION (Page 1)", &queries.page(1)?)?,
        Section::new("INDEX PERFORMANCE COMPARISON", &queries.index_comparison("The Great Gatsby")?)?,
        Section::new("UPDATING BOOK PRICE", &queries.update_price("The Great Gatsby", 15.99)?)?,
        // heading only; the demo never deletes
        Section::new("DELETING A BOOK", &())?,
    ])
}

/// Writes sections to `out`.
///
/// # Errors
/// Returns `Io` on write failure.
pub fn render<W: Write>(out: &mut W, sections: &[Section], mode: OutputMode) -> Result<(), DbError> {
    for (i, s) in sections.iter().enumerate() {
        match mode {
            OutputMode::Human => {
                if i > 0 {
                    writeln!(out)?;
                }
                writeln!(out, "=== {} ===", s.heading)?;
                writeln!(out, "{}", serde_json::to_string_pretty(&s.body)?)?;
            }
            OutputMode::Json => {
                writeln!(out, "{}", json!({"section": s.heading, "result": s.body}))?;
            }
        }
    }
    Ok(())
}
