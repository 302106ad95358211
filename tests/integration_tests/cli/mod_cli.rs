use bookstore::cli::{Command, FindBy, OutputMode, ReportKind, render, run};
use bookstore::errors::DbError;
use bookstore::query::Order;
use serde_json::json;

use crate::integration_tests::support::{abc_items, sample_store, store_with};

#[test]
fn report_commands_print_typed_rows() {
    let store = store_with(&abc_items());
    let out = run(&store, Command::Report(ReportKind::AvgPrice), 5).unwrap();
    assert_eq!(
        out[0].body,
        json!([
            {"category": "Sci-Fi", "average_price": 30.0, "item_count": 1},
            {"category": "Fantasy", "average_price": 15.0, "item_count": 2},
        ])
    );
    let out = run(&store, Command::Report(ReportKind::ByDecade), 5).unwrap();
    assert_eq!(out[0].body[2], json!({"decade": 2010, "item_count": 1, "titles": ["C"]}));
}

#[test]
fn describe_lists_three_pipelines() {
    let store = store_with(&[]);
    let out = run(&store, Command::Describe, 5).unwrap();
    assert_eq!(out.len(), 3);
    assert_eq!(out[1].body, json!([
        {"$group": {"_id": "$author", "bookCount": {"$sum": 1}}},
        {"$sort": {"bookCount": -1}},
        {"$limit": 1},
    ]));
}

#[test]
fn find_sort_and_page_commands() {
    let store = sample_store();
    let out = run(&store, Command::Find { by: FindBy::InStockAfter, value: "2010".into() }, 5).unwrap();
    assert_eq!(out[0].body[0]["title"], "The Night Circus");
    let out = run(&store, Command::Sort { order: Order::Desc }, 5).unwrap();
    assert_eq!(out[0].body[0]["title"], "The Lord of the Rings");
    let out = run(&store, Command::Page { number: 2 }, 7).unwrap();
    assert_eq!(out[0].body.as_array().unwrap().len(), 7);
    assert!(matches!(run(&store, Command::Page { number: 1 }, 0), Err(DbError::InvalidInput(_))));
}

#[test]
fn write_commands() {
    let store = sample_store();
    let out = run(&store, Command::UpdatePrice { title: "1984".into(), price: 11.99 }, 5).unwrap();
    assert_eq!(out[0].body, json!({"matched": 1, "modified": 1}));
    let out = run(&store, Command::Delete { title: "1984".into() }, 5).unwrap();
    assert_eq!(out[0].body, json!({"deleted": 1}));
    let out = run(
        &store,
        Command::Update { filter_json: r#"{"title": "Moby Dick"}"#.into(), update_json: r#"{"$set": {"in_stock": true}}"#.into() },
        5,
    )
    .unwrap();
    assert_eq!(out[0].body["modified"], 1);
    let out = run(&store, Command::Index, 5).unwrap();
    assert_eq!(out[0].body, json!(["title_1", "author_1_published_year_-1"]));
    let out = run(&store, Command::Explain { title: "Moby Dick".into() }, 5).unwrap();
    assert_eq!(out[0].body["with_index"]["index_used"], "title_1");
}

#[test]
fn bad_json_input_is_an_error() {
    let store = sample_store();
    assert!(run(&store, Command::Query { filter_json: "{".into(), limit: None }, 5).is_err());
    assert!(matches!(
        run(&store, Command::Aggregate { pipeline_json: r#"[{"$bucket": {}}]"#.into() }, 5),
        Err(DbError::QueryError(_))
    ));
}

#[test]
fn demo_output_renders_every_heading() {
    let store = sample_store();
    let sections = run(&store, Command::Demo, 5).unwrap();
    let mut buf = Vec::new();
    render(&mut buf, &sections, OutputMode::Human).unwrap();
    let text = String::from_utf8(buf).unwrap();
    for heading in [
        "=== BOOKS BY GENRE (Fantasy) ===",
        "=== AVERAGE PRICE BY GENRE ===",
        "=== BOOKS BY PUBLICATION DECADE ===",
        "=== INDEX PERFORMANCE COMPARISON ===",
        "=== UPDATING BOOK PRICE ===",
        "=== DELETING A BOOK ===",
    ] {
        assert!(text.contains(heading), "missing {heading}");
    }
    let mut buf = Vec::new();
    render(&mut buf, &sections, OutputMode::Json).unwrap();
    let lines: Vec<serde_json::Value> = String::from_utf8(buf)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), sections.len());
    assert_eq!(lines[6]["result"]["item_count"], 3);
}
