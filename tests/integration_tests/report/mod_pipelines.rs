use bookstore::aggregate::{Accumulator, Expr, Pipeline, ProjectField, Stage, parse_pipeline_json, run_pipeline};
use bookstore::errors::DbError;
use bookstore::query::{Filter, SortSpec};
use bookstore::report::{ItemsByDecade, Report, describe_all};
use bookstore::store::CatalogStore;
use bson::{Bson, doc};

use crate::integration_tests::support::sample_store;

#[test]
fn described_pipelines_parse_back_to_the_same_description() {
    for (name, stages) in describe_all() {
        let json = serde_json::to_string(&stages).unwrap();
        let parsed = parse_pipeline_json(&json).unwrap_or_else(|e| panic!("{name}: {e}"));
        assert_eq!(parsed.to_bson(), stages, "{name}");
    }
}

#[test]
fn parsed_decade_pipeline_matches_typed_report() {
    let store = sample_store();
    let json = r#"[
        {"$project": {"title": 1, "published_year": 1,
            "decade": {"$subtract": ["$published_year", {"$mod": ["$published_year", 10]}]}}},
        {"$group": {"_id": "$decade", "bookCount": {"$sum": 1}, "books": {"$push": "$title"}}},
        {"$sort": {"_id": 1}}
    ]"#;
    let raw = store.aggregate(&parse_pipeline_json(json).unwrap()).unwrap();
    let typed = store.aggregate(&ItemsByDecade::default().pipeline()).unwrap();
    assert_eq!(raw, typed);
}

#[test]
fn match_skip_limit_stages() {
    let docs: Vec<_> = (1..=6).map(|i| doc! {"n": i, "even": i % 2 == 0}).collect();
    let p = Pipeline::new()
        .stage(Stage::Match(Filter::eq("even", true)))
        .sort(vec![SortSpec::desc("n")])
        .stage(Stage::Skip(1))
        .limit(1);
    let out = run_pipeline(docs, &p).unwrap();
    assert_eq!(out, vec![doc! {"n": 4, "even": true}]);
}

#[test]
fn project_exclusion_and_computed_fields() {
    let docs = vec![doc! {"_id": "x", "a": 7, "b": 3}];
    let excl = Pipeline::new().project(vec![("b", ProjectField::Exclude)]);
    assert_eq!(run_pipeline(docs.clone(), &excl).unwrap(), vec![doc! {"_id": "x", "a": 7}]);
    let comp = Pipeline::new().project(vec![
        ("_id", ProjectField::Exclude),
        ("r", ProjectField::Computed(Expr::modulo(Expr::field("a"), Expr::field("b")))),
    ]);
    assert_eq!(run_pipeline(docs, &comp).unwrap(), vec![doc! {"r": 1}]);
}

#[test]
fn sum_of_field_and_push_of_missing_values() {
    let docs = vec![doc! {"g": 1, "v": 2}, doc! {"g": 1, "v": 2.5}, doc! {"g": 1}];
    let p = Pipeline::new().group(
        Expr::field("g"),
        vec![("total", Accumulator::Sum(Expr::field("v"))), ("all", Accumulator::Push(Expr::field("v")))],
    );
    let out = run_pipeline(docs, &p).unwrap();
    assert_eq!(out[0].get("total"), Some(&Bson::Double(4.5)));
    // the document without `v` adds nothing to the pushed list
    assert_eq!(out[0].get_array("all").unwrap().len(), 2);
}

#[test]
fn malformed_pipelines_are_rejected() {
    assert!(matches!(parse_pipeline_json("[{\"$out\": \"x\"}]"), Err(DbError::QueryError(_))));
    assert!(matches!(parse_pipeline_json("not json"), Err(DbError::Json(_))));
    let limit0 = Pipeline::new().limit(0);
    assert!(matches!(run_pipeline(Vec::new(), &limit0), Err(DbError::InvalidInput(_))));
    let mixed = Pipeline::new().project(vec![("a", ProjectField::Include), ("b", ProjectField::Exclude)]);
    assert!(run_pipeline(Vec::new(), &mixed).is_err());
}

#[test]
fn mod_by_zero_is_invalid_input() {
    let p = Pipeline::new().project(vec![("r", ProjectField::Computed(Expr::modulo(Expr::field("a"), Expr::literal(0))))]);
    assert!(matches!(run_pipeline(vec![doc! {"a": 5}], &p), Err(DbError::InvalidInput(_))));
}
