use bookstore::aggregate::{Expr, eval_expr, parse_expr};
use bookstore::query::{eval_filter, filter_to_document, parse_filter_json, parse_filter_value};
use bson::{Bson, doc};
use proptest::prelude::*;

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_gt_filter_matches_integer_order(x in any::<i32>(), y in any::<i32>()) {
        let f = parse_filter_json(&format!("{{\"published_year\": {{\"$gt\": {y}}}}}")).unwrap();
        prop_assert_eq!(eval_filter(&doc! {"published_year": x}, &f), x > y);
    }

    #[test]
    fn prop_rendered_filter_parses_to_same_semantics(x in -50i32..50, lo in -50i32..50, hi in -50i32..50) {
        let json = format!("{{\"$or\": [{{\"n\": {{\"$lt\": {lo}}}}}, {{\"n\": {{\"$gte\": {hi}}}}}], \"tag\": {{\"$in\": [\"a\", \"b\"]}}}}");
        let f = parse_filter_json(&json).unwrap();
        let again = parse_filter_value(&serde_json::to_value(filter_to_document(&f)).unwrap()).unwrap();
        for tag in ["a", "c"] {
            let d = doc! {"n": x, "tag": tag};
            prop_assert_eq!(eval_filter(&d, &f), eval_filter(&d, &again));
        }
    }

    #[test]
    fn prop_decade_expression(year in 0i32..10_000) {
        let e = parse_expr(&serde_json::json!({"$subtract": ["$y", {"$mod": ["$y", 10]}]})).unwrap();
        let v = eval_expr(&doc! {"y": year}, &e).unwrap();
        prop_assert_eq!(v, Bson::Int32(year - year % 10));
        prop_assert_eq!(e, Expr::subtract(Expr::field("y"), Expr::modulo(Expr::field("y"), Expr::literal(10))));
    }
}
