use bookstore::query::{Filter, FindOptions, SortSpec, find_docs};
use bson::doc;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_multi_key_sort_non_decreasing(v in proptest::collection::vec((any::<i64>(), any::<i64>()), 0..50)) {
        let docs: Vec<_> = v.iter().map(|(a, b)| doc! {"a": *a, "b": *b}).collect();
        let opts = FindOptions {
            sort: Some(vec![SortSpec::asc("a"), SortSpec::asc("b")]),
            ..FindOptions::default()
        };
        let out = find_docs(docs, &Filter::True, &opts);
        prop_assert_eq!(out.len(), v.len());
        for w in out.windows(2) {
            let (a0, b0) = (w[0].get_i64("a").unwrap(), w[0].get_i64("b").unwrap());
            let (a1, b1) = (w[1].get_i64("a").unwrap(), w[1].get_i64("b").unwrap());
            prop_assert!(a0 < a1 || (a0 == a1 && b0 <= b1));
        }
    }

    #[test]
    fn prop_pages_never_overlap(n in 0usize..60, size in 1usize..10, page in 1usize..20) {
        let docs: Vec<_> = (0..n).map(|i| doc! {"i": i as i64}).collect();
        let opts = FindOptions {
            sort: Some(vec![SortSpec::asc("i")]),
            skip: Some((page - 1) * size),
            limit: Some(size),
            ..FindOptions::default()
        };
        let out = find_docs(docs, &Filter::True, &opts);
        let start = ((page - 1) * size).min(n);
        prop_assert_eq!(out.len(), (n - start).min(size));
        if let Some(first) = out.first() {
            prop_assert_eq!(first.get_i64("i").unwrap() as usize, start);
        }
    }
}
