use bookstore::catalog::CatalogItem;
use bookstore::report::ReportBuilder;
use bookstore::seed::seed_store;
use bookstore::store::MemoryStore;
use proptest::prelude::*;
use std::collections::HashMap;

fn arb_item() -> impl Strategy<Value = CatalogItem> {
    (
        "[A-Z][a-z]{0,6}",
        prop::sample::select(vec!["Ann", "Bob", "Cy", "Dee"]),
        prop::sample::select(vec!["Fantasy", "Fiction", "Sci-Fi", "Romance"]),
        1000i32..=9999,
        0u32..10_000,
        any::<bool>(),
    )
        .prop_map(|(title, author, genre, year, cents, stock)| {
            CatalogItem::new(title, author, genre, year, f64::from(cents) / 100.0, stock)
        })
}

fn store_of(items: &[CatalogItem]) -> MemoryStore {
    let store = MemoryStore::new("books");
    seed_store(&store, items).unwrap();
    store
}

proptest! {
    #![proptest_config(proptest::test_runner::Config {
        failure_persistence: Some(Box::new(proptest::test_runner::FileFailurePersistence::WithSource("proptest-regressions"))),
        cases: 64,
        .. proptest::test_runner::Config::default()
    })]

    #[test]
    fn prop_decades_are_sorted_multiples_of_ten_covering_all_items(items in prop::collection::vec(arb_item(), 0..40)) {
        let store = store_of(&items);
        let buckets = ReportBuilder::new(&store).items_by_decade().unwrap();
        for b in &buckets {
            prop_assert_eq!(b.decade % 10, 0);
            prop_assert_eq!(b.item_count as usize, b.titles.len());
        }
        prop_assert!(buckets.windows(2).all(|w| w[0].decade < w[1].decade));
        prop_assert_eq!(buckets.iter().map(|b| b.item_count).sum::<u64>() as usize, items.len());
        for item in &items {
            let decade = i64::from(item.published_year - item.published_year % 10);
            prop_assert!(buckets.iter().any(|b| b.decade == decade && b.titles.contains(&item.title)));
        }
    }

    #[test]
    fn prop_average_prices_non_increasing(items in prop::collection::vec(arb_item(), 0..40)) {
        let store = store_of(&items);
        let rows = ReportBuilder::new(&store).average_price_by_category().unwrap();
        let avgs: Vec<f64> = rows.iter().map(|r| r.average_price.unwrap()).collect();
        prop_assert!(avgs.windows(2).all(|w| w[0] >= w[1]));
        prop_assert_eq!(rows.iter().map(|r| r.item_count).sum::<u64>() as usize, items.len());
    }

    #[test]
    fn prop_top_author_has_maximal_count(items in prop::collection::vec(arb_item(), 0..40)) {
        let store = store_of(&items);
        let top = ReportBuilder::new(&store).top_author_by_count().unwrap();
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for i in &items {
            *counts.entry(i.author.as_str()).or_default() += 1;
        }
        match top {
            None => prop_assert!(items.is_empty()),
            Some(t) => {
                let author = t.author.unwrap();
                prop_assert_eq!(counts[author.as_str()], t.item_count);
                prop_assert!(counts.values().all(|c| *c <= t.item_count));
            }
        }
    }

    #[test]
    fn prop_reports_are_idempotent(items in prop::collection::vec(arb_item(), 0..30)) {
        let store = store_of(&items);
        let rb = ReportBuilder::new(&store);
        prop_assert_eq!(rb.average_price_by_category().unwrap(), rb.average_price_by_category().unwrap());
        prop_assert_eq!(rb.items_by_decade().unwrap(), rb.items_by_decade().unwrap());
        prop_assert_eq!(rb.top_author_by_count().unwrap(), rb.top_author_by_count().unwrap());
    }
}
