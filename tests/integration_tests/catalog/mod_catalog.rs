use bookstore::catalog::{CatalogQueries, StoredItem};
use bookstore::errors::DbError;
use bookstore::query::Order;
use bookstore::store::CatalogStore;

use crate::integration_tests::support::sample_store;

fn titles(items: &[StoredItem]) -> Vec<String> {
    items.iter().map(|i| i.item.title.clone()).collect()
}

#[test]
fn lookups_over_the_sample_catalog() {
    let store = sample_store();
    let q = CatalogQueries::new(&store);
    let fantasy = q.find_by_genre("Fantasy").unwrap();
    assert_eq!(fantasy.len(), 6);
    assert!(fantasy.iter().all(|i| i.item.genre == "Fantasy"));
    assert_eq!(q.find_by_author("J.K. Rowling").unwrap().len(), 3);
    let recent = q.find_published_after(2000).unwrap();
    assert_eq!(titles(&recent), ["The Night Circus", "The Martian"]);
    assert_eq!(titles(&q.find_in_stock_after(2010).unwrap()), ["The Night Circus"]);
    assert!(q.find_by_genre("Cookbook").unwrap().is_empty());
}

#[test]
fn projection_keeps_only_selected_fields() {
    let store = sample_store();
    let rows = CatalogQueries::new(&store).find_with_projection().unwrap();
    assert_eq!(rows.len(), 17);
    assert!(rows.iter().all(|r| r.len() == 3 && r.get("_id").is_none() && r.get("genre").is_none()));
}

#[test]
fn price_sorting_is_monotone() {
    let store = sample_store();
    let q = CatalogQueries::new(&store);
    let asc: Vec<f64> = q.sort_by_price(Order::Asc).unwrap().iter().map(|i| i.item.price).collect();
    assert!(asc.windows(2).all(|w| w[0] <= w[1]));
    let desc: Vec<f64> = q.sort_by_price(Order::Desc).unwrap().iter().map(|i| i.item.price).collect();
    assert!(desc.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(desc.first(), Some(&19.99));
}

#[test]
fn pages_partition_the_catalog() {
    let store = sample_store();
    let q = CatalogQueries::new(&store);
    let mut seen = Vec::new();
    for n in 1..=4 {
        let page = q.page(n).unwrap();
        assert!(page.len() <= 5);
        seen.extend(titles(&page));
    }
    assert_eq!(seen.len(), 17);
    let mut sorted = seen.clone();
    sorted.sort();
    assert_eq!(seen, sorted);
    assert!(q.page(5).unwrap().is_empty());
    assert!(matches!(q.page(0), Err(DbError::InvalidInput(_))));
}

#[test]
fn update_then_delete() {
    let store = sample_store();
    let q = CatalogQueries::new(&store);
    let r = q.update_price("The Great Gatsby", 15.99).unwrap();
    assert_eq!((r.matched, r.modified), (1, 1));
    let again = q.update_price("The Great Gatsby", 15.99).unwrap();
    assert_eq!((again.matched, again.modified), (1, 0));
    assert!(matches!(q.update_price("The Great Gatsby", f64::INFINITY), Err(DbError::InvalidInput(_))));
    assert_eq!(q.delete_by_title("1984").unwrap().deleted, 1);
    assert_eq!(q.find_by_author("George Orwell").unwrap().len(), 1);
    assert_eq!(store.len(), 16);
}

#[test]
fn indexes_and_explain() {
    let store = sample_store();
    let q = CatalogQueries::new(&store);
    assert_eq!(q.create_title_index().unwrap(), "title_1");
    assert_eq!(q.create_title_index().unwrap(), "title_1");
    assert_eq!(q.create_author_year_index().unwrap(), "author_1_published_year_-1");
    assert_eq!(store.list_indexes().unwrap().len(), 2);
    let cmp = q.index_comparison("The Great Gatsby").unwrap();
    // index already existed, both runs use it
    assert_eq!(cmp.without_index, cmp.with_index);
    assert_eq!(cmp.with_index.n_returned, 1);
}

#[test]
fn explain_before_and_after_title_index() {
    let store = sample_store();
    let cmp = CatalogQueries::new(&store).index_comparison("The Great Gatsby").unwrap();
    assert_eq!(cmp.without_index.index_used, None);
    assert_eq!(cmp.without_index.docs_examined, 17);
    assert_eq!(cmp.with_index.index_used.as_deref(), Some("title_1"));
    assert_eq!(cmp.with_index.docs_examined, 1);
    assert_eq!(cmp.without_index.n_returned, cmp.with_index.n_returned);
}
