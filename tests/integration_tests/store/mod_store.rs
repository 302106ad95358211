use bookstore::catalog::{CatalogItem, StoredItem};
use bookstore::errors::DbError;
use bookstore::index::IndexSpec;
use bookstore::query::{Filter, FindOptions, Order, SortSpec, UpdateDoc, parse_filter_json, parse_update_json};
use bookstore::store::{CatalogStore, MemoryStore};
use bson::{Bson, doc};
use std::sync::Arc;

use crate::integration_tests::support::sample_store;

#[test]
fn store_is_usable_as_trait_object() {
    let store: Box<dyn CatalogStore> = Box::new(sample_store());
    assert_eq!(store.count(&Filter::True).unwrap(), 17);
    let top = bookstore::ReportBuilder::new(store.as_ref()).top_author_by_count().unwrap();
    assert!(top.is_some());
}

#[test]
fn stored_documents_decode_to_items() {
    let store = sample_store();
    let docs = store.find(&Filter::eq("title", "Moby Dick"), &FindOptions::default()).unwrap();
    let item = StoredItem::try_from(&docs[0]).unwrap();
    assert_eq!(item.item.publisher.as_deref(), Some("Harper & Brothers"));
    assert_eq!(item.id.to_string(), docs[0].get_str("_id").unwrap());
}

#[test]
fn compound_index_gives_same_results_as_scan() {
    let store = sample_store();
    let filter = parse_filter_json(r#"{"author": "George Orwell", "published_year": {"$gt": 1946}}"#).unwrap();
    let scan = store.find(&filter, &FindOptions::default()).unwrap();
    store.create_index(&IndexSpec { keys: vec![SortSpec::asc("author"), SortSpec::desc("published_year")] }).unwrap();
    let indexed = store.find(&filter, &FindOptions::default()).unwrap();
    assert_eq!(scan, indexed);
    assert_eq!(indexed.len(), 1);
    let stats = store.explain(&filter).unwrap();
    assert_eq!(stats.index_used.as_deref(), Some("author_1_published_year_-1"));
    assert_eq!(stats.docs_examined, 2);
    assert_eq!(stats.n_returned, 1);
}

#[test]
fn index_spec_validation() {
    let store = MemoryStore::new("books");
    assert!(matches!(store.create_index(&IndexSpec { keys: vec![] }), Err(DbError::InvalidInput(_))));
    assert_eq!(store.create_index(&IndexSpec::single("price", Order::Desc)).unwrap(), "price_-1");
}

#[test]
fn shell_style_update_and_sorted_find() {
    let store = sample_store();
    let filter = parse_filter_json(r#"{"title": "The Hobbit"}"#).unwrap();
    let update = parse_update_json(r#"{"$inc": {"price": 1}, "$set": {"in_stock": false}}"#).unwrap();
    let r = store.update_one(&filter, &update).unwrap();
    assert_eq!(r.modified, 1);
    let hobbit = &store.find(&filter, &FindOptions::default()).unwrap()[0];
    assert!((hobbit.get_f64("price").unwrap() - 15.99).abs() < 1e-9);
    assert!(!hobbit.get_bool("in_stock").unwrap());

    let opts = FindOptions {
        sort: Some(vec![SortSpec::asc("published_year")]),
        limit: Some(2),
        projection: Some(vec!["title".into()]),
        ..FindOptions::default()
    };
    let oldest = store.find(&Filter::True, &opts).unwrap();
    assert_eq!(oldest, vec![doc! {"title": "Pride and Prejudice"}, doc! {"title": "Wuthering Heights"}]);
}

#[test]
fn id_is_immutable() {
    let store = sample_store();
    let update = UpdateDoc { unset: vec!["_id".into()], ..UpdateDoc::default() };
    assert!(matches!(store.update_one(&Filter::True, &update), Err(DbError::InvalidInput(_))));
    let update = UpdateDoc { set: vec![("_id".into(), Bson::from("x"))], ..UpdateDoc::default() };
    assert!(store.update_one(&Filter::True, &update).is_err());
}

#[test]
fn shared_store_across_threads() {
    let store = Arc::new(MemoryStore::new("books"));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let s = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..25 {
                    let item = CatalogItem::new(format!("T{t}-{i}"), format!("A{t}"), "G", 1990 + i, 1.0, true);
                    s.insert_item(&item).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(store.len(), 100);
    assert_eq!(store.count(&Filter::eq("author", "A2")).unwrap(), 25);
}

#[test]
fn disconnect_and_reconnect() {
    let store = sample_store();
    store.disconnect();
    assert!(matches!(store.insert(doc! {"title": "x"}), Err(DbError::StoreUnavailable(_))));
    assert!(matches!(store.list_indexes(), Err(DbError::StoreUnavailable(_))));
    assert!(matches!(store.delete_one(&Filter::True), Err(DbError::StoreUnavailable(_))));
    store.reconnect();
    assert_eq!(store.len(), 17);
}

#[test]
fn integer_increment_keeps_reports_and_lookups_working() {
    let store = sample_store();
    let update = parse_update_json(r#"{"$inc": {"published_year": 1}}"#).unwrap();
    let r = store.update_one(&Filter::eq("title", "1984"), &update).unwrap();
    assert_eq!(r.modified, 1);
    let doc = &store.find(&Filter::eq("title", "1984"), &FindOptions::default()).unwrap()[0];
    assert_eq!(doc.get("published_year"), Some(&Bson::Int32(1950)));

    let decades = bookstore::ReportBuilder::new(&store).items_by_decade().unwrap();
    let fifties = decades.iter().find(|b| b.decade == 1950).unwrap();
    assert!(fifties.titles.iter().any(|t| t == "1984"));
    let dystopian = bookstore::catalog::CatalogQueries::new(&store).find_by_genre("Dystopian").unwrap();
    assert!(dystopian.iter().any(|i| i.item.published_year == 1950));
}

#[test]
fn find_returns_every_match_in_large_collections() {
    let store = MemoryStore::new("books");
    let items: Vec<CatalogItem> =
        (0..10_001).map(|i| CatalogItem::new(format!("T{i}"), "A", "Fantasy", 2000, 1.0, true)).collect();
    bookstore::seed::seed_store(&store, &items).unwrap();
    let found = bookstore::catalog::CatalogQueries::new(&store).find_by_genre("Fantasy").unwrap();
    assert_eq!(found.len(), store.count(&Filter::eq("genre", "Fantasy")).unwrap());
    assert_eq!(found.len(), 10_001);
}
