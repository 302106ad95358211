//! Sample catalog data and JSON / NDJSON item import.

use serde::Serialize;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::catalog::CatalogItem;
use crate::errors::DbError;
use crate::store::CatalogStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub inserted: usize,
}

/// The built-in sample bookstore.
#[must_use]
pub fn sample_items() -> Vec<CatalogItem> {
    [
        ("To Kill a Mockingbird", "Harper Lee", "Fiction", 1960, 12.99, true, 336, "J. B. Lippincott & Co."),
        ("1984", "George Orwell", "Dystopian", 1949, 10.99, true, 328, "Secker & Warburg"),
        ("The Great Gatsby", "F. Scott Fitzgerald", "Fiction", 1925, 9.99, true, 180, "Charles Scribner's Sons"),
        ("Brave New World", "Aldous Huxley", "Dystopian", 1932, 11.50, false, 311, "Chatto & Windus"),
        ("The Hobbit", "J.R.R. Tolkien", "Fantasy", 1937, 14.99, true, 310, "George Allen & Unwin"),
        ("The Catcher in the Rye", "J.D. Salinger", "Fiction", 1951, 8.99, true, 224, "Little, Brown and Company"),
        ("Pride and Prejudice", "Jane Austen", "Romance", 1813, 7.99, true, 432, "T. Egerton"),
        ("The Lord of the Rings", "J.R.R. Tolkien", "Fantasy", 1954, 19.99, true, 1178, "Allen & Unwin"),
        ("Animal Farm", "George Orwell", "Political Satire", 1945, 8.50, false, 112, "Secker & Warburg"),
        ("The Alchemist", "Paulo Coelho", "Fiction", 1988, 10.99, true, 197, "HarperOne"),
        ("Moby Dick", "Herman Melville", "Adventure", 1851, 12.50, false, 635, "Harper & Brothers"),
        ("Wuthering Heights", "Emily Brontë", "Gothic Fiction", 1847, 9.99, true, 342, "Thomas Cautley Newby"),
        ("Harry Potter and the Philosopher's Stone", "J.K. Rowling", "Fantasy", 1997, 15.99, true, 223, "Bloomsbury"),
        ("Harry Potter and the Chamber of Secrets", "J.K. Rowling", "Fantasy", 1998, 16.99, true, 251, "Bloomsbury"),
        ("Harry Potter and the Prisoner of Azkaban", "J.K. Rowling", "Fantasy", 1999, 17.99, true, 317, "Bloomsbury"),
        ("The Night Circus", "Erin Morgenstern", "Fantasy", 2011, 13.99, true, 387, "Doubleday"),
        ("The Martian", "Andy Weir", "Science Fiction", 2014, 12.99, false, 369, "Crown"),
    ]
    .into_iter()
    .map(|(title, author, genre, year, price, in_stock, pages, publisher)| {
        let mut item = CatalogItem::new(title, author, genre, year, price, in_stock);
        item.pages = Some(pages);
        item.publisher = Some(publisher.to_string());
        item
    })
    .collect()
}

/// Parses catalog items from a JSON array or from NDJSON (one object per line).
/// Input whose first non-blank byte is `[` is read as an array.
///
/// # Errors
/// Returns `Json` for a malformed array, `InvalidInput` naming the line for malformed
/// NDJSON or an item that fails validation.
pub fn parse_items<R: Read>(reader: R) -> Result<Vec<CatalogItem>, DbError> {
    let mut reader = BufReader::new(reader);
    let is_array = loop {
        let buf = reader.fill_buf()?;
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(i) => break buf[i] == b'[',
            None if buf.is_empty() => break false,
            None => {
                let n = buf.len();
                reader.consume(n);
            }
        }
    };
    let items: Vec<CatalogItem> = if is_array {
        serde_json::from_reader(reader)?
    } else {
        let mut items = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let item = serde_json::from_str(&line)
                .map_err(|e| DbError::InvalidInput(format!("line {}: {e}", i + 1)))?;
            items.push(item);
        }
        items
    };
    for item in &items {
        item.validate()?;
    }
    Ok(items)
}

/// # Errors
/// See [`parse_items`]; also `Io` if the file cannot be opened.
pub fn load_items(path: &Path) -> Result<Vec<CatalogItem>, DbError> {
    let file = std::fs::File::open(path)
        .map_err(|e| DbError::Io(format!("cannot open seed file {}: {e}", path.display())))?;
    let items = parse_items(file)?;
    log::info!("loaded {} items from {}", items.len(), path.display());
    Ok(items)
}

/// Inserts `items` in order, stopping at the first failure.
///
/// # Errors
/// Propagates validation and store errors.
pub fn seed_store<S: CatalogStore + ?Sized>(store: &S, items: &[CatalogItem]) -> Result<SeedReport, DbError> {
    let mut report = SeedReport::default();
    for item in items {
        store.insert_item(item)?;
        report.inserted += 1;
    }
    log::info!(target: "bookstore::audit", "seeded {} items", report.inserted);
    Ok(report)
}
