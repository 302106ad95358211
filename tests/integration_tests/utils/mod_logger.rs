use bookstore::logger::{app_config, init_for_app, parse_level};
use log::LevelFilter;

#[test]
fn level_names() {
    assert_eq!(parse_level("trace").unwrap(), LevelFilter::Trace);
    assert_eq!(parse_level("Error").unwrap(), LevelFilter::Error);
    assert!(parse_level("").is_err());
}

#[test]
fn app_logging_writes_into_the_log_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("bookstore_logs");
    assert!(app_config(&dir, "bookstore", LevelFilter::Debug).is_ok());
    for stem in ["bookstore", "bookstore_audit", "bookstore_metrics"] {
        assert!(dir.join(format!("{stem}.log")).exists(), "{stem}.log missing");
    }
    // only one logger per process; whichever test installs it first wins
    if init_for_app(&dir, "bookstore", LevelFilter::Info).is_ok() {
        log::info!(target: "bookstore::audit", "audit line");
        assert!(init_for_app(&dir, "bookstore", LevelFilter::Info).is_err());
    }
}
