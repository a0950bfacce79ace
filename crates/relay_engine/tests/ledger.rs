use std::fs;

use pretty_assertions::assert_eq;
use relay_engine::{filter_new, Ledger, LedgerEntries, LedgerError, Post};
use tempfile::TempDir;

fn urls(posts: &[Post]) -> Vec<String> {
    posts.iter().map(|post| post.url.clone()).collect()
}

fn posts(urls: &[&str]) -> Vec<Post> {
    urls.iter().map(|url| Post::new(*url, "title")).collect()
}

fn ledger_in(temp: &TempDir, content: &str) -> Ledger {
    let path = temp.path().join("savedPosts.json");
    fs::write(&path, content).unwrap();
    Ledger::new(path)
}

#[test]
fn filter_new_returns_unseen_in_input_order() {
    let entries = LedgerEntries::from_urls(vec!["b".to_string(), "d".to_string()]);
    let fresh = filter_new(posts(&["a", "b", "c", "d", "e"]), &entries);
    assert_eq!(urls(&fresh), vec!["a", "c", "e"]);
}

#[test]
fn filter_new_is_idempotent_after_append() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp, r#"["x"]"#);

    let mut entries = ledger.load().unwrap();
    let fresh = filter_new(posts(&["x", "y", "z"]), &entries);
    assert_eq!(urls(&fresh), vec!["y", "z"]);

    ledger.append(&mut entries, urls(&fresh)).unwrap();
    let reloaded = ledger.load().unwrap();
    assert!(filter_new(posts(&["x", "y", "z"]), &reloaded).is_empty());
}

#[test]
fn duplicate_entries_are_tolerated_on_read() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp, r#"["a", "a", "b"]"#);
    let entries = ledger.load().unwrap();
    assert_eq!(entries.len(), 3);
    assert_eq!(urls(&filter_new(posts(&["a", "c"]), &entries)), vec!["c"]);
}

#[test]
fn append_grows_by_exactly_the_appended_count_without_dedup() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp, r#"["a", "b"]"#);
    let mut entries = ledger.load().unwrap();

    ledger
        .append(&mut entries, vec!["b".to_string(), "c".to_string()])
        .unwrap();

    let reloaded = ledger.load().unwrap();
    assert_eq!(reloaded.len(), 4);
    assert_eq!(reloaded.urls(), &["a", "b", "b", "c"]);
    assert!(reloaded.contains("c"));
}

#[test]
fn append_writes_four_space_json() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp, "[]");
    let mut entries = ledger.load().unwrap();
    ledger
        .append(&mut entries, vec!["https://i.redd.it/a.jpg".to_string()])
        .unwrap();

    let text = fs::read_to_string(ledger.path()).unwrap();
    assert_eq!(text, "[\n    \"https://i.redd.it/a.jpg\"\n]");
}

#[test]
fn missing_file_is_not_found() {
    let temp = TempDir::new().unwrap();
    let ledger = Ledger::new(temp.path().join("absent.json"));
    assert!(matches!(ledger.load(), Err(LedgerError::NotFound(_))));
}

#[test]
fn malformed_file_is_parse_error() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp, r#"{"not": "a list"}"#);
    assert!(matches!(ledger.load(), Err(LedgerError::Parse(_))));
}

#[test]
fn ensure_exists_creates_empty_list_once() {
    let temp = TempDir::new().unwrap();
    let ledger = Ledger::new(temp.path().join("savedPosts.json"));

    assert!(ledger.ensure_exists().unwrap());
    assert!(ledger.load().unwrap().is_empty());

    let mut entries = ledger.load().unwrap();
    ledger.append(&mut entries, vec!["a".to_string()]).unwrap();
    assert!(!ledger.ensure_exists().unwrap());
    assert_eq!(ledger.load().unwrap().len(), 1);
}

#[test]
fn compact_collapses_duplicates_keeping_first_order() {
    let temp = TempDir::new().unwrap();
    let ledger = ledger_in(&temp, r#"["b", "a", "b", "c", "a"]"#);

    assert_eq!(ledger.compact().unwrap(), 2);
    assert_eq!(ledger.load().unwrap().urls(), &["b", "a", "c"]);
    assert_eq!(ledger.compact().unwrap(), 0);
}
