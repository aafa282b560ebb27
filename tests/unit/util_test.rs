//! Tests for utility functions

use prometheus_limiter::core::{Channel, Collection, Key};
use prometheus_limiter::util::init_tracing;

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}

#[test]
fn test_channel_names() {
    let names: Vec<_> = Channel::ALL.iter().map(|c| c.as_str()).collect();
    assert_eq!(names, vec!["iteration", "done", "error"]);
    assert_eq!(Channel::Error.to_string(), "error");
}

#[test]
fn test_collection_from_btreemap_is_sorted_by_key() {
    let mut map = std::collections::BTreeMap::new();
    map.insert("b".to_string(), 2);
    map.insert("a".to_string(), 1);
    let collection = Collection::from(map);
    let keys: Vec<_> = collection.keys().cloned().collect();
    assert_eq!(keys, vec![Key::from("a"), Key::from("b")]);
}

#[test]
fn test_key_accessors() {
    assert_eq!(Key::Index(3).as_index(), Some(3));
    assert_eq!(Key::Index(3).as_name(), None);
    assert_eq!(Key::from("3").as_name(), Some("3"));
    assert_eq!(Key::from("3").as_index(), None);
}
