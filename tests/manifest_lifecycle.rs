//! Manifest store behavior across load/modify/save cycles.

mod common;

use common::{nid, scratch_dir};
use notion2docs::{ManifestEntry, ManifestStore, NotionId, UrlSource};
use pretty_assertions::assert_eq;

#[test]
fn entries_survive_a_save_and_reload() {
    let dir = scratch_dir("lifecycle");
    let root = nid(1);

    let mut store = ManifestStore::initialize(&dir, &root).unwrap();
    assert!(store.is_empty());
    store.update_entry(
        nid(2),
        ManifestEntry::from_property("https://docs.example.com/getting-started".to_string()),
    );
    store.update_entry(
        nid(3),
        ManifestEntry::from_property("https://docs.example.com/reference".to_string()),
    );
    store.save().unwrap();

    let reloaded = ManifestStore::initialize(&dir, &root).unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(
        reloaded.entry(&nid(2)).unwrap().url,
        "https://docs.example.com/getting-started"
    );

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn round_trip_preserves_url_source_and_timestamp() {
    let dir = scratch_dir("round-trip");
    let root = nid(1);

    let mut store = ManifestStore::initialize(&dir, &root).unwrap();
    store.update_entry(
        nid(2),
        ManifestEntry::from_property("https://docs.example.com/a".to_string()),
    );
    store.update_entry(
        nid(3),
        ManifestEntry::from_manifest("https://docs.example.com/b".to_string()),
    );
    let written_a = store.entry(&nid(2)).unwrap().clone();
    let written_b = store.entry(&nid(3)).unwrap().clone();
    store.save().unwrap();

    let reloaded = ManifestStore::initialize(&dir, &root).unwrap();
    assert_eq!(reloaded.entry(&nid(2)), Some(&written_a));
    assert_eq!(reloaded.entry(&nid(3)), Some(&written_b));
    assert_eq!(reloaded.entry(&nid(2)).unwrap().source, UrlSource::Property);
    assert_eq!(reloaded.entry(&nid(3)).unwrap().source, UrlSource::Manifest);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn resaving_an_untouched_manifest_rewrites_the_file_byte_identically() {
    let dir = scratch_dir("untouched");
    let root = nid(1);

    let mut store = ManifestStore::initialize(&dir, &root).unwrap();
    store.update_entry(
        nid(2),
        ManifestEntry::from_property("https://docs.example.com/a".to_string()),
    );
    store.save().unwrap();
    let before = std::fs::read_to_string(store.path()).unwrap();

    // A load/save cycle with no updates in between must change nothing.
    let reloaded = ManifestStore::initialize(&dir, &root).unwrap();
    reloaded.save().unwrap();
    let after = std::fs::read_to_string(reloaded.path()).unwrap();
    assert_eq!(before, after);

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn raw_and_hyphenated_ids_address_the_same_entry() {
    let dir = scratch_dir("normalization");
    let root = nid(1);
    let raw = NotionId::parse("1107e9d7682d455287113965a3979313").unwrap();
    let hyphenated = NotionId::parse("1107e9d7-682d-4552-8711-3965a3979313").unwrap();

    let mut store = ManifestStore::initialize(&dir, &root).unwrap();
    store.update_entry(
        raw,
        ManifestEntry::from_property("https://docs.example.com/one".to_string()),
    );
    assert_eq!(store.len(), 1);
    assert!(store.has_entry(&hyphenated));
    store.save().unwrap();

    let reloaded = ManifestStore::initialize(&dir, &root).unwrap();
    assert!(reloaded.has_entry(&hyphenated));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn each_root_gets_its_own_manifest_file() {
    let dir = scratch_dir("per-root");

    let mut store_a = ManifestStore::initialize(&dir, &nid(1)).unwrap();
    store_a.update_entry(
        nid(10),
        ManifestEntry::from_property("https://a.example.com/".to_string()),
    );
    store_a.save().unwrap();

    let store_b = ManifestStore::initialize(&dir, &nid(2)).unwrap();
    assert!(store_b.is_empty());
    assert_ne!(store_a.path(), store_b.path());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn update_replaces_and_remove_is_a_no_op_when_absent() {
    let dir = scratch_dir("update-remove");
    let mut store = ManifestStore::initialize(&dir, &nid(1)).unwrap();

    store.update_entry(
        nid(2),
        ManifestEntry::from_property("https://docs.example.com/old".to_string()),
    );
    store.update_entry(
        nid(2),
        ManifestEntry::from_property("https://docs.example.com/new".to_string()),
    );
    assert_eq!(store.len(), 1);
    assert_eq!(store.entry(&nid(2)).unwrap().url, "https://docs.example.com/new");

    assert!(store.remove_entry(&nid(9)).is_none());
    assert!(store.remove_entry(&nid(2)).is_some());
    assert!(store.is_empty());

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn corrupt_manifest_file_is_a_parse_error_not_a_silent_reset() {
    let dir = scratch_dir("corrupt");
    let root = nid(1);

    let mut store = ManifestStore::initialize(&dir, &root).unwrap();
    store.update_entry(
        nid(2),
        ManifestEntry::from_property("https://docs.example.com/a".to_string()),
    );
    store.save().unwrap();

    std::fs::write(store.path(), "{ not json").unwrap();
    let err = ManifestStore::initialize(&dir, &root).unwrap_err();
    assert!(matches!(
        err,
        notion2docs::AppError::JsonParseError { .. }
    ));

    std::fs::remove_dir_all(&dir).unwrap();
}
