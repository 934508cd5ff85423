//! Manifest builds against an in-memory workspace.

mod common;

use std::sync::Arc;

use common::{
    child_database, child_page, database, nid, page, paragraph, scratch_dir, toggle_with_children,
    FakeWorkspace, URL_PROPERTY,
};
use notion2docs::{
    ManifestBuilder, ManifestBuilderConfig, ManifestEntry, ManifestStore, RateLimiter,
    RichTextItem,
};
use pretty_assertions::assert_eq;

fn builder(workspace: FakeWorkspace, dir: std::path::PathBuf) -> ManifestBuilder {
    ManifestBuilder::new(
        Arc::new(workspace),
        Arc::new(RateLimiter::new(1000)),
        ManifestBuilderConfig {
            url_property_name: URL_PROPERTY.into(),
            manifest_dir: dir,
            max_depth: 5,
        },
    )
}

#[tokio::test]
async fn database_root_records_rows_with_publish_urls() {
    let dir = scratch_dir("db-root");
    let root = nid(1);

    let mut workspace = FakeWorkspace::default();
    workspace.databases.insert(root.clone(), database(&root, "Docs"));
    workspace.rows.insert(
        root.clone(),
        vec![
            page(&nid(10), "Intro", Some("https://docs.example.com/intro")),
            page(&nid(11), "Draft", None),
            page(&nid(12), "Guide", Some("https://docs.example.com/guide")),
            // Relative paths never reach the manifest.
            page(&nid(13), "Broken", Some("/guide")),
        ],
    );

    let report = builder(workspace, dir.clone()).build(&root).await.unwrap();
    assert_eq!(report.databases_scanned, 1);
    assert_eq!(report.pages_visited, 4);
    assert_eq!(report.entries_written, 2);
    assert_eq!(report.branches_skipped, 0);

    let store = ManifestStore::initialize(&dir, &root).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(
        store.entry(&nid(10)).unwrap().url,
        "https://docs.example.com/intro"
    );
    assert!(!store.has_entry(&nid(11)));
    assert!(!store.has_entry(&nid(13)));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn query_pagination_is_followed_to_the_end() {
    let dir = scratch_dir("paged");
    let root = nid(1);

    let mut workspace = FakeWorkspace::default();
    workspace.databases.insert(root.clone(), database(&root, "Docs"));
    workspace.paged_rows.insert(
        root.clone(),
        vec![
            vec![page(&nid(10), "A", Some("https://docs.example.com/a"))],
            vec![page(&nid(11), "B", Some("https://docs.example.com/b"))],
            vec![page(&nid(12), "C", Some("https://docs.example.com/c"))],
        ],
    );

    let report = builder(workspace, dir.clone()).build(&root).await.unwrap();
    assert_eq!(report.entries_written, 3);

    let store = ManifestStore::initialize(&dir, &root).unwrap();
    assert!(store.has_entry(&nid(12)));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn page_root_scans_databases_found_in_its_block_tree() {
    let dir = scratch_dir("page-root");
    let root = nid(1);
    let inner_db = nid(2);
    let sub_page = nid(3);
    let nested_db = nid(4);
    let toggle = nid(5);

    let mut workspace = FakeWorkspace::default();
    // Root is a page, not a database: block tree holds a database, a toggle
    // hiding another database, and a sub-page with a third level below it.
    workspace.children.insert(
        root.clone(),
        vec![
            paragraph(&nid(20), vec![RichTextItem::plain_text("welcome")]),
            child_database(&inner_db, "Docs"),
            toggle_with_children(&toggle),
            child_page(&sub_page, "Area"),
        ],
    );
    workspace
        .children
        .insert(toggle.clone(), vec![child_database(&nested_db, "More Docs")]);
    workspace
        .children
        .insert(sub_page.clone(), vec![child_database(&nested_db, "More Docs")]);
    workspace
        .databases
        .insert(inner_db.clone(), database(&inner_db, "Docs"));
    workspace
        .databases
        .insert(nested_db.clone(), database(&nested_db, "More Docs"));
    workspace.rows.insert(
        inner_db.clone(),
        vec![page(&nid(10), "One", Some("https://docs.example.com/one"))],
    );
    workspace.rows.insert(
        nested_db.clone(),
        vec![page(&nid(11), "Two", Some("https://docs.example.com/two"))],
    );

    let report = builder(workspace, dir.clone()).build(&root).await.unwrap();
    // The nested database is reachable twice but scanned once.
    assert_eq!(report.databases_scanned, 2);
    assert_eq!(report.entries_written, 2);

    let store = ManifestStore::initialize(&dir, &root).unwrap();
    assert!(store.has_entry(&nid(10)));
    assert!(store.has_entry(&nid(11)));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn one_failing_database_does_not_abort_the_build() {
    let dir = scratch_dir("fail-isolation");
    let root = nid(1);
    let good_db = nid(2);
    let bad_db = nid(3);

    let mut workspace = FakeWorkspace::default();
    workspace.children.insert(
        root.clone(),
        vec![
            child_database(&bad_db, "Restricted"),
            child_database(&good_db, "Docs"),
        ],
    );
    workspace.failing.insert(bad_db);
    workspace
        .databases
        .insert(good_db.clone(), database(&good_db, "Docs"));
    workspace.rows.insert(
        good_db.clone(),
        vec![page(&nid(10), "One", Some("https://docs.example.com/one"))],
    );

    let report = builder(workspace, dir.clone()).build(&root).await.unwrap();
    assert_eq!(report.branches_skipped, 1);
    assert_eq!(report.entries_written, 1);

    let store = ManifestStore::initialize(&dir, &root).unwrap();
    assert!(store.has_entry(&nid(10)));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn rebuild_upserts_without_pruning_unreached_pages() {
    let dir = scratch_dir("upsert");
    let root = nid(1);

    // Seed an entry for a page the upcoming crawl will not see.
    let mut seed = ManifestStore::initialize(&dir, &root).unwrap();
    seed.update_entry(
        nid(99),
        ManifestEntry::from_property("https://docs.example.com/ghost".to_string()),
    );
    seed.update_entry(
        nid(10),
        ManifestEntry::from_property("https://docs.example.com/old".to_string()),
    );
    let ghost = seed.entry(&nid(99)).unwrap().clone();
    seed.save().unwrap();

    let mut workspace = FakeWorkspace::default();
    workspace.databases.insert(root.clone(), database(&root, "Docs"));
    workspace.rows.insert(
        root.clone(),
        vec![page(&nid(10), "One", Some("https://docs.example.com/new"))],
    );

    builder(workspace, dir.clone()).build(&root).await.unwrap();

    let store = ManifestStore::initialize(&dir, &root).unwrap();
    assert_eq!(store.len(), 2);
    assert_eq!(store.entry(&nid(10)).unwrap().url, "https://docs.example.com/new");
    // The untouched entry is exactly what the previous run wrote, source
    // and timestamp included.
    assert_eq!(store.entry(&nid(99)), Some(&ghost));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn transport_failure_probing_the_root_still_saves_the_manifest() {
    let dir = scratch_dir("root-probe");
    let root = nid(1);
    let inner_db = nid(2);

    // The root probe dies below the API layer; the page-root fallback still
    // runs and the build still saves what it found.
    let mut workspace = FakeWorkspace::default();
    workspace.hard_failing.insert(root.clone());
    workspace
        .children
        .insert(root.clone(), vec![child_database(&inner_db, "Docs")]);
    workspace
        .databases
        .insert(inner_db.clone(), database(&inner_db, "Docs"));
    workspace.rows.insert(
        inner_db.clone(),
        vec![page(&nid(10), "One", Some("https://docs.example.com/one"))],
    );

    let report = builder(workspace, dir.clone()).build(&root).await.unwrap();
    assert_eq!(report.entries_written, 1);

    let store = ManifestStore::initialize(&dir, &root).unwrap();
    assert!(store.has_entry(&nid(10)));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn depth_limit_stops_the_block_walk() {
    let dir = scratch_dir("depth");
    let root = nid(1);
    let toggle = nid(5);
    let deep_db = nid(2);

    let mut workspace = FakeWorkspace::default();
    workspace
        .children
        .insert(root.clone(), vec![toggle_with_children(&toggle)]);
    workspace
        .children
        .insert(toggle.clone(), vec![child_database(&deep_db, "Too Deep")]);
    workspace
        .databases
        .insert(deep_db.clone(), database(&deep_db, "Too Deep"));
    workspace.rows.insert(
        deep_db.clone(),
        vec![page(&nid(10), "One", Some("https://docs.example.com/one"))],
    );

    let shallow = ManifestBuilder::new(
        Arc::new(workspace),
        Arc::new(RateLimiter::new(1000)),
        ManifestBuilderConfig {
            url_property_name: URL_PROPERTY.into(),
            manifest_dir: dir.clone(),
            max_depth: 1,
        },
    );
    let report = shallow.build(&root).await.unwrap();
    assert_eq!(report.databases_scanned, 0);
    assert!(report.branches_skipped > 0);

    std::fs::remove_dir_all(&dir).unwrap();
}
