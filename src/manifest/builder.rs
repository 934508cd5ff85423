// src/manifest/builder.rs
//! Workspace crawler that populates the manifest.
//!
//! Starting from a root database or page, the builder discovers every
//! reachable database, pages through its rows, and records each row's
//! published URL. One database or branch failing is logged and skipped; the
//! crawl continues and the manifest is saved with whatever did succeed.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use futures::future::BoxFuture;

use crate::api::{NotionRepository, RateLimiter};
use crate::constants::{RETRY_INITIAL_DELAY, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY};
use crate::error::{classify_database_fetch_failure, AppError};
use crate::error_recovery::retry_with_backoff;
use crate::manifest::{ManifestEntry, ManifestStore};
use crate::model::{Block, Database, Page};
use crate::refs::classify;
use crate::types::{NotionId, PropertyName};

/// Settings for one manifest build.
#[derive(Debug, Clone)]
pub struct ManifestBuilderConfig {
    /// Page property holding the published URL, e.g. `"Publish URL"`.
    pub url_property_name: PropertyName,
    /// Directory the manifest file lives in.
    pub manifest_dir: PathBuf,
    /// How deep to walk block trees when the root is a page.
    pub max_depth: u8,
}

/// What one build run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Databases whose rows were paged through.
    pub databases_scanned: usize,
    /// Distinct pages seen across all databases.
    pub pages_visited: usize,
    /// Pages whose URL property produced a manifest entry.
    pub entries_written: usize,
    /// Databases or block branches abandoned after an error.
    pub branches_skipped: usize,
}

/// Mutable state threaded through one crawl.
///
/// Recording and walking are deduplicated separately: a page descended into
/// as a `child_page` block can still be recorded later when it turns up as a
/// database row, but nothing is recorded or walked twice.
struct Crawl {
    store: ManifestStore,
    recorded_pages: HashSet<NotionId>,
    walked_pages: HashSet<NotionId>,
    visited_databases: HashSet<NotionId>,
    report: BuildReport,
}

/// Crawls a workspace subtree and upserts published URLs into the manifest.
pub struct ManifestBuilder {
    repo: Arc<dyn NotionRepository>,
    limiter: Arc<RateLimiter>,
    config: ManifestBuilderConfig,
}

impl ManifestBuilder {
    pub fn new(
        repo: Arc<dyn NotionRepository>,
        limiter: Arc<RateLimiter>,
        config: ManifestBuilderConfig,
    ) -> Self {
        Self {
            repo,
            limiter,
            config,
        }
    }

    /// Runs one build: initialize the store, crawl from `root`, save.
    ///
    /// The store is loaded exactly once at the start and saved exactly once
    /// at the end, no matter how many branches failed in between. Existing
    /// entries are never cleared; the crawl is a pure upsert, so pages that
    /// lost their URL property keep their previous entry.
    pub async fn build(&self, root: &NotionId) -> Result<BuildReport, AppError> {
        let store = ManifestStore::initialize(&self.config.manifest_dir, root)?;
        let mut crawl = Crawl {
            store,
            recorded_pages: HashSet::new(),
            walked_pages: HashSet::new(),
            visited_databases: HashSet::new(),
            report: BuildReport::default(),
        };

        // A root can be either a database or a page. Probe the database
        // endpoint first; on any failure, walk the root as a page and scan
        // every child_database found in its block tree. A failing probe
        // never aborts the build, so the save below always happens.
        match self.fetch_database(root).await {
            Ok(database) => self.scan_database(&database, &mut crawl).await,
            Err(err) => {
                log::info!(
                    "Root {} is not a queryable database ({}); scanning its block tree instead",
                    root,
                    classify_database_fetch_failure(&err)
                );
                crawl.walked_pages.insert(root.clone());
                self.scan_children(root, self.config.max_depth, &mut crawl)
                    .await;
            }
        }

        crawl.store.save()?;
        log::info!(
            "Manifest build for {} finished: {} databases scanned, {}/{} pages recorded, {} branches skipped",
            root,
            crawl.report.databases_scanned,
            crawl.report.entries_written,
            crawl.report.pages_visited,
            crawl.report.branches_skipped
        );
        Ok(crawl.report)
    }

    /// Pages through one database's rows and records their published URLs.
    ///
    /// Rows are recorded from the query results alone; their block trees are
    /// not fetched. A query failure abandons the rest of this database but
    /// not the build.
    async fn scan_database(&self, database: &Database, crawl: &mut Crawl) {
        if !crawl.visited_databases.insert(database.id.clone()) {
            return;
        }
        crawl.report.databases_scanned += 1;
        log::info!(
            "Scanning database '{}' ({})",
            database.title.as_plain_text(),
            database.id
        );

        let mut cursor: Option<String> = None;
        loop {
            let batch = match self.fetch_query_page(&database.id, cursor).await {
                Ok(batch) => batch,
                Err(err) => {
                    log::warn!(
                        "Abandoning database {}: {}",
                        database.id,
                        classify_database_fetch_failure(&err)
                    );
                    crawl.report.branches_skipped += 1;
                    return;
                }
            };

            for page in &batch.results {
                self.record_page(page, crawl);
            }

            if !batch.has_more {
                break;
            }
            match batch.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }
    }

    /// Records one page's published URL, once per build run.
    ///
    /// Pages without a usable URL are skipped silently: no entry is created
    /// and any previous entry is left in place.
    fn record_page(&self, page: &Page, crawl: &mut Crawl) {
        if !crawl.recorded_pages.insert(page.id.clone()) {
            return;
        }
        crawl.report.pages_visited += 1;

        match classify::published_url_from_page(page, &self.config.url_property_name) {
            Some(url) => {
                crawl
                    .store
                    .update_entry(page.id.clone(), ManifestEntry::from_property(url.into_string()));
                crawl.report.entries_written += 1;
            }
            None => log::debug!(
                "Page {} has no usable '{}' property",
                page.id,
                self.config.url_property_name
            ),
        }
    }

    /// Walks a block tree looking for databases to scan.
    ///
    /// `child_database` blocks are retrieved and scanned, `child_page` blocks
    /// are recursed into, and container blocks with children are descended
    /// through. Listing failures skip the branch, not the build.
    fn scan_children<'a>(
        &'a self,
        container: &'a NotionId,
        depth: u8,
        crawl: &'a mut Crawl,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if depth == 0 {
                log::warn!(
                    "Depth limit reached under {}; skipping deeper blocks",
                    container
                );
                crawl.report.branches_skipped += 1;
                return;
            }

            let mut cursor: Option<String> = None;
            loop {
                let batch = match self.fetch_children_page(container, cursor).await {
                    Ok(batch) => batch,
                    Err(err) => {
                        log::warn!("Abandoning block branch {}: {}", container, err);
                        crawl.report.branches_skipped += 1;
                        return;
                    }
                };

                for block in &batch.results {
                    self.scan_block(block, depth, crawl).await;
                }

                if !batch.has_more {
                    break;
                }
                match batch.next_cursor {
                    Some(next) => cursor = Some(next),
                    None => break,
                }
            }
        })
    }

    async fn scan_block(&self, block: &Block, depth: u8, crawl: &mut Crawl) {
        match block {
            Block::ChildDatabase(child) => {
                if crawl.visited_databases.contains(&child.common.id) {
                    return;
                }
                match self.fetch_database(&child.common.id).await {
                    Ok(database) => self.scan_database(&database, crawl).await,
                    Err(err) => {
                        log::warn!(
                            "Skipping database '{}' ({}): {}",
                            child.title,
                            child.common.id,
                            classify_database_fetch_failure(&err)
                        );
                        crawl.report.branches_skipped += 1;
                    }
                }
            }
            Block::ChildPage(child) => {
                if !crawl.walked_pages.insert(child.common.id.clone()) {
                    return;
                }
                self.scan_children(&child.common.id, depth - 1, crawl).await;
            }
            other if other.has_children() => {
                self.scan_children(other.id(), depth - 1, crawl).await;
            }
            _ => {}
        }
    }

    async fn fetch_database(&self, id: &NotionId) -> Result<Database, AppError> {
        retry_with_backoff(
            || self.limiter.execute(|| self.repo.retrieve_database(id)),
            RETRY_MAX_ATTEMPTS,
            RETRY_INITIAL_DELAY,
            RETRY_MAX_DELAY,
        )
        .await
    }

    async fn fetch_query_page(
        &self,
        id: &NotionId,
        cursor: Option<String>,
    ) -> Result<crate::api::PaginatedResponse<Page>, AppError> {
        retry_with_backoff(
            || {
                self.limiter
                    .execute(|| self.repo.query_database(id, cursor.clone()))
            },
            RETRY_MAX_ATTEMPTS,
            RETRY_INITIAL_DELAY,
            RETRY_MAX_DELAY,
        )
        .await
    }

    async fn fetch_children_page(
        &self,
        id: &NotionId,
        cursor: Option<String>,
    ) -> Result<crate::api::PaginatedResponse<Block>, AppError> {
        retry_with_backoff(
            || {
                self.limiter
                    .execute(|| self.repo.list_children(id, cursor.clone()))
            },
            RETRY_MAX_ATTEMPTS,
            RETRY_INITIAL_DELAY,
            RETRY_MAX_DELAY,
        )
        .await
    }
}
