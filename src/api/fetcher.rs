// src/api/fetcher.rs
//! Assembly of one page export: properties, block tree, tracked references.

use std::sync::Arc;

use futures::future::BoxFuture;

use super::{fetch_all_pages, NotionRepository, RateLimiter};
use crate::constants::{
    NOTION_MAX_FETCH_DEPTH, RETRY_INITIAL_DELAY, RETRY_MAX_ATTEMPTS, RETRY_MAX_DELAY,
};
use crate::error::AppError;
use crate::error_recovery::retry_with_backoff;
use crate::model::{Block, PageExport};
use crate::refs::collect_page_refs;
use crate::types::{NotionId, Warning, WarningLevel};

/// Fetches a page and its full block tree, producing a [`PageExport`]
/// annotated with every page-reference site found in it.
///
/// Child pages and child databases appear as single blocks; their own
/// content belongs to separate exports and is never descended into.
pub struct PageFetcher {
    repo: Arc<dyn NotionRepository>,
    limiter: Arc<RateLimiter>,
    max_depth: u8,
}

impl PageFetcher {
    pub fn new(repo: Arc<dyn NotionRepository>, limiter: Arc<RateLimiter>, max_depth: u8) -> Self {
        let max_depth = max_depth.min(NOTION_MAX_FETCH_DEPTH);
        Self {
            repo,
            limiter,
            max_depth,
        }
    }

    /// Retrieves the page object and its block tree, then records the
    /// tracked references the resolver will consume.
    pub async fn fetch(&self, id: &NotionId) -> Result<PageExport, AppError> {
        log::info!("Fetching page {}", id);
        let page = retry_with_backoff(
            || self.limiter.execute(|| self.repo.retrieve_page(id)),
            RETRY_MAX_ATTEMPTS,
            RETRY_INITIAL_DELAY,
            RETRY_MAX_DELAY,
        )
        .await?;

        let mut warnings = Vec::new();
        let blocks = self
            .fetch_tree(id.clone(), self.max_depth, &mut warnings)
            .await?;

        let mut export = PageExport::new(page, blocks);
        export.page_refs = collect_page_refs(&export.page, &export.blocks);
        export.warnings = warnings;

        log::info!(
            "Fetched page '{}': {} top-level blocks, {} reference sites",
            export.page.title,
            export.blocks.len(),
            export.page_refs.len()
        );
        Ok(export)
    }

    /// Lists a block's children and descends into nested containers.
    fn fetch_tree<'a>(
        &'a self,
        parent: NotionId,
        depth: u8,
        warnings: &'a mut Vec<Warning>,
    ) -> BoxFuture<'a, Result<Vec<Block>, AppError>> {
        Box::pin(async move {
            let mut blocks = fetch_all_pages(|cursor| self.fetch_children(&parent, cursor)).await?;

            for block in &mut blocks {
                if !block.has_children() || !descends(block) {
                    continue;
                }
                if depth == 0 {
                    log::warn!(
                        "Depth limit reached at block {}; nested content omitted",
                        block.id()
                    );
                    warnings.push(
                        Warning::new(
                            WarningLevel::Warning,
                            "Depth limit reached; nested content omitted",
                        )
                        .with_context(block.id().to_string()),
                    );
                    continue;
                }
                let children = self
                    .fetch_tree(block.id().clone(), depth - 1, &mut *warnings)
                    .await?;
                block.set_children(children);
            }

            Ok(blocks)
        })
    }

    async fn fetch_children(
        &self,
        id: &NotionId,
        cursor: Option<String>,
    ) -> Result<super::PaginatedResponse<Block>, AppError> {
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

/// Whether a block's children belong to this page's tree.
fn descends(block: &Block) -> bool {
    !matches!(block, Block::ChildPage(_) | Block::ChildDatabase(_))
}
