// src/api/mod.rs
//! Notion API interaction — the ability to retrieve content from a workspace.
//!
//! This module separates I/O (the HTTP client), parsing (JSON into the
//! domain model), pacing (the rate limiter), and assembly (the page
//! fetcher). Business logic depends on the [`NotionRepository`] trait,
//! never on HTTP details.

pub mod client;
mod fetcher;
mod pagination;
pub mod parser;
mod rate_limit;

use crate::error::AppError;
use crate::model::{Block, Database, Page};
use crate::types::NotionId;

pub use client::NotionHttpClient;
pub use fetcher::PageFetcher;
pub use pagination::fetch_all_pages;
pub use rate_limit::RateLimiter;

/// The ability to retrieve content from a Notion workspace.
///
/// Four endpoints cover everything this tool consumes. All of them are
/// idempotent reads and safe to retry; the paginated ones hand back one
/// batch per call and a cursor for the next.
#[async_trait::async_trait]
pub trait NotionRepository: Send + Sync {
    async fn retrieve_page(&self, id: &NotionId) -> Result<Page, AppError>;

    async fn retrieve_database(&self, id: &NotionId) -> Result<Database, AppError>;

    /// One batch of a database's rows, starting at `cursor`.
    async fn query_database(
        &self,
        id: &NotionId,
        cursor: Option<String>,
    ) -> Result<PaginatedResponse<Page>, AppError>;

    /// One batch of a block's direct children, starting at `cursor`.
    async fn list_children(
        &self,
        id: &NotionId,
        cursor: Option<String>,
    ) -> Result<PaginatedResponse<Block>, AppError>;
}

/// One batch of a cursor-paginated Notion listing.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginatedResponse<T> {
    pub results: Vec<T>,
    pub has_more: bool,
    pub next_cursor: Option<String>,
}

impl<T> PaginatedResponse<T> {
    /// A single complete batch with no further pages. The shape every
    /// in-memory test fixture returns.
    pub fn complete(results: Vec<T>) -> Self {
        Self {
            results,
            has_more: false,
            next_cursor: None,
        }
    }
}
