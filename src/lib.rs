// src/lib.rs
//! notion2docs library — exports Notion pages as portable documents with
//! workspace-internal links resolved to externally publishable URLs.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling** — `AppError`, `ValidationError`
//! - **Configuration** — `ManifestRunConfig`, `ExportRunConfig`
//! - **Domain model** — `Page`, `Database`, `Block`, `PageExport`, etc.
//! - **Domain types** — `NotionId`, `ApiKey`, `PropertyName`, etc.
//! - **API client** — `NotionRepository`, `NotionHttpClient`, `PageFetcher`,
//!   `RateLimiter`
//! - **Manifest** — `ManifestStore`, `ManifestBuilder`
//! - **Reference handling** — `PageReferenceHandler`, classification

pub mod api;
pub mod config;
pub mod constants;
pub mod error;
mod error_recovery;
pub mod manifest;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod refs;
pub mod types;

// --- Error Handling ---
pub use crate::error::{AppError, DatabaseFetchFailure, NotionErrorCode};
pub use crate::refs::PageRefError;
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::{ExportRunConfig, ManifestRunConfig};

// --- Domain Model ---
pub use crate::model::{
    Block, BlockCommon, BlockPath, Database, DatabaseTitle, Page, PageExport, PageTitle, Parent,
    PropertyKind, PropertyValue, RefLocation, RichTextItem, RichTextType, TrackedBlockReference,
};

// --- Domain Types ---
pub use crate::types::{ApiKey, NotionId, PropertyName, PortableDocument, ValidatedUrl};

// --- API Client ---
pub use crate::api::{
    NotionHttpClient, NotionRepository, PageFetcher, PaginatedResponse, RateLimiter,
};

// --- Manifest ---
pub use crate::manifest::{
    BuildReport, Manifest, ManifestBuilder, ManifestBuilderConfig, ManifestEntry, ManifestStore,
    UrlSource,
};

// --- Reference Handling ---
pub use crate::refs::{
    collect_page_refs, PageRefConfig, PageRefKind, PageReferenceHandler, UrlTransform,
};

// --- Pipeline Traits ---
pub use crate::pipeline::{ContentSource, DocumentDelivery, ReferenceResolver};
