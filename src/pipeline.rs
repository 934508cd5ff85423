// src/pipeline.rs
//! Pipeline capability traits — the three stages of one page export.
//!
//! Each trait describes a single capability, enabling testing each stage in
//! isolation.

use crate::error::AppError;
use crate::manifest::ManifestStore;
use crate::model::PageExport;
use crate::output::OutputReport;
use crate::types::{NotionId, PortableDocument};

/// Retrieves a page export by ID.
#[async_trait::async_trait]
pub trait ContentSource {
    async fn fetch(&self, id: &NotionId) -> Result<PageExport, AppError>;
}

/// Rewrites an export's page references against a manifest.
pub trait ReferenceResolver {
    fn resolve(&self, store: &mut ManifestStore, export: &mut PageExport)
        -> Result<(), AppError>;
}

/// Delivers a composed document to its destinations.
pub trait DocumentDelivery {
    fn deliver(&self, document: PortableDocument) -> Result<OutputReport, AppError>;
}
