// src/manifest/mod.rs
//! Durable map from workspace page IDs to published URLs.
//!
//! The manifest is a JSON file kept next to the exported documents. It is
//! rebuilt incrementally: every crawl upserts the pages it saw and leaves
//! everything else in place, so a page that has become unreachable keeps
//! resolving through the last URL we learned for it.

mod builder;
mod store;

pub use builder::{BuildReport, ManifestBuilder, ManifestBuilderConfig};
pub use store::ManifestStore;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::NotionId;

/// On-disk manifest document.
///
/// Entry order is preserved across load/save cycles so diffs of the file
/// stay reviewable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// When any entry was last added, replaced, or removed.
    pub last_updated: DateTime<Utc>,
    /// Resolved URLs keyed by canonical (hyphenated) page ID.
    pub references: IndexMap<NotionId, ManifestEntry>,
}

impl Manifest {
    pub(crate) fn empty() -> Self {
        Self {
            last_updated: Utc::now(),
            references: IndexMap::new(),
        }
    }
}

/// A single resolved page URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Published URL for the page.
    pub url: String,
    /// Where the URL was learned when the entry was written. Preserved
    /// verbatim across load/save cycles.
    pub source: UrlSource,
    /// When this entry was last written.
    pub last_updated: DateTime<Utc>,
}

impl ManifestEntry {
    /// Entry freshly extracted from a page's URL property.
    pub fn from_property(url: String) -> Self {
        Self {
            url,
            source: UrlSource::Property,
            last_updated: Utc::now(),
        }
    }

    /// Entry carried forward from an existing manifest file.
    pub fn from_manifest(url: String) -> Self {
        Self {
            url,
            source: UrlSource::Manifest,
            last_updated: Utc::now(),
        }
    }
}

/// Provenance of a manifest entry's URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlSource {
    /// Extracted from the page's URL property.
    Property,
    /// Carried in from another, previously built manifest.
    Manifest,
}
