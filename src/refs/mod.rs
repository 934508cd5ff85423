//! Page reference handling: finding workspace-internal references in
//! fetched content, and rewriting them to published URLs.

use thiserror::Error;

pub mod classify;
mod resolver;
mod tracker;

pub use classify::PageRefKind;
pub use resolver::{PageRefConfig, PageReferenceHandler, UrlTransform};
pub use tracker::collect_page_refs;

/// Failures tied to a single tracked reference.
///
/// These stay separate from [`crate::error::AppError`]'s coarser categories
/// because the resolver's fail-forward mode needs to swallow exactly these
/// and nothing else.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PageRefError {
    #[error("a URL property name is required for reference resolution")]
    MissingUrlProperty,

    #[error("tracked path {path} no longer matches the block tree of page {parent_id}")]
    StalePath { parent_id: String, path: String },

    #[error("tracked property '{name}' is missing from page {parent_id}")]
    MissingProperty { parent_id: String, name: String },
}
