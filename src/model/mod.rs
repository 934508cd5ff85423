mod block;
pub mod blocks;
pub mod common;
pub mod properties;

pub use block::Block;
pub use blocks::*;
pub use common::*;
pub use properties::*;

use crate::types::{NotionId, PropertyName, Warning};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A Notion page as returned by page retrieval or a database query:
/// identity, properties, and placement, but no block content. Blocks are
/// fetched separately and travel alongside in a [`PageExport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: NotionId,
    pub title: PageTitle,
    pub url: String,
    pub properties: HashMap<PropertyName, PropertyValue>,
    pub parent: Option<Parent>,
    pub archived: bool,
}

impl Page {
    /// Get the page title
    pub fn title(&self) -> &PageTitle {
        &self.title
    }

    /// Look up a property by name.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Mutable property lookup, for in-place rewriting.
    pub fn property_mut(&mut self, name: &str) -> Option<&mut PropertyValue> {
        self.properties.get_mut(name)
    }
}

/// A Notion database, trimmed to what a workspace crawl needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub id: NotionId,
    pub title: DatabaseTitle,
    pub url: String,
    pub archived: bool,
}

impl Database {
    /// Get the database title
    pub fn title(&self) -> &DatabaseTitle {
        &self.title
    }
}

/// Parent reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Parent {
    #[serde(rename = "page_id")]
    Page { page_id: NotionId },
    #[serde(rename = "database_id")]
    Database { database_id: NotionId },
    #[serde(rename = "block_id")]
    Block { block_id: NotionId },
    #[serde(rename = "workspace")]
    Workspace,
}

/// Page title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageTitle(String);

impl PageTitle {
    pub fn new(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PageTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseTitle(Vec<RichTextItem>);

impl DatabaseTitle {
    pub fn new(items: Vec<RichTextItem>) -> Self {
        Self(items)
    }

    pub fn as_plain_text(&self) -> String {
        self.0
            .iter()
            .map(|item| item.plain_text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

impl fmt::Display for DatabaseTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_plain_text())
    }
}

/// A page plus its fetched block tree and the reference bookkeeping
/// collected along the way. This is the unit the resolver operates on and
/// the compose stage serializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageExport {
    pub page: Page,
    pub blocks: Vec<Block>,
    pub page_refs: Vec<TrackedBlockReference>,
    #[serde(skip)]
    pub warnings: Vec<Warning>,
}

impl PageExport {
    pub fn new(page: Page, blocks: Vec<Block>) -> Self {
        Self {
            page,
            blocks,
            page_refs: Vec::new(),
            warnings: Vec::new(),
        }
    }
}

/// A handle on one page-reference site inside a fetched export.
///
/// The handle stores where the reference lives, not a pointer into the tree,
/// so exports stay plain owned data and the resolver re-derives access at
/// rewrite time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedBlockReference {
    /// The page whose export contains this reference.
    pub parent_id: NotionId,
    /// The block carrying the reference; for property references, the page
    /// itself.
    pub block_id: NotionId,
    #[serde(flatten)]
    pub location: RefLocation,
}

/// Where inside the export a tracked reference sits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RefLocation {
    /// A block in the tree, addressed by child indices from the root.
    Block { path: BlockPath },
    /// A rich text page property.
    Property { name: PropertyName },
}

/// Index path from the export's top-level block list down to one block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockPath(Vec<usize>);

impl BlockPath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Follow the path through a block tree. Returns `None` when the tree no
    /// longer matches the shape the path was recorded against.
    pub fn resolve<'a>(&self, blocks: &'a [Block]) -> Option<&'a Block> {
        let (first, rest) = self.0.split_first()?;
        let mut current = blocks.get(*first)?;
        for &idx in rest {
            current = current.children().get(idx)?;
        }
        Some(current)
    }

    /// Mutable variant of [`BlockPath::resolve`].
    pub fn resolve_mut<'a>(&self, blocks: &'a mut [Block]) -> Option<&'a mut Block> {
        let (first, rest) = self.0.split_first()?;
        let mut current = blocks.get_mut(*first)?;
        for &idx in rest {
            current = current.children_mut().get_mut(idx)?;
        }
        Some(current)
    }
}

impl fmt::Display for BlockPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "{}", parts.join("."))
    }
}
