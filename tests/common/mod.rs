//! Shared fixtures: an in-memory workspace standing in for the Notion API.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;

use notion2docs::model::{
    Block, BlockCommon, ChildDatabaseBlock, ChildPageBlock, LinkToPageBlock, ParagraphBlock,
    TextBlockContent, ToggleBlock,
};
use notion2docs::{
    AppError, Database, DatabaseTitle, NotionErrorCode, NotionId, NotionRepository, Page,
    PageTitle, PaginatedResponse, PropertyKind, PropertyValue, RichTextItem,
};

pub const URL_PROPERTY: &str = "Publish URL";

/// Deterministic ID from a small seed, stable across runs.
pub fn nid(seed: u8) -> NotionId {
    NotionId::parse(&format!("{:032x}", seed as u128 + 1)).unwrap()
}

/// A unique scratch directory for one test's manifest files.
pub fn scratch_dir(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("notion2docs-{}-{}", label, NotionId::new_v4()))
}

pub fn page(id: &NotionId, title: &str, publish_url: Option<&str>) -> Page {
    let mut properties = HashMap::new();
    if let Some(url) = publish_url {
        properties.insert(
            URL_PROPERTY.into(),
            PropertyValue::new(
                "prop",
                PropertyKind::Url {
                    url: Some(url.to_string()),
                },
            ),
        );
    }
    Page {
        id: id.clone(),
        title: PageTitle::new(title),
        url: format!("https://www.notion.so/{}", id.as_simple()),
        properties,
        parent: None,
        archived: false,
    }
}

pub fn database(id: &NotionId, title: &str) -> Database {
    Database {
        id: id.clone(),
        title: DatabaseTitle::new(vec![RichTextItem::plain_text(title)]),
        url: format!("https://www.notion.so/{}", id.as_simple()),
        archived: false,
    }
}

pub fn paragraph(id: &NotionId, spans: Vec<RichTextItem>) -> Block {
    Block::Paragraph(ParagraphBlock {
        common: BlockCommon::new(id.clone()),
        content: TextBlockContent::from_rich_text(spans),
    })
}

/// A toggle whose children live behind a separate `list_children` call.
pub fn toggle_with_children(id: &NotionId) -> Block {
    Block::Toggle(ToggleBlock {
        common: BlockCommon {
            id: id.clone(),
            children: Vec::new(),
            has_children: true,
            archived: false,
        },
        content: TextBlockContent::from_rich_text(vec![RichTextItem::plain_text("details")]),
    })
}

pub fn link_to_page(block_id: &NotionId, target: &NotionId) -> Block {
    Block::LinkToPage(LinkToPageBlock {
        common: BlockCommon::new(block_id.clone()),
        page_id: target.clone(),
        url: None,
    })
}

pub fn child_page(page_id: &NotionId, title: &str) -> Block {
    Block::ChildPage(ChildPageBlock {
        common: BlockCommon::new(page_id.clone()),
        title: title.to_string(),
        url: None,
    })
}

pub fn child_database(db_id: &NotionId, title: &str) -> Block {
    Block::ChildDatabase(ChildDatabaseBlock {
        common: BlockCommon::new(db_id.clone()),
        title: title.to_string(),
    })
}

fn not_found(id: &NotionId) -> AppError {
    AppError::NotionService {
        code: NotionErrorCode::ObjectNotFound,
        message: format!("Could not find object with ID: {}", id),
        status: None,
    }
}

/// In-memory [`NotionRepository`]. Pages, databases, database rows, and
/// block children are plain maps; IDs listed in `failing` error with a
/// non-retryable permission failure instead.
#[derive(Default)]
pub struct FakeWorkspace {
    pub pages: HashMap<NotionId, Page>,
    pub databases: HashMap<NotionId, Database>,
    pub rows: HashMap<NotionId, Vec<Page>>,
    /// Row batches keyed by database, served one per call; takes precedence
    /// over `rows` for databases present in both.
    pub paged_rows: HashMap<NotionId, Vec<Vec<Page>>>,
    pub children: HashMap<NotionId, Vec<Block>>,
    pub failing: HashSet<NotionId>,
    /// Database IDs that fail with a transport-level error instead of a
    /// typed API error.
    pub hard_failing: HashSet<NotionId>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeWorkspace {
    pub fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }
}

#[async_trait::async_trait]
impl NotionRepository for FakeWorkspace {
    async fn retrieve_page(&self, id: &NotionId) -> Result<Page, AppError> {
        self.record(format!("page:{}", id));
        self.pages.get(id).cloned().ok_or_else(|| not_found(id))
    }

    async fn retrieve_database(&self, id: &NotionId) -> Result<Database, AppError> {
        self.record(format!("database:{}", id));
        if self.hard_failing.contains(id) {
            return Err(AppError::MalformedResponse(
                "connection reset mid-body".to_string(),
            ));
        }
        if self.failing.contains(id) {
            return Err(AppError::NotionService {
                code: NotionErrorCode::RestrictedResource,
                message: "integration lacks access".to_string(),
                status: None,
            });
        }
        self.databases.get(id).cloned().ok_or_else(|| not_found(id))
    }

    async fn query_database(
        &self,
        id: &NotionId,
        cursor: Option<String>,
    ) -> Result<PaginatedResponse<Page>, AppError> {
        self.record(format!("query:{}", id));
        if let Some(batches) = self.paged_rows.get(id) {
            let index: usize = cursor.as_deref().map_or(0, |c| c.parse().unwrap());
            let batch = batches.get(index).cloned().unwrap_or_default();
            let has_more = index + 1 < batches.len();
            return Ok(PaginatedResponse {
                results: batch,
                has_more,
                next_cursor: has_more.then(|| (index + 1).to_string()),
            });
        }
        match self.rows.get(id) {
            Some(rows) => Ok(PaginatedResponse::complete(rows.clone())),
            None => Err(not_found(id)),
        }
    }

    async fn list_children(
        &self,
        id: &NotionId,
        _cursor: Option<String>,
    ) -> Result<PaginatedResponse<Block>, AppError> {
        self.record(format!("children:{}", id));
        if self.failing.contains(id) {
            return Err(AppError::NotionService {
                code: NotionErrorCode::RestrictedResource,
                message: "integration lacks access".to_string(),
                status: None,
            });
        }
        Ok(PaginatedResponse::complete(
            self.children.get(id).cloned().unwrap_or_default(),
        ))
    }
}
