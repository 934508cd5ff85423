// src/refs/classify.rs
//! Pure classification of page references.
//!
//! Nothing here touches the network or the manifest; given a block, a rich
//! text span, a property, or a URL, these functions answer one question:
//! does this point at a Notion page, and if so, which one?

use crate::model::{
    Block, FormulaResult, MentionData, MentionType, Page, PropertyKind, PropertyValue,
    RichTextItem, RichTextType,
};
use crate::types::{NotionId, PropertyName, ValidatedUrl};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

/// The encodings a page reference can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRefKind {
    /// A `link_to_page` block carrying the target's ID directly.
    LinkToPage,
    /// A `child_page` block; the block's own ID is the sub-page's ID.
    ChildPage,
    /// A page mention span in rich text.
    PageMention,
    /// A link-preview mention whose URL points into Notion.
    LinkPreviewMention,
    /// A plain text span hyperlinked to a Notion URL.
    TextLink,
}

impl PageRefKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LinkToPage => "link_to_page",
            Self::ChildPage => "child_page",
            Self::PageMention => "page_mention",
            Self::LinkPreviewMention => "link_preview_mention",
            Self::TextLink => "text_link",
        }
    }
}

/// Classify a block as a page reference and name its target.
///
/// For rich-text-bearing blocks, the first span that classifies wins; the
/// resolver still rewrites every matching span when it visits the block.
pub fn classify_block(block: &Block) -> Option<(PageRefKind, NotionId)> {
    match block {
        Block::LinkToPage(b) => Some((PageRefKind::LinkToPage, b.page_id.clone())),
        Block::ChildPage(b) => Some((PageRefKind::ChildPage, b.common.id.clone())),
        _ => block
            .rich_text()?
            .iter()
            .find_map(classify_span),
    }
}

/// Classify a single rich text span as a page reference.
pub fn classify_span(item: &RichTextItem) -> Option<(PageRefKind, NotionId)> {
    match &item.text_type {
        RichTextType::Mention(MentionData { mention_type }) => match mention_type {
            MentionType::Page { page } => Some((PageRefKind::PageMention, page.id.clone())),
            MentionType::LinkPreview { link_preview } => {
                extract_notion_page_id_from_url(&link_preview.url)
                    .map(|id| (PageRefKind::LinkPreviewMention, id))
            }
            _ => None,
        },
        RichTextType::Text {
            link: Some(link), ..
        } => extract_notion_page_id_from_url(&link.url).map(|id| (PageRefKind::TextLink, id)),
        _ => None,
    }
}

static PATH_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:^|[/-])([0-9a-f]{32}|[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12})$",
    )
    .expect("Failed to compile path ID regex - this is a bug in the code")
});

/// Pull a page ID out of a Notion URL.
///
/// Recognizes absolute URLs on a canonical Notion host whose path ends in an
/// ID (bare, slug-prefixed, raw or hyphenated), plus the root-relative
/// `/<id>` shape Notion emits for in-workspace links. Query strings and
/// fragments are ignored. Anything else — other hosts, workspace subdomains,
/// malformed input — is not a page reference.
pub fn extract_notion_page_id_from_url(raw: &str) -> Option<NotionId> {
    let raw = raw.trim();

    if let Some(rest) = raw.strip_prefix('/') {
        // Reject protocol-relative URLs; "//host/path" is not a local path.
        if rest.starts_with('/') {
            return None;
        }
        let candidate = rest.split(['?', '#']).next().unwrap_or(rest);
        if candidate.contains('/') {
            return None;
        }
        return id_at_path_end(candidate);
    }

    let url = Url::parse(raw).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    if !is_notion_host(url.host_str()?) {
        return None;
    }
    id_at_path_end(url.path())
}

/// Whether a host is Notion itself.
///
/// Only the canonical hosts count. Workspace subdomains (`acme.notion.so`)
/// and unrelated products (`notion.site`) serve published content whose URLs
/// must pass through untouched.
pub fn is_notion_host(host: &str) -> bool {
    matches!(
        host,
        "notion.so" | "www.notion.so" | "notion.com" | "www.notion.com"
    )
}

fn id_at_path_end(path: &str) -> Option<NotionId> {
    let captures = PATH_ID_RE.captures(path)?;
    NotionId::parse(captures.get(1)?.as_str()).ok()
}

/// Read a candidate publish URL out of a page property, unvalidated.
///
/// `url` properties yield their value, `rich_text` yields its first span's
/// plain text, and string-valued formulas yield their result. Every other
/// property kind is None. Whitespace-only values count as absent. Callers
/// own validation; pair this with [`ValidatedUrl::parse`] before trusting
/// the result.
pub fn extract_url_from_property(value: &PropertyValue) -> Option<String> {
    let raw = match &value.kind {
        PropertyKind::Url { url } => url.clone()?,
        PropertyKind::RichText { rich_text } => rich_text.first()?.plain_text.clone(),
        PropertyKind::Formula {
            formula: FormulaResult::String(result),
        } => result.clone()?,
        _ => return None,
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// The validated publish URL a page declares for itself, if any.
///
/// This is the single choke point both the manifest builder and the
/// resolver's self-registration go through, so relative paths and junk
/// never reach the manifest from either direction.
pub fn published_url_from_page(page: &Page, property: &PropertyName) -> Option<ValidatedUrl> {
    let value = page.property(property.as_str())?;
    let raw = extract_url_from_property(value)?;
    match ValidatedUrl::parse(&raw) {
        Ok(url) => Some(url),
        Err(err) => {
            log::debug!(
                "Page {} property '{}' holds an unusable URL: {}",
                page.id,
                property,
                err
            );
            None
        }
    }
}
