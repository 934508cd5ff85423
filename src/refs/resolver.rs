// src/refs/resolver.rs
//! In-place rewriting of page references to published URLs.
//!
//! The resolver walks the tracked references a fetch produced, looks each
//! target up in the manifest, and writes the resolved URL back into the
//! exact field the encoding requires. Targets with no manifest entry are
//! left byte-for-byte as fetched; one unresolved link never aborts a page.

use super::classify;
use super::PageRefError;
use crate::error::AppError;
use crate::manifest::{ManifestEntry, ManifestStore};
use crate::model::{
    Block, MentionData, MentionType, PageExport, PropertyKind, RefLocation, RichTextItem,
    RichTextType, TrackedBlockReference,
};
use crate::types::PropertyName;
use url::Url;

/// Rewrites a resolved URL before it is applied, e.g. to route it through a
/// redirect service. Always receives the full URL from the manifest.
pub type UrlTransform = Box<dyn Fn(&str) -> String + Send + Sync>;

/// Settings for one reference handler.
pub struct PageRefConfig {
    /// Page property holding the published URL, e.g. `"Publish URL"`.
    pub url_property_name: PropertyName,
    /// Emit only the URL's path component instead of the full URL.
    pub use_url_path: bool,
    /// Applied to every resolved URL; takes precedence over `use_url_path`.
    pub transform_url: Option<UrlTransform>,
    /// Log per-reference failures and keep going instead of aborting.
    pub fail_forward: bool,
}

impl PageRefConfig {
    pub fn new(url_property_name: impl Into<PropertyName>) -> Self {
        Self {
            url_property_name: url_property_name.into(),
            use_url_path: false,
            transform_url: None,
            fail_forward: false,
        }
    }
}

impl std::fmt::Debug for PageRefConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageRefConfig")
            .field("url_property_name", &self.url_property_name)
            .field("use_url_path", &self.use_url_path)
            .field("transform_url", &self.transform_url.is_some())
            .field("fail_forward", &self.fail_forward)
            .finish()
    }
}

/// Resolves tracked page references against a manifest.
pub struct PageReferenceHandler {
    config: PageRefConfig,
}

impl PageReferenceHandler {
    /// An empty URL property name can never self-register or build a
    /// manifest worth resolving against, so it fails construction.
    pub fn new(config: PageRefConfig) -> Result<Self, PageRefError> {
        if config.url_property_name.is_empty() {
            return Err(PageRefError::MissingUrlProperty);
        }
        Ok(Self { config })
    }

    /// Runs one resolution pass over an export.
    ///
    /// First the export's own publish URL, if it declares one, is upserted
    /// into the manifest, so pages learn about each other as they are
    /// converted. Then every tracked reference is resolved and rewritten in
    /// place; the tracked list is consumed by the pass. The caller observes
    /// the rewritten tree through the same export, and is responsible for
    /// saving the store.
    pub fn process(
        &self,
        store: &mut ManifestStore,
        export: &mut PageExport,
    ) -> Result<(), AppError> {
        self.register_self(store, export);

        let refs = std::mem::take(&mut export.page_refs);
        let mut resolved = 0usize;
        for tracked in &refs {
            match self.resolve_one(store, export, tracked) {
                Ok(true) => resolved += 1,
                Ok(false) => {}
                Err(err) if self.config.fail_forward => {
                    log::warn!("Skipping reference in {}: {}", tracked.parent_id, err);
                }
                Err(err) => return Err(err.into()),
            }
        }

        log::debug!(
            "Resolved {}/{} references in page {}",
            resolved,
            refs.len(),
            export.page.id
        );
        Ok(())
    }

    /// Records the current page's own publish URL in the manifest.
    fn register_self(&self, store: &mut ManifestStore, export: &PageExport) {
        let Some(url) =
            classify::published_url_from_page(&export.page, &self.config.url_property_name)
        else {
            return;
        };
        log::debug!("Registering {} -> {}", export.page.id, url);
        store.update_entry(
            export.page.id.clone(),
            ManifestEntry::from_property(url.into_string()),
        );
    }

    /// Rewrites one tracked reference. `Ok(true)` means a URL was applied;
    /// `Ok(false)` means the target has no manifest entry and the site was
    /// left untouched.
    fn resolve_one(
        &self,
        store: &ManifestStore,
        export: &mut PageExport,
        tracked: &TrackedBlockReference,
    ) -> Result<bool, PageRefError> {
        match &tracked.location {
            RefLocation::Block { path } => {
                let block =
                    path.resolve_mut(&mut export.blocks)
                        .ok_or_else(|| PageRefError::StalePath {
                            parent_id: tracked.parent_id.to_string(),
                            path: path.to_string(),
                        })?;
                Ok(self.rewrite_block(store, block))
            }
            RefLocation::Property { name } => {
                let value = export.page.property_mut(name.as_str()).ok_or_else(|| {
                    PageRefError::MissingProperty {
                        parent_id: tracked.parent_id.to_string(),
                        name: name.to_string(),
                    }
                })?;
                let spans = match &mut value.kind {
                    PropertyKind::Title { title } => title,
                    PropertyKind::RichText { rich_text } => rich_text,
                    _ => return Ok(false),
                };
                Ok(self.rewrite_spans(store, spans))
            }
        }
    }

    fn rewrite_block(&self, store: &ManifestStore, block: &mut Block) -> bool {
        match block {
            Block::LinkToPage(b) => match self.resolved_url(store, &b.page_id) {
                Some(url) => {
                    b.url = Some(url);
                    true
                }
                None => false,
            },
            Block::ChildPage(b) => match self.resolved_url(store, &b.common.id) {
                Some(url) => {
                    b.url = Some(url);
                    true
                }
                None => false,
            },
            other => match other.rich_text_mut() {
                Some(spans) => self.rewrite_spans(store, spans),
                None => false,
            },
        }
    }

    /// Rewrites every span in a run that classifies as a page reference,
    /// not only the one that made the block classify.
    fn rewrite_spans(&self, store: &ManifestStore, spans: &mut [RichTextItem]) -> bool {
        let mut any = false;
        for span in spans {
            let Some((_, target)) = classify::classify_span(span) else {
                continue;
            };
            let Some(url) = self.resolved_url(store, &target) else {
                continue;
            };
            match &mut span.text_type {
                RichTextType::Mention(MentionData {
                    mention_type: MentionType::Page { page },
                }) => {
                    page.url = Some(url.clone());
                }
                RichTextType::Mention(MentionData {
                    mention_type: MentionType::LinkPreview { link_preview },
                }) => {
                    link_preview.url = url.clone();
                }
                RichTextType::Text {
                    link: Some(link), ..
                } => {
                    link.url = url.clone();
                }
                _ => continue,
            }
            span.href = Some(url);
            any = true;
        }
        any
    }

    /// Manifest lookup plus output shaping. `None` when the target has no
    /// entry — the caller leaves the reference as it was fetched.
    fn resolved_url(&self, store: &ManifestStore, target: &crate::types::NotionId) -> Option<String> {
        let entry = store.entry(target)?;
        Some(self.output_url(&entry.url))
    }

    fn output_url(&self, full: &str) -> String {
        if let Some(transform) = &self.config.transform_url {
            return transform(full);
        }
        if self.config.use_url_path {
            if let Ok(parsed) = Url::parse(full) {
                return parsed.path().to_string();
            }
            // Manifest entries are validated absolute URLs; an unparseable
            // one still resolves to something rather than nothing.
        }
        full.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        BlockCommon, LinkToPageBlock, Page, PageTitle, ParagraphBlock, PropertyValue,
        TextBlockContent,
    };
    use crate::refs::collect_page_refs;
    use crate::types::NotionId;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    const TARGET_RAW: &str = "1107e9d7682d455287113965a3979313";

    fn target() -> NotionId {
        NotionId::parse(TARGET_RAW).unwrap()
    }

    fn store_with_target() -> ManifestStore {
        let dir = std::env::temp_dir().join(format!("notion2docs-test-{}", NotionId::new_v4()));
        let mut store = ManifestStore::initialize(&dir, &NotionId::new_v4()).unwrap();
        store.update_entry(
            target(),
            ManifestEntry::from_property("https://x/final".to_string()),
        );
        store
    }

    fn export_with_link() -> PageExport {
        let page = Page {
            id: NotionId::new_v4(),
            title: PageTitle::new("Source"),
            url: "https://www.notion.so/source".to_string(),
            properties: HashMap::new(),
            parent: None,
            archived: false,
        };
        let blocks = vec![Block::LinkToPage(LinkToPageBlock {
            common: BlockCommon::default(),
            page_id: target(),
            url: None,
        })];
        let mut export = PageExport::new(page, blocks);
        export.page_refs = collect_page_refs(&export.page, &export.blocks);
        export
    }

    fn link_url(export: &PageExport) -> Option<String> {
        match &export.blocks[0] {
            Block::LinkToPage(b) => b.url.clone(),
            other => panic!("expected link_to_page, got {}", other.block_type()),
        }
    }

    #[test]
    fn test_empty_property_name_fails_construction() {
        assert_eq!(
            PageReferenceHandler::new(PageRefConfig::new("")).err(),
            Some(PageRefError::MissingUrlProperty)
        );
    }

    #[test]
    fn test_raw_form_id_resolves_through_hyphenated_manifest_key() {
        let mut store = store_with_target();
        let mut export = export_with_link();
        let handler = PageReferenceHandler::new(PageRefConfig::new("Publish URL")).unwrap();

        handler.process(&mut store, &mut export).unwrap();
        assert_eq!(link_url(&export).as_deref(), Some("https://x/final"));
        // The pass consumes the tracked references.
        assert!(export.page_refs.is_empty());
    }

    #[test]
    fn test_use_url_path_emits_path_only() {
        let mut store = store_with_target();
        let mut export = export_with_link();
        let mut config = PageRefConfig::new("Publish URL");
        config.use_url_path = true;
        let handler = PageReferenceHandler::new(config).unwrap();

        handler.process(&mut store, &mut export).unwrap();
        assert_eq!(link_url(&export).as_deref(), Some("/final"));
    }

    #[test]
    fn test_transform_wins_over_use_url_path() {
        let mut store = store_with_target();
        let mut export = export_with_link();
        let mut config = PageRefConfig::new("Publish URL");
        config.use_url_path = true;
        config.transform_url = Some(Box::new(|url: &str| url.to_uppercase()));
        let handler = PageReferenceHandler::new(config).unwrap();

        handler.process(&mut store, &mut export).unwrap();
        assert_eq!(link_url(&export).as_deref(), Some("HTTPS://X/FINAL"));
    }

    #[test]
    fn test_unresolved_reference_is_left_untouched() {
        let dir = std::env::temp_dir().join(format!("notion2docs-test-{}", NotionId::new_v4()));
        let mut store = ManifestStore::initialize(&dir, &NotionId::new_v4()).unwrap();
        let mut export = export_with_link();
        let before = serde_json::to_string(&export.blocks[0]).unwrap();
        let handler = PageReferenceHandler::new(PageRefConfig::new("Publish URL")).unwrap();

        handler.process(&mut store, &mut export).unwrap();
        let after = serde_json::to_string(&export.blocks[0]).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_self_registration_upserts_current_page() {
        let mut store = store_with_target();
        let mut export = export_with_link();
        export.page.properties.insert(
            "Publish URL".into(),
            PropertyValue::new(
                "u1",
                PropertyKind::Url {
                    url: Some("https://x/self".to_string()),
                },
            ),
        );
        let page_id = export.page.id.clone();
        let handler = PageReferenceHandler::new(PageRefConfig::new("Publish URL")).unwrap();

        handler.process(&mut store, &mut export).unwrap();
        assert_eq!(store.entry(&page_id).unwrap().url, "https://x/self");
    }

    #[test]
    fn test_text_link_rewrites_href_and_link_url() {
        let mut store = store_with_target();
        let page = Page {
            id: NotionId::new_v4(),
            title: PageTitle::new("Source"),
            url: "https://www.notion.so/source".to_string(),
            properties: HashMap::new(),
            parent: None,
            archived: false,
        };
        let notion_url = format!("https://www.notion.so/Target-{}", TARGET_RAW);
        let blocks = vec![Block::Paragraph(ParagraphBlock {
            common: BlockCommon::default(),
            content: TextBlockContent::from_rich_text(vec![
                RichTextItem::text_link("see the target", &notion_url),
                RichTextItem::text_link("external", "https://example.com/stays"),
            ]),
        })];
        let mut export = PageExport::new(page, blocks);
        export.page_refs = collect_page_refs(&export.page, &export.blocks);
        let handler = PageReferenceHandler::new(PageRefConfig::new("Publish URL")).unwrap();

        handler.process(&mut store, &mut export).unwrap();
        let spans = export.blocks[0].rich_text().unwrap();
        assert_eq!(spans[0].href.as_deref(), Some("https://x/final"));
        match &spans[0].text_type {
            RichTextType::Text { link: Some(link), .. } => {
                assert_eq!(link.url, "https://x/final")
            }
            other => panic!("expected text link, got {:?}", other),
        }
        // The external link in the same run is untouched.
        assert_eq!(spans[1].href.as_deref(), Some("https://example.com/stays"));
    }

    #[test]
    fn test_stale_path_fails_or_is_skipped_by_policy() {
        let mut store = store_with_target();
        let mut export = export_with_link();
        // Invalidate the tracked path by clearing the tree.
        export.blocks.clear();

        let strict = PageReferenceHandler::new(PageRefConfig::new("Publish URL")).unwrap();
        assert!(strict.process(&mut store, &mut export).is_err());

        let mut export = export_with_link();
        export.blocks.clear();
        let mut config = PageRefConfig::new("Publish URL");
        config.fail_forward = true;
        let forgiving = PageReferenceHandler::new(config).unwrap();
        assert!(forgiving.process(&mut store, &mut export).is_ok());
    }

    #[test]
    fn test_page_mention_in_property_is_rewritten() {
        let mut store = store_with_target();
        let page = Page {
            id: NotionId::new_v4(),
            title: PageTitle::new("Source"),
            url: "https://www.notion.so/source".to_string(),
            properties: HashMap::from([(
                "Related".into(),
                PropertyValue::new(
                    "r1",
                    PropertyKind::RichText {
                        rich_text: vec![RichTextItem::page_mention(target())],
                    },
                ),
            )]),
            parent: None,
            archived: false,
        };
        let mut export = PageExport::new(page, vec![]);
        export.page_refs = collect_page_refs(&export.page, &export.blocks);
        let handler = PageReferenceHandler::new(PageRefConfig::new("Publish URL")).unwrap();

        handler.process(&mut store, &mut export).unwrap();
        let value = export.page.property("Related").unwrap();
        match &value.kind {
            PropertyKind::RichText { rich_text } => {
                assert_eq!(rich_text[0].href.as_deref(), Some("https://x/final"));
            }
            other => panic!("expected rich text property, got {:?}", other),
        }
    }
}
