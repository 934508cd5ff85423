// src/api/parser.rs
//! Parsing of Notion API responses into the domain model.
//!
//! The wire format is taken apart by hand: every object the four consumed
//! endpoints return passes through here, and anything unrecognized is
//! preserved as an `Unsupported` block or `Other` property rather than
//! failing the whole response.

use super::client::ApiResponse;
use super::PaginatedResponse;
use crate::constants::ERROR_BODY_PREVIEW_LENGTH;
use crate::error::{AppError, NotionErrorCode};
use crate::model::{
    Annotations, Block, BlockCommon, BookmarkBlock, BulletedListItemBlock, CalloutBlock,
    ChildDatabaseBlock, ChildPageBlock, CodeBlock, Database, DatabaseReference, DatabaseTitle,
    DateValue, DividerBlock, EmbedBlock, EquationBlock, EquationData, ExternalFile, FileObject,
    FormulaResult, Heading1Block, Heading2Block, Heading3Block, Icon, ImageBlock, Link,
    LinkPreviewBlock, LinkPreviewReference, LinkToPageBlock, MentionData, MentionType,
    NotionFile, NumberedListItemBlock, Page, PageReference, PageTitle, ParagraphBlock, Parent,
    PartialUser, PropertyKind, PropertyValue, QuoteBlock, RichTextItem, RichTextType,
    SelectOption, TextBlockContent, ToDoBlock, ToggleBlock, UnsupportedBlock,
};
use crate::types::{Color, NotionId, PropertyName};
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::HashMap;

/// Parses a page retrieval response.
pub fn parse_page_response(result: ApiResponse<String>) -> Result<Page, AppError> {
    let value = success_body(result)?;
    page_from_value(&value)
}

/// Parses a database retrieval response.
pub fn parse_database_response(result: ApiResponse<String>) -> Result<Database, AppError> {
    let value = success_body(result)?;
    database_from_value(&value)
}

/// Parses one batch of a database query.
pub fn parse_query_response(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<Page>, AppError> {
    let value = success_body(result)?;
    let results = list_results(&value)?
        .iter()
        .map(page_from_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PaginatedResponse {
        results,
        has_more: value["has_more"].as_bool().unwrap_or(false),
        next_cursor: string_field(&value, "next_cursor"),
    })
}

/// Parses one batch of a block-children listing.
pub fn parse_children_response(
    result: ApiResponse<String>,
) -> Result<PaginatedResponse<Block>, AppError> {
    let value = success_body(result)?;
    let results = list_results(&value)?
        .iter()
        .map(block_from_value)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PaginatedResponse {
        results,
        has_more: value["has_more"].as_bool().unwrap_or(false),
        next_cursor: string_field(&value, "next_cursor"),
    })
}

/// Turns a raw response into JSON, converting non-2xx statuses into the
/// typed Notion error vocabulary.
fn success_body(result: ApiResponse<String>) -> Result<Value, AppError> {
    if !result.status.is_success() {
        return Err(error_from_body(&result.data, result.status, &result.url));
    }
    serde_json::from_str(&result.data).map_err(|e| {
        log::error!("Failed to parse response from {}: {}", result.url, e);
        AppError::MalformedResponse(format!(
            "{} (body: {})",
            e,
            preview(&result.data)
        ))
    })
}

/// Parses a Notion error body, falling back to the bare HTTP status when
/// the body is not the documented error shape.
fn error_from_body(body: &str, status: StatusCode, url: &str) -> AppError {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let (Some(code), Some(message)) = (value["code"].as_str(), value["message"].as_str()) {
            return AppError::NotionService {
                code: NotionErrorCode::from_api_response(code),
                message: message.to_string(),
                status: Some(status),
            };
        }
    }
    AppError::NotionService {
        code: NotionErrorCode::from_http_status(status.as_u16()),
        message: format!("HTTP {} from {}", status, url),
        status: Some(status),
    }
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_PREVIEW_LENGTH) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

fn list_results(value: &Value) -> Result<&Vec<Value>, AppError> {
    value["results"]
        .as_array()
        .ok_or_else(|| AppError::MalformedResponse("Missing 'results' array".to_string()))
}

fn string_field(value: &Value, field: &str) -> Option<String> {
    value[field].as_str().map(String::from)
}

fn id_field(value: &Value) -> Result<NotionId, AppError> {
    let raw = value["id"]
        .as_str()
        .ok_or_else(|| AppError::MalformedResponse("Object has no 'id' field".to_string()))?;
    Ok(NotionId::parse(raw)?)
}

// ---------------------------------------------------------------------------
// Pages and databases
// ---------------------------------------------------------------------------

fn page_from_value(value: &Value) -> Result<Page, AppError> {
    let id = id_field(value)?;
    let mut properties = HashMap::new();
    let mut title = PageTitle::new("Untitled");

    if let Some(map) = value["properties"].as_object() {
        for (name, prop) in map {
            let parsed = property_from_value(prop);
            if let PropertyKind::Title { title: items } = &parsed.kind {
                let text = plain_text(items);
                if !text.is_empty() {
                    title = PageTitle::new(text);
                }
            }
            properties.insert(PropertyName::from(name.as_str()), parsed);
        }
    }

    Ok(Page {
        id,
        title,
        url: string_field(value, "url").unwrap_or_default(),
        properties,
        parent: parent_from_value(&value["parent"]),
        archived: value["archived"].as_bool().unwrap_or(false),
    })
}

fn database_from_value(value: &Value) -> Result<Database, AppError> {
    Ok(Database {
        id: id_field(value)?,
        title: DatabaseTitle::new(rich_text_from_value(&value["title"])),
        url: string_field(value, "url").unwrap_or_default(),
        archived: value["archived"].as_bool().unwrap_or(false),
    })
}

fn parent_from_value(value: &Value) -> Option<Parent> {
    match value["type"].as_str()? {
        "page_id" => Some(Parent::Page {
            page_id: NotionId::parse(value["page_id"].as_str()?).ok()?,
        }),
        "database_id" => Some(Parent::Database {
            database_id: NotionId::parse(value["database_id"].as_str()?).ok()?,
        }),
        "block_id" => Some(Parent::Block {
            block_id: NotionId::parse(value["block_id"].as_str()?).ok()?,
        }),
        "workspace" => Some(Parent::Workspace),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

fn property_from_value(value: &Value) -> PropertyValue {
    let id = value["id"].as_str().unwrap_or_default();
    let kind = match value["type"].as_str().unwrap_or_default() {
        "title" => PropertyKind::Title {
            title: rich_text_from_value(&value["title"]),
        },
        "rich_text" => PropertyKind::RichText {
            rich_text: rich_text_from_value(&value["rich_text"]),
        },
        "url" => PropertyKind::Url {
            url: string_field(value, "url"),
        },
        "formula" => PropertyKind::Formula {
            formula: formula_from_value(&value["formula"]),
        },
        "number" => PropertyKind::Number {
            number: value["number"].as_f64(),
        },
        "select" => PropertyKind::Select {
            select: select_from_value(&value["select"]),
        },
        "checkbox" => PropertyKind::Checkbox {
            checkbox: value["checkbox"].as_bool().unwrap_or(false),
        },
        "date" => PropertyKind::Date {
            date: date_from_value(&value["date"]),
        },
        other => PropertyKind::Other {
            property_type: other.to_string(),
        },
    };
    PropertyValue::new(id, kind)
}

fn formula_from_value(value: &Value) -> FormulaResult {
    match value["type"].as_str().unwrap_or_default() {
        "string" => FormulaResult::String(string_field(value, "string")),
        "number" => FormulaResult::Number(value["number"].as_f64()),
        "boolean" => FormulaResult::Boolean(value["boolean"].as_bool()),
        "date" => FormulaResult::Date(date_from_value(&value["date"])),
        _ => FormulaResult::String(None),
    }
}

fn select_from_value(value: &Value) -> Option<SelectOption> {
    let obj = value.as_object()?;
    Some(SelectOption {
        id: obj.get("id")?.as_str().unwrap_or_default().to_string(),
        name: obj.get("name")?.as_str().unwrap_or_default().to_string(),
        color: color_from_value(&value["color"]),
    })
}

fn date_from_value(value: &Value) -> Option<DateValue> {
    Some(DateValue {
        start: value["start"].as_str()?.to_string(),
        end: string_field(value, "end"),
        time_zone: string_field(value, "time_zone"),
    })
}

fn color_from_value(value: &Value) -> Color {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Rich text
// ---------------------------------------------------------------------------

fn rich_text_from_value(value: &Value) -> Vec<RichTextItem> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(rich_text_item_from_value).collect())
        .unwrap_or_default()
}

fn rich_text_item_from_value(value: &Value) -> Option<RichTextItem> {
    let text_type = match value["type"].as_str()? {
        "text" => RichTextType::Text {
            content: value["text"]["content"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
            link: value["text"]["link"]["url"].as_str().map(|url| Link {
                url: url.to_string(),
            }),
        },
        "mention" => RichTextType::Mention(MentionData {
            mention_type: mention_from_value(&value["mention"])?,
        }),
        "equation" => RichTextType::Equation(EquationData {
            expression: value["equation"]["expression"]
                .as_str()
                .unwrap_or_default()
                .to_string(),
        }),
        _ => return None,
    };

    Some(RichTextItem {
        text_type,
        annotations: annotations_from_value(&value["annotations"]),
        plain_text: value["plain_text"].as_str().unwrap_or_default().to_string(),
        href: string_field(value, "href"),
    })
}

fn mention_from_value(value: &Value) -> Option<MentionType> {
    match value["type"].as_str()? {
        "page" => Some(MentionType::Page {
            page: PageReference {
                id: NotionId::parse(value["page"]["id"].as_str()?).ok()?,
                url: None,
            },
        }),
        "database" => Some(MentionType::Database {
            database: DatabaseReference {
                id: NotionId::parse(value["database"]["id"].as_str()?).ok()?,
            },
        }),
        "user" => Some(MentionType::User {
            user: PartialUser {
                id: value["user"]["id"].as_str()?.to_string(),
                name: value["user"]["name"].as_str().map(String::from),
                avatar_url: value["user"]["avatar_url"].as_str().map(String::from),
            },
        }),
        "date" => Some(MentionType::Date {
            date: date_from_value(&value["date"])?,
        }),
        "link_preview" => Some(MentionType::LinkPreview {
            link_preview: LinkPreviewReference {
                url: value["link_preview"]["url"].as_str()?.to_string(),
            },
        }),
        "link_mention" => Some(MentionType::LinkMention {
            url: value["link_mention"]["href"]
                .as_str()
                .or_else(|| value["link_mention"]["url"].as_str())?
                .to_string(),
        }),
        _ => None,
    }
}

fn annotations_from_value(value: &Value) -> Annotations {
    Annotations {
        bold: value["bold"].as_bool().unwrap_or(false),
        italic: value["italic"].as_bool().unwrap_or(false),
        strikethrough: value["strikethrough"].as_bool().unwrap_or(false),
        underline: value["underline"].as_bool().unwrap_or(false),
        code: value["code"].as_bool().unwrap_or(false),
        color: color_from_value(&value["color"]),
    }
}

fn plain_text(items: &[RichTextItem]) -> String {
    items
        .iter()
        .map(|item| item.plain_text.as_str())
        .collect::<Vec<_>>()
        .join("")
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

fn block_from_value(value: &Value) -> Result<Block, AppError> {
    let common = BlockCommon {
        id: id_field(value)?,
        children: Vec::new(),
        has_children: value["has_children"].as_bool().unwrap_or(false),
        archived: value["archived"].as_bool().unwrap_or(false),
    };

    let block_type = value["type"].as_str().unwrap_or_default();
    let payload = &value[block_type];

    let block = match block_type {
        "paragraph" => Block::Paragraph(ParagraphBlock {
            common,
            content: text_content(payload),
        }),
        "heading_1" => Block::Heading1(Heading1Block {
            common,
            content: text_content(payload),
        }),
        "heading_2" => Block::Heading2(Heading2Block {
            common,
            content: text_content(payload),
        }),
        "heading_3" => Block::Heading3(Heading3Block {
            common,
            content: text_content(payload),
        }),
        "bulleted_list_item" => Block::BulletedListItem(BulletedListItemBlock {
            common,
            content: text_content(payload),
        }),
        "numbered_list_item" => Block::NumberedListItem(NumberedListItemBlock {
            common,
            content: text_content(payload),
        }),
        "to_do" => Block::ToDo(ToDoBlock {
            common,
            content: text_content(payload),
            checked: payload["checked"].as_bool().unwrap_or(false),
        }),
        "toggle" => Block::Toggle(ToggleBlock {
            common,
            content: text_content(payload),
        }),
        "quote" => Block::Quote(QuoteBlock {
            common,
            content: text_content(payload),
        }),
        "callout" => Block::Callout(CalloutBlock {
            common,
            icon: icon_from_value(&payload["icon"]),
            content: text_content(payload),
        }),
        "code" => Block::Code(CodeBlock {
            common,
            language: payload["language"].as_str().unwrap_or_default().to_string(),
            caption: rich_text_from_value(&payload["caption"]),
            content: text_content(payload),
        }),
        "equation" => Block::Equation(EquationBlock {
            common,
            expression: payload["expression"].as_str().unwrap_or_default().to_string(),
        }),
        "divider" => Block::Divider(DividerBlock { common }),
        "image" => match file_object_from_value(payload) {
            Some(image) => Block::Image(ImageBlock {
                common,
                image,
                caption: rich_text_from_value(&payload["caption"]),
            }),
            None => unsupported(common, block_type),
        },
        "bookmark" => Block::Bookmark(BookmarkBlock {
            common,
            url: payload["url"].as_str().unwrap_or_default().to_string(),
            caption: rich_text_from_value(&payload["caption"]),
        }),
        "embed" => Block::Embed(EmbedBlock {
            common,
            url: payload["url"].as_str().unwrap_or_default().to_string(),
        }),
        "child_page" => Block::ChildPage(ChildPageBlock {
            common,
            title: payload["title"].as_str().unwrap_or_default().to_string(),
            url: None,
        }),
        "child_database" => Block::ChildDatabase(ChildDatabaseBlock {
            common,
            title: payload["title"].as_str().unwrap_or_default().to_string(),
        }),
        // link_to_page can target a database too; only the page form carries
        // a reference this tool resolves.
        "link_to_page" => match payload["page_id"]
            .as_str()
            .and_then(|raw| NotionId::parse(raw).ok())
        {
            Some(page_id) => Block::LinkToPage(LinkToPageBlock {
                common,
                page_id,
                url: None,
            }),
            None => unsupported(common, block_type),
        },
        "link_preview" => Block::LinkPreview(LinkPreviewBlock {
            common,
            url: payload["url"].as_str().unwrap_or_default().to_string(),
        }),
        other => unsupported(common, other),
    };

    Ok(block)
}

fn unsupported(common: BlockCommon, block_type: &str) -> Block {
    Block::Unsupported(UnsupportedBlock {
        common,
        block_type: block_type.to_string(),
    })
}

fn text_content(payload: &Value) -> TextBlockContent {
    TextBlockContent {
        rich_text: rich_text_from_value(&payload["rich_text"]),
        color: color_from_value(&payload["color"]),
    }
}

fn icon_from_value(value: &Value) -> Option<Icon> {
    match value["type"].as_str()? {
        "emoji" => Some(Icon::Emoji {
            emoji: value["emoji"].as_str()?.to_string(),
        }),
        "external" => Some(Icon::External {
            external: ExternalFile {
                url: value["external"]["url"].as_str()?.to_string(),
            },
        }),
        "file" => Some(Icon::File {
            file: NotionFile {
                url: value["file"]["url"].as_str()?.to_string(),
                expiry_time: value["file"]["expiry_time"]
                    .as_str()
                    .and_then(|s| s.parse().ok()),
            },
        }),
        _ => None,
    }
}

fn file_object_from_value(value: &Value) -> Option<FileObject> {
    match value["type"].as_str()? {
        "external" => Some(FileObject::External {
            external: ExternalFile {
                url: value["external"]["url"].as_str()?.to_string(),
            },
        }),
        "file" => Some(FileObject::File {
            file: NotionFile {
                url: value["file"]["url"].as_str()?.to_string(),
                expiry_time: value["file"]["expiry_time"]
                    .as_str()
                    .and_then(|s| s.parse().ok()),
            },
        }),
        _ => None,
    }
}
