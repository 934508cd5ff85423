use crate::types::{Color, NotionId, PropertyName};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of rich text content — a typed vocabulary replacing stringly-typed dispatch.
///
/// Each variant carries its specific data, making invalid states
/// unrepresentable: you can't have a "mention" type with no mention data,
/// or an "equation" type with no expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RichTextType {
    Text { content: String, link: Option<Link> },
    Mention(MentionData),
    Equation(EquationData),
}

/// Rich text item with formatting annotations.
///
/// The `text_type` field carries the content variant — text, mention, or equation —
/// and `plain_text` provides the fallback rendering for any variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextItem {
    pub text_type: RichTextType,
    pub annotations: Annotations,
    pub plain_text: String,
    pub href: Option<String>,
}

impl RichTextItem {
    /// Create a plain text item — the most common rich text variant.
    pub fn plain_text(text: &str) -> Self {
        Self {
            text_type: RichTextType::Text {
                content: text.to_string(),
                link: None,
            },
            annotations: Annotations::default(),
            plain_text: text.to_string(),
            href: None,
        }
    }

    /// Create a text span carrying a hyperlink.
    pub fn text_link(text: &str, url: &str) -> Self {
        Self {
            text_type: RichTextType::Text {
                content: text.to_string(),
                link: Some(Link {
                    url: url.to_string(),
                }),
            },
            annotations: Annotations::default(),
            plain_text: text.to_string(),
            href: Some(url.to_string()),
        }
    }

    /// Create a page mention span. The visible text defaults to the page ID
    /// the way the API does for pages the integration can't read.
    pub fn page_mention(id: NotionId) -> Self {
        let plain = id.to_string();
        Self {
            text_type: RichTextType::Mention(MentionData {
                mention_type: MentionType::Page {
                    page: PageReference { id, url: None },
                },
            }),
            annotations: Annotations::default(),
            plain_text: plain,
            href: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Annotations {
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub underline: bool,
    pub code: bool,
    pub color: Color,
}

/// Mention data with type information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MentionData {
    #[serde(flatten)]
    pub mention_type: MentionType,
}

/// Different types of mentions in rich text
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MentionType {
    User {
        user: PartialUser,
    },
    Page {
        page: PageReference,
    },
    Database {
        database: DatabaseReference,
    },
    Date {
        date: DateValue,
    },
    LinkPreview {
        link_preview: LinkPreviewReference,
    },
    #[serde(rename = "link_mention")]
    LinkMention {
        url: String,
    },
}

/// A mention's pointer at another page. `url` starts empty and is filled in
/// by reference resolution when the target has a publish URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageReference {
    pub id: NotionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseReference {
    pub id: NotionId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkPreviewReference {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EquationData {
    pub expression: String,
}

/// Partial user representation (used in mentions)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PartialUser {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl fmt::Display for PartialUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "User {}", self.id),
        }
    }
}

/// Select option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub id: String,
    pub name: String,
    pub color: Color,
}

/// Date value with optional end date. Kept as the ISO-8601 strings the wire
/// carries; nothing here needs calendar arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateValue {
    pub start: String,
    pub end: Option<String>,
    pub time_zone: Option<String>,
}

/// A formula's computed result. Every kind can be empty: Notion reports the
/// result type even when the formula evaluated to nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FormulaResult {
    String(Option<String>),
    Number(Option<f64>),
    Boolean(Option<bool>),
    Date(Option<DateValue>),
}

/// Property value — wraps a typed value with its property ID.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyValue {
    pub id: PropertyName,
    #[serde(flatten)]
    pub kind: PropertyKind,
}

impl PropertyValue {
    pub fn new(id: impl Into<PropertyName>, kind: PropertyKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }

    /// Returns the Notion API type name for this property value.
    pub fn type_name(&self) -> &str {
        match &self.kind {
            PropertyKind::Title { .. } => "title",
            PropertyKind::RichText { .. } => "rich_text",
            PropertyKind::Url { .. } => "url",
            PropertyKind::Formula { .. } => "formula",
            PropertyKind::Number { .. } => "number",
            PropertyKind::Select { .. } => "select",
            PropertyKind::Checkbox { .. } => "checkbox",
            PropertyKind::Date { .. } => "date",
            PropertyKind::Other { property_type } => property_type,
        }
    }
}

/// The value payloads this tool actually reads. Everything else keeps its
/// type name in `Other` so exports stay honest about what was dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyKind {
    Title { title: Vec<RichTextItem> },
    RichText { rich_text: Vec<RichTextItem> },
    Formula { formula: FormulaResult },
    Select { select: Option<SelectOption> },
    Checkbox { checkbox: bool },
    Date { date: Option<DateValue> },
    Number { number: Option<f64> },
    Url { url: Option<String> },
    Other { property_type: String },
}
