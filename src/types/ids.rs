use super::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of any Notion object (page, database, block).
///
/// The canonical form is the hyphenated lowercase UUID; every constructor
/// normalizes into it, so two `NotionId`s compare equal whenever they name
/// the same object, regardless of the spelling they were parsed from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotionId(String);

impl NotionId {
    /// Parses the ID formats Notion hands out: raw 32-char hex, hyphenated
    /// UUID, or a Notion URL carrying either.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let cleaned = input.trim().trim_end_matches('/');

        if let Ok(uuid) = Uuid::parse_str(cleaned) {
            return Ok(NotionId(uuid.as_hyphenated().to_string()));
        }

        if cleaned.contains("notion") {
            return Self::extract_from_url(cleaned);
        }

        Err(ValidationError::InvalidId(format!(
            "Could not parse Notion ID from: {}",
            input
        )))
    }

    /// Creates a fresh random ID. Handy for fixtures.
    pub fn new_v4() -> Self {
        NotionId(Uuid::new_v4().as_hyphenated().to_string())
    }

    /// Creates a NotionId from a hex string with the hyphens already removed.
    pub(crate) fn from_hex(hex: &str) -> Result<Self, ValidationError> {
        match Uuid::parse_str(hex) {
            Ok(uuid) => Ok(NotionId(uuid.as_hyphenated().to_string())),
            Err(_) => Err(ValidationError::InvalidId(format!(
                "Invalid Notion ID format: {}",
                hex
            ))),
        }
    }

    /// Returns the canonical hyphenated form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the compact 32-char hex form some Notion URLs embed.
    pub fn as_simple(&self) -> String {
        self.0.replace('-', "")
    }

    /// Extracts an ID from a Notion URL, raw or hyphenated, slug or bare.
    fn extract_from_url(url: &str) -> Result<Self, ValidationError> {
        lazy_static::lazy_static! {
            static ref ID_REGEX: Regex = Regex::new(
                r"(?:[/-])([a-fA-F0-9]{32}|[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12})(?:[/?#]|$)"
            ).expect("Failed to compile Notion ID regex - this is a bug in the code");
        }

        if let Some(captures) = ID_REGEX.captures(url) {
            if let Some(id_match) = captures.get(1) {
                let id = id_match.as_str().replace('-', "");
                return Self::from_hex(&id);
            }
        }

        Err(ValidationError::InvalidId(format!(
            "No valid ID found in URL: {}",
            url
        )))
    }
}

impl fmt::Display for NotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for NotionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NotionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NotionId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_raw_hex_normalizes_to_hyphenated() {
        let id = NotionId::parse("1107e9d7682d455287113965a3979313").unwrap();
        assert_eq!(id.as_str(), "1107e9d7-682d-4552-8711-3965a3979313");
    }

    #[test]
    fn test_parse_hyphenated_is_identity() {
        let id = NotionId::parse("1107e9d7-682d-4552-8711-3965a3979313").unwrap();
        assert_eq!(id.as_str(), "1107e9d7-682d-4552-8711-3965a3979313");
    }

    #[test]
    fn test_parse_is_idempotent() {
        let once = NotionId::parse("550e8400e29b41d4a716446655440000").unwrap();
        let twice = NotionId::parse(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_both_spellings_compare_equal() {
        let raw = NotionId::parse("550e8400e29b41d4a716446655440000").unwrap();
        let dashed = NotionId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(raw, dashed);
    }

    #[test]
    fn test_uppercase_input_lowercased() {
        let id = NotionId::parse("550E8400E29B41D4A716446655440000").unwrap();
        assert_eq!(id.as_str(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_parse_from_slug_url() {
        let id = NotionId::parse(
            "https://www.notion.so/Test-Page-550e8400e29b41d4a716446655440000",
        )
        .unwrap();
        assert_eq!(id.as_str(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_parse_from_bare_url_with_trailing_slash() {
        let id = NotionId::parse("https://notion.so/550e8400e29b41d4a716446655440000/").unwrap();
        assert_eq!(id.as_str(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_as_simple_strips_hyphens() {
        let id = NotionId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(id.as_simple(), "550e8400e29b41d4a716446655440000");
    }

    #[test]
    fn test_invalid_ids() {
        assert!(NotionId::parse("too-short").is_err());
        assert!(NotionId::parse("not-hex-chars-00000000000000000").is_err());
        assert!(NotionId::parse("").is_err());
        assert!(NotionId::parse("https://www.notion.so/just-a-slug").is_err());
    }
}
