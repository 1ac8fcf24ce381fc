use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::Value;

use super::content::Tagged;

/// Prompt-cache marker attached to an individual block.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheControl {
    #[serde(rename = "type")]
    pub cache_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<String>,
}

impl CacheControl {
    pub fn ephemeral() -> Self {
        Self {
            cache_type: "ephemeral".to_string(),
            ttl: None,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: impl Into<String>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }
}

/// Whether a document or search result may be cited.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CitationsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// A citation attached to a text block.
///
/// Citation kinds this crate does not know yet decode to
/// [`Citation::Unknown`], which keeps the object as sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Citation {
    CharLocation(CharLocation),
    PageLocation(PageLocation),
    ContentBlockLocation(ContentBlockLocation),
    WebSearchResultLocation(WebSearchResultLocation),
    SearchResultLocation(SearchResultLocation),
    Unknown(Value),
}

impl Citation {
    pub fn cited_text(&self) -> Option<&str> {
        match self {
            Self::CharLocation(c) => Some(&c.cited_text),
            Self::PageLocation(c) => Some(&c.cited_text),
            Self::ContentBlockLocation(c) => Some(&c.cited_text),
            Self::WebSearchResultLocation(c) => Some(&c.cited_text),
            Self::SearchResultLocation(c) => Some(&c.cited_text),
            Self::Unknown(raw) => raw.get("cited_text").and_then(Value::as_str),
        }
    }

    /// The wire discriminator, including the raw one of an unknown citation.
    pub fn type_name(&self) -> &str {
        match self {
            Self::CharLocation(_) => "char_location",
            Self::PageLocation(_) => "page_location",
            Self::ContentBlockLocation(_) => "content_block_location",
            Self::WebSearchResultLocation(_) => "web_search_result_location",
            Self::SearchResultLocation(_) => "search_result_location",
            Self::Unknown(raw) => raw.get("type").and_then(Value::as_str).unwrap_or("unknown"),
        }
    }

    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        let Some(kind) = value.get("type").and_then(Value::as_str) else {
            return Err(de::Error::missing_field("type"));
        };

        match kind {
            "char_location" => serde_json::from_value(value).map(Self::CharLocation),
            "page_location" => serde_json::from_value(value).map(Self::PageLocation),
            "content_block_location" => {
                serde_json::from_value(value).map(Self::ContentBlockLocation)
            }
            "web_search_result_location" => {
                serde_json::from_value(value).map(Self::WebSearchResultLocation)
            }
            "search_result_location" => {
                serde_json::from_value(value).map(Self::SearchResultLocation)
            }
            other => {
                log::debug!("Keeping unrecognised citation type `{other}` as sent");
                Ok(Self::Unknown(value))
            }
        }
    }
}

impl Serialize for Citation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let kind = self.type_name();
        match self {
            Self::CharLocation(inner) => Tagged { kind, inner }.serialize(serializer),
            Self::PageLocation(inner) => Tagged { kind, inner }.serialize(serializer),
            Self::ContentBlockLocation(inner) => Tagged { kind, inner }.serialize(serializer),
            Self::WebSearchResultLocation(inner) => Tagged { kind, inner }.serialize(serializer),
            Self::SearchResultLocation(inner) => Tagged { kind, inner }.serialize(serializer),
            Self::Unknown(raw) => raw.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Citation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CharLocation {
    pub cited_text: String,
    pub document_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_title: Option<String>,
    pub start_char_index: u32,
    pub end_char_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageLocation {
    pub cited_text: String,
    pub document_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_title: Option<String>,
    pub start_page_number: u32,
    pub end_page_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContentBlockLocation {
    pub cited_text: String,
    pub document_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_title: Option<String>,
    pub start_block_index: u32,
    pub end_block_index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebSearchResultLocation {
    pub cited_text: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub encrypted_index: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResultLocation {
    pub cited_text: String,
    pub search_result_index: u32,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub start_block_index: u32,
    pub end_block_index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_citation_kind_does_not_fail() {
        let raw = json!({"type": "audio_location", "cited_text": "x", "start_ms": 120});
        let citation: Citation = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(citation, Citation::Unknown(raw.clone()));
        assert_eq!(citation.type_name(), "audio_location");
        assert_eq!(citation.cited_text(), Some("x"));
        assert_eq!(serde_json::to_value(&citation).unwrap(), raw);
    }

    #[test]
    fn test_char_location() {
        let citation: Citation = serde_json::from_value(json!({
            "type": "char_location",
            "cited_text": "the grass is green",
            "document_index": 0,
            "document_title": "Facts",
            "start_char_index": 0,
            "end_char_index": 18
        }))
        .unwrap();

        assert_eq!(citation.cited_text(), Some("the grass is green"));
        let value = serde_json::to_value(&citation).unwrap();
        assert_eq!(value["type"], "char_location");
        assert!(value.get("file_id").is_none());
    }
}
