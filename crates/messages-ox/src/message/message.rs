use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::Value;
use strum::{Display, EnumString};

use super::ContentBlock;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// One conversational turn: a role and its ordered content blocks.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    #[serde(deserialize_with = "string_or_blocks")]
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn new(role: Role, content: Vec<ContentBlock>) -> Self {
        Self { role, content }
    }

    pub fn user<T: Into<ContentBlock>>(content: Vec<T>) -> Self {
        Self {
            role: Role::User,
            content: content.into_iter().map(Into::into).collect(),
        }
    }

    pub fn assistant<T: Into<ContentBlock>>(content: Vec<T>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into_iter().map(Into::into).collect(),
        }
    }

    pub fn push<T: Into<ContentBlock>>(&mut self, block: T) {
        self.content.push(block.into());
    }

    /// Concatenation of every text block, in order.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentBlock::as_text)
            .map(|t| t.text.as_str())
            .collect()
    }
}

/// `content` may be sent as a bare string, shorthand for one text block.
fn string_or_blocks<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(vec![ContentBlock::text(text)]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| ContentBlock::from_value(item).map_err(de::Error::custom))
            .collect(),
        other => Err(de::Error::invalid_type(
            de::Unexpected::Other(json_kind(&other)),
            &"a string or an array of content blocks",
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
