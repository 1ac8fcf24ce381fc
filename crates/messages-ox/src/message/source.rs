use std::{fmt, path::Path};

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::ContentBlock;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    Base64 { media_type: String, data: String },
    Url { url: String },
    File { file_id: String },
}

impl ImageSource {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let (media_type, data) = read_base64(path.as_ref())?;
        Ok(ImageSource::Base64 { media_type, data })
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Base64 { media_type, data } => {
                write!(f, "Base64 ({}, {})", media_type, truncate(data))
            }
            ImageSource::Url { url } => write!(f, "Url ({url})"),
            ImageSource::File { file_id } => write!(f, "File ({file_id})"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentSource {
    Base64 { media_type: String, data: String },
    Text { media_type: String, data: String },
    Url { url: String },
    Content { content: Vec<ContentBlock> },
    File { file_id: String },
}

impl DocumentSource {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, std::io::Error> {
        let (media_type, data) = read_base64(path.as_ref())?;
        Ok(DocumentSource::Base64 { media_type, data })
    }

    pub fn plain_text(data: impl Into<String>) -> Self {
        DocumentSource::Text {
            media_type: "text/plain".to_string(),
            data: data.into(),
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Base64 { media_type, data } => {
                write!(f, "Base64 ({}, {})", media_type, truncate(data))
            }
            DocumentSource::Text { data, .. } => write!(f, "Text ({})", truncate(data)),
            DocumentSource::Url { url } => write!(f, "Url ({url})"),
            DocumentSource::Content { content } => write!(f, "Content ({} blocks)", content.len()),
            DocumentSource::File { file_id } => write!(f, "File ({file_id})"),
        }
    }
}

fn read_base64(path: &Path) -> Result<(String, String), std::io::Error> {
    let data = std::fs::read(path)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(data);
    let media_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();
    Ok((media_type, encoded))
}

fn truncate(data: &str) -> String {
    match data.char_indices().nth(20) {
        Some((idx, _)) => format!("{}...", &data[..idx]),
        None => data.to_string(),
    }
}
