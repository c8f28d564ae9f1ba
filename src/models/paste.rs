//! Paste data structures.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One paste discovered in the upstream list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Paste {
    /// Opaque unique identifier
    pub key: String,

    /// Everything else the list endpoint returns
    #[serde(flatten)]
    pub metadata: PasteMetadata,
}

/// Listing metadata; carried through to notifications, never interpreted.
///
/// Any JSON type is accepted per field so one odd record cannot fail the list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PasteMetadata {
    #[serde(deserialize_with = "lenient_string")]
    pub scrape_url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub full_url: String,
    #[serde(deserialize_with = "lenient_string")]
    pub date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub size: String,
    #[serde(deserialize_with = "lenient_string")]
    pub expire: String,
    #[serde(deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(deserialize_with = "lenient_string")]
    pub syntax: String,
    #[serde(deserialize_with = "lenient_string")]
    pub user: String,
}

/// `null` becomes empty, strings pass through, anything else is rendered as JSON.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

impl Paste {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            metadata: PasteMetadata::default(),
        }
    }

    /// Title for display, falling back to the key for untitled pastes.
    pub fn display_title(&self) -> &str {
        if self.metadata.title.trim().is_empty() {
            &self.key
        } else {
            &self.metadata.title
        }
    }
}

/// A paste whose body matched at least one keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPaste {
    pub paste: Paste,

    /// Full fetched body
    pub body: String,

    /// Keyword to trimmed matching line
    pub hits: BTreeMap<String, String>,
}

impl MatchedPaste {
    /// Human-readable notification text, hits in keyword order.
    pub fn format_message(&self) -> String {
        let mut message = format!("Found keywords in paste \"{}\"", self.paste.display_title());
        if !self.paste.metadata.full_url.is_empty() {
            message.push_str(&format!(" ({})", self.paste.metadata.full_url));
        }
        message.push('\n');

        for (keyword, line) in &self.hits {
            message.push_str(&format!("{keyword}: {line}\n"));
        }

        if !self.paste.metadata.date.is_empty() {
            message.push_str(&format!("Published: {}\n", self.paste.metadata.date));
        }
        message
    }
}
