//! Canonical content parts (the atomic unit of messages and artifacts).

use serde::{Deserialize, Serialize};

/// Placeholder text for remote content we cannot classify.
pub const UNKNOWN_PART_TEXT: &str = "unknown part type";

/// One atomic piece of message/artifact content.
///
/// This is a closed vocabulary: whatever the remote side sends, conversion
/// lands in exactly one of these variants (unrecognized shapes become a
/// sentinel [`Part::Text`], see `convert`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    /// Plain text content.
    Text { text: String },

    /// Structured payload, already collapsed to its display string.
    Data { data: String },

    /// File content, by reference or by value.
    File {
        source: FileSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
}

/// A file part carries exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSource {
    /// Reference to an external resource.
    Uri(String),

    /// Inline encoded bytes (base64 on the wire).
    Bytes(String),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text { text: text.into() }
    }

    /// The sentinel produced for unrecognized remote content.
    pub fn unknown() -> Self {
        Part::text(UNKNOWN_PART_TEXT)
    }
}
