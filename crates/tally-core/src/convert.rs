//! Wire -> canonical conversion.
//!
//! Every function here is pure and total: unrecognized remote content
//! degrades to a documented fallback instead of failing. This is the only
//! place where the loose wire types from `domain::remote` are tightened into
//! the closed canonical vocabulary.

use std::collections::HashMap;

use serde_json::Value;

use crate::domain::{
    Artifact, FileSource, Message, Part, RemoteArtifact, RemoteFile, RemoteMessage, RemotePart,
    Role,
};

/// Convert one remote content part. Never fails.
pub fn convert_part(part: &RemotePart) -> Part {
    match part {
        RemotePart::Text { text } => Part::Text { text: text.clone() },
        RemotePart::Data { data } => Part::Data {
            data: display_string(data),
        },
        RemotePart::File { file } => convert_file(file),
        RemotePart::Unknown => Part::unknown(),
    }
}

fn convert_file(file: &RemoteFile) -> Part {
    let source = match (&file.uri, &file.bytes) {
        (Some(uri), _) => FileSource::Uri(uri.clone()),
        (None, Some(bytes)) => FileSource::Bytes(bytes.clone()),
        // Degenerate file with neither reference nor content: keep the
        // file kind with an empty reference, mirroring the wire's shape.
        (None, None) => FileSource::Uri(String::new()),
    };
    Part::File {
        source,
        mime_type: file.mime_type.clone(),
    }
}

/// Convert remote artifacts, dropping any whose part sequence converts to
/// empty. Order is preserved.
pub fn convert_artifacts(artifacts: &[RemoteArtifact]) -> Vec<Artifact> {
    artifacts
        .iter()
        .filter(|artifact| !artifact.parts.is_empty())
        .map(|artifact| Artifact {
            artifact_id: artifact.artifact_id.clone(),
            name: artifact.name.clone(),
            description: artifact.description.clone(),
            parts: artifact.parts.iter().map(convert_part).collect(),
            metadata: stringify_metadata(&artifact.metadata),
        })
        .collect()
}

/// Convert remote history, dropping any message whose part sequence converts
/// to empty. Order is preserved.
pub fn convert_history(history: &[RemoteMessage]) -> Vec<Message> {
    history
        .iter()
        .filter(|message| !message.parts.is_empty())
        .map(convert_message)
        .collect()
}

/// Convert a single message without the empty-parts filter. Used for the
/// status message, which is kept as `last_status_message` even when it has
/// no content (only the history append is gated on part count).
pub fn convert_message(message: &RemoteMessage) -> Message {
    Message {
        message_id: message.message_id.clone(),
        role: Role::from_wire(&message.role),
        parts: message.parts.iter().map(convert_part).collect(),
        metadata: stringify_metadata(&message.metadata),
    }
}

/// Collapse arbitrarily-typed metadata into a string-valued map.
///
/// Deliberately lossy normalization boundary: round-tripping is not
/// guaranteed beyond string equality of the display form.
pub fn stringify_metadata(metadata: &HashMap<String, Value>) -> HashMap<String, String> {
    metadata
        .iter()
        .map(|(k, v)| (k.clone(), display_string(v)))
        .collect()
}

/// Uniform display string for a metadata or data value: strings render bare,
/// everything else renders as its JSON text.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
