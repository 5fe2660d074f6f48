//! Wire-side (inbound) types: one snapshot per poll, as the remote sends it.
//!
//! These are deliberately loose: ids may be missing, metadata values are
//! arbitrarily typed, content parts may have shapes we do not recognize.
//! Everything tightens up in `convert`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One poll-time observation of a remotely executing task.
///
/// Ephemeral: built by the polling collaborator, consumed once by
/// `reconcile::update`, then dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Remote task id (informational; record identity is owned by the caller).
    #[serde(default)]
    pub id: String,

    /// Conversation context this task belongs to.
    #[serde(default)]
    pub context_id: String,

    /// Free-form remote state string ("submitted", "working", ...).
    #[serde(default)]
    pub raw_state: String,

    /// Most recent status message, if the remote reported one.
    #[serde(default)]
    pub status_message: Option<RemoteMessage>,

    #[serde(default)]
    pub artifacts: Vec<RemoteArtifact>,

    #[serde(default)]
    pub history: Vec<RemoteMessage>,

    /// Arbitrarily-typed metadata; collapsed to strings on conversion.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,

    /// RFC 3339 timestamp of the reported status, or empty.
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMessage {
    /// May be empty: such a message can never be deduplicated.
    #[serde(default)]
    pub message_id: String,

    #[serde(default)]
    pub role: String,

    #[serde(default)]
    pub parts: Vec<RemotePart>,

    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteArtifact {
    #[serde(default)]
    pub artifact_id: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub parts: Vec<RemotePart>,

    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

/// Remote content part. The `Unknown` arm catches any kind tag outside the
/// known vocabulary so deserialization stays total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RemotePart {
    Text {
        #[serde(default)]
        text: String,
    },
    Data {
        #[serde(default)]
        data: Value,
    },
    File {
        #[serde(default)]
        file: RemoteFile,
    },
    #[serde(other)]
    Unknown,
}

/// Remote file content: by URI or by inline bytes, optionally typed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteFile {
    #[serde(default)]
    pub uri: Option<String>,

    #[serde(default)]
    pub bytes: Option<String>,

    #[serde(default)]
    pub mime_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_deserializes_from_sparse_json() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{"id":"task-1","rawState":"working","timestamp":"2025-01-15T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(snapshot.raw_state, "working");
        assert!(snapshot.artifacts.is_empty());
        assert!(snapshot.status_message.is_none());
    }

    #[test]
    fn unknown_part_kind_deserializes_to_unknown() {
        let part: RemotePart = serde_json::from_str(r#"{"kind":"video","url":"x"}"#).unwrap();
        assert_eq!(part, RemotePart::Unknown);
    }

    #[test]
    fn data_part_keeps_arbitrary_payload() {
        let part: RemotePart =
            serde_json::from_str(r#"{"kind":"data","data":{"rows":[1,2]}}"#).unwrap();
        match part {
            RemotePart::Data { data } => assert_eq!(data["rows"][1], 2),
            other => panic!("unexpected part: {other:?}"),
        }
    }
}
