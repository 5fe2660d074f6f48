//! Status record: durable accumulation of everything observed about a task.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::{Artifact, Message};
use super::phase::Phase;

/// Durable status of one tracked task.
///
/// Design:
/// - This is the single source of truth for a task's observed state.
/// - Mutated only by `reconcile::update` and the caller-policy helpers below;
///   the caller persists it after every update.
/// - `artifacts` are unique by id, id-carrying `history` entries are unique
///   by id; first occurrence wins and is never overwritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    /// Derived lifecycle phase; recomputed on every update.
    pub phase: Phase,

    /// Raw remote state echoed from the latest snapshot.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw_state: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub context_id: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<Artifact>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<Message>,

    /// Remote metadata from the latest snapshot (last-write-wins).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_status_message: Option<Message>,

    /// RFC 3339 string as reported by the remote, or empty.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_status_timestamp: String,

    /// Stamped at most once, on the update where the phase leaves Pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,

    /// Stamped at most once, on the non-terminal -> terminal edge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_time: Option<DateTime<Utc>>,

    /// Explanatory error text, set by caller policy via [`StatusRecord::fail`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// One-shot flag: flipped by the first snapshot ever folded in.
    /// Distinguishes the bootstrap path from incremental merges.
    #[serde(default)]
    pub initialized: bool,
}

impl StatusRecord {
    /// A fresh record for a just-created task. Starts Pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the task failed with an explanatory error.
    ///
    /// This is the caller-policy hook: the engine never decides that a task
    /// is unreachable or overdue, the polling collaborator does.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.phase = Phase::Failed;
        self.error = Some(error.into());
    }

    /// Ids of all accumulated artifacts.
    pub fn artifact_ids(&self) -> HashSet<&str> {
        self.artifacts
            .iter()
            .map(|a| a.artifact_id.as_str())
            .collect()
    }

    /// Ids of all accumulated messages that carry one.
    pub fn message_ids(&self) -> HashSet<&str> {
        self.history
            .iter()
            .filter(|m| !m.message_id.is_empty())
            .map(|m| m.message_id.as_str())
            .collect()
    }
}
