//! Canonical messages and artifacts accumulated on the status record.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::part::Part;

/// Who a message is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
    System,
}

impl Role {
    /// Map a wire role string. The remote's default sender is the agent, so
    /// anything unrecognized degrades there rather than failing.
    pub fn from_wire(role: &str) -> Self {
        match role {
            "user" => Role::User,
            "system" => Role::System,
            _ => Role::Agent,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Agent => "agent",
            Role::System => "system",
        };
        f.write_str(s)
    }
}

/// One conversation turn associated with a task.
///
/// `message_id` may be empty: such messages can never be deduplicated and
/// only enter the record during bootstrap (see `reconcile`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message_id: String,

    pub role: Role,

    pub parts: Vec<Part>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

/// A named, identified output of task execution.
///
/// `artifact_id` is the primary dedup key and is always present (the
/// converter only produces artifacts for wire entries that carry one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub artifact_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub parts: Vec<Part>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}
