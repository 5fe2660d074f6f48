//! The reconciliation engine: fold one snapshot into the status record.
//!
//! Pure and synchronous. The caller owns mutual exclusion per task and
//! persists the record afterwards; calls for different tasks are independent.
//!
//! Correctness properties the merge upholds:
//! - idempotent under repeated delivery of the same snapshot
//! - monotonic accumulation (nothing recorded ever disappears)
//! - start/completion times stamped exactly once, on specific phase edges
//!
//! The merge relies on the remote side's append-only guarantee: each
//! snapshot's artifact/message sets are supersets of the prior snapshot's.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use crate::convert::{convert_artifacts, convert_history, convert_message, stringify_metadata};
use crate::domain::{Artifact, Message, Phase, Snapshot, StatusRecord};

/// Canonical view of one snapshot, built fresh per update and consumed once.
struct SnapshotView {
    raw_state: String,
    context_id: String,
    artifacts: Vec<Artifact>,
    history: Vec<Message>,
    metadata: HashMap<String, String>,
    last_status_message: Option<Message>,
    last_status_timestamp: String,
}

impl SnapshotView {
    fn build(snapshot: &Snapshot) -> Self {
        let artifacts = convert_artifacts(&snapshot.artifacts);
        let mut history = convert_history(&snapshot.history);

        // The status message is kept verbatim as last_status_message, but
        // only joins the history when it actually carries content.
        let last_status_message = snapshot.status_message.as_ref().map(convert_message);
        if let Some(message) = &last_status_message {
            if !message.parts.is_empty() {
                history.push(message.clone());
            }
        }

        Self {
            raw_state: snapshot.raw_state.clone(),
            context_id: snapshot.context_id.clone(),
            artifacts,
            history,
            metadata: stringify_metadata(&snapshot.metadata),
            last_status_message,
            last_status_timestamp: snapshot.timestamp.clone(),
        }
    }
}

/// Fold a snapshot into the record. Absent snapshot is a legitimate no-op
/// (the poll came back empty; caller decides what that means).
pub fn update(record: &mut StatusRecord, snapshot: Option<&Snapshot>) {
    let Some(snapshot) = snapshot else {
        return;
    };

    let old_phase = record.phase;
    let view = SnapshotView::build(snapshot);

    if !record.initialized {
        debug!(
            task = %snapshot.id,
            raw_state = %view.raw_state,
            artifacts = view.artifacts.len(),
            messages = view.history.len(),
            "bootstrapping record from first snapshot"
        );
        bootstrap(record, view);
    } else {
        merge(record, view);
    }

    apply_timestamps(record, old_phase, &snapshot.timestamp);
}

/// First-ever population: wholesale assignment. This is the only path where
/// id-less messages enter the history.
fn bootstrap(record: &mut StatusRecord, view: SnapshotView) {
    record.raw_state = view.raw_state;
    record.context_id = view.context_id;
    record.artifacts = view.artifacts;
    record.history = view.history;
    record.metadata = view.metadata;
    record.last_status_message = view.last_status_message;
    record.last_status_timestamp = view.last_status_timestamp;
    record.initialized = true;
}

/// Incremental merge: append-only for artifacts and id-carrying messages,
/// last-write-wins for everything else.
fn merge(record: &mut StatusRecord, view: SnapshotView) {
    merge_artifacts(record, view.artifacts);
    merge_history(record, view.history);

    record.raw_state = view.raw_state;
    record.context_id = view.context_id;
    record.metadata = view.metadata;
    record.last_status_message = view.last_status_message;
    record.last_status_timestamp = view.last_status_timestamp;
}

/// Append artifacts whose id is not yet present, preserving arrival order.
/// Existing artifacts are never overwritten.
fn merge_artifacts(record: &mut StatusRecord, incoming: Vec<Artifact>) {
    let known: HashSet<String> = record
        .artifact_ids()
        .into_iter()
        .map(str::to_string)
        .collect();

    for artifact in incoming {
        if !known.contains(&artifact.artifact_id) {
            trace!(artifact_id = %artifact.artifact_id, "recording new artifact");
            record.artifacts.push(artifact);
        }
    }
}

/// Append messages with a non-empty, not-yet-seen id, preserving arrival
/// order. Id-less messages are never merged here (bootstrap only).
fn merge_history(record: &mut StatusRecord, incoming: Vec<Message>) {
    if incoming.is_empty() {
        return;
    }

    let mut known: HashSet<String> = record
        .message_ids()
        .into_iter()
        .map(str::to_string)
        .collect();

    for message in incoming {
        if message.message_id.is_empty() {
            continue;
        }
        if known.insert(message.message_id.clone()) {
            record.history.push(message);
        }
    }
}

/// Recompute the phase and stamp the one-shot boundary timestamps.
fn apply_timestamps(record: &mut StatusRecord, old_phase: Phase, timestamp: &str) {
    let new_phase = Phase::from_raw_state(&record.raw_state);
    record.phase = new_phase;

    if old_phase != new_phase {
        debug!(from = %old_phase, to = %new_phase, "phase transition");
    }

    // Start time: only on the edge leaving Pending. A task first observed
    // past Pending never gets one; that is intentional.
    if old_phase == Phase::Pending && record.start_time.is_none() {
        if let Some(parsed) = parse_remote_timestamp(timestamp) {
            record.start_time = Some(parsed);
        }
    }

    // Completion time: only on the non-terminal -> terminal edge, which can
    // occur at most once per record.
    if !old_phase.is_terminal() && new_phase.is_terminal() {
        if let Some(parsed) = parse_remote_timestamp(timestamp) {
            record.completion_time = Some(parsed);
        }
    }
}

/// Parse the remote's RFC 3339 timestamp. Empty or malformed input yields
/// None; the corresponding record field simply stays unset.
pub fn parse_remote_timestamp(timestamp: &str) -> Option<DateTime<Utc>> {
    if timestamp.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(timestamp)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RemoteArtifact, RemoteMessage, RemotePart};
    use rstest::rstest;
    use std::collections::HashSet;

    fn text_part(text: &str) -> RemotePart {
        RemotePart::Text {
            text: text.to_string(),
        }
    }

    fn message(id: &str, text: &str) -> RemoteMessage {
        RemoteMessage {
            message_id: id.to_string(),
            role: "user".to_string(),
            parts: vec![text_part(text)],
            ..Default::default()
        }
    }

    fn artifact(id: &str, text: &str) -> RemoteArtifact {
        RemoteArtifact {
            artifact_id: id.to_string(),
            parts: vec![text_part(text)],
            ..Default::default()
        }
    }

    fn snapshot(raw_state: &str, timestamp: &str) -> Snapshot {
        Snapshot {
            id: "task-123".to_string(),
            context_id: "ctx-456".to_string(),
            raw_state: raw_state.to_string(),
            timestamp: timestamp.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn absent_snapshot_is_a_no_op() {
        let mut record = StatusRecord::new();
        update(&mut record, None);

        assert_eq!(record, StatusRecord::new());
    }

    #[test]
    fn bootstrap_populates_every_field() {
        let mut snap = snapshot("working", "2025-01-15T10:00:00Z");
        snap.history = vec![message("msg-1", "initial request")];
        snap.artifacts = vec![artifact("art-1", "result")];
        snap.metadata
            .insert("agent".to_string(), serde_json::json!("test-agent"));
        snap.status_message = Some(message("msg-status", "processing"));

        let mut record = StatusRecord::new();
        update(&mut record, Some(&snap));

        assert!(record.initialized);
        assert_eq!(record.raw_state, "working");
        assert_eq!(record.context_id, "ctx-456");
        assert_eq!(record.phase, Phase::Running);
        assert_eq!(record.artifacts.len(), 1);
        // Original history plus the carried status message.
        assert_eq!(record.history.len(), 2);
        assert_eq!(record.metadata["agent"], "test-agent");
        assert_eq!(record.last_status_timestamp, "2025-01-15T10:00:00Z");
        assert!(record.last_status_message.is_some());
    }

    #[test]
    fn applying_the_same_snapshot_twice_is_idempotent() {
        let mut snap = snapshot("working", "2025-01-15T10:00:00Z");
        snap.history = vec![message("msg-1", "request")];
        snap.artifacts = vec![artifact("art-1", "partial result")];

        let mut record = StatusRecord::new();
        update(&mut record, Some(&snap));
        let after_first = record.clone();

        update(&mut record, Some(&snap));

        assert_eq!(record.artifact_ids(), after_first.artifact_ids());
        assert_eq!(record.message_ids(), after_first.message_ids());
        assert_eq!(record.history.len(), after_first.history.len());
    }

    #[test]
    fn duplicate_artifact_id_is_recorded_once() {
        let mut first = snapshot("working", "2025-01-15T10:00:00Z");
        first.artifacts = vec![artifact("art-1", "v1")];

        let mut second = snapshot("working", "2025-01-15T10:05:00Z");
        second.artifacts = vec![artifact("art-1", "v1 resent"), artifact("art-2", "v2")];

        let mut record = StatusRecord::new();
        update(&mut record, Some(&first));
        update(&mut record, Some(&second));

        assert_eq!(record.artifacts.len(), 2);
        assert_eq!(record.artifacts[0].artifact_id, "art-1");
        // First occurrence wins: the resent body must not overwrite.
        assert_eq!(
            record.artifacts[0].parts,
            vec![crate::domain::Part::text("v1")]
        );
        assert_eq!(record.artifacts[1].artifact_id, "art-2");
    }

    #[test]
    fn id_less_message_enters_only_at_bootstrap() {
        let mut first = snapshot("working", "2025-01-15T10:00:00Z");
        first.history = vec![message("", "anonymous note")];

        let mut record = StatusRecord::new();
        update(&mut record, Some(&first));
        assert_eq!(record.history.len(), 1);

        // Identical id-less message reappears: must not be merged again.
        let mut second = snapshot("working", "2025-01-15T10:05:00Z");
        second.history = vec![message("", "anonymous note"), message("msg-2", "reply")];

        update(&mut record, Some(&second));
        assert_eq!(record.history.len(), 2);
        assert_eq!(record.history[1].message_id, "msg-2");
    }

    #[test]
    fn accumulation_is_monotonic_across_a_sequence() {
        let mut snapshots = Vec::new();
        for i in 1..=4 {
            let mut snap = snapshot("working", "2025-01-15T10:00:00Z");
            for j in 1..=i {
                snap.history.push(message(&format!("msg-{j}"), "m"));
                snap.artifacts.push(artifact(&format!("art-{j}"), "a"));
            }
            snapshots.push(snap);
        }

        let mut record = StatusRecord::new();
        let mut seen_messages: HashSet<String> = HashSet::new();
        let mut seen_artifacts: HashSet<String> = HashSet::new();

        for snap in &snapshots {
            update(&mut record, Some(snap));

            let messages: HashSet<String> =
                record.message_ids().iter().map(|s| s.to_string()).collect();
            let artifacts: HashSet<String> = record
                .artifact_ids()
                .iter()
                .map(|s| s.to_string())
                .collect();

            assert!(seen_messages.is_subset(&messages));
            assert!(seen_artifacts.is_subset(&artifacts));
            seen_messages = messages;
            seen_artifacts = artifacts;
        }

        assert_eq!(seen_messages.len(), 4);
        assert_eq!(seen_artifacts.len(), 4);
    }

    #[test]
    fn scalar_fields_are_last_write_wins() {
        let mut first = snapshot("working", "2025-01-15T10:00:00Z");
        first.history = vec![message("msg-1", "request")];
        first
            .metadata
            .insert("round".to_string(), serde_json::json!(1));

        let mut second = snapshot("input-required", "2025-01-15T10:05:00Z");
        second.context_id = "ctx-789".to_string();
        second
            .metadata
            .insert("round".to_string(), serde_json::json!(2));

        let mut record = StatusRecord::new();
        update(&mut record, Some(&first));
        update(&mut record, Some(&second));

        assert_eq!(record.raw_state, "input-required");
        assert_eq!(record.phase, Phase::InputRequired);
        assert_eq!(record.context_id, "ctx-789");
        assert_eq!(record.metadata["round"], "2");
        assert_eq!(record.last_status_timestamp, "2025-01-15T10:05:00Z");
        // Second snapshot carried no status message: the field is overwritten
        // wholesale, not accumulated.
        assert!(record.last_status_message.is_none());
    }

    #[test]
    fn pending_to_working_stamps_start_time() {
        let mut record = StatusRecord::new();
        update(&mut record, Some(&snapshot("working", "2025-01-15T10:00:00Z")));

        assert_eq!(record.phase, Phase::Running);
        assert_eq!(
            record.start_time,
            Some("2025-01-15T10:00:00Z".parse().unwrap())
        );
        assert!(record.completion_time.is_none());
    }

    #[test]
    fn terminal_edge_stamps_completion_time_once() {
        let mut record = StatusRecord::new();
        update(&mut record, Some(&snapshot("working", "2025-01-15T10:00:00Z")));
        update(&mut record, Some(&snapshot("completed", "2025-01-15T11:00:00Z")));

        assert_eq!(record.phase, Phase::Completed);
        assert_eq!(
            record.start_time,
            Some("2025-01-15T10:00:00Z".parse().unwrap())
        );
        assert_eq!(
            record.completion_time,
            Some("2025-01-15T11:00:00Z".parse().unwrap())
        );

        // Later polls at a terminal phase must not move either timestamp.
        update(&mut record, Some(&snapshot("completed", "2025-01-15T12:00:00Z")));
        assert_eq!(
            record.completion_time,
            Some("2025-01-15T11:00:00Z".parse().unwrap())
        );
        assert_eq!(
            record.start_time,
            Some("2025-01-15T10:00:00Z".parse().unwrap())
        );
    }

    #[test]
    fn first_observation_past_pending_never_gets_a_start_time() {
        // Intentional edge: the start-time rule fires only on the exact
        // was-Pending edge.
        let mut record = StatusRecord::new();
        update(&mut record, Some(&snapshot("submitted", "2025-01-15T09:00:00Z")));
        assert_eq!(record.phase, Phase::Assigned);
        // This first update *did* leave Pending, so it stamps.
        assert!(record.start_time.is_some());

        // But a record that skipped Pending entirely does not.
        let mut record = StatusRecord {
            phase: Phase::Assigned,
            ..StatusRecord::new()
        };
        update(&mut record, Some(&snapshot("working", "2025-01-15T10:00:00Z")));
        assert!(record.start_time.is_none());
    }

    #[test]
    fn malformed_timestamp_leaves_fields_unset() {
        let mut record = StatusRecord::new();
        update(&mut record, Some(&snapshot("working", "not-a-timestamp")));
        assert!(record.start_time.is_none());

        update(&mut record, Some(&snapshot("completed", "")));
        assert_eq!(record.phase, Phase::Completed);
        assert!(record.completion_time.is_none());
    }

    #[test]
    fn unrecognized_state_maps_to_unknown_and_is_not_terminal() {
        let mut record = StatusRecord::new();
        update(&mut record, Some(&snapshot("working", "2025-01-15T10:00:00Z")));
        update(&mut record, Some(&snapshot("zzz", "2025-01-15T10:05:00Z")));

        assert_eq!(record.phase, Phase::Unknown);
        assert!(record.completion_time.is_none());

        // Recovery is possible: a later recognizable state takes over.
        update(&mut record, Some(&snapshot("completed", "2025-01-15T11:00:00Z")));
        assert_eq!(record.phase, Phase::Completed);
        assert!(record.completion_time.is_some());
    }

    #[rstest]
    #[case::valid("2025-01-15T10:30:45Z", true)]
    #[case::offset("2025-01-15T10:30:45+09:00", true)]
    #[case::empty("", false)]
    #[case::garbage("not-a-timestamp", false)]
    fn parse_remote_timestamp_cases(#[case] input: &str, #[case] expect_some: bool) {
        assert_eq!(parse_remote_timestamp(input).is_some(), expect_some);
    }

    #[test]
    fn status_message_without_parts_is_kept_but_not_appended() {
        let mut snap = snapshot("working", "2025-01-15T10:00:00Z");
        snap.history = vec![message("msg-1", "request")];
        snap.status_message = Some(RemoteMessage {
            message_id: "status-1".to_string(),
            role: "agent".to_string(),
            parts: vec![],
            ..Default::default()
        });

        let mut record = StatusRecord::new();
        update(&mut record, Some(&snap));

        assert_eq!(record.history.len(), 1);
        assert_eq!(
            record
                .last_status_message
                .as_ref()
                .map(|m| m.message_id.as_str()),
            Some("status-1")
        );
    }
}
