//! Demo polling collaborator for the tally reconciliation engine.
//!
//! Plays the part of everything the engine treats as external: a remote
//! task executor (scripted), a poll loop with an interval and a failure
//! budget, and record persistence. Run it to watch a task walk
//! submitted -> working -> completed while the record accumulates.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde_json::json;
use tokio::time::{Duration, sleep};
use tracing::{info, warn};
use ulid::Ulid;

use tally_core::domain::{RemoteArtifact, RemoteMessage, RemotePart, Snapshot, StatusRecord};
use tally_core::impls::{InMemoryRecordStore, ScriptedSource};
use tally_core::ports::{RecordStore, SnapshotSource};
use tally_core::{TallyError, update};

/// Wraps a source and fails the first N fetches, the way a remote does
/// when it is briefly unreachable.
struct FlakySource<S> {
    inner: S,
    remaining_failures: AtomicU32,
}

impl<S> FlakySource<S> {
    fn new(inner: S, failures: u32) -> Self {
        Self {
            inner,
            remaining_failures: AtomicU32::new(failures),
        }
    }
}

#[async_trait]
impl<S: SnapshotSource> SnapshotSource for FlakySource<S> {
    async fn fetch(&self, task_id: &str) -> Result<Option<Snapshot>, TallyError> {
        let left = self.remaining_failures.load(Ordering::Relaxed);
        if left > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(TallyError::SourceUnavailable(format!(
                "simulated outage (left={left})"
            )));
        }
        self.inner.fetch(task_id).await
    }
}

fn text_part(text: &str) -> RemotePart {
    RemotePart::Text {
        text: text.to_string(),
    }
}

/// What the remote would report across four successive polls.
fn script(context_id: &str) -> Vec<Snapshot> {
    let request_id = format!("msg-{}", Ulid::new());
    let reply_id = format!("msg-{}", Ulid::new());
    let artifact_id = format!("art-{}", Ulid::new());

    let request = RemoteMessage {
        message_id: request_id,
        role: "user".to_string(),
        parts: vec![text_part("summarize the quarterly numbers")],
        ..Default::default()
    };

    let reply = RemoteMessage {
        message_id: reply_id,
        role: "agent".to_string(),
        parts: vec![text_part("summary drafted")],
        ..Default::default()
    };

    let artifact = RemoteArtifact {
        artifact_id,
        name: Some("summary".to_string()),
        parts: vec![
            text_part("Q3 revenue grew 12%"),
            RemotePart::Data {
                data: json!({"revenue": 1200000, "growth": 0.12}),
            },
        ],
        ..Default::default()
    };

    let base = Snapshot {
        id: "task-demo".to_string(),
        context_id: context_id.to_string(),
        metadata: HashMap::from([("agent".to_string(), json!("demo-agent"))]),
        ..Default::default()
    };

    vec![
        Snapshot {
            raw_state: "submitted".to_string(),
            history: vec![request.clone()],
            timestamp: "2025-01-15T10:00:00Z".to_string(),
            ..base.clone()
        },
        Snapshot {
            raw_state: "working".to_string(),
            history: vec![request.clone()],
            status_message: Some(RemoteMessage {
                role: "agent".to_string(),
                parts: vec![text_part("crunching")],
                ..Default::default()
            }),
            timestamp: "2025-01-15T10:00:05Z".to_string(),
            ..base.clone()
        },
        Snapshot {
            raw_state: "working".to_string(),
            history: vec![request.clone(), reply.clone()],
            artifacts: vec![artifact.clone()],
            timestamp: "2025-01-15T10:00:10Z".to_string(),
            ..base.clone()
        },
        Snapshot {
            raw_state: "completed".to_string(),
            history: vec![request, reply],
            artifacts: vec![artifact],
            timestamp: "2025-01-15T10:00:15Z".to_string(),
            ..base
        },
    ]
}

/// The control loop the engine deliberately does not own: poll, fold, save.
async fn poll_task(
    task_id: &str,
    source: Arc<dyn SnapshotSource>,
    store: Arc<dyn RecordStore>,
    interval: Duration,
    failure_budget: u32,
) -> Result<StatusRecord, TallyError> {
    let mut record = store.load(task_id).await?.unwrap_or_else(StatusRecord::new);
    let mut consecutive_failures = 0u32;

    loop {
        match source.fetch(task_id).await {
            Ok(snapshot) => {
                consecutive_failures = 0;
                update(&mut record, snapshot.as_ref());
                store.save(task_id, record.clone()).await?;
                info!(
                    phase = %record.phase,
                    artifacts = record.artifacts.len(),
                    messages = record.history.len(),
                    "folded snapshot"
                );
            }
            Err(err) => {
                consecutive_failures += 1;
                warn!(%err, consecutive_failures, "poll failed");
                if consecutive_failures >= failure_budget {
                    // Caller policy: the engine never decides this.
                    record.fail(format!(
                        "remote unreachable after {consecutive_failures} attempts: {err}"
                    ));
                    store.save(task_id, record.clone()).await?;
                    return Ok(record);
                }
            }
        }

        if record.phase.is_terminal() {
            return Ok(record);
        }
        sleep(interval).await;
    }
}

#[tokio::main]
async fn main() -> Result<(), TallyError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tally_core=debug".into()),
        )
        .compact()
        .init();

    let task_id = "task-demo";
    let source = Arc::new(FlakySource::new(ScriptedSource::new(script("ctx-demo")), 1));
    let store = Arc::new(InMemoryRecordStore::new());

    let record = poll_task(
        task_id,
        source,
        store.clone(),
        Duration::from_millis(200),
        3,
    )
    .await?;

    info!(phase = %record.phase, "task reached terminal phase");
    println!(
        "{}",
        serde_json::to_string_pretty(&record).map_err(|e| TallyError::Other(e.to_string()))?
    );
    Ok(())
}
