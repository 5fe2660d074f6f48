//! Scripted snapshot source.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::Snapshot;
use crate::error::TallyError;
use crate::ports::SnapshotSource;

/// A [`SnapshotSource`] that replays a canned sequence of snapshots in
/// order, one per fetch, then reports nothing.
///
/// Stands in for the remote executor in the demo binary and in tests: each
/// entry is "what the remote would have said on that poll".
#[derive(Debug, Default)]
pub struct ScriptedSource {
    snapshots: Mutex<VecDeque<Snapshot>>,
}

impl ScriptedSource {
    pub fn new(snapshots: impl IntoIterator<Item = Snapshot>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots.into_iter().collect()),
        }
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn fetch(&self, _task_id: &str) -> Result<Option<Snapshot>, TallyError> {
        Ok(self.snapshots.lock().await.pop_front())
    }
}
