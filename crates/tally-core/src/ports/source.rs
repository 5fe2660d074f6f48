//! Snapshot source port.

use async_trait::async_trait;

use crate::domain::Snapshot;
use crate::error::TallyError;

/// Where snapshots come from (in production: a network poll against the
/// remote task executor).
///
/// Poll cadence, timeout, and retry/backoff policy belong to the caller of
/// this trait, not to implementations or to the engine.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch the current snapshot for a task.
    ///
    /// `Ok(None)` means the source had nothing to report this round (a
    /// legitimate no-op for the engine). `Err` means the poll itself failed;
    /// the caller decides when repeated failures turn into a failed task.
    async fn fetch(&self, task_id: &str) -> Result<Option<Snapshot>, TallyError>;
}
