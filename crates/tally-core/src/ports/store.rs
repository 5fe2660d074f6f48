//! Record store port.

use async_trait::async_trait;

use crate::domain::StatusRecord;
use crate::error::TallyError;

/// Durable home of status records, one per task.
///
/// The engine has no opinion on the storage format or the concurrency
/// control used for writes; callers load, fold, and save inside whatever
/// critical section their backend gives them.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn load(&self, task_id: &str) -> Result<Option<StatusRecord>, TallyError>;

    async fn save(&self, task_id: &str, record: StatusRecord) -> Result<(), TallyError>;
}
