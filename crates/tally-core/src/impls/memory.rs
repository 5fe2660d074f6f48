//! In-memory record store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::StatusRecord;
use crate::error::TallyError;
use crate::ports::RecordStore;

/// HashMap-backed [`RecordStore`] for development and tests.
///
/// One record per task id; saves replace wholesale. Real backends add
/// optimistic concurrency on top, the engine does not care.
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    records: Mutex<HashMap<String, StatusRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn load(&self, task_id: &str) -> Result<Option<StatusRecord>, TallyError> {
        Ok(self.records.lock().await.get(task_id).cloned())
    }

    async fn save(&self, task_id: &str, record: StatusRecord) -> Result<(), TallyError> {
        self.records.lock().await.insert(task_id.to_string(), record);
        Ok(())
    }
}
