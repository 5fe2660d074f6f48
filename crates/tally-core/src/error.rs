use thiserror::Error;

/// Errors surfaced by the collaborator seams (ports).
///
/// The reconciliation engine itself never fails: malformed snapshot content
/// degrades to documented fallbacks. These variants exist for the things
/// around it, fetching snapshots and persisting records.
#[derive(Debug, Error)]
pub enum TallyError {
    #[error("remote source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("record store failure: {0}")]
    Store(String),

    #[error("{0}")]
    Other(String),
}
