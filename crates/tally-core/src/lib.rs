//! tally-core
//!
//! Core building blocks for the Tally task-status reconciler.
//!
//! A remote system executes tasks on its own schedule; all we get are
//! point-in-time snapshots obtained by a polling collaborator. This crate
//! folds each snapshot into one durable [`domain::StatusRecord`] per task:
//!
//! - **domain**: data model (phase, parts, messages, artifacts, wire
//!   snapshot, status record)
//! - **convert**: wire content -> canonical content (total, never fails)
//! - **reconcile**: the idempotent merge + phase/timestamp tracking
//! - **ports**: seams for the collaborators (SnapshotSource, RecordStore)
//! - **impls**: in-memory / scripted implementations for dev and tests
//!
//! The engine itself performs no I/O and never returns an error: malformed
//! input degrades to a documented fallback. Polling cadence, timeout, and
//! retry policy belong to the caller.

pub mod convert;
pub mod domain;
pub mod error;
pub mod impls;
pub mod ports;
pub mod reconcile;

pub use domain::{
    Artifact, FileSource, Message, Part, Phase, RemoteArtifact, RemoteFile, RemoteMessage,
    RemotePart, Role, Snapshot, StatusRecord,
};
pub use error::TallyError;
pub use reconcile::update;
