//! Ports (interfaces) for the engine's collaborators.
//!
//! The engine is pure; everything with a failure mode lives behind these
//! seams. v1 ships in-memory implementations (see `impls`), but the traits
//! are where real network/storage backends plug in later.

mod source;
mod store;

pub use source::SnapshotSource;
pub use store::RecordStore;
