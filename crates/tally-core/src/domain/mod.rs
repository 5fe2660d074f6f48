//! Domain model (phase, content parts, messages, wire snapshot, record).

pub mod message;
pub mod part;
pub mod phase;
pub mod record;
pub mod remote;

pub use message::{Artifact, Message, Role};
pub use part::{FileSource, Part, UNKNOWN_PART_TEXT};
pub use phase::Phase;
pub use record::StatusRecord;
pub use remote::{RemoteArtifact, RemoteFile, RemoteMessage, RemotePart, Snapshot};
