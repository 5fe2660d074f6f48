//! Development implementations of the ports (in-memory, scripted).

mod memory;
mod scripted;

pub use memory::InMemoryRecordStore;
pub use scripted::ScriptedSource;
