//! tabshell Storage Layer
//!
//! File-backed persistence for the open tab set.
//! Writes go to a temporary sibling first and are renamed into place, so a
//! crash mid-write never leaves a truncated state file behind.

mod error;
mod state_file;

pub use error::StorageError;
pub use state_file::StateFile;

pub type Result<T> = std::result::Result<T, StorageError>;
