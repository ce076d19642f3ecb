use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Crate-wide error taxonomy.
///
/// Tree mutations fail locally and silently by default: the session
/// controller logs these and returns without effect, because the display
/// layer dispatches commands asynchronously and has no channel for a
/// synchronous failure reply. Nothing in this taxonomy is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum BunnyHoleError {
    #[error("no node with parent URL '{0}' exists in the tree")]
    ParentNotFound(String),
    #[error("path {0:?} does not resolve to a node")]
    InvalidPath(Vec<usize>),
    #[error("invalid move: {0}")]
    InvalidMove(String),
    #[error("tab lookup failed: {0}")]
    Lookup(String),
    #[error("snapshot persistence failed: {0}")]
    Persistence(String),
    #[error("(de)serialization error: {0}")]
    Serialization(String),
    #[error("file system error: {0}")]
    Io(String),
    #[error("no session is currently open")]
    NoSession,
}

impl From<serde_json::Error> for BunnyHoleError {
    fn from(src: serde_json::Error) -> BunnyHoleError {
        BunnyHoleError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for BunnyHoleError {
    fn from(src: io::Error) -> Self {
        BunnyHoleError::Io(format!("IOError: {}", src.kind()))
    }
}
