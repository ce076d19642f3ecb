use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Command surface between the toolbar/display layer and the session
/// controller: session lifecycle plus UI-requested tree edits, as one
/// closed union matched exhaustively at dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    /// Discard the current tree and start fresh from the active tab.
    New,
    /// Read the persisted snapshot back into memory.
    Load,
    /// Import a tree from a user-selected file, replacing the current one.
    Open(PathBuf),
    /// Export the current tree to a user-selected file.
    Save(PathBuf),
    /// Discard the in-memory tree and stop tracking.
    Close,
    /// Insert a node as a sibling of the node at `path`.
    Place {
        path: Vec<usize>,
        after: bool,
        title: String,
        url: String,
    },
    /// Update the supplied fields of the node at `path`.
    Edit {
        path: Vec<usize>,
        title: Option<String>,
        url: Option<String>,
        notes: Option<String>,
    },
    /// Remove the subtree rooted at `path`.
    Delete { path: Vec<usize> },
    /// Move the node at `src` to be a sibling of the node at `dst`.
    Move {
        src: Vec<usize>,
        dst: Vec<usize>,
        after: bool,
    },
    /// Pause or resume recording of completed navigations.
    SetFrozen(bool),
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Op::New => write!(f, "New"),
            Op::Load => write!(f, "Load"),
            Op::Open(path) => write!(f, "Open({})", path.display()),
            Op::Save(path) => write!(f, "Save({})", path.display()),
            Op::Close => write!(f, "Close"),
            Op::Place { path, after, url, .. } => {
                write!(f, "Place({url} at {path:?}, after: {after})")
            }
            Op::Edit { path, .. } => write!(f, "Edit({path:?})"),
            Op::Delete { path } => write!(f, "Delete({path:?})"),
            Op::Move { src, dst, after } => {
                write!(f, "Move({src:?} -> {dst:?}, after: {after})")
            }
            Op::SetFrozen(frozen) => write!(f, "SetFrozen({frozen})"),
        }
    }
}
