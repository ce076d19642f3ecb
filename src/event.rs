use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::hole::NodeSnapshot;

/// Notification broadcast to observers of the active session.
///
/// The display layer re-renders from `Tree` payloads; it never receives
/// deltas. Delivery is fire-and-forget: a lagging or closed observer is
/// dropped without affecting the mutation that produced the event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    /// The tree changed; carries the full updated snapshot.
    Tree(NodeSnapshot),
    /// The session was discarded; observers should clear their view.
    SessionClosed,
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Event::Tree(snapshot) => write!(f, "Tree({} nodes)", snapshot.node_count()),
            Event::SessionClosed => write!(f, "SessionClosed"),
        }
    }
}
