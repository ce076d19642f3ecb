//! The bunny hole: one browsing session's navigation tree.
//!
//! [`BunnyHole`] is the sole owner and mutator of the tree. Nodes live in an
//! arena indexed by private handles; parent links are handles, never owning
//! references. Everything outside this module addresses nodes by *path*
//! (child-index sequence from the root), the same addressing scheme the
//! display layer uses.
//!
//! Every successful mutation persists the full tree snapshot through the
//! configured [`SnapshotStore`] and then broadcasts the snapshot as an
//! [`Event::Tree`] to observers. Both side effects are fire-and-forget: a
//! failed write is logged and the in-memory tree remains the authority.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::{event::Event, storage::SnapshotStore, tab::BunnyTab, BunnyHoleError};

pub const ROOT_TITLE: &str = "New Bunny Hole";

const ROOT: NodeId = NodeId(0);

/// Arena handle. Never exposed: node identity outside this module is a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(usize);

#[derive(Debug)]
struct Node {
    tab: BunnyTab,
    sequence: u64,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Plain nested representation of the tree, root included.
///
/// This is the wire shape for the persisted slot, file import/export, and
/// the [`Event::Tree`] broadcast. Unknown fields from older files are
/// ignored and missing fields default, so snapshots stay loadable across
/// format revisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub sequence_key: u64,
    #[serde(default)]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(NodeSnapshot::node_count)
            .sum::<usize>()
    }
}

pub struct BunnyHole {
    nodes: Vec<Option<Node>>,
    free: Vec<usize>,
    next_sequence: u64,
    store: Arc<dyn SnapshotStore>,
    events: broadcast::Sender<Event>,
}

impl std::fmt::Display for BunnyHole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BunnyHole({} nodes)", self.node_count())
    }
}

impl BunnyHole {
    /// Creates an empty hole: a root sentinel with no children.
    ///
    /// The root carries a synthetic record (fixed title, empty URL) and is
    /// never the target of navigation inserts.
    pub fn new(store: Arc<dyn SnapshotStore>, events: broadcast::Sender<Event>) -> Self {
        let root = Node {
            tab: BunnyTab::new(ROOT_TITLE, ""),
            sequence: 0,
            parent: None,
            children: Vec::new(),
        };
        BunnyHole {
            nodes: vec![Some(root)],
            free: Vec::new(),
            next_sequence: 1,
            store,
            events,
        }
    }

    /// Rebuilds a hole from its serialized form.
    ///
    /// URLs are re-normalized on the way in, so hand-edited or imported
    /// files cannot smuggle fragments past the [`BunnyTab`] invariant.
    /// Sequence keys continue past the largest loaded key.
    pub fn from_snapshot(
        snapshot: &NodeSnapshot,
        store: Arc<dyn SnapshotStore>,
        events: broadcast::Sender<Event>,
    ) -> Self {
        let mut hole = BunnyHole::new(store, events);
        if let Some(root) = hole.node_mut(ROOT) {
            root.tab =
                BunnyTab::with_notes(snapshot.title.clone(), &snapshot.url, snapshot.notes.clone());
            root.sequence = snapshot.sequence_key;
        }
        let mut max_sequence = snapshot.sequence_key;
        for child in &snapshot.children {
            hole.restore(child, ROOT, &mut max_sequence);
        }
        hole.next_sequence = max_sequence + 1;
        hole
    }

    fn restore(&mut self, snapshot: &NodeSnapshot, parent: NodeId, max_sequence: &mut u64) {
        let tab =
            BunnyTab::with_notes(snapshot.title.clone(), &snapshot.url, snapshot.notes.clone());
        *max_sequence = (*max_sequence).max(snapshot.sequence_key);
        let id = self.alloc(Node {
            tab,
            sequence: snapshot.sequence_key,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.push(id);
        }
        for child in &snapshot.children {
            self.restore(child, id, max_sequence);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Serializes the full tree, root included.
    pub fn snapshot(&self) -> NodeSnapshot {
        self.snapshot_from(ROOT)
    }

    fn snapshot_from(&self, id: NodeId) -> NodeSnapshot {
        let Some(node) = self.node(id) else {
            return NodeSnapshot::default();
        };
        NodeSnapshot {
            title: node.tab.title.clone(),
            url: node.tab.url().to_string(),
            notes: node.tab.notes.clone(),
            sequence_key: node.sequence,
            children: node
                .children
                .iter()
                .map(|child| self.snapshot_from(*child))
                .collect(),
        }
    }

    /// Records a freshly visited page under the node whose URL matches
    /// `parent_url` (the root when `parent_url` is `None`).
    ///
    /// Revisits are deduplicated by URL: when a node for the page already
    /// exists anywhere in the tree, the call is an accepted no-op and the
    /// existing node is not re-parented. When `parent_url` resolves to no
    /// node, `root_if_orphan` decides between attaching at the root and
    /// failing with [`BunnyHoleError::ParentNotFound`].
    pub fn create_node(
        &mut self,
        tab: BunnyTab,
        parent_url: Option<&str>,
        root_if_orphan: bool,
    ) -> Result<(), BunnyHoleError> {
        if self.find_by_url(tab.url()).is_some() {
            tracing::debug!(url = tab.url(), "page already recorded, leaving tree as-is");
            return Ok(());
        }
        let parent = match parent_url {
            None => ROOT,
            Some(url) => match self.find_by_url(url) {
                Some(id) => id,
                None if root_if_orphan => {
                    tracing::debug!(source = url, "source page not in tree, attaching at root");
                    ROOT
                }
                None => return Err(BunnyHoleError::ParentNotFound(url.to_string())),
            },
        };
        self.attach(tab, parent, None);
        self.commit();
        Ok(())
    }

    /// Inserts a new node as a sibling of the node at `path`, immediately
    /// before or after it. The root has no sibling position, so the empty
    /// path is invalid here. Deduplicated by URL like [`Self::create_node`].
    pub fn place_node(
        &mut self,
        tab: BunnyTab,
        path: &[usize],
        after: bool,
    ) -> Result<(), BunnyHoleError> {
        if self.find_by_url(tab.url()).is_some() {
            tracing::debug!(url = tab.url(), "page already recorded, leaving tree as-is");
            return Ok(());
        }
        let anchor = self.resolve(path)?;
        let parent = match self.node(anchor).and_then(|node| node.parent) {
            Some(parent) => parent,
            None => return Err(BunnyHoleError::InvalidPath(path.to_vec())),
        };
        let index = match self.child_index(parent, anchor) {
            Some(position) => position + usize::from(after),
            None => return Err(BunnyHoleError::InvalidPath(path.to_vec())),
        };
        self.attach(tab, parent, Some(index));
        self.commit();
        Ok(())
    }

    /// Updates only the supplied fields of the node at `path`. A new URL
    /// passes through the usual normalization.
    pub fn edit_node(
        &mut self,
        path: &[usize],
        title: Option<&str>,
        url: Option<&str>,
        notes: Option<&str>,
    ) -> Result<(), BunnyHoleError> {
        let id = self.resolve(path)?;
        let Some(node) = self.node_mut(id) else {
            return Err(BunnyHoleError::InvalidPath(path.to_vec()));
        };
        if let Some(title) = title {
            node.tab.title = title.to_string();
        }
        if let Some(url) = url {
            node.tab.set_url(url);
        }
        if let Some(notes) = notes {
            node.tab.notes = notes.to_string();
        }
        self.commit();
        Ok(())
    }

    /// Removes the subtree rooted at `path`. Children go with their
    /// ancestor; orphans are never re-parented. The empty path (the root)
    /// is an accepted no-op.
    pub fn delete_node(&mut self, path: &[usize]) -> Result<(), BunnyHoleError> {
        if path.is_empty() {
            tracing::debug!("ignoring request to delete the root node");
            return Ok(());
        }
        let id = self.resolve(path)?;
        let parent = match self.node(id).and_then(|node| node.parent) {
            Some(parent) => parent,
            None => return Err(BunnyHoleError::InvalidPath(path.to_vec())),
        };
        if let Some(parent_node) = self.node_mut(parent) {
            parent_node.children.retain(|child| *child != id);
        }
        self.free_subtree(id);
        self.commit();
        Ok(())
    }

    /// Moves the node at `src` to become a sibling of the node at `dst`,
    /// inserted immediately before or after it.
    ///
    /// The root cannot move, nothing may join the root's nesting level, and
    /// a node cannot move into its own subtree. All four handles (both
    /// nodes, both parents) are resolved before any child list is touched;
    /// the destination index is then recomputed by identity after the
    /// source is detached, so a same-parent move cannot suffer index shift.
    pub fn reposition_node(
        &mut self,
        src: &[usize],
        dst: &[usize],
        after: bool,
    ) -> Result<(), BunnyHoleError> {
        if src.is_empty() {
            return Err(BunnyHoleError::InvalidMove(
                "cannot move the root node".to_string(),
            ));
        }
        if dst.is_empty() {
            return Err(BunnyHoleError::InvalidMove(
                "cannot place a node on the root's nesting level".to_string(),
            ));
        }
        if dst.len() >= src.len() && dst[..src.len()] == *src {
            return Err(BunnyHoleError::InvalidMove(
                "cannot move a node into its own subtree".to_string(),
            ));
        }

        let src_id = self.resolve(src)?;
        let dst_id = self.resolve(dst)?;
        let src_parent = match self.node(src_id).and_then(|node| node.parent) {
            Some(parent) => parent,
            None => return Err(BunnyHoleError::InvalidPath(src.to_vec())),
        };
        let dst_parent = match self.node(dst_id).and_then(|node| node.parent) {
            Some(parent) => parent,
            None => return Err(BunnyHoleError::InvalidPath(dst.to_vec())),
        };

        if let Some(parent_node) = self.node_mut(src_parent) {
            parent_node.children.retain(|child| *child != src_id);
        }
        let index = match self.child_index(dst_parent, dst_id) {
            Some(position) => position + usize::from(after),
            None => return Err(BunnyHoleError::InvalidPath(dst.to_vec())),
        };
        if let Some(parent_node) = self.node_mut(dst_parent) {
            parent_node.children.insert(index, src_id);
        }
        if let Some(node) = self.node_mut(src_id) {
            node.parent = Some(dst_parent);
        }
        self.commit();
        Ok(())
    }

    /// Pre-order search: a node is visited before its children, children in
    /// sibling order. Returns the path of the first match.
    pub fn search_by_url(&self, url: &str) -> Option<Vec<usize>> {
        self.find_by_url(url).map(|id| self.path_to(id))
    }

    fn find_by_url(&self, url: &str) -> Option<NodeId> {
        self.find_from(ROOT, url)
    }

    fn find_from(&self, id: NodeId, url: &str) -> Option<NodeId> {
        let node = self.node(id)?;
        if node.tab.url() == url {
            return Some(id);
        }
        node.children
            .iter()
            .find_map(|child| self.find_from(*child, url))
    }

    fn path_to(&self, mut id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        while let Some(parent) = self.node(id).and_then(|node| node.parent) {
            if let Some(position) = self.child_index(parent, id) {
                path.push(position);
            }
            id = parent;
        }
        path.reverse();
        path
    }

    fn resolve(&self, path: &[usize]) -> Result<NodeId, BunnyHoleError> {
        let mut id = ROOT;
        for &index in path {
            let Some(node) = self.node(id) else {
                return Err(BunnyHoleError::InvalidPath(path.to_vec()));
            };
            match node.children.get(index) {
                Some(child) => id = *child,
                None => return Err(BunnyHoleError::InvalidPath(path.to_vec())),
            }
        }
        Ok(id)
    }

    fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.node(parent)?
            .children
            .iter()
            .position(|candidate| *candidate == child)
    }

    fn attach(&mut self, tab: BunnyTab, parent: NodeId, index: Option<usize>) -> NodeId {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let id = self.alloc(Node {
            tab,
            sequence,
            parent: Some(parent),
            children: Vec::new(),
        });
        if let Some(parent_node) = self.node_mut(parent) {
            let end = parent_node.children.len();
            let index = index.unwrap_or(end).min(end);
            parent_node.children.insert(index, id);
        }
        id
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes[current.0].take() {
                pending.extend(node.children);
                self.free.push(current.0);
            }
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Persist first, then notify. Neither failure rolls back the mutation:
    /// the in-memory tree is the authority and persistence is best-effort
    /// until the next successful write.
    fn commit(&mut self) {
        let snapshot = self.snapshot();
        if let Err(err) = self.store.save(&snapshot) {
            tracing::warn!("failed to persist tree snapshot: {err}");
        }
        if self.events.receiver_count() > 0 {
            let _ = self.events.send(Event::Tree(snapshot));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn test_hole() -> BunnyHole {
        let (events, _) = broadcast::channel(16);
        BunnyHole::new(Arc::new(MemoryStore::default()), events)
    }

    fn tab(title: &str, url: &str) -> BunnyTab {
        BunnyTab::new(title, url)
    }

    /// Walks the arena and checks that every child's parent handle points
    /// back at the node listing it, and that each live non-root node is
    /// listed by exactly one parent.
    fn assert_parent_consistency(hole: &BunnyHole) {
        let mut referenced = vec![0usize; hole.nodes.len()];
        for (index, slot) in hole.nodes.iter().enumerate() {
            let Some(node) = slot else { continue };
            for child in &node.children {
                let child_node = hole.nodes[child.0]
                    .as_ref()
                    .expect("child handle points at a live slot");
                assert_eq!(child_node.parent, Some(NodeId(index)));
                referenced[child.0] += 1;
            }
        }
        for (index, slot) in hole.nodes.iter().enumerate() {
            if slot.is_some() && index != ROOT.0 {
                assert_eq!(referenced[index], 1, "node {index} parented once");
            }
        }
    }

    #[test]
    fn new_hole_has_sentinel_root() {
        let hole = test_hole();
        let snapshot = hole.snapshot();
        assert_eq!(snapshot.title, ROOT_TITLE);
        assert_eq!(snapshot.url, "");
        assert_eq!(snapshot.sequence_key, 0);
        assert!(snapshot.children.is_empty());
    }

    #[test]
    fn create_node_without_parent_attaches_to_root() {
        let mut hole = test_hole();
        hole.create_node(tab("x", "http://x.com/"), None, false)
            .unwrap();
        let snapshot = hole.snapshot();
        assert_eq!(snapshot.children.len(), 1);
        assert_eq!(snapshot.children[0].url, "http://x.com/");
        assert_parent_consistency(&hole);
    }

    #[test]
    fn create_node_under_parent_url() {
        let mut hole = test_hole();
        hole.create_node(tab("x", "http://x.com/"), None, false)
            .unwrap();
        hole.create_node(tab("y", "http://y.com/"), Some("http://x.com/"), false)
            .unwrap();
        let snapshot = hole.snapshot();
        assert_eq!(snapshot.children.len(), 1);
        assert_eq!(snapshot.children[0].children.len(), 1);
        assert_eq!(snapshot.children[0].children[0].url, "http://y.com/");
        assert_parent_consistency(&hole);
    }

    #[test]
    fn create_node_duplicate_url_is_noop() {
        let mut hole = test_hole();
        hole.create_node(tab("x", "http://x.com/"), None, false)
            .unwrap();
        let before = hole.snapshot();
        hole.create_node(tab("x again", "http://x.com/"), Some("http://x.com/"), false)
            .unwrap();
        assert_eq!(hole.snapshot(), before);
    }

    #[test]
    fn create_node_unresolvable_parent_fails_without_fallback() {
        let mut hole = test_hole();
        let result = hole.create_node(tab("y", "http://y.com/"), Some("http://gone.com/"), false);
        assert_eq!(
            result,
            Err(BunnyHoleError::ParentNotFound("http://gone.com/".to_string()))
        );
        assert!(hole.snapshot().children.is_empty());
    }

    #[test]
    fn create_node_orphan_falls_back_to_root() {
        let mut hole = test_hole();
        hole.create_node(tab("y", "http://y.com/"), Some("http://gone.com/"), true)
            .unwrap();
        let snapshot = hole.snapshot();
        assert_eq!(snapshot.children.len(), 1);
        assert_eq!(snapshot.children[0].url, "http://y.com/");
    }

    #[test]
    fn url_uniqueness_holds_over_create_sequences() {
        let mut hole = test_hole();
        let urls = [
            "http://a.com/",
            "http://b.com/",
            "http://a.com/",
            "http://c.com/",
            "http://b.com/",
        ];
        for (index, url) in urls.iter().enumerate() {
            let parent = if index % 2 == 0 {
                None
            } else {
                Some("http://a.com/")
            };
            hole.create_node(tab("page", url), parent, true).unwrap();
        }
        let mut seen = Vec::new();
        fn collect(snapshot: &NodeSnapshot, seen: &mut Vec<String>) {
            seen.push(snapshot.url.clone());
            for child in &snapshot.children {
                collect(child, seen);
            }
        }
        collect(&hole.snapshot(), &mut seen);
        let mut deduped = seen.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(seen.len(), deduped.len(), "no duplicate URLs in tree");
    }

    #[test]
    fn sequence_keys_increase_monotonically() {
        let mut hole = test_hole();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        hole.create_node(tab("b", "http://b.com/"), None, false)
            .unwrap();
        let snapshot = hole.snapshot();
        assert_eq!(snapshot.children[0].sequence_key, 1);
        assert_eq!(snapshot.children[1].sequence_key, 2);
    }

    #[test]
    fn place_node_before_and_after_anchor() {
        let mut hole = test_hole();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        hole.place_node(tab("b", "http://b.com/"), &[0], true).unwrap();
        hole.place_node(tab("c", "http://c.com/"), &[0], false)
            .unwrap();
        let snapshot = hole.snapshot();
        let urls: Vec<&str> = snapshot
            .children
            .iter()
            .map(|child| child.url.as_str())
            .collect();
        assert_eq!(urls, vec!["http://c.com/", "http://a.com/", "http://b.com/"]);
        assert_parent_consistency(&hole);
    }

    #[test]
    fn place_node_rejects_root_and_bad_paths() {
        let mut hole = test_hole();
        assert_eq!(
            hole.place_node(tab("a", "http://a.com/"), &[], true),
            Err(BunnyHoleError::InvalidPath(vec![]))
        );
        assert_eq!(
            hole.place_node(tab("a", "http://a.com/"), &[3], true),
            Err(BunnyHoleError::InvalidPath(vec![3]))
        );
    }

    #[test]
    fn edit_node_updates_only_supplied_fields() {
        let mut hole = test_hole();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        hole.edit_node(&[0], Some("renamed"), None, Some("visited twice"))
            .unwrap();
        let child = &hole.snapshot().children[0];
        assert_eq!(child.title, "renamed");
        assert_eq!(child.url, "http://a.com/");
        assert_eq!(child.notes, "visited twice");
    }

    #[test]
    fn edit_node_normalizes_new_url() {
        let mut hole = test_hole();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        hole.edit_node(&[0], None, Some("http://a.com/page#section"), None)
            .unwrap();
        assert_eq!(hole.snapshot().children[0].url, "http://a.com/page");
    }

    #[test]
    fn edit_node_bad_path_fails() {
        let mut hole = test_hole();
        assert_eq!(
            hole.edit_node(&[1, 2], Some("x"), None, None),
            Err(BunnyHoleError::InvalidPath(vec![1, 2]))
        );
    }

    #[test]
    fn delete_node_removes_whole_subtree() {
        let mut hole = test_hole();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        hole.create_node(tab("b", "http://b.com/"), Some("http://a.com/"), false)
            .unwrap();
        hole.delete_node(&[0]).unwrap();
        assert!(hole.snapshot().children.is_empty());
        assert_eq!(hole.node_count(), 1);
        assert!(hole.search_by_url("http://b.com/").is_none());
    }

    #[test]
    fn delete_root_is_a_noop() {
        let mut hole = test_hole();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        hole.delete_node(&[]).unwrap();
        assert_eq!(hole.snapshot().children.len(), 1);
    }

    #[test]
    fn deleted_url_can_be_recorded_again() {
        let mut hole = test_hole();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        hole.delete_node(&[0]).unwrap();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        assert_eq!(hole.snapshot().children.len(), 1);
        assert_parent_consistency(&hole);
    }

    #[test]
    fn reposition_before_moves_to_front() {
        let mut hole = test_hole();
        for url in ["http://a.com/", "http://b.com/", "http://c.com/"] {
            hole.create_node(tab("page", url), None, false).unwrap();
        }
        hole.reposition_node(&[2], &[0], false).unwrap();
        let urls: Vec<String> = hole
            .snapshot()
            .children
            .iter()
            .map(|child| child.url.clone())
            .collect();
        assert_eq!(urls, vec!["http://c.com/", "http://a.com/", "http://b.com/"]);
        assert_parent_consistency(&hole);
    }

    #[test]
    fn reposition_after_within_same_parent() {
        let mut hole = test_hole();
        for url in ["http://a.com/", "http://b.com/", "http://c.com/"] {
            hole.create_node(tab("page", url), None, false).unwrap();
        }
        hole.reposition_node(&[0], &[2], true).unwrap();
        let urls: Vec<String> = hole
            .snapshot()
            .children
            .iter()
            .map(|child| child.url.clone())
            .collect();
        assert_eq!(urls, vec!["http://b.com/", "http://c.com/", "http://a.com/"]);
    }

    #[test]
    fn reposition_across_parents_updates_parent_link() {
        let mut hole = test_hole();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        hole.create_node(tab("b", "http://b.com/"), Some("http://a.com/"), false)
            .unwrap();
        hole.create_node(tab("c", "http://c.com/"), None, false)
            .unwrap();
        // Move c next to b, under a.
        hole.reposition_node(&[1], &[0, 0], true).unwrap();
        let snapshot = hole.snapshot();
        assert_eq!(snapshot.children.len(), 1);
        let under_a: Vec<String> = snapshot.children[0]
            .children
            .iter()
            .map(|child| child.url.clone())
            .collect();
        assert_eq!(under_a, vec!["http://b.com/", "http://c.com/"]);
        assert_parent_consistency(&hole);
    }

    #[test]
    fn reposition_into_own_subtree_is_rejected() {
        let mut hole = test_hole();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        hole.create_node(tab("b", "http://b.com/"), Some("http://a.com/"), false)
            .unwrap();
        let before = hole.snapshot();
        let result = hole.reposition_node(&[0], &[0, 0], true);
        assert!(matches!(result, Err(BunnyHoleError::InvalidMove(_))));
        assert_eq!(hole.snapshot(), before);
    }

    #[test]
    fn reposition_root_or_to_root_level_is_rejected() {
        let mut hole = test_hole();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        assert!(matches!(
            hole.reposition_node(&[], &[0], true),
            Err(BunnyHoleError::InvalidMove(_))
        ));
        assert!(matches!(
            hole.reposition_node(&[0], &[], true),
            Err(BunnyHoleError::InvalidMove(_))
        ));
    }

    #[test]
    fn reposition_onto_itself_is_rejected() {
        let mut hole = test_hole();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        assert!(matches!(
            hole.reposition_node(&[0], &[0], true),
            Err(BunnyHoleError::InvalidMove(_))
        ));
    }

    #[test]
    fn search_is_preorder_first_match() {
        let mut hole = test_hole();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        hole.create_node(tab("b", "http://b.com/"), Some("http://a.com/"), false)
            .unwrap();
        hole.create_node(tab("c", "http://c.com/"), None, false)
            .unwrap();
        assert_eq!(hole.search_by_url("http://a.com/"), Some(vec![0]));
        assert_eq!(hole.search_by_url("http://b.com/"), Some(vec![0, 0]));
        assert_eq!(hole.search_by_url("http://c.com/"), Some(vec![1]));
        assert_eq!(hole.search_by_url("http://missing.com/"), None);
    }

    #[test]
    fn snapshot_roundtrip_preserves_structure_and_order() {
        let mut hole = test_hole();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        hole.create_node(tab("b", "http://b.com/"), Some("http://a.com/"), false)
            .unwrap();
        hole.create_node(tab("c", "http://c.com/"), None, false)
            .unwrap();
        hole.edit_node(&[0], None, None, Some("some notes")).unwrap();

        let snapshot = hole.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: NodeSnapshot = serde_json::from_str(&json).unwrap();
        let (events, _) = broadcast::channel(16);
        let restored = BunnyHole::from_snapshot(&parsed, Arc::new(MemoryStore::default()), events);

        assert_eq!(restored.snapshot(), snapshot);
        assert_parent_consistency(&restored);
    }

    #[test]
    fn restored_hole_continues_sequence_keys() {
        let mut hole = test_hole();
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        hole.create_node(tab("b", "http://b.com/"), None, false)
            .unwrap();
        let snapshot = hole.snapshot();

        let (events, _) = broadcast::channel(16);
        let mut restored =
            BunnyHole::from_snapshot(&snapshot, Arc::new(MemoryStore::default()), events);
        restored
            .create_node(tab("c", "http://c.com/"), None, false)
            .unwrap();
        assert_eq!(restored.snapshot().children[2].sequence_key, 3);
    }

    #[test]
    fn snapshot_with_missing_fields_loads_with_defaults() {
        let parsed: NodeSnapshot =
            serde_json::from_str(r#"{"title": "Old Hole", "children": [{"url": "http://a.com/"}]}"#)
                .unwrap();
        assert_eq!(parsed.title, "Old Hole");
        assert_eq!(parsed.url, "");
        assert_eq!(parsed.children[0].url, "http://a.com/");
        assert_eq!(parsed.children[0].notes, "");
    }

    #[test]
    fn serialized_form_uses_camel_case_sequence_key() {
        let hole = test_hole();
        let json = serde_json::to_string(&hole.snapshot()).unwrap();
        assert!(json.contains("\"sequenceKey\":0"));
    }

    #[test]
    fn mutations_persist_through_the_store() {
        let store = Arc::new(MemoryStore::default());
        let (events, _) = broadcast::channel(16);
        let mut hole = BunnyHole::new(store.clone(), events);
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        let saved = store.load().unwrap().expect("snapshot persisted");
        assert_eq!(saved.children.len(), 1);
        assert_eq!(saved.children[0].url, "http://a.com/");
    }

    #[test]
    fn mutations_notify_subscribers_after_persisting() {
        let store = Arc::new(MemoryStore::default());
        let (events, mut rx) = broadcast::channel(16);
        let mut hole = BunnyHole::new(store, events);
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        match rx.try_recv() {
            Ok(Event::Tree(snapshot)) => assert_eq!(snapshot.children.len(), 1),
            other => panic!("expected tree event, got {other:?}"),
        }
    }

    #[test]
    fn rejected_mutations_do_not_notify() {
        let store = Arc::new(MemoryStore::default());
        let (events, mut rx) = broadcast::channel(16);
        let mut hole = BunnyHole::new(store, events);
        hole.create_node(tab("a", "http://a.com/"), None, false)
            .unwrap();
        let _ = rx.try_recv();
        assert!(hole.delete_node(&[5]).is_err());
        assert!(rx.try_recv().is_err());
    }
}
