//! Quadtree nodes and their lifecycle states.

use tellus_cubesphere::TileKey;
use tellus_pool::TileRef;

/// Lifecycle state of one quadtree node.
///
/// `Unloaded → Requested → Generating → Resident → (Splitting | Merging)
/// → Unloaded`. `Merging` is transient within a single update; `Splitting`
/// persists until all four children have geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TileState {
    /// No geometry and none requested (abandoned or torn down).
    Unloaded,
    /// Waiting to be submitted to the scheduler.
    Requested,
    /// A generation job is in flight.
    Generating,
    /// Geometry is in the pool.
    Resident,
    /// Children exist but not all of them have geometry yet; this node's
    /// geometry keeps covering the region.
    Splitting,
    /// Children are being collapsed back into this node.
    Merging,
}

/// One node of the planet quadtree.
///
/// A node is either a leaf, or an interior node with exactly four
/// exclusively-owned children, never a partial set.
pub struct TileNode {
    /// The tile this node covers.
    pub key: TileKey,
    /// Current lifecycle state.
    pub state: TileState,
    /// Non-owning reference into the tile pool once geometry was admitted.
    pub geometry: Option<TileRef>,
    /// The four children, present only while split.
    pub children: Option<Box<[TileNode; 4]>>,
    /// Generation failures seen so far.
    pub failures: u32,
    /// Permanently excluded from refinement after exhausting retries.
    pub abandoned: bool,
}

impl TileNode {
    /// Create a childless node in the given state.
    #[must_use]
    pub fn new(key: TileKey, state: TileState) -> Self {
        Self {
            key,
            state,
            geometry: None,
            children: None,
            failures: 0,
            abandoned: false,
        }
    }

    /// Whether this node currently has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Descend to the node with the given key, following the child-slot
    /// path encoded in the key's coordinates. Returns `None` when the key
    /// lies on another face, outside this subtree, or below the current
    /// leaves (e.g. the subtree was merged away).
    #[must_use]
    pub fn find_mut(&mut self, key: TileKey) -> Option<&mut TileNode> {
        if key.face != self.key.face || key.level < self.key.level {
            return None;
        }
        if key.level == self.key.level {
            return if key == self.key { Some(self) } else { None };
        }
        let slot = key.child_index_at_depth(self.key.level + 1);
        self.children.as_mut()?[slot].find_mut(key)
    }

    /// Visit this node and every descendant, depth-first in child order.
    pub fn visit(&self, f: &mut impl FnMut(&TileNode)) {
        f(self);
        if let Some(children) = &self.children {
            for child in children.iter() {
                child.visit(f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tellus_cubesphere::CubeFace;

    fn split(node: &mut TileNode) {
        let children = node.key.children().unwrap();
        node.children = Some(Box::new(
            children.map(|key| TileNode::new(key, TileState::Requested)),
        ));
        node.state = TileState::Splitting;
    }

    #[test]
    fn test_new_node_is_a_leaf() {
        let node = TileNode::new(TileKey::root(CubeFace::PosX), TileState::Requested);
        assert!(node.is_leaf());
        assert!(node.geometry.is_none());
        assert_eq!(node.failures, 0);
    }

    #[test]
    fn test_find_mut_reaches_descendants() {
        let mut root = TileNode::new(TileKey::root(CubeFace::PosY), TileState::Resident);
        split(&mut root);
        let child_key = root.children.as_ref().unwrap()[2].key;
        split(&mut root.children.as_mut().unwrap()[2]);
        let grandchild_key = root.children.as_ref().unwrap()[2].children.as_ref().unwrap()[1].key;

        assert_eq!(root.find_mut(child_key).unwrap().key, child_key);
        assert_eq!(root.find_mut(grandchild_key).unwrap().key, grandchild_key);
        let root_key = root.key;
        assert_eq!(root.find_mut(root_key).unwrap().key, root_key);
    }

    #[test]
    fn test_find_mut_misses_merged_away_keys() {
        let mut root = TileNode::new(TileKey::root(CubeFace::NegZ), TileState::Resident);
        let orphan = TileKey::root(CubeFace::NegZ).children().unwrap()[0];
        assert!(root.find_mut(orphan).is_none());

        let other_face = TileKey::root(CubeFace::PosX);
        assert!(root.find_mut(other_face).is_none());
    }

    #[test]
    fn test_visit_covers_whole_subtree() {
        let mut root = TileNode::new(TileKey::root(CubeFace::PosZ), TileState::Resident);
        split(&mut root);
        split(&mut root.children.as_mut().unwrap()[0]);

        let mut count = 0;
        root.visit(&mut |_| count += 1);
        assert_eq!(count, 1 + 4 + 4);
    }
}
