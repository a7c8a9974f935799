//! Typed reference edges between nodes.

use crate::{ids, NodeId};

/// A typed edge stored on its source node.
///
/// Every edge has a counterpart of the same type and opposite direction on
/// its target; see [`ReferenceEdge::reversed`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReferenceEdge {
    /// The reference type (e.g. [`ids::ORGANIZES`]).
    pub reference_type: NodeId,
    /// True if the edge points from the target to the holder.
    pub is_inverse: bool,
    /// The other end of the edge; null when the source omitted it.
    pub target: NodeId,
}

impl ReferenceEdge {
    /// A forward edge.
    #[must_use]
    pub fn forward(reference_type: NodeId, target: NodeId) -> Self {
        Self {
            reference_type,
            is_inverse: false,
            target,
        }
    }

    /// An inverse edge.
    #[must_use]
    pub fn inverse(reference_type: NodeId, target: NodeId) -> Self {
        Self {
            reference_type,
            is_inverse: true,
            target,
        }
    }

    /// The counterpart edge to store on `self.target`, pointing back to
    /// `source`.
    #[must_use]
    pub fn reversed(&self, source: &NodeId) -> Self {
        Self {
            reference_type: self.reference_type.clone(),
            is_inverse: !self.is_inverse,
            target: source.clone(),
        }
    }

    /// True for inverse edges of a hierarchical type, i.e. edges pointing at
    /// a parent.
    #[must_use]
    pub fn is_parent_link(&self) -> bool {
        self.is_inverse && ids::is_hierarchical(&self.reference_type)
    }
}

/// Which edges a browse follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BrowseDirection {
    /// Forward edges only.
    #[default]
    Forward,
    /// Inverse edges only.
    Inverse,
    /// Both directions.
    Both,
}

impl BrowseDirection {
    /// Returns true if an edge in the given direction is followed.
    #[must_use]
    pub fn includes(self, is_inverse: bool) -> bool {
        match self {
            BrowseDirection::Forward => !is_inverse,
            BrowseDirection::Inverse => is_inverse,
            BrowseDirection::Both => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reversed_flips_direction_and_target() {
        let parent = NodeId::numeric(0, 85);
        let child = NodeId::numeric(3, 5001);
        let edge = ReferenceEdge::inverse(ids::ORGANIZES, parent.clone());
        let back = edge.reversed(&child);
        assert_eq!(back, ReferenceEdge::forward(ids::ORGANIZES, child));
        assert!(edge.is_parent_link());
        assert!(!back.is_parent_link());
    }

    #[test]
    fn browse_direction_filter() {
        assert!(BrowseDirection::Forward.includes(false));
        assert!(!BrowseDirection::Forward.includes(true));
        assert!(BrowseDirection::Inverse.includes(true));
        assert!(BrowseDirection::Both.includes(true));
    }
}
