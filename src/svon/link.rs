//! Navigation graph addressing: node references and neighbour links

use std::fmt;

use crate::math::morton::MortonCode;

/// Identifies one navigable cell of the octree.
///
/// Whole nodes are addressed by (layer, code). Partially blocked layer-0
/// nodes are navigated per sub-cell, so their references also carry the
/// sub-cell's local Morton index.
///
/// References are plain keys: they stay valid only until the octree is
/// rebuilt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef {
    pub layer: u8,
    pub code: MortonCode,
    pub sub: Option<u8>,
}

impl NodeRef {
    /// Reference to a whole node
    pub const fn node(layer: u8, code: MortonCode) -> Self {
        Self { layer, code, sub: None }
    }

    /// Reference to a sub-cell of a layer-0 node
    pub const fn sub_cell(code: MortonCode, sub: u8) -> Self {
        Self { layer: 0, code, sub: Some(sub) }
    }

    /// True if this addresses a sub-cell rather than a whole node
    pub fn is_sub_cell(&self) -> bool {
        self.sub.is_some()
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sub {
            Some(sub) => write!(f, "{}:{}:{}", self.layer, self.code, sub),
            None => write!(f, "{}:{}", self.layer, self.code),
        }
    }
}

/// A traversable edge to a neighbour, with its world-space length
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeLink {
    pub node: NodeRef,
    pub cost: f32,
}
