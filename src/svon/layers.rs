//! Per-layer Morton-sorted node arrays

use crate::math::morton::{child_code, parent_code, MortonCode};
use super::node::VoxelNode;

/// Sparse octree storage: one node array per layer, sorted by Morton code.
///
/// Children are never linked by index. A subdivided node at layer L owns the
/// 8 consecutive entries `code << 3 | 0..8` at layer L-1, found by binary
/// search. Index 0 is the finest layer, the last index holds the root.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerStore {
    layers: Vec<Vec<VoxelNode>>,
}

impl LayerStore {
    /// Wrap per-layer arrays produced by the builder
    pub fn from_layers(layers: Vec<Vec<VoxelNode>>) -> Self {
        debug_assert!(
            layers.iter().all(|l| l.windows(2).all(|w| w[0].code < w[1].code)),
            "layer arrays must be strictly ascending by Morton code"
        );
        Self { layers }
    }

    /// Number of layers including the root layer
    pub fn layer_total(&self) -> usize {
        self.layers.len()
    }

    /// All nodes of a layer, ascending by code
    pub fn layer(&self, layer: u8) -> &[VoxelNode] {
        &self.layers[layer as usize]
    }

    /// Raw bytes of a layer array (for external inspection tools)
    pub fn layer_bytes(&self, layer: u8) -> &[u8] {
        bytemuck::cast_slice(self.layer(layer))
    }

    /// The single root node
    pub fn root(&self) -> Option<&VoxelNode> {
        self.layers.last().and_then(|l| l.first())
    }

    /// Array index of `code` within `layer`
    pub fn index_of(&self, layer: u8, code: MortonCode) -> Option<usize> {
        self.layers
            .get(layer as usize)?
            .binary_search_by_key(&code, |n| n.code)
            .ok()
    }

    /// Look up a node by layer and code
    pub fn find(&self, layer: u8, code: MortonCode) -> Option<&VoxelNode> {
        let index = self.index_of(layer, code)?;
        Some(&self.layers[layer as usize][index])
    }

    /// The 8 children of a subdivided node, in octant order
    pub fn children(&self, layer: u8, code: MortonCode) -> Option<&[VoxelNode]> {
        if layer == 0 {
            return None;
        }
        let first = self.index_of(layer - 1, child_code(code, 0))?;
        self.layers[layer as usize - 1].get(first..first + 8)
    }

    /// Find the leaf that absorbed a missing node.
    ///
    /// `code` is a cell at `layer` with no entry of its own; walks toward the
    /// root until an existing ancestor is found.
    pub fn leaf_containing(&self, layer: u8, code: MortonCode) -> Option<(u8, &VoxelNode)> {
        let mut code = code;
        for ancestor_layer in layer as usize + 1..self.layers.len() {
            code = parent_code(code);
            if let Some(node) = self.find(ancestor_layer as u8, code) {
                return (!node.has_children()).then_some((ancestor_layer as u8, node));
            }
        }
        None
    }

    /// Number of nodes in each layer, finest first
    pub fn layer_node_counts(&self) -> Vec<usize> {
        self.layers.iter().map(Vec::len).collect()
    }

    /// Total number of stored nodes
    pub fn node_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    /// Calculate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        std::mem::size_of::<VoxelNode>() * self.node_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::morton::encode_morton_3d;

    /// Two-layer store: root subdivided, octant 7 subdivided again,
    /// octant 3 of that child fully blocked
    fn store() -> LayerStore {
        let mut layer1: Vec<VoxelNode> = (0..8).map(VoxelNode::open).collect();
        layer1[7] = VoxelNode::branch(7);
        let mut layer0: Vec<VoxelNode> =
            (0..8).map(|o| VoxelNode::open(child_code(7, o))).collect();
        layer0[3] = VoxelNode::solid(child_code(7, 3));
        LayerStore::from_layers(vec![layer0, layer1, vec![VoxelNode::branch(0)]])
    }

    #[test]
    fn test_find_and_counts() {
        let s = store();
        assert_eq!(s.layer_total(), 3);
        assert_eq!(s.layer_node_counts(), vec![8, 8, 1]);
        assert_eq!(s.node_count(), 17);
        assert_eq!(s.memory_usage(), 17 * 24);
        assert!(s.root().unwrap().has_children());
        assert!(s.find(1, 7).unwrap().has_children());
        assert!(s.find(0, child_code(7, 3)).unwrap().is_solid());
        assert!(s.find(0, 0).is_none());
    }

    #[test]
    fn test_children() {
        let s = store();
        let children = s.children(1, 7).unwrap();
        assert_eq!(children.len(), 8);
        assert_eq!(children[0].code, child_code(7, 0));
        assert_eq!(children[7].code, child_code(7, 7));
        assert!(s.children(1, 0).is_none());
        assert!(s.children(0, child_code(7, 0)).is_none());
    }

    #[test]
    fn test_leaf_containing() {
        let s = store();
        // Layer-0 cell (0, 0, 0) was absorbed by the open layer-1 node 0
        let (layer, node) = s.leaf_containing(0, encode_morton_3d(0, 0, 0)).unwrap();
        assert_eq!(layer, 1);
        assert_eq!(node.code, 0);
        assert!(node.is_open());
    }

    #[test]
    fn test_layer_bytes() {
        let s = store();
        let bytes = s.layer_bytes(1);
        assert_eq!(bytes.len(), 8 * std::mem::size_of::<VoxelNode>());
        // First field of the last node is its Morton code
        let code = u64::from_ne_bytes(bytes[7 * 24..7 * 24 + 8].try_into().unwrap());
        assert_eq!(code, 7);
    }
}
