//! Built navigation octree and its point queries

use serde::Serialize;

use crate::core::types::{UVec3, Vec3};
use crate::math::morton::{decode_morton_3d, MortonCode};
use super::builder::{GenerationConfig, SvonBuilder};
use super::layers::LayerStore;
use super::link::{NodeLink, NodeRef};
use super::neighbors::NeighborResolver;
use super::node::{sub_cell_coord, VoxelNode, SUB_CELLS_PER_AXIS};
use super::oracle::OccupancyOracle;
use super::volume::Volume;

/// Read-only view of one stored node for debug drawing and export
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DebugNode {
    pub layer: u8,
    pub code: MortonCode,
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub occupied: bool,
    pub has_children: bool,
    /// Blocked sub-cells out of 64 (0 above layer 0 unless fully blocked)
    pub blocked_sub_cells: u32,
}

/// Size figures for a built octree
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OctreeStats {
    /// Node count per layer, finest first
    pub layer_node_counts: Vec<usize>,
    pub node_count: usize,
    pub memory_bytes: usize,
}

/// Free sub-cell center considered while snapping to the nearest free cell
struct SnapCandidate {
    distance: f32,
    grid: UVec3,
    node: NodeRef,
}

impl SnapCandidate {
    fn ranks_before(&self, other: &SnapCandidate) -> bool {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.grid.to_array().cmp(&other.grid.to_array()))
            .is_lt()
    }
}

/// A volume together with its built layer store.
///
/// Immutable once built; safe to query from many threads at once.
#[derive(Clone, Debug)]
pub struct NavOctree {
    volume: Volume,
    layers: LayerStore,
}

impl NavOctree {
    /// Build the octree for `volume` from `oracle`
    pub fn build<O: OccupancyOracle + ?Sized>(
        volume: Volume,
        oracle: &O,
        config: &GenerationConfig,
    ) -> Self {
        let layers = SvonBuilder::new(volume, config.clone()).build(oracle);
        Self { volume, layers }
    }

    pub fn volume(&self) -> &Volume {
        &self.volume
    }

    pub fn layers(&self) -> &LayerStore {
        &self.layers
    }

    pub fn resolver(&self) -> NeighborResolver<'_> {
        NeighborResolver::new(&self.volume, &self.layers)
    }

    /// Traversable neighbours of a cell
    pub fn neighbors(&self, node: NodeRef) -> Vec<NodeLink> {
        self.resolver().neighbors(node)
    }

    /// World center of a cell
    pub fn link_center(&self, node: NodeRef) -> Vec3 {
        self.volume.link_center(node)
    }

    /// Free cell containing `position`.
    ///
    /// Returns None outside the volume or in blocked space at the finest
    /// resolution (a blocked leaf or a blocked sub-cell).
    pub fn world_to_node(&self, position: Vec3) -> Option<NodeRef> {
        let finest = self.volume.code_at(0, position)?;
        for layer in (0..=self.volume.root_layer()).rev() {
            let code = finest >> (3 * layer as u32);
            let node = self.layers.find(layer, code)?;
            if node.has_children() {
                continue;
            }
            if node.is_open() {
                return Some(NodeRef::node(layer, code));
            }
            if node.is_partial() {
                let sub = self.volume.sub_cell_at(code, position);
                return (!node.is_sub_cell_blocked(sub)).then_some(NodeRef::sub_cell(code, sub));
            }
            return None;
        }
        None
    }

    /// Free cell at `position`, or the closest free cell whose sub-cell
    /// center lies within `radius`.
    ///
    /// Candidates are ranked by distance, ties broken by sub-cell grid
    /// coordinate, so the answer is deterministic. Only leaves that intersect
    /// the search sphere are visited. Returns None if `position` is outside
    /// the volume.
    pub fn nearest_free_node(&self, position: Vec3, radius: f32) -> Option<NodeRef> {
        if !self.volume.contains(position) {
            return None;
        }
        if let Some(node) = self.world_to_node(position) {
            return Some(node);
        }
        if !(radius > 0.0) {
            return None;
        }

        let root = self.layers.root()?;
        let mut best = None;
        self.nearest_in(self.volume.root_layer(), root, position, radius, &mut best);
        best.map(|candidate| candidate.node)
    }

    fn nearest_in(
        &self,
        layer: u8,
        node: &VoxelNode,
        position: Vec3,
        radius: f32,
        best: &mut Option<SnapCandidate>,
    ) {
        let reach = best.as_ref().map_or(radius, |b| b.distance.min(radius));
        if self.volume.node_bounds(layer, node.code).distance_to_point(position) > reach {
            return;
        }

        if node.has_children() {
            for child in self.layers.children(layer, node.code).unwrap_or_default() {
                self.nearest_in(layer - 1, child, position, radius, best);
            }
        } else if node.is_open() {
            // Closest sub-cell center inside the leaf, lower index on ties
            let span = SUB_CELLS_PER_AXIS << layer;
            let (x, y, z) = decode_morton_3d(node.code);
            let first = UVec3::new(x, y, z) * span;
            let local = (position - self.volume.origin()) / self.volume.sub_cell_size();
            let grid = (local - 1.0)
                .ceil()
                .clamp(first.as_vec3(), (first + span - 1).as_vec3())
                .as_uvec3();
            self.offer(grid, NodeRef::node(layer, node.code), position, radius, best);
        } else if node.is_partial() {
            let (x, y, z) = decode_morton_3d(node.code);
            let first = UVec3::new(x, y, z) * SUB_CELLS_PER_AXIS;
            for sub in (0..64u8).filter(|&sub| !node.is_sub_cell_blocked(sub)) {
                let (sx, sy, sz) = sub_cell_coord(sub);
                let grid = first + UVec3::new(sx, sy, sz);
                self.offer(grid, NodeRef::sub_cell(node.code, sub), position, radius, best);
            }
        }
    }

    fn offer(
        &self,
        grid: UVec3,
        node: NodeRef,
        position: Vec3,
        radius: f32,
        best: &mut Option<SnapCandidate>,
    ) {
        let center = self.volume.origin() + (grid.as_vec3() + 0.5) * self.volume.sub_cell_size();
        let candidate = SnapCandidate { distance: center.distance(position), grid, node };
        if candidate.distance > radius {
            return;
        }
        if best.as_ref().is_none_or(|b| candidate.ranks_before(b)) {
            *best = Some(candidate);
        }
    }

    /// Every stored node with its world bounds
    pub fn nodes(&self) -> impl Iterator<Item = DebugNode> + '_ {
        (0..self.layers.layer_total() as u8).flat_map(move |layer| {
            self.layers.layer(layer).iter().map(move |node| {
                let bounds = self.volume.node_bounds(layer, node.code);
                DebugNode {
                    layer,
                    code: node.code,
                    min: bounds.min.to_array(),
                    max: bounds.max.to_array(),
                    occupied: node.is_occupied(),
                    has_children: node.has_children(),
                    blocked_sub_cells: node.blocked_sub_cells(),
                }
            })
        })
    }

    pub fn stats(&self) -> OctreeStats {
        OctreeStats {
            layer_node_counts: self.layers.layer_node_counts(),
            node_count: self.layers.node_count(),
            memory_bytes: self.layers.memory_usage(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::morton::encode_morton_3d;
    use crate::math::Aabb;
    use crate::svon::node::sub_cell_index;
    use crate::svon::oracle::BlockingBoxes;

    fn octree(boxes: Vec<Aabb>) -> NavOctree {
        let volume = Volume::new(Vec3::ZERO, 1.0, 3).unwrap();
        NavOctree::build(volume, &BlockingBoxes::from_boxes(boxes), &GenerationConfig::default())
    }

    #[test]
    fn test_world_to_node_free_space() {
        let tree = octree(vec![]);
        assert_eq!(tree.world_to_node(Vec3::splat(3.0)), Some(NodeRef::node(3, 0)));
        assert_eq!(tree.world_to_node(Vec3::splat(8.0)), Some(NodeRef::node(3, 0)));
        assert_eq!(tree.world_to_node(Vec3::new(-0.1, 1.0, 1.0)), None);
    }

    #[test]
    fn test_world_to_node_mixed() {
        let tree = octree(vec![Aabb::cube(Vec3::splat(4.0), 1.0)]);
        assert_eq!(tree.world_to_node(Vec3::splat(1.0)), Some(NodeRef::node(2, 0)));
        assert_eq!(tree.world_to_node(Vec3::splat(7.0)), Some(NodeRef::node(1, 63)));
        assert_eq!(
            tree.world_to_node(Vec3::new(5.5, 4.5, 4.5)),
            Some(NodeRef::node(0, encode_morton_3d(5, 4, 4)))
        );
        assert_eq!(tree.world_to_node(Vec3::splat(4.5)), None);
    }

    #[test]
    fn test_world_to_node_sub_cells() {
        let tree = octree(vec![Aabb::new(Vec3::splat(4.0), Vec3::new(4.5, 5.0, 5.0))]);
        let code = encode_morton_3d(4, 4, 4);
        assert_eq!(tree.world_to_node(Vec3::new(4.2, 4.5, 4.5)), None);
        assert_eq!(
            tree.world_to_node(Vec3::new(4.8, 4.1, 4.6)),
            Some(NodeRef::sub_cell(code, sub_cell_index(3, 0, 2)))
        );
    }

    #[test]
    fn test_nearest_free_node() {
        let tree = octree(vec![Aabb::new(Vec3::splat(2.0), Vec3::splat(6.0))]);
        let inside = Vec3::splat(4.0);
        assert_eq!(tree.world_to_node(inside), None);
        assert_eq!(tree.nearest_free_node(inside, 1.0), None);
        assert_eq!(tree.nearest_free_node(inside, 0.0), None);

        let found = tree.nearest_free_node(inside, 3.0).unwrap();
        let center = tree.link_center(found);
        assert!(!Aabb::new(Vec3::splat(2.0), Vec3::splat(6.0)).contains_point(center));

        // Free points resolve to themselves regardless of radius
        assert_eq!(
            tree.nearest_free_node(Vec3::splat(0.5), 0.0),
            tree.world_to_node(Vec3::splat(0.5))
        );
        assert_eq!(tree.nearest_free_node(Vec3::splat(-1.0), 5.0), None);
    }

    #[test]
    fn test_nearest_free_node_deterministic() {
        let tree = octree(vec![Aabb::new(Vec3::splat(2.0), Vec3::splat(6.0))]);
        let p = Vec3::new(4.0, 4.0, 2.3);
        let first = tree.nearest_free_node(p, 2.0);
        assert!(first.is_some());
        for _ in 0..4 {
            assert_eq!(tree.nearest_free_node(p, 2.0), first);
        }
    }

    #[test]
    fn test_nearest_free_node_matches_grid_order() {
        // Ties between equidistant sub-cells go to the lower grid coordinate
        let tree = octree(vec![Aabb::new(Vec3::ZERO, Vec3::new(4.0, 8.0, 8.0))]);
        let found = tree.nearest_free_node(Vec3::new(3.0, 2.0, 2.0), 2.0).unwrap();
        assert_eq!(found, NodeRef::node(2, 1));
        assert_eq!(tree.nearest_free_node(Vec3::new(3.0, 2.0, 2.0), 1.0), None);
    }

    #[test]
    fn test_nearest_free_node_large_radius() {
        // 4096^3 voxels: walking every sub-cell in range would never finish
        let volume = Volume::new(Vec3::ZERO, 1.0, 12).unwrap();
        let side = volume.side_length();
        let config = GenerationConfig::default();

        let solid = Aabb::new(Vec3::splat(-1.0), Vec3::splat(side + 1.0));
        let tree = NavOctree::build(volume, &BlockingBoxes::from_boxes(vec![solid]), &config);
        assert_eq!(tree.stats().node_count, 1);
        assert_eq!(tree.nearest_free_node(Vec3::splat(100.0), side), None);

        let half = Aabb::new(Vec3::splat(-1.0), Vec3::new(side * 0.5, side + 1.0, side + 1.0));
        let tree = NavOctree::build(volume, &BlockingBoxes::from_boxes(vec![half]), &config);
        let position = Vec3::new(100.0, 50.0, 50.0);
        assert_eq!(tree.nearest_free_node(position, side), Some(NodeRef::node(11, 1)));
        assert_eq!(tree.nearest_free_node(position, 1900.0), None);
    }

    #[test]
    fn test_debug_nodes_and_stats() {
        let tree = octree(vec![Aabb::cube(Vec3::splat(4.0), 1.0)]);
        let nodes: Vec<DebugNode> = tree.nodes().collect();
        assert_eq!(nodes.len(), 25);
        let blocked: Vec<_> = nodes.iter().filter(|n| n.occupied && !n.has_children).collect();
        assert_eq!(blocked.len(), 1);
        assert_eq!(blocked[0].min, [4.0, 4.0, 4.0]);
        assert_eq!(blocked[0].blocked_sub_cells, 64);

        let stats = tree.stats();
        assert_eq!(stats.layer_node_counts, vec![8, 8, 8, 1]);
        assert_eq!(stats.node_count, 25);
        assert_eq!(stats.memory_bytes, 25 * 24);

        let json = serde_json::to_string(&nodes[0]).unwrap();
        assert!(json.contains("\"has_children\""));
    }
}
