//! Neighbour discovery across layers and sub-cells
//!
//! Links are computed on demand from the layer arrays and never cached.
//! A neighbour at the same layer is found directly by code. A missing code
//! means a coarser leaf absorbed that region, found by walking up. A
//! subdivided neighbour fans out into every descendant touching the shared
//! face, edge or corner.
//!
//! Edge and corner steps also require the cells around the crossed edge or
//! corner to be free where they touch it, so a path never slips between
//! two blocked cells that only meet along an edge.

use crate::core::types::{IVec3, UVec3};
use crate::math::morton::{decode_morton_3d, encode_morton_3d, octant_of, MortonCode};
use super::layers::LayerStore;
use super::link::{NodeLink, NodeRef};
use super::node::{sub_cell_coord, sub_cell_index, VoxelNode, SUB_CELLS_PER_AXIS};
use super::volume::Volume;

/// The 26 neighbour offsets: 6 faces, then 12 edges, then 8 corners
pub const DIRECTIONS: [IVec3; 26] = [
    IVec3::new(-1, 0, 0),
    IVec3::new(1, 0, 0),
    IVec3::new(0, -1, 0),
    IVec3::new(0, 1, 0),
    IVec3::new(0, 0, -1),
    IVec3::new(0, 0, 1),
    IVec3::new(-1, -1, 0),
    IVec3::new(1, -1, 0),
    IVec3::new(-1, 1, 0),
    IVec3::new(1, 1, 0),
    IVec3::new(-1, 0, -1),
    IVec3::new(1, 0, -1),
    IVec3::new(-1, 0, 1),
    IVec3::new(1, 0, 1),
    IVec3::new(0, -1, -1),
    IVec3::new(0, 1, -1),
    IVec3::new(0, -1, 1),
    IVec3::new(0, 1, 1),
    IVec3::new(-1, -1, -1),
    IVec3::new(1, -1, -1),
    IVec3::new(-1, 1, -1),
    IVec3::new(1, 1, -1),
    IVec3::new(-1, -1, 1),
    IVec3::new(1, -1, 1),
    IVec3::new(-1, 1, 1),
    IVec3::new(1, 1, 1),
];

/// True if a cell at `local` (each axis in `0..=last`) touches the boundary
/// shared with a neighbour lying in direction `-dir`
fn faces_toward(local: UVec3, dir: IVec3, last: u32) -> bool {
    let axis = |l: u32, d: i32| match d {
        1 => l == 0,
        -1 => l == last,
        _ => true,
    };
    axis(local.x, dir.x) && axis(local.y, dir.y) && axis(local.z, dir.z)
}

/// Local offset (0 or 1 per axis) of a child inside its parent
fn octant_offset(code: MortonCode) -> UVec3 {
    let octant = octant_of(code) as u32;
    UVec3::new(octant & 1, (octant >> 1) & 1, (octant >> 2) & 1)
}

/// Cells sharing the edge or corner crossed by a diagonal step `dir`.
///
/// Yields `(offset, toward)` pairs: `offset` is the cell relative to the
/// origin cell and `toward` selects its parts that touch the crossed edge or
/// corner, in the convention of [`faces_toward`]. Face steps yield nothing.
fn straddled(dir: IVec3) -> impl Iterator<Item = (IVec3, IVec3)> {
    (1..7).filter_map(move |bits: i32| {
        let pick = IVec3::new(bits & 1, (bits >> 1) & 1, (bits >> 2) & 1);
        if pick * dir.abs() != pick {
            return None;
        }
        let offset = pick * dir;
        (offset != dir).then_some((offset, dir * (pick * 2 - IVec3::ONE)))
    })
}

fn in_range(coord: IVec3, side: i32) -> bool {
    coord.cmpge(IVec3::ZERO).all() && coord.cmplt(IVec3::splat(side)).all()
}

fn encode(coord: IVec3) -> MortonCode {
    encode_morton_3d(coord.x as u32, coord.y as u32, coord.z as u32)
}

fn push_unique(out: &mut Vec<NodeRef>, node: NodeRef) {
    if !out.contains(&node) {
        out.push(node);
    }
}

/// Resolves traversable neighbours of a navigable cell
pub struct NeighborResolver<'a> {
    volume: &'a Volume,
    layers: &'a LayerStore,
}

impl<'a> NeighborResolver<'a> {
    pub fn new(volume: &'a Volume, layers: &'a LayerStore) -> Self {
        Self { volume, layers }
    }

    /// All free cells adjacent to `node`, with the distance between centres.
    ///
    /// `node` must refer to a cell of the store this resolver was made for.
    /// Output order depends only on the store, never on hashing.
    pub fn neighbors(&self, node: NodeRef) -> Vec<NodeLink> {
        let mut targets = Vec::new();
        match node.sub {
            Some(sub) => self.sub_cell_targets(node.code, sub, &mut targets),
            None => self.node_targets(node.layer, node.code, &mut targets),
        }

        let from = self.volume.link_center(node);
        targets
            .into_iter()
            .map(|target| NodeLink {
                node: target,
                cost: from.distance(self.volume.link_center(target)),
            })
            .collect()
    }

    fn node_targets(&self, layer: u8, code: MortonCode, out: &mut Vec<NodeRef>) {
        let (x, y, z) = decode_morton_3d(code);
        let coord = IVec3::new(x as i32, y as i32, z as i32);
        let side = self.volume.nodes_per_side(layer) as i32;

        for dir in DIRECTIONS {
            let neighbour = coord + dir;
            if !in_range(neighbour, side) || !self.node_step_clear(layer, coord, dir) {
                continue;
            }
            let neighbour_code = encode(neighbour);
            match self.layers.find(layer, neighbour_code) {
                Some(node) => self.collect_facing(layer, node, dir, out),
                None => self.collect_containing(layer, neighbour_code, out),
            }
        }
    }

    fn sub_cell_targets(&self, code: MortonCode, sub: u8, out: &mut Vec<NodeRef>) {
        let (vx, vy, vz) = decode_morton_3d(code);
        let (sx, sy, sz) = sub_cell_coord(sub);
        let per_axis = SUB_CELLS_PER_AXIS as i32;
        let global = IVec3::new(vx as i32, vy as i32, vz as i32) * per_axis
            + IVec3::new(sx as i32, sy as i32, sz as i32);
        let side = self.volume.nodes_per_side(0) as i32 * per_axis;

        for dir in DIRECTIONS {
            let neighbour = global + dir;
            if !in_range(neighbour, side)
                || !straddled(dir).all(|(offset, _)| self.sub_cell_free(global + offset))
            {
                continue;
            }
            let voxel_code = encode(neighbour / per_axis);
            let local = (neighbour % per_axis).as_uvec3();
            let neighbour_sub = sub_cell_index(local.x, local.y, local.z);

            match self.layers.find(0, voxel_code) {
                Some(node) if node.is_open() => push_unique(out, NodeRef::node(0, voxel_code)),
                Some(node) if node.is_partial() => {
                    if !node.is_sub_cell_blocked(neighbour_sub) {
                        out.push(NodeRef::sub_cell(voxel_code, neighbour_sub));
                    }
                }
                Some(_) => {}
                None => self.collect_containing(0, voxel_code, out),
            }
        }
    }

    /// True unless a diagonal step from `coord` squeezes past blocked space
    fn node_step_clear(&self, layer: u8, coord: IVec3, dir: IVec3) -> bool {
        straddled(dir).all(|(offset, toward)| {
            let code = encode(coord + offset);
            match self.layers.find(layer, code) {
                Some(node) => self.touching_free(layer, node, toward),
                None => self
                    .layers
                    .leaf_containing(layer, code)
                    .is_some_and(|(_, leaf)| leaf.is_open()),
            }
        })
    }

    /// True if every part of `node` facing a neighbour in direction `-toward`
    /// is free
    fn touching_free(&self, layer: u8, node: &VoxelNode, toward: IVec3) -> bool {
        if node.has_children() {
            let Some(children) = self.layers.children(layer, node.code) else {
                return false;
            };
            children
                .iter()
                .filter(|child| faces_toward(octant_offset(child.code), toward, 1))
                .all(|child| self.touching_free(layer - 1, child, toward))
        } else if node.is_partial() {
            (0..64u8)
                .filter(|&sub| {
                    let (x, y, z) = sub_cell_coord(sub);
                    faces_toward(UVec3::new(x, y, z), toward, SUB_CELLS_PER_AXIS - 1)
                })
                .all(|sub| !node.is_sub_cell_blocked(sub))
        } else {
            node.is_open()
        }
    }

    /// True if the sub-cell at global sub-cell coordinate `global` is free
    fn sub_cell_free(&self, global: IVec3) -> bool {
        let per_axis = SUB_CELLS_PER_AXIS as i32;
        let voxel_code = encode(global / per_axis);
        match self.layers.find(0, voxel_code) {
            Some(node) if node.is_partial() => {
                let local = (global % per_axis).as_uvec3();
                !node.is_sub_cell_blocked(sub_cell_index(local.x, local.y, local.z))
            }
            Some(node) => node.is_open(),
            None => self
                .layers
                .leaf_containing(0, voxel_code)
                .is_some_and(|(_, leaf)| leaf.is_open()),
        }
    }

    /// Link the leaf that absorbed a missing cell, if it is free
    fn collect_containing(&self, layer: u8, code: MortonCode, out: &mut Vec<NodeRef>) {
        if let Some((leaf_layer, leaf)) = self.layers.leaf_containing(layer, code) {
            if leaf.is_open() {
                push_unique(out, NodeRef::node(leaf_layer, leaf.code));
            }
        }
    }

    /// Link the free parts of `node` that face a neighbour in direction `-dir`
    fn collect_facing(&self, layer: u8, node: &VoxelNode, dir: IVec3, out: &mut Vec<NodeRef>) {
        if node.has_children() {
            let Some(children) = self.layers.children(layer, node.code) else {
                return;
            };
            for child in children {
                if faces_toward(octant_offset(child.code), dir, 1) {
                    self.collect_facing(layer - 1, child, dir, out);
                }
            }
        } else if node.is_open() {
            push_unique(out, NodeRef::node(layer, node.code));
        } else if node.is_partial() {
            for sub in 0..64u8 {
                let (x, y, z) = sub_cell_coord(sub);
                if faces_toward(UVec3::new(x, y, z), dir, SUB_CELLS_PER_AXIS - 1)
                    && !node.is_sub_cell_blocked(sub)
                {
                    out.push(NodeRef::sub_cell(node.code, sub));
                }
            }
        }
    }
}
