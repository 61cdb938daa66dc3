//! Sparse voxel octree navigation node

use bytemuck::{Pod, Zeroable};

use crate::math::morton::{decode_morton_3d, encode_morton_3d, MortonCode};

/// Mask value of a leaf whose every sub-cell is blocked
pub const FULL_MASK: u64 = u64::MAX;

/// Number of sub-cells per axis inside a layer-0 node
pub const SUB_CELLS_PER_AXIS: u32 = 4;

const FLAG_OCCUPIED: u32 = 1;
const FLAG_HAS_CHILDREN: u32 = 1 << 1;

/// Octree node - exactly 24 bytes, stored by value in a layer array
///
/// Layout:
/// - code (8 bytes): Morton code of this cell within its layer
/// - leaf_mask (8 bytes): 4x4x4 sub-cell occupancy, bit = local Morton index
/// - flags (4 bytes): bit 0 occupied, bit 1 has children
/// - padding (4 bytes)
///
/// A blocked leaf stores [`FULL_MASK`] at any layer and a free leaf stores 0.
/// Only layer-0 nodes carry a mask in between.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct VoxelNode {
    pub code: MortonCode,
    pub leaf_mask: u64,
    flags: u32,
    _padding: u32,
}

impl VoxelNode {
    /// Fully free leaf
    pub const fn open(code: MortonCode) -> Self {
        Self { code, leaf_mask: 0, flags: 0, _padding: 0 }
    }

    /// Fully blocked leaf
    pub const fn solid(code: MortonCode) -> Self {
        Self { code, leaf_mask: FULL_MASK, flags: FLAG_OCCUPIED, _padding: 0 }
    }

    /// Mixed node whose 8 children live one layer down
    pub const fn branch(code: MortonCode) -> Self {
        Self { code, leaf_mask: 0, flags: FLAG_OCCUPIED | FLAG_HAS_CHILDREN, _padding: 0 }
    }

    /// Layer-0 node with sampled sub-cell occupancy
    pub const fn leaf(code: MortonCode, leaf_mask: u64) -> Self {
        let flags = if leaf_mask != 0 { FLAG_OCCUPIED } else { 0 };
        Self { code, leaf_mask, flags, _padding: 0 }
    }

    /// True if any part of this node's region is blocked
    pub fn is_occupied(&self) -> bool {
        self.flags & FLAG_OCCUPIED != 0
    }

    /// True if this node was subdivided
    pub fn has_children(&self) -> bool {
        self.flags & FLAG_HAS_CHILDREN != 0
    }

    /// Leaf with no blocked space at all
    pub fn is_open(&self) -> bool {
        !self.has_children() && self.leaf_mask == 0
    }

    /// Leaf with no free space at all
    pub fn is_solid(&self) -> bool {
        !self.has_children() && self.leaf_mask == FULL_MASK
    }

    /// Layer-0 leaf that must be navigated per sub-cell
    pub fn is_partial(&self) -> bool {
        !self.has_children() && self.leaf_mask != 0 && self.leaf_mask != FULL_MASK
    }

    /// Check a sub-cell by local Morton index (0-63)
    pub fn is_sub_cell_blocked(&self, sub: u8) -> bool {
        debug_assert!(sub < 64);
        (self.leaf_mask >> sub) & 1 != 0
    }

    /// Number of blocked sub-cells
    pub fn blocked_sub_cells(&self) -> u32 {
        self.leaf_mask.count_ones()
    }
}

/// Local Morton index of sub-cell (x, y, z), each in 0..4
#[inline]
pub fn sub_cell_index(x: u32, y: u32, z: u32) -> u8 {
    debug_assert!(x < SUB_CELLS_PER_AXIS && y < SUB_CELLS_PER_AXIS && z < SUB_CELLS_PER_AXIS);
    encode_morton_3d(x, y, z) as u8
}

/// Local coordinate of a sub-cell index
#[inline]
pub fn sub_cell_coord(sub: u8) -> (u32, u32, u32) {
    decode_morton_3d(sub as u64)
}
