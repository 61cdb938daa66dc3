//! Cubic navigation volume: layer geometry and world/voxel conversions

use serde::{Deserialize, Serialize};

use crate::core::types::{Result, UVec3, Vec3};
use crate::core::Error;
use crate::math::morton::{decode_morton_3d, encode_morton_3d, MortonCode};
use crate::math::Aabb;
use super::link::NodeRef;
use super::node::{sub_cell_coord, sub_cell_index, SUB_CELLS_PER_AXIS};

/// Maximum supported layer count. Layer-0 coordinates need `layer_count`
/// bits per axis and Morton codes hold 21.
pub const MAX_LAYER_COUNT: u8 = 20;

/// Relative tolerance when checking that bounds form a cube
const CUBE_TOLERANCE: f32 = 1e-4;

/// Axis-aligned cube subdivided into `layer_count + 1` octree layers.
///
/// Layer 0 holds nodes of edge `voxel_size`; layer `layer_count` holds the
/// single root node spanning the whole volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Volume {
    origin: Vec3,
    voxel_size: f32,
    layer_count: u8,
}

impl Volume {
    /// Create a volume from its min corner, finest voxel size and layer count
    pub fn new(origin: Vec3, voxel_size: f32, layer_count: u8) -> Result<Self> {
        if layer_count == 0 {
            return Err(Error::ZeroLayers);
        }
        if layer_count > MAX_LAYER_COUNT {
            return Err(Error::TooManyLayers { requested: layer_count, max: MAX_LAYER_COUNT });
        }
        if !voxel_size.is_finite() || voxel_size <= 0.0 {
            return Err(Error::InvalidVoxelSize(voxel_size));
        }
        Ok(Self { origin, voxel_size, layer_count })
    }

    /// Create a volume filling `bounds`, which must be a cube
    pub fn from_bounds(bounds: Aabb, layer_count: u8) -> Result<Self> {
        let size = bounds.size();
        let side = size.x;
        let tolerance = side.abs() * CUBE_TOLERANCE;
        if (size.y - side).abs() > tolerance || (size.z - side).abs() > tolerance {
            return Err(Error::NotCube(size));
        }
        if layer_count == 0 {
            return Err(Error::ZeroLayers);
        }
        let voxel_size = side / (1u32 << layer_count.min(MAX_LAYER_COUNT)) as f32;
        Self::new(bounds.min, voxel_size, layer_count)
    }

    /// Min corner (Morton code 0 at every layer starts here)
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Edge of a layer-0 node
    pub fn voxel_size(&self) -> f32 {
        self.voxel_size
    }

    /// Number of subdivisions between root and layer 0
    pub fn layer_count(&self) -> u8 {
        self.layer_count
    }

    /// Layer index of the root node
    pub fn root_layer(&self) -> u8 {
        self.layer_count
    }

    /// Edge length of the whole cube
    pub fn side_length(&self) -> f32 {
        self.node_size(self.layer_count)
    }

    /// World bounds of the whole cube
    pub fn bounds(&self) -> Aabb {
        Aabb::cube(self.origin, self.side_length())
    }

    /// Edge length of a node at `layer`
    pub fn node_size(&self, layer: u8) -> f32 {
        self.voxel_size * (1u32 << layer) as f32
    }

    /// Edge length of a layer-0 sub-cell
    pub fn sub_cell_size(&self) -> f32 {
        self.voxel_size / SUB_CELLS_PER_AXIS as f32
    }

    /// Number of nodes along one axis at `layer`
    pub fn nodes_per_side(&self, layer: u8) -> u32 {
        debug_assert!(layer <= self.layer_count, "layer {} out of range", layer);
        1 << (self.layer_count - layer)
    }

    /// True if the point lies in the volume (faces inclusive)
    pub fn contains(&self, position: Vec3) -> bool {
        self.bounds().contains_point(position)
    }

    /// Integer coordinate of the layer node containing `position`.
    /// Points on the max faces belong to the last cell.
    pub fn coord_at(&self, layer: u8, position: Vec3) -> Option<UVec3> {
        if !self.contains(position) {
            return None;
        }
        let max = self.nodes_per_side(layer) - 1;
        let local = (position - self.origin) / self.node_size(layer);
        Some(local.floor().as_uvec3().min(UVec3::splat(max)))
    }

    /// Morton code of the layer node containing `position`
    pub fn code_at(&self, layer: u8, position: Vec3) -> Option<MortonCode> {
        self.coord_at(layer, position).map(|c| encode_morton_3d(c.x, c.y, c.z))
    }

    /// World bounds of a node
    pub fn node_bounds(&self, layer: u8, code: MortonCode) -> Aabb {
        let (x, y, z) = decode_morton_3d(code);
        let size = self.node_size(layer);
        let min = self.origin + Vec3::new(x as f32, y as f32, z as f32) * size;
        Aabb::cube(min, size)
    }

    /// World center of a node
    pub fn node_center(&self, layer: u8, code: MortonCode) -> Vec3 {
        self.node_bounds(layer, code).center()
    }

    /// World bounds of sub-cell `sub` inside layer-0 node `code`
    pub fn sub_cell_bounds(&self, code: MortonCode, sub: u8) -> Aabb {
        let node_min = self.node_bounds(0, code).min;
        let (x, y, z) = sub_cell_coord(sub);
        let size = self.sub_cell_size();
        Aabb::cube(node_min + Vec3::new(x as f32, y as f32, z as f32) * size, size)
    }

    /// World center of sub-cell `sub` inside layer-0 node `code`
    pub fn sub_cell_center(&self, code: MortonCode, sub: u8) -> Vec3 {
        self.sub_cell_bounds(code, sub).center()
    }

    /// World bounds of a navigable cell (whole node or sub-cell)
    pub fn link_bounds(&self, node: NodeRef) -> Aabb {
        match node.sub {
            Some(sub) => self.sub_cell_bounds(node.code, sub),
            None => self.node_bounds(node.layer, node.code),
        }
    }

    /// World center of a navigable cell
    pub fn link_center(&self, node: NodeRef) -> Vec3 {
        self.link_bounds(node).center()
    }

    /// Sub-cell of layer-0 node `code` containing `position`, clamped to the node
    pub fn sub_cell_at(&self, code: MortonCode, position: Vec3) -> u8 {
        let node_min = self.node_bounds(0, code).min;
        let local = ((position - node_min) / self.sub_cell_size()).floor();
        let last = (SUB_CELLS_PER_AXIS - 1) as f32;
        let c = local.clamp(Vec3::ZERO, Vec3::splat(last)).as_uvec3();
        sub_cell_index(c.x, c.y, c.z)
    }
}

/// Serializable description of a [`Volume`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// Min corner of the cube
    pub origin: [f32; 3],
    /// Edge of a layer-0 node
    pub voxel_size: f32,
    /// Subdivisions between root and layer 0
    pub layer_count: u8,
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            origin: [0.0; 3],
            voxel_size: 1.0,
            layer_count: 5,
        }
    }
}

impl VolumeConfig {
    /// Validate and build the volume
    pub fn to_volume(&self) -> Result<Volume> {
        Volume::new(Vec3::from_array(self.origin), self.voxel_size, self.layer_count)
    }
}
