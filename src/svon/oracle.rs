//! Occupancy queries against host collision geometry.
//!
//! The octree never sees geometry directly. Everything it knows comes from an
//! [`OccupancyOracle`], which the host implements on top of its collision
//! system. Only the box overlap test is required; the other methods have
//! default implementations built on it that hosts may replace with faster
//! native queries.

use crate::core::types::Vec3;
use crate::math::Aabb;
use super::node::{sub_cell_coord, SUB_CELLS_PER_AXIS};

/// Hint for the octree builder about region content.
/// Used for early-out during octree construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegionHint {
    /// Region contains no blocking geometry
    Empty,
    /// Region is entirely inside blocking geometry
    Solid,
    /// Region is partially blocked - must subdivide further
    Mixed,
}

/// Capability interface over the host's collision system.
///
/// Implementations must be deterministic and must not change while an octree
/// is being built from them.
pub trait OccupancyOracle: Send + Sync {
    /// True if any blocking geometry overlaps the interior of `aabb`.
    fn overlaps_blocking(&self, aabb: &Aabb) -> bool;

    /// Classify a region for early-out during construction.
    ///
    /// The default can only tell empty from mixed. Oracles that can detect full
    /// containment should return [`RegionHint::Solid`] to avoid subdividing
    /// the inside of large obstacles.
    fn classify_region(&self, aabb: &Aabb) -> RegionHint {
        if self.overlaps_blocking(aabb) {
            RegionHint::Mixed
        } else {
            RegionHint::Empty
        }
    }

    /// Sample the 4x4x4 sub-cells of a finest-layer voxel.
    ///
    /// Bit `i` of the result is set when the sub-cell with local Morton index
    /// `i`, grown by `clearance`, overlaps blocking geometry.
    fn sample_leaf(&self, voxel: &Aabb, clearance: f32) -> u64 {
        let cell = voxel.size() / SUB_CELLS_PER_AXIS as f32;
        let mut mask = 0u64;
        for sub in 0..64u8 {
            let (x, y, z) = sub_cell_coord(sub);
            let min = voxel.min + Vec3::new(x as f32, y as f32, z as f32) * cell;
            let bounds = Aabb::new(min, min + cell).inflated(clearance);
            if self.overlaps_blocking(&bounds) {
                mask |= 1 << sub;
            }
        }
        mask
    }

    /// True if a straight segment from `from` to `to` touches blocking geometry.
    ///
    /// The default sweeps cubes of edge `probe` spaced `probe` apart, which
    /// covers the whole segment.
    fn segment_blocked(&self, from: Vec3, to: Vec3, probe: f32) -> bool {
        debug_assert!(probe > 0.0, "probe size must be positive");
        let length = from.distance(to);
        let steps = (length / probe).ceil().max(1.0) as u32;
        let half = Vec3::splat(probe * 0.5);
        (0..=steps).any(|i| {
            let p = from.lerp(to, i as f32 / steps as f32);
            self.overlaps_blocking(&Aabb::from_center_half_extent(p, half))
        })
    }
}

/// Blocking geometry described as a set of axis-aligned boxes
#[derive(Clone, Debug, Default)]
pub struct BlockingBoxes {
    boxes: Vec<Aabb>,
}

impl BlockingBoxes {
    /// Create an empty set (nothing blocks)
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from a list of boxes
    pub fn from_boxes(boxes: Vec<Aabb>) -> Self {
        Self { boxes }
    }

    /// Add a blocking box
    pub fn push(&mut self, aabb: Aabb) {
        self.boxes.push(aabb);
    }

    /// The blocking boxes
    pub fn boxes(&self) -> &[Aabb] {
        &self.boxes
    }

    /// Number of boxes
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl OccupancyOracle for BlockingBoxes {
    fn overlaps_blocking(&self, aabb: &Aabb) -> bool {
        self.boxes.iter().any(|b| b.overlaps(aabb))
    }

    fn classify_region(&self, aabb: &Aabb) -> RegionHint {
        let mut any = false;
        for b in &self.boxes {
            if b.contains_aabb(aabb) {
                return RegionHint::Solid;
            }
            any |= b.overlaps(aabb);
        }
        if any { RegionHint::Mixed } else { RegionHint::Empty }
    }
}

/// Adapter turning a box-overlap closure into an oracle
pub struct FnOracle<F> {
    overlaps: F,
}

impl<F> FnOracle<F>
where
    F: Fn(&Aabb) -> bool + Send + Sync,
{
    pub fn new(overlaps: F) -> Self {
        Self { overlaps }
    }
}

impl<F> OccupancyOracle for FnOracle<F>
where
    F: Fn(&Aabb) -> bool + Send + Sync,
{
    fn overlaps_blocking(&self, aabb: &Aabb) -> bool {
        (self.overlaps)(aabb)
    }
}

impl<F> std::fmt::Debug for FnOracle<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnOracle").finish_non_exhaustive()
    }
}
