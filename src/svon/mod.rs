//! Sparse voxel octree for navigation

pub mod node;
pub mod volume;
pub mod link;
pub mod layers;
pub mod oracle;
pub mod builder;
pub mod neighbors;
pub mod octree;

pub use node::{VoxelNode, FULL_MASK, SUB_CELLS_PER_AXIS};
pub use volume::{Volume, VolumeConfig, MAX_LAYER_COUNT};
pub use link::{NodeLink, NodeRef};
pub use layers::LayerStore;
pub use oracle::{BlockingBoxes, FnOracle, OccupancyOracle, RegionHint};
pub use builder::{GenerationConfig, SvonBuilder};
pub use neighbors::{NeighborResolver, DIRECTIONS};
pub use octree::{DebugNode, NavOctree, OctreeStats};
