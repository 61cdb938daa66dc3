//! Svonav - sparse voxel octree navigation for free-moving agents
//!
//! Builds a multi-resolution occupancy octree from an [`OccupancyOracle`]
//! over a cubic volume, then answers point lookups and A* path queries on it.

pub mod core;
pub mod math;
pub mod svon;
pub mod nav;
pub mod config;

pub use crate::config::NavConfig;
pub use crate::core::Error;
pub use crate::math::Aabb;
pub use crate::nav::{NavPath, Navigator, NoPathReason, PathOutcome, PathPoint, PathfinderSettings};
pub use crate::svon::{
    BlockingBoxes, FnOracle, GenerationConfig, NavOctree, NodeRef, OccupancyOracle, Volume,
    VolumeConfig,
};
