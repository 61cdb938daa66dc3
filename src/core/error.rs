//! Error types for svonav

use glam::Vec3;
use thiserror::Error;

/// Main error type for the crate.
///
/// Only configuration problems surface here. Expected query outcomes
/// (point outside the volume, no path) are plain return values.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Volume must have at least one layer")]
    ZeroLayers,

    #[error("Volume layer count {requested} exceeds maximum of {max}")]
    TooManyLayers { requested: u8, max: u8 },

    #[error("Voxel size must be finite and positive, got {0}")]
    InvalidVoxelSize(f32),

    #[error("Volume bounds must be a cube, got extents {0}")]
    NotCube(Vec3),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Json(#[from] serde_json::Error),
}
