//! Path queries over a built navigation octree

pub mod config;
pub mod path;
pub mod pathfinder;
pub mod smoothing;
pub mod navigator;

pub use config::{Heuristic, PathfinderSettings};
pub use path::{NavPath, NoPathReason, PathOutcome, PathPoint};
pub use pathfinder::{PathSearch, SearchOutcome};
pub use smoothing::string_pull;
pub use navigator::Navigator;
