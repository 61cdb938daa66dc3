//! Mathematical utilities and data structures

pub mod aabb;
pub mod morton;

pub use aabb::Aabb;
pub use morton::MortonCode;
