//! Axis-aligned bounding box

use crate::core::types::Vec3;

/// Axis-aligned bounding box defined by min and max corners
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create AABB from center and half-extents
    pub fn from_center_half_extent(center: Vec3, half_extent: Vec3) -> Self {
        Self {
            min: center - half_extent,
            max: center + half_extent,
        }
    }

    /// Create a cube from its min corner and edge length
    pub fn cube(min: Vec3, size: f32) -> Self {
        Self {
            min,
            max: min + Vec3::splat(size),
        }
    }

    /// Get center point
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get size (max - min)
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Check if point is inside AABB (faces inclusive)
    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x &&
        p.y >= self.min.y && p.y <= self.max.y &&
        p.z >= self.min.z && p.z <= self.max.z
    }

    /// Check if `other` lies entirely inside this box
    pub fn contains_aabb(&self, other: &Aabb) -> bool {
        other.min.x >= self.min.x && other.max.x <= self.max.x &&
        other.min.y >= self.min.y && other.max.y <= self.max.y &&
        other.min.z >= self.min.z && other.max.z <= self.max.z
    }

    /// Check if the interiors of two AABBs overlap.
    /// Boxes that only share a face, edge or corner do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x && self.max.x > other.min.x &&
        self.min.y < other.max.y && self.max.y > other.min.y &&
        self.min.z < other.max.z && self.max.z > other.min.z
    }

    /// Distance from `p` to the nearest point of the box, 0 inside
    pub fn distance_to_point(&self, p: Vec3) -> f32 {
        (self.min - p).max(p - self.max).max(Vec3::ZERO).length()
    }

    /// Return a copy grown by `margin` on every side
    pub fn inflated(&self, margin: f32) -> Aabb {
        Aabb {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_accessors() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(aabb.center(), Vec3::splat(0.5));
        assert_eq!(aabb.size(), Vec3::ONE);
        assert_eq!(Aabb::cube(Vec3::ZERO, 1.0), aabb);
        assert_eq!(Aabb::from_center_half_extent(Vec3::splat(0.5), Vec3::splat(0.5)), aabb);
    }

    #[test]
    fn test_contains_point() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(aabb.contains_point(Vec3::splat(0.5)));
        assert!(aabb.contains_point(Vec3::ONE));
        assert!(!aabb.contains_point(Vec3::splat(2.0)));
    }

    #[test]
    fn test_contains_aabb() {
        let outer = Aabb::new(Vec3::ZERO, Vec3::splat(4.0));
        assert!(outer.contains_aabb(&Aabb::cube(Vec3::ONE, 1.0)));
        assert!(outer.contains_aabb(&outer));
        assert!(!outer.contains_aabb(&Aabb::cube(Vec3::splat(3.5), 1.0)));
    }

    #[test]
    fn test_overlaps_is_strict() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::new(Vec3::splat(0.5), Vec3::splat(1.5));
        let touching = Aabb::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let far = Aabb::new(Vec3::splat(2.0), Vec3::splat(3.0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&touching));
        assert!(!a.overlaps(&far));
    }

    #[test]
    fn test_inflated() {
        let a = Aabb::new(Vec3::ZERO, Vec3::ONE).inflated(0.5);
        assert_eq!(a.min, Vec3::splat(-0.5));
        assert_eq!(a.max, Vec3::splat(1.5));
    }

    #[test]
    fn test_distance_to_point() {
        let a = Aabb::new(Vec3::ZERO, Vec3::splat(2.0));
        assert_eq!(a.distance_to_point(Vec3::ONE), 0.0);
        assert_eq!(a.distance_to_point(Vec3::new(5.0, 1.0, 1.0)), 3.0);
        assert_eq!(a.distance_to_point(Vec3::new(-3.0, 6.0, 1.0)), 5.0);
    }
}
