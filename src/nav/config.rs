//! Path search settings

use serde::{Deserialize, Serialize};

use crate::core::types::Vec3;

/// Distance estimate used as the A* heuristic
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heuristic {
    #[default]
    Euclidean,
    Manhattan,
}

impl Heuristic {
    pub fn distance(&self, a: Vec3, b: Vec3) -> f32 {
        match self {
            Heuristic::Euclidean => a.distance(b),
            Heuristic::Manhattan => (a - b).abs().element_sum(),
        }
    }
}

/// Tuning for [`find_path`](crate::nav::Navigator::find_path).
///
/// Defaults give a plain world-distance A* that returns shortest paths over
/// the octree graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfinderSettings {
    pub heuristic: Heuristic,
    /// Multiplier on the heuristic. Above 1 trades optimality for speed.
    pub weight_estimate: f32,
    /// Discount for stepping into coarse nodes, 0 disables.
    /// A node at layer L costs `1 - L / layers * compensation` times its distance.
    pub node_size_compensation: f32,
    /// Charge `unit_cost` per step instead of the distance between centres
    pub use_unit_cost: bool,
    pub unit_cost: f32,
    /// Give up after expanding this many nodes
    pub max_expanded_nodes: Option<usize>,
    /// Shorten the raw node path with straight line-of-sight segments
    pub string_pulling: bool,
    /// How far (in finest voxels) blocked endpoints may snap to free space
    pub snap_radius_voxels: f32,
}

impl Default for PathfinderSettings {
    fn default() -> Self {
        Self {
            heuristic: Heuristic::Euclidean,
            weight_estimate: 1.0,
            node_size_compensation: 0.0,
            use_unit_cost: false,
            unit_cost: 1.0,
            max_expanded_nodes: None,
            string_pulling: true,
            snap_radius_voxels: 2.0,
        }
    }
}

impl PathfinderSettings {
    /// Log settings that make results surprising
    pub fn log_warnings(&self) {
        if self.weight_estimate > 1.0 || self.node_size_compensation > 0.0 {
            log::warn!(
                "Path search is not guaranteed shortest (weight_estimate={}, node_size_compensation={})",
                self.weight_estimate,
                self.node_size_compensation
            );
        }
        if self.node_size_compensation > 1.0 {
            log::warn!(
                "node_size_compensation {} > 1 makes coarse nodes free to enter",
                self.node_size_compensation
            );
        }
        if self.use_unit_cost && self.unit_cost <= 0.0 {
            log::warn!("unit_cost {} is not positive", self.unit_cost);
        }
        if self.snap_radius_voxels < 0.0 {
            log::warn!(
                "snap_radius_voxels {} is negative, snapping disabled",
                self.snap_radius_voxels
            );
        }
    }

    /// Cost multiplier for entering a node at `layer` of `layer_total` layers
    pub fn size_factor(&self, layer: u8, layer_total: usize) -> f32 {
        if self.node_size_compensation == 0.0 {
            return 1.0;
        }
        (1.0 - layer as f32 / layer_total as f32 * self.node_size_compensation).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristics() {
        let a = Vec3::ZERO;
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert_eq!(Heuristic::Euclidean.distance(a, b), 5.0);
        assert_eq!(Heuristic::Manhattan.distance(a, b), 7.0);
    }

    #[test]
    fn test_size_factor() {
        let mut settings = PathfinderSettings::default();
        assert_eq!(settings.size_factor(3, 4), 1.0);
        settings.node_size_compensation = 1.0;
        assert_eq!(settings.size_factor(0, 4), 1.0);
        assert_eq!(settings.size_factor(2, 4), 0.5);
        settings.node_size_compensation = 4.0;
        assert_eq!(settings.size_factor(3, 4), 0.0);
    }

    #[test]
    fn test_serde_defaults() {
        let settings: PathfinderSettings =
            serde_json::from_str(r#"{ "heuristic": "manhattan" }"#).unwrap();
        assert_eq!(settings.heuristic, Heuristic::Manhattan);
        assert_eq!(settings.weight_estimate, 1.0);
        assert!(settings.string_pulling);
        assert_eq!(settings.max_expanded_nodes, None);

        let json = serde_json::to_string(&PathfinderSettings::default()).unwrap();
        assert!(json.contains("\"euclidean\""));
    }
}
