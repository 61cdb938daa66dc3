//! Top-level navigation configuration, loadable from JSON

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::types::Result;
use crate::nav::PathfinderSettings;
use crate::svon::{GenerationConfig, VolumeConfig};

/// Everything needed to build a [`Navigator`](crate::nav::Navigator) apart
/// from the oracle. Missing sections fall back to their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    pub volume: VolumeConfig,
    pub generation: GenerationConfig,
    pub pathfinding: PathfinderSettings,
}

impl NavConfig {
    /// Load a JSON config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use crate::core::Error;
    use crate::nav::Heuristic;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = NavConfig::from_json_str(
            r#"{
                "volume": { "voxel_size": 0.5, "layer_count": 4 },
                "pathfinding": { "heuristic": "manhattan", "max_expanded_nodes": 500 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.volume.voxel_size, 0.5);
        assert_eq!(config.volume.origin, [0.0; 3]);
        assert_eq!(config.generation, GenerationConfig::default());
        assert_eq!(config.pathfinding.heuristic, Heuristic::Manhattan);
        assert_eq!(config.pathfinding.max_expanded_nodes, Some(500));
        assert!(config.pathfinding.string_pulling);
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let original = NavConfig {
            generation: GenerationConfig { clearance: 0.25, parallel: true },
            ..Default::default()
        };
        file.write_all(original.to_json_pretty().unwrap().as_bytes()).unwrap();

        let loaded = NavConfig::load(file.path()).unwrap();
        assert_eq!(loaded, original);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = NavConfig::load(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(Error::Io(_))));

        let invalid = NavConfig::from_json_str("{ \"volume\": 3 }");
        assert!(matches!(invalid, Err(Error::Json(_))));
    }
}
