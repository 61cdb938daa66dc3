//! Query facade: owns the octree and its oracle, answers path queries

use crate::config::NavConfig;
use crate::core::types::{Result, Vec3};
use crate::svon::{
    DebugNode, GenerationConfig, NavOctree, NodeRef, OccupancyOracle, OctreeStats, Volume,
};
use super::config::PathfinderSettings;
use super::path::{NavPath, NoPathReason, PathOutcome, PathPoint};
use super::pathfinder::{PathSearch, SearchOutcome};
use super::smoothing::string_pull;

/// Navigation for one volume.
///
/// Built once from an oracle, then queried from any number of threads.
/// Rebuilding needs `&mut self`, so no query can observe a half-built
/// octree, and every [`NodeRef`] handed out before a rebuild is stale after it.
pub struct Navigator<O> {
    octree: NavOctree,
    oracle: O,
    generation: GenerationConfig,
    settings: PathfinderSettings,
}

impl<O: OccupancyOracle> Navigator<O> {
    /// Build the octree for `volume` and keep `oracle` for line-of-sight checks
    pub fn build(
        volume: Volume,
        oracle: O,
        generation: GenerationConfig,
        settings: PathfinderSettings,
    ) -> Self {
        settings.log_warnings();
        let octree = NavOctree::build(volume, &oracle, &generation);
        Self { octree, oracle, generation, settings }
    }

    /// Validate `config` and build
    pub fn from_config(config: &NavConfig, oracle: O) -> Result<Self> {
        let volume = config.volume.to_volume()?;
        Ok(Self::build(volume, oracle, config.generation.clone(), config.pathfinding.clone()))
    }

    /// Rebuild against the current oracle (after the host geometry changed)
    pub fn rebuild(&mut self) {
        self.octree = NavOctree::build(*self.octree.volume(), &self.oracle, &self.generation);
    }

    /// Replace the oracle and rebuild
    pub fn rebuild_with(&mut self, oracle: O) {
        self.oracle = oracle;
        self.rebuild();
    }

    pub fn octree(&self) -> &NavOctree {
        &self.octree
    }

    pub fn volume(&self) -> &Volume {
        self.octree.volume()
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn settings(&self) -> &PathfinderSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: PathfinderSettings) {
        settings.log_warnings();
        self.settings = settings;
    }

    pub fn world_to_node(&self, position: Vec3) -> Option<NodeRef> {
        self.octree.world_to_node(position)
    }

    pub fn nearest_free_node(&self, position: Vec3, radius: f32) -> Option<NodeRef> {
        self.octree.nearest_free_node(position, radius)
    }

    /// Find a path with the navigator's settings
    pub fn find_path(&self, start: Vec3, goal: Vec3) -> PathOutcome {
        self.find_path_with(start, goal, &self.settings)
    }

    /// Find a path with per-query settings
    pub fn find_path_with(
        &self,
        start: Vec3,
        goal: Vec3,
        settings: &PathfinderSettings,
    ) -> PathOutcome {
        let volume = self.octree.volume();
        if !volume.contains(start) {
            return PathOutcome::NoPath(NoPathReason::StartOutsideVolume);
        }
        if !volume.contains(goal) {
            return PathOutcome::NoPath(NoPathReason::GoalOutsideVolume);
        }

        let snap_radius = settings.snap_radius_voxels.max(0.0) * volume.voxel_size();
        let Some((start_node, start_exact)) = self.resolve(start, snap_radius) else {
            return PathOutcome::NoPath(NoPathReason::StartBlocked);
        };
        let Some((goal_node, goal_exact)) = self.resolve(goal, snap_radius) else {
            return PathOutcome::NoPath(NoPathReason::GoalBlocked);
        };

        let cells = match PathSearch::new(&self.octree, settings).run(start_node, goal_node) {
            SearchOutcome::Found(cells) => cells,
            SearchOutcome::Exhausted => return PathOutcome::NoPath(NoPathReason::Unreachable),
            SearchOutcome::LimitReached => {
                return PathOutcome::NoPath(NoPathReason::SearchLimitReached);
            }
        };

        let mut points: Vec<PathPoint> = cells
            .iter()
            .map(|cell| PathPoint { position: self.octree.link_center(*cell), layer: cell.layer })
            .collect();
        if points.len() == 1 {
            points.push(points[0]);
        }
        if start_exact {
            points[0].position = start;
        }
        if goal_exact {
            if let Some(last) = points.last_mut() {
                last.position = goal;
            }
        }

        if settings.string_pulling {
            let probe = volume.sub_cell_size() * 0.5 + 2.0 * self.generation.clearance;
            points = string_pull(&points, &self.oracle, probe);
        }

        let path = NavPath::new(points);
        log::debug!(
            "Found path {} -> {}: {} points, length {:.2}",
            start_node,
            goal_node,
            path.len(),
            path.length()
        );
        PathOutcome::Found(path)
    }

    /// Free cell for an endpoint and whether it contains the point itself
    fn resolve(&self, position: Vec3, snap_radius: f32) -> Option<(NodeRef, bool)> {
        if let Some(node) = self.octree.world_to_node(position) {
            return Some((node, true));
        }
        self.octree
            .nearest_free_node(position, snap_radius)
            .map(|node| (node, false))
    }

    /// Every stored node, for debug drawing
    pub fn nodes(&self) -> impl Iterator<Item = DebugNode> + '_ {
        self.octree.nodes()
    }

    pub fn stats(&self) -> OctreeStats {
        self.octree.stats()
    }
}
