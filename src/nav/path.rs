//! Path query results

use std::fmt;

use crate::core::types::Vec3;

/// One waypoint of a path
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PathPoint {
    pub position: Vec3,
    /// Octree layer of the cell this waypoint came from
    pub layer: u8,
}

/// Ordered waypoints from start to goal, owned by the caller
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NavPath {
    pub points: Vec<PathPoint>,
}

impl NavPath {
    pub fn new(points: Vec<PathPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.points.iter().map(|p| p.position)
    }

    pub fn first(&self) -> Option<Vec3> {
        self.points.first().map(|p| p.position)
    }

    pub fn last(&self) -> Option<Vec3> {
        self.points.last().map(|p| p.position)
    }

    /// Total length of the polyline
    pub fn length(&self) -> f32 {
        self.points
            .windows(2)
            .map(|w| w[0].position.distance(w[1].position))
            .sum()
    }
}

/// Why a path query produced no path
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoPathReason {
    StartOutsideVolume,
    GoalOutsideVolume,
    /// No free cell within the snap radius of the start
    StartBlocked,
    /// No free cell within the snap radius of the goal
    GoalBlocked,
    /// Search exhausted every reachable cell
    Unreachable,
    /// Expanded-node cap hit before reaching the goal
    SearchLimitReached,
}

impl fmt::Display for NoPathReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NoPathReason::StartOutsideVolume => "start outside volume",
            NoPathReason::GoalOutsideVolume => "goal outside volume",
            NoPathReason::StartBlocked => "start blocked",
            NoPathReason::GoalBlocked => "goal blocked",
            NoPathReason::Unreachable => "goal unreachable",
            NoPathReason::SearchLimitReached => "search limit reached",
        };
        f.write_str(text)
    }
}

/// Result of a path query. Missing paths are ordinary outcomes, not errors.
#[derive(Clone, Debug, PartialEq)]
pub enum PathOutcome {
    Found(NavPath),
    NoPath(NoPathReason),
}

impl PathOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, PathOutcome::Found(_))
    }

    pub fn path(&self) -> Option<&NavPath> {
        match self {
            PathOutcome::Found(path) => Some(path),
            PathOutcome::NoPath(_) => None,
        }
    }

    pub fn into_path(self) -> Option<NavPath> {
        match self {
            PathOutcome::Found(path) => Some(path),
            PathOutcome::NoPath(_) => None,
        }
    }

    pub fn no_path_reason(&self) -> Option<NoPathReason> {
        match self {
            PathOutcome::Found(_) => None,
            PathOutcome::NoPath(reason) => Some(*reason),
        }
    }
}
