//! String pulling: straighten a cell-centre path using line of sight

use crate::svon::OccupancyOracle;
use super::path::PathPoint;

/// Greedily connect each kept waypoint to the farthest later waypoint that
/// is visible from it.
///
/// Visibility is checked against the oracle with a swept cube of edge
/// `probe`, never against the octree. Every new segment replaces a chain of
/// old segments between the same endpoints, so the path never gets longer.
/// The first and last points are always kept.
pub fn string_pull<O: OccupancyOracle + ?Sized>(
    points: &[PathPoint],
    oracle: &O,
    probe: f32,
) -> Vec<PathPoint> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let last = points.len() - 1;
    let mut pulled = vec![points[0]];
    let mut anchor = 0;
    while anchor < last {
        let from = points[anchor].position;
        let next = (anchor + 2..=last)
            .rev()
            .find(|&candidate| !oracle.segment_blocked(from, points[candidate].position, probe))
            .unwrap_or(anchor + 1);
        pulled.push(points[next]);
        anchor = next;
    }

    log::trace!("String pulling kept {} of {} waypoints", pulled.len(), points.len());
    pulled
}
