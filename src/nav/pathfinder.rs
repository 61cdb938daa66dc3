//! A* search over the octree neighbour graph
//!
//! All search state lives in the call, so any number of searches may run
//! against one octree at once.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::core::types::Vec3;
use crate::svon::{NavOctree, NodeLink, NodeRef};
use super::config::PathfinderSettings;

/// Raw result of one search
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Cells from start to goal inclusive
    Found(Vec<NodeRef>),
    /// Every reachable cell was expanded without reaching the goal
    Exhausted,
    /// The expanded-node cap was hit first
    LimitReached,
}

/// Per-cell search record
#[derive(Clone, Debug)]
struct Record {
    node: NodeRef,
    parent: Option<usize>,
    g: f32,
    closed: bool,
}

/// Open list entry. Records are numbered in discovery order, so the slot
/// doubles as the tie-break on equal f.
#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    f: f32,
    g: f32,
    slot: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap: lowest f first, then earliest discovered
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.slot.cmp(&self.slot))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One-shot A* search between two cells of an octree
pub struct PathSearch<'a> {
    octree: &'a NavOctree,
    settings: &'a PathfinderSettings,
}

impl<'a> PathSearch<'a> {
    pub fn new(octree: &'a NavOctree, settings: &'a PathfinderSettings) -> Self {
        Self { octree, settings }
    }

    /// Find the cheapest cell sequence from `start` to `goal`
    pub fn run(&self, start: NodeRef, goal: NodeRef) -> SearchOutcome {
        if start == goal {
            return SearchOutcome::Found(vec![start]);
        }

        let goal_center = self.octree.link_center(goal);
        let mut records = vec![Record { node: start, parent: None, g: 0.0, closed: false }];
        let mut slots: HashMap<NodeRef, usize> = HashMap::new();
        slots.insert(start, 0);

        let mut open = BinaryHeap::new();
        open.push(OpenEntry { f: self.estimate(start, goal_center), g: 0.0, slot: 0 });

        let mut expanded = 0usize;
        while let Some(entry) = open.pop() {
            let record = &records[entry.slot];
            if record.closed || entry.g > record.g {
                continue;
            }

            if record.node == goal {
                log::debug!(
                    "Path search reached {} after expanding {} of {} discovered cells",
                    goal,
                    expanded,
                    records.len()
                );
                return SearchOutcome::Found(Self::reconstruct(&records, entry.slot));
            }

            if self.settings.max_expanded_nodes.is_some_and(|max| expanded >= max) {
                log::debug!("Path search stopped at expansion limit {}", expanded);
                return SearchOutcome::LimitReached;
            }

            let current = record.node;
            records[entry.slot].closed = true;
            expanded += 1;

            for link in self.octree.neighbors(current) {
                let g = entry.g + self.step_cost(&link);
                let slot = match slots.get(&link.node) {
                    Some(&slot) => {
                        let known = &mut records[slot];
                        if known.closed || g >= known.g {
                            continue;
                        }
                        known.g = g;
                        known.parent = Some(entry.slot);
                        slot
                    }
                    None => {
                        let slot = records.len();
                        records.push(Record {
                            node: link.node,
                            parent: Some(entry.slot),
                            g,
                            closed: false,
                        });
                        slots.insert(link.node, slot);
                        slot
                    }
                };
                let f = g + self.estimate(link.node, goal_center);
                open.push(OpenEntry { f, g, slot });
            }
        }

        log::debug!("Path search exhausted {} cells without reaching {}", expanded, goal);
        SearchOutcome::Exhausted
    }

    fn step_cost(&self, link: &NodeLink) -> f32 {
        let base = if self.settings.use_unit_cost { self.settings.unit_cost } else { link.cost };
        base * self.size_factor(link.node.layer)
    }

    fn estimate(&self, node: NodeRef, goal_center: Vec3) -> f32 {
        let center = self.octree.link_center(node);
        self.settings.heuristic.distance(center, goal_center)
            * self.size_factor(node.layer)
            * self.settings.weight_estimate
    }

    fn size_factor(&self, layer: u8) -> f32 {
        self.settings.size_factor(layer, self.octree.layers().layer_total())
    }

    fn reconstruct(records: &[Record], goal_slot: usize) -> Vec<NodeRef> {
        let mut path = Vec::new();
        let mut slot = Some(goal_slot);
        while let Some(index) = slot {
            path.push(records[index].node);
            slot = records[index].parent;
        }
        path.reverse();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Aabb;
    use crate::nav::config::Heuristic;
    use crate::svon::{BlockingBoxes, GenerationConfig, Volume};

    fn octree(boxes: Vec<Aabb>) -> NavOctree {
        let volume = Volume::new(Vec3::ZERO, 1.0, 3).unwrap();
        NavOctree::build(volume, &BlockingBoxes::from_boxes(boxes), &GenerationConfig::default())
    }

    fn node_at(tree: &NavOctree, p: Vec3) -> NodeRef {
        tree.world_to_node(p).unwrap()
    }

    #[test]
    fn test_open_entry_order() {
        let mut heap = BinaryHeap::new();
        heap.push(OpenEntry { f: 2.0, g: 0.0, slot: 0 });
        heap.push(OpenEntry { f: 1.0, g: 0.0, slot: 5 });
        heap.push(OpenEntry { f: 1.0, g: 0.0, slot: 3 });
        assert_eq!(heap.pop().unwrap().slot, 3);
        assert_eq!(heap.pop().unwrap().slot, 5);
        assert_eq!(heap.pop().unwrap().slot, 0);
    }

    #[test]
    fn test_same_cell() {
        let tree = octree(vec![]);
        let settings = PathfinderSettings::default();
        let start = node_at(&tree, Vec3::ONE);
        assert_eq!(
            PathSearch::new(&tree, &settings).run(start, start),
            SearchOutcome::Found(vec![start])
        );
    }

    #[test]
    fn test_found_path_is_connected() {
        let tree = octree(vec![Aabb::new(Vec3::new(4.0, 0.0, 0.0), Vec3::new(5.0, 6.0, 8.0))]);
        let settings = PathfinderSettings::default();
        let start = node_at(&tree, Vec3::new(1.0, 1.0, 1.0));
        let goal = node_at(&tree, Vec3::new(7.0, 1.0, 1.0));

        let SearchOutcome::Found(cells) = PathSearch::new(&tree, &settings).run(start, goal) else {
            panic!("expected a path");
        };
        assert_eq!(cells.first(), Some(&start));
        assert_eq!(cells.last(), Some(&goal));
        for pair in cells.windows(2) {
            let links = tree.neighbors(pair[0]);
            assert!(
                links.iter().any(|l| l.node == pair[1]),
                "{} -> {} not linked",
                pair[0],
                pair[1]
            );
        }
        // The wall forces the path over y = 6
        assert!(cells.iter().any(|c| tree.link_center(*c).y > 6.0));
    }

    #[test]
    fn test_exhausted() {
        // Wall splits the volume completely
        let tree = octree(vec![Aabb::new(Vec3::new(4.0, 0.0, 0.0), Vec3::new(5.0, 8.0, 8.0))]);
        let settings = PathfinderSettings::default();
        let start = node_at(&tree, Vec3::new(1.0, 1.0, 1.0));
        let goal = node_at(&tree, Vec3::new(7.0, 1.0, 1.0));
        assert_eq!(PathSearch::new(&tree, &settings).run(start, goal), SearchOutcome::Exhausted);
    }

    #[test]
    fn test_limit_reached() {
        let tree = octree(vec![Aabb::new(Vec3::new(4.0, 0.0, 0.0), Vec3::new(5.0, 6.0, 8.0))]);
        let settings = PathfinderSettings { max_expanded_nodes: Some(1), ..Default::default() };
        let start = node_at(&tree, Vec3::new(1.0, 1.0, 1.0));
        let goal = node_at(&tree, Vec3::new(7.0, 1.0, 1.0));
        assert_eq!(PathSearch::new(&tree, &settings).run(start, goal), SearchOutcome::LimitReached);
    }

    #[test]
    fn test_unit_cost_and_manhattan_still_find_path() {
        let tree = octree(vec![Aabb::cube(Vec3::splat(4.0), 1.0)]);
        let settings = PathfinderSettings {
            heuristic: Heuristic::Manhattan,
            use_unit_cost: true,
            node_size_compensation: 0.5,
            ..Default::default()
        };
        let start = node_at(&tree, Vec3::splat(0.5));
        let goal = node_at(&tree, Vec3::splat(7.5));
        assert!(matches!(
            PathSearch::new(&tree, &settings).run(start, goal),
            SearchOutcome::Found(_)
        ));
    }

    #[test]
    fn test_deterministic() {
        let tree = octree(vec![
            Aabb::new(Vec3::new(2.0, 2.0, 0.0), Vec3::new(6.0, 3.0, 8.0)),
            Aabb::new(Vec3::new(3.0, 5.0, 0.0), Vec3::new(8.0, 5.5, 8.0)),
        ]);
        let settings = PathfinderSettings::default();
        let start = node_at(&tree, Vec3::new(4.0, 0.5, 4.0));
        let goal = node_at(&tree, Vec3::new(4.0, 7.5, 4.0));
        let first = PathSearch::new(&tree, &settings).run(start, goal);
        assert!(matches!(first, SearchOutcome::Found(_)));
        for _ in 0..3 {
            assert_eq!(PathSearch::new(&tree, &settings).run(start, goal), first);
        }
    }
}
