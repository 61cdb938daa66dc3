//! Octree construction from an occupancy oracle
//!
//! Builds the layer store top-down: each node's box is classified by the
//! oracle and only mixed regions are subdivided. Layer-0 nodes sample their
//! 4x4x4 sub-cells instead of subdividing further. Children are appended to
//! their layer after the whole subtree is built, which keeps every layer
//! array in ascending Morton order without sorting.

use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::math::morton::{child_code, MortonCode};
use super::layers::LayerStore;
use super::node::VoxelNode;
use super::oracle::{OccupancyOracle, RegionHint};
use super::volume::Volume;

/// Construction options
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Margin added around every oracle query box (agent radius)
    pub clearance: f32,
    /// Build the 8 root octants on the rayon thread pool
    pub parallel: bool,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            clearance: 0.0,
            parallel: false,
        }
    }
}

/// Builder for a navigation octree over one volume
pub struct SvonBuilder {
    volume: Volume,
    config: GenerationConfig,
}

impl SvonBuilder {
    pub fn new(volume: Volume, config: GenerationConfig) -> Self {
        Self { volume, config }
    }

    /// Build the layer store for `oracle`.
    ///
    /// The oracle must answer identically for identical boxes for the
    /// duration of the build; the output is then identical across runs and
    /// between the sequential and parallel modes.
    pub fn build<O: OccupancyOracle + ?Sized>(&self, oracle: &O) -> LayerStore {
        let start = Instant::now();

        let layers = if self.config.parallel {
            self.build_parallel(oracle)
        } else {
            self.build_sequential(oracle)
        };
        let store = LayerStore::from_layers(layers);

        log::info!(
            "Built navigation octree: {} layers, {} nodes, {:.1} KB in {:.2}ms",
            store.layer_total(),
            store.node_count(),
            store.memory_usage() as f64 / 1024.0,
            start.elapsed().as_secs_f64() * 1000.0,
        );
        for (layer, count) in store.layer_node_counts().iter().enumerate() {
            log::debug!("  layer {}: {} nodes", layer, count);
        }

        store
    }

    fn empty_layers(count: usize) -> Vec<Vec<VoxelNode>> {
        vec![Vec::new(); count]
    }

    fn build_sequential<O: OccupancyOracle + ?Sized>(&self, oracle: &O) -> Vec<Vec<VoxelNode>> {
        let root_layer = self.volume.root_layer();
        let mut layers = Self::empty_layers(root_layer as usize + 1);
        let root = self.build_node(oracle, &mut layers, root_layer, 0);
        layers[root_layer as usize].push(root);
        layers
    }

    /// Each root octant fills private layer buffers; concatenating them in
    /// octant order reproduces the sequential layout exactly.
    fn build_parallel<O: OccupancyOracle + ?Sized>(&self, oracle: &O) -> Vec<Vec<VoxelNode>> {
        let root_layer = self.volume.root_layer();
        let mut layers = Self::empty_layers(root_layer as usize + 1);

        if let Some(root) = self.classify(oracle, root_layer, 0) {
            layers[root_layer as usize].push(root);
            return layers;
        }

        let child_layer = root_layer - 1;
        let octants: Vec<(VoxelNode, Vec<Vec<VoxelNode>>)> = (0..8u8)
            .into_par_iter()
            .map(|octant| {
                let mut local = Self::empty_layers(root_layer as usize);
                let node = self.build_node(oracle, &mut local, child_layer, child_code(0, octant));
                (node, local)
            })
            .collect();

        let mut children = [VoxelNode::default(); 8];
        for (octant, (node, local)) in octants.into_iter().enumerate() {
            children[octant] = node;
            for (layer, nodes) in local.into_iter().enumerate() {
                layers[layer].extend(nodes);
            }
        }

        let root = Self::finish_branch(&mut layers, root_layer, 0, &children);
        layers[root_layer as usize].push(root);
        layers
    }

    /// Leaf node for a region the oracle can decide on, None if mixed
    fn classify<O: OccupancyOracle + ?Sized>(
        &self,
        oracle: &O,
        layer: u8,
        code: MortonCode,
    ) -> Option<VoxelNode> {
        let bounds = self.volume.node_bounds(layer, code).inflated(self.config.clearance);
        match oracle.classify_region(&bounds) {
            RegionHint::Empty => Some(VoxelNode::open(code)),
            RegionHint::Solid => Some(VoxelNode::solid(code)),
            RegionHint::Mixed => None,
        }
    }

    /// Build the node at (layer, code), pushing its descendants into `layers`
    fn build_node<O: OccupancyOracle + ?Sized>(
        &self,
        oracle: &O,
        layers: &mut [Vec<VoxelNode>],
        layer: u8,
        code: MortonCode,
    ) -> VoxelNode {
        if let Some(leaf) = self.classify(oracle, layer, code) {
            return leaf;
        }

        if layer == 0 {
            let bounds = self.volume.node_bounds(0, code);
            return VoxelNode::leaf(code, oracle.sample_leaf(&bounds, self.config.clearance));
        }

        let mut children = [VoxelNode::default(); 8];
        for octant in 0..8u8 {
            children[octant as usize] =
                self.build_node(oracle, layers, layer - 1, child_code(code, octant));
        }

        Self::finish_branch(layers, layer, code, &children)
    }

    /// Merge uniform children into their parent, otherwise store them
    fn finish_branch(
        layers: &mut [Vec<VoxelNode>],
        layer: u8,
        code: MortonCode,
        children: &[VoxelNode; 8],
    ) -> VoxelNode {
        if children.iter().all(VoxelNode::is_solid) {
            return VoxelNode::solid(code);
        }
        if children.iter().all(VoxelNode::is_open) {
            return VoxelNode::open(code);
        }
        layers[layer as usize - 1].extend_from_slice(children);
        VoxelNode::branch(code)
    }
}
