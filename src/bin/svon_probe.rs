//! Navigation probe - builds an octree for a JSON scene and runs path queries.
//!
//! Usage: cargo run --release --bin svon_probe -- [OPTIONS]
//!
//! Options:
//!   --scene <PATH>    Scene file (default: built-in wall-with-hole scene)
//!   --dump <PATH>     Write every octree node as JSON
//!   --raw-dir <DIR>   Write raw layer arrays as layer_<N>.bin
//!
//! Scene format:
//!   {
//!     "config":    { "volume": {...}, "generation": {...}, "pathfinding": {...} },
//!     "obstacles": [ { "min": [x, y, z], "max": [x, y, z] } ],
//!     "queries":   [ { "start": [x, y, z], "goal": [x, y, z] } ]
//!   }

use std::path::PathBuf;
use std::time::Instant;

use glam::Vec3;
use serde::Deserialize;
use serde_json::json;

use svonav::core::logging;
use svonav::core::types::Result;
use svonav::{Aabb, BlockingBoxes, NavConfig, Navigator, PathOutcome};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Scene {
    config: NavConfig,
    obstacles: Vec<ObstacleDesc>,
    queries: Vec<QueryDesc>,
}

#[derive(Debug, Deserialize)]
struct ObstacleDesc {
    min: [f32; 3],
    max: [f32; 3],
}

#[derive(Debug, Deserialize)]
struct QueryDesc {
    start: [f32; 3],
    goal: [f32; 3],
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let scene_path = parse_str_arg(&args, "--scene").map(PathBuf::from);
    let dump_path = parse_str_arg(&args, "--dump").map(PathBuf::from);
    let raw_dir = parse_str_arg(&args, "--raw-dir").map(PathBuf::from);

    let scene = match &scene_path {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            serde_json::from_str::<Scene>(&json)?
        }
        None => demo_scene(),
    };

    println!("=== Svonav Probe ===");
    match &scene_path {
        Some(path) => println!("Scene:     {}", path.display()),
        None => println!("Scene:     built-in demo"),
    }
    println!("Obstacles: {}", scene.obstacles.len());
    println!("Queries:   {}", scene.queries.len());
    println!();

    let oracle = BlockingBoxes::from_boxes(
        scene
            .obstacles
            .iter()
            .map(|o| Aabb::new(Vec3::from_array(o.min), Vec3::from_array(o.max)))
            .collect(),
    );

    let start = Instant::now();
    let navigator = Navigator::from_config(&scene.config, oracle)?;
    let stats = navigator.stats();
    println!(
        "Built {} nodes ({:.1} KB) in {:.2}ms",
        stats.node_count,
        stats.memory_bytes as f64 / 1024.0,
        start.elapsed().as_secs_f64() * 1000.0
    );
    for (layer, count) in stats.layer_node_counts.iter().enumerate() {
        println!("  layer {:2}: {} nodes", layer, count);
    }
    println!();

    for (i, query) in scene.queries.iter().enumerate() {
        let from = Vec3::from_array(query.start);
        let to = Vec3::from_array(query.goal);
        let query_start = Instant::now();
        let outcome = navigator.find_path(from, to);
        let elapsed_us = query_start.elapsed().as_secs_f64() * 1e6;

        match outcome {
            PathOutcome::Found(path) => {
                println!(
                    "[{}] {} -> {}: {} points, length {:.2} ({:.0}us)",
                    i, from, to, path.len(), path.length(), elapsed_us
                );
                for point in &path.points {
                    println!("      {} (layer {})", point.position, point.layer);
                }
            }
            PathOutcome::NoPath(reason) => {
                println!("[{}] {} -> {}: no path, {} ({:.0}us)", i, from, to, reason, elapsed_us);
            }
        }
    }

    if let Some(path) = dump_path {
        let nodes: Vec<_> = navigator.nodes().collect();
        let dump = json!({
            "stats": stats,
            "nodes": nodes,
        });
        std::fs::write(&path, serde_json::to_string_pretty(&dump)?)?;
        println!();
        println!("Wrote {} nodes to {}", nodes.len(), path.display());
    }

    if let Some(dir) = raw_dir {
        std::fs::create_dir_all(&dir)?;
        let layers = navigator.octree().layers();
        for layer in 0..layers.layer_total() as u8 {
            let file = dir.join(format!("layer_{}.bin", layer));
            std::fs::write(&file, layers.layer_bytes(layer))?;
        }
        println!("Wrote {} raw layers to {}", layers.layer_total(), dir.display());
    }

    Ok(())
}

/// 16^3 volume split by a wall with one opening
fn demo_scene() -> Scene {
    let wall = |min: [f32; 3], max: [f32; 3]| ObstacleDesc { min, max };
    let mut scene = Scene {
        obstacles: vec![
            wall([8.0, 0.0, 0.0], [9.0, 12.0, 16.0]),
            wall([8.0, 14.0, 0.0], [9.0, 16.0, 16.0]),
            wall([8.0, 12.0, 0.0], [9.0, 14.0, 10.0]),
            wall([8.0, 12.0, 12.0], [9.0, 14.0, 16.0]),
        ],
        queries: vec![
            QueryDesc { start: [1.5, 1.5, 1.5], goal: [14.5, 1.5, 14.5] },
            QueryDesc { start: [4.0, 4.0, 4.0], goal: [8.5, 4.0, 4.0] },
        ],
        ..Default::default()
    };
    scene.config.volume.layer_count = 4;
    scene
}

fn parse_str_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
