use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use dungen_core::{
    DungeonConfig, DungeonGenerator, GenerationMode, GenerationStatus, GraphAlgorithm,
};
use dungen_tools::config_file::{default_config_toml, load_config};
use dungen_tools::{export, init_tracing};
use tracing::info;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GraphArg {
    Gabriel,
    Delaunay,
    RelativeNeighborhood,
}

impl From<GraphArg> for GraphAlgorithm {
    fn from(arg: GraphArg) -> Self {
        match arg {
            GraphArg::Gabriel => GraphAlgorithm::Gabriel,
            GraphArg::Delaunay => GraphAlgorithm::Delaunay,
            GraphArg::RelativeNeighborhood => GraphAlgorithm::RelativeNeighborhood,
        }
    }
}

#[derive(Parser)]
#[command(author, version, about = "Generate a procedural dungeon layout", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Overrides the configured seed (0 picks one from the clock)
    #[arg(short, long)]
    seed: Option<u64>,
    /// Overrides the configured room count
    #[arg(short, long)]
    rooms: Option<u32>,
    /// Overrides the configured proximity graph algorithm
    #[arg(short, long, value_enum)]
    graph: Option<GraphArg>,
    /// Run one phase per tick instead of straight through
    #[arg(long)]
    stepped: bool,
    /// Write a JSON export of the dungeon to this path
    #[arg(long)]
    json: Option<PathBuf>,
    /// Skip printing the ASCII map
    #[arg(long)]
    no_map: bool,
    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    if args.print_config {
        print!("{}", default_config_toml()?);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => DungeonConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.general.seed = seed;
    }
    if let Some(rooms) = args.rooms {
        config.rooms.amount = rooms;
    }
    if let Some(graph) = args.graph {
        config.general.graph = graph.into();
    }
    if args.stepped {
        config.general.mode = GenerationMode::Stepped;
    }

    let mut generator =
        DungeonGenerator::new(config).context("configuration rejected by the generator")?;
    let dungeon = match generator.config().general.mode {
        GenerationMode::Direct => generator.generate().context("generation failed")?,
        GenerationMode::Stepped => {
            let mut ticks = 0_u64;
            loop {
                ticks += 1;
                match generator.generate_step() {
                    GenerationStatus::InProgress(_) => {}
                    GenerationStatus::Complete => break,
                    GenerationStatus::Failed(err) => {
                        return Err(err).context(format!("generation failed after {ticks} ticks"));
                    }
                }
            }
            info!(ticks, "stepped generation finished");
            generator.dungeon().context("generator reported completion without a dungeon")?
        }
    };

    if !args.no_map {
        print!("{}", dungeon.grid.render_ascii());
    }

    let stats = &dungeon.stats;
    println!("Seed: {}", stats.seed);
    println!("Size: {}x{}", stats.width, stats.height);
    println!("Rooms: {} ({} prefabs)", stats.rooms, stats.prefabs);
    println!("Edges: {} proximity, {} tree", stats.proximity_edges, stats.tree_edges);
    println!("Corridors: {} ({} blocks)", stats.corridors, stats.corridor_blocks);
    println!(
        "Cells: {} room, {} corridor, {} occupied",
        stats.room_cells, stats.corridor_cells, stats.occupied_cells
    );
    println!("Walls: {}", stats.wall_segments);
    println!("BSP: {} nodes, {} leaves", stats.bsp_nodes, stats.bsp_leaves);
    println!("Elapsed: {:.3} ms", stats.elapsed_ms);
    println!("Fingerprint: {:016x}", dungeon.fingerprint());

    if let Some(path) = &args.json {
        fs::write(path, export::to_json(&dungeon)?)
            .with_context(|| format!("failed to write JSON export: {}", path.display()))?;
        println!("Exported: {}", path.display());
    }

    Ok(())
}
