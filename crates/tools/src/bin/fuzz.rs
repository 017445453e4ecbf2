use anyhow::{Result, bail};
use clap::Parser;
use dungen_core::{DungeonConfig, GenerationError, GraphAlgorithm, generate_dungeon};
use dungen_tools::init_tracing;
use dungen_tools::invariants::violations;
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 200)]
    runs: u32,
}

fn choose<T: Clone>(rng: &mut ChaCha8Rng, slice: &[T]) -> T {
    let p = rng.next_u64() as usize % slice.len();
    slice[p].clone()
}

/// Random but always satisfiable settings.
fn random_config(rng: &mut ChaCha8Rng) -> DungeonConfig {
    let mut config = DungeonConfig::default().with_seed(rng.next_u64().max(1));
    config.general.graph = choose(
        rng,
        &[GraphAlgorithm::Gabriel, GraphAlgorithm::Delaunay, GraphAlgorithm::RelativeNeighborhood],
    );
    config.rooms.amount = 1 + (rng.next_u64() % 40) as u32;
    config.rooms.max_area = choose(rng, &[12, 20, 30, 48]);
    config.layout.spacing_x = choose(rng, &[1.0, 1.25, 1.5]);
    config.layout.spacing_y = choose(rng, &[1.0, 1.25, 1.5]);
    config.corridors.width = choose(rng, &[1, 1, 2, 3]);
    config.corridors.algorithm_ratio = (rng.next_u64() % 101) as i32;
    config.bsp.min_leaf_size = choose(rng, &[4, 8, 10, 16]);
    config
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    println!("Starting fuzz harness on seed {} for {} runs...", args.seed, args.runs);
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut degenerate = 0_u32;

    for run in 0..args.runs {
        let config = random_config(&mut rng);
        let dungeon = match generate_dungeon(config.clone()) {
            Ok(dungeon) => dungeon,
            Err(GenerationError::DegenerateGeometry { .. }) => {
                degenerate += 1;
                continue;
            }
            Err(err) => bail!("run {run} (seed {}) failed: {err}", config.general.seed),
        };

        let found = violations(&dungeon, &config);
        if !found.is_empty() {
            bail!(
                "run {run} (seed {}, {}) broke invariants:\n  {}",
                config.general.seed,
                config.general.graph,
                found.join("\n  ")
            );
        }
    }

    println!("Fuzzing completed successfully ({degenerate} degenerate layouts skipped).");
    Ok(())
}
