use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;

use orogen::{
    GenerateError, Generator, GeologySettings, ImageSettings, SimplexNoiseSettings,
    TerrainSettings,
};

/// Orogen - large-scale terrain generation from uplift and fluvial erosion
#[derive(Parser, Debug)]
#[command(name = "orogen", version, about)]
struct Cli {
    /// Terrain side length in meters
    #[arg(long, default_value_t = 4000)]
    size: i32,

    /// Target sample count (level of detail)
    #[arg(long, default_value_t = 50_000)]
    lod: i32,

    /// Random seed for terrain generation
    #[arg(long)]
    seed: Option<u64>,

    /// Number of simulation steps to run
    #[arg(long, default_value_t = 50)]
    steps: u32,

    /// Land radius of the noise provider's continental gradient
    #[arg(long)]
    land_radius: Option<i32>,

    /// Use an RGB image as the terrain data source instead of noise
    #[arg(long, value_name = "FILE")]
    image: Option<PathBuf>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let seed = cli.seed.unwrap_or_else(rand::random);
    println!(
        "seed={}, size={}, lod={}, steps={}",
        seed, cli.size, cli.lod, cli.steps
    );

    let geology = GeologySettings::default();
    let result = match &cli.image {
        Some(path) => {
            let settings = ImageSettings::open(cli.size, cli.lod, seed, path)
                .unwrap_or_else(|e| {
                    eprintln!("failed to load {}: {}", path.display(), e);
                    std::process::exit(1);
                });
            run(geology, settings, cli.steps)
        }
        None => {
            let land_radius = cli.land_radius.unwrap_or(cli.size / 2);
            let settings = SimplexNoiseSettings::new(cli.size, cli.lod, land_radius, seed);
            run(geology, settings, cli.steps)
        }
    };

    if let Err(e) = result {
        eprintln!("generation failed: {}", e);
        std::process::exit(1);
    }
}

fn run<S: TerrainSettings>(
    geology: GeologySettings,
    settings: S,
    steps: u32,
) -> Result<(), GenerateError> {
    print!("Building planar graph... ");
    let start = Instant::now();
    let mut generator = Generator::new(geology, settings)?;
    println!(
        "{} nodes, {} edges ({:.1}ms)",
        generator.rp_graph().node_count(),
        generator.rp_graph().edge_count(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    print!("Simulating {} steps... ", steps);
    let start = Instant::now();
    generator.generate(|g| g.steps() >= steps)?;
    println!(
        "max height {:.1}m ({:.1}s)",
        generator.max_height(),
        start.elapsed().as_secs_f64()
    );

    let mesh = generator.triangle_mesh();
    println!(
        "Extracted mesh: {} vertices, {} triangles; {} stream segments",
        mesh.vertices.len(),
        mesh.triangles.len(),
        generator.stream_segments().count()
    );
    Ok(())
}
