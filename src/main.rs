//! planetgen CLI - Procedural planet terrain generator.
//!
//! Generates a displaced cube-sphere terrain mesh with shading data and an
//! ocean shell, on the GPU when one is available.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use tracing::{warn, Level};

use planetgen::compute::{ComputeBackend, ComputeDevice, ReferenceDevice};
use planetgen::compute::wgpu::GpuDevice;
use planetgen::geometry::{check_resolution, SphereGeometry};
use planetgen::planet::{GenerationError, PlanetConfig, PlanetGenerator, RenderSink, TerrainMaterial};
use planetgen::terrain::{IndexFormat, OceanShell, TerrainMesh};

/// Procedural planet terrain generator.
#[derive(Parser)]
#[command(name = "planetgen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log per-stage timings.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a planet and print a summary.
    Generate {
        /// JSON configuration file; command-line options override it.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Vertices per cube-face edge (2-4096).
        #[arg(short, long)]
        resolution: Option<u32>,

        /// Random seed for reproducible generation.
        #[arg(short, long)]
        seed: Option<u64>,

        /// Start from the Earth-like preset instead of the defaults.
        #[arg(long)]
        earth_like: bool,

        /// Ocean level between the lowest (0) and highest (1) terrain.
        #[arg(long)]
        ocean_level: Option<f32>,

        /// Disable the ocean shell.
        #[arg(long)]
        no_ocean: bool,

        /// Skip the shading data pass.
        #[arg(long)]
        no_shading: bool,

        /// Planet body scale.
        #[arg(long)]
        body_scale: Option<f32>,

        /// Compute device to run on.
        #[arg(short, long, default_value = "auto")]
        backend: Backend,

        /// Print the resolved configuration as JSON before generating.
        #[arg(long)]
        dump_config: bool,
    },

    /// Display mesh sizes for a resolution.
    Info {
        /// Vertices per cube-face edge.
        #[arg(short, long, default_value = "64")]
        resolution: u32,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Backend {
    /// GPU if available, otherwise the reference device.
    Auto,
    /// Require a GPU.
    Gpu,
    /// Sequential CPU reference device.
    Reference,
}

impl From<Backend> for ComputeBackend {
    fn from(backend: Backend) -> Self {
        match backend {
            Backend::Auto => ComputeBackend::Auto,
            Backend::Gpu => ComputeBackend::GpuOnly,
            Backend::Reference => ComputeBackend::ReferenceOnly,
        }
    }
}

struct GenerateArgs {
    config: Option<PathBuf>,
    resolution: Option<u32>,
    seed: Option<u64>,
    earth_like: bool,
    ocean_level: Option<f32>,
    no_ocean: bool,
    no_shading: bool,
    body_scale: Option<f32>,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_target(false)
        .init();

    match cli.command {
        Commands::Generate {
            config,
            resolution,
            seed,
            earth_like,
            ocean_level,
            no_ocean,
            no_shading,
            body_scale,
            backend,
            dump_config,
        } => {
            let args = GenerateArgs {
                config,
                resolution,
                seed,
                earth_like,
                ocean_level,
                no_ocean,
                no_shading,
                body_scale,
            };
            let config = match resolve_config(args) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    process::exit(1);
                }
            };
            if dump_config {
                match config.to_json() {
                    Ok(json) => println!("{}", json),
                    Err(e) => eprintln!("Error serializing config: {}", e),
                }
            }
            if let Err(e) = run_generate(&config, backend.into()) {
                eprintln!("Error during generation: {}", e);
                process::exit(1);
            }
        }
        Commands::Info { resolution } => {
            if let Err(e) = check_resolution(resolution) {
                eprintln!("Error: {}", e);
                process::exit(1);
            }
            run_info(resolution);
        }
    }
}

fn resolve_config(args: GenerateArgs) -> Result<PlanetConfig, GenerationError> {
    let seed = args.seed.unwrap_or_else(rand::random);
    let mut config = match (&args.config, args.earth_like) {
        (Some(path), _) => PlanetConfig::load(path)?,
        (None, true) => PlanetConfig::earth_like(seed),
        (None, false) => PlanetConfig::default(),
    };

    if args.config.is_none() || args.seed.is_some() {
        config.seed = seed;
    }
    if let Some(resolution) = args.resolution {
        config.resolution = resolution;
    }
    if let Some(level) = args.ocean_level {
        config.ocean.level = level;
    }
    if args.no_ocean {
        config.ocean.enabled = false;
    }
    if args.no_shading {
        config.shading = None;
    }
    if let Some(body_scale) = args.body_scale {
        config.body_scale = body_scale;
    }
    config.validate()?;
    Ok(config)
}

fn run_generate(config: &PlanetConfig, backend: ComputeBackend) -> Result<(), GenerationError> {
    println!("planetgen - Procedural Planet Generator");
    println!("=======================================");
    println!("Resolution: {} vertices per face edge", config.resolution);
    println!("Seed: {}", config.seed);

    match backend {
        ComputeBackend::ReferenceOnly => generate_on(ReferenceDevice::new(), config),
        ComputeBackend::GpuOnly => generate_on(GpuDevice::create()?, config),
        ComputeBackend::Auto => match GpuDevice::create() {
            Ok(gpu) => generate_on(gpu, config),
            Err(e) => {
                warn!(error = %e, "GPU unavailable, falling back to the reference device");
                generate_on(ReferenceDevice::new(), config)
            }
        },
    }
}

fn generate_on<D: ComputeDevice>(device: D, config: &PlanetConfig) -> Result<(), GenerationError> {
    println!("Device: {}", device.name());

    let start = Instant::now();
    let mut generator = PlanetGenerator::new(device);
    generator.generate(config)?;
    println!("Generation completed in {:.2?}", start.elapsed());

    let mut summary = SummarySink::default();
    generator.present(&mut summary);
    summary.print();
    Ok(())
}

/// Prints what a renderer would receive.
#[derive(Default)]
struct SummarySink {
    lines: Vec<String>,
}

impl SummarySink {
    fn print(&self) {
        println!();
        for line in &self.lines {
            println!("{}", line);
        }
    }
}

impl RenderSink for SummarySink {
    fn set_terrain_mesh(&mut self, mesh: &TerrainMesh) {
        self.lines.push(format!("Vertices:  {:>12}", mesh.vertex_count()));
        self.lines.push(format!("Triangles: {:>12}", mesh.triangle_count()));
        self.lines.push(format!("Indices:   {:>12}", format!("{:?}", mesh.index_format())));
    }

    fn set_terrain_material(&mut self, material: &TerrainMaterial) {
        self.lines.push(format!(
            "Height range: [{:.4}, {:.4}]",
            material.height_min_max.x, material.height_min_max.y
        ));
        self.lines.push(format!("Body scale: {}", material.body_scale));
    }

    fn set_ocean_shell(&mut self, shell: Option<&OceanShell>) {
        match shell {
            Some(shell) => self.lines.push(format!("Ocean radius: {:.4}", shell.radius)),
            None => self.lines.push("Ocean: disabled".to_string()),
        }
    }
}

fn run_info(resolution: u32) {
    let vertices = SphereGeometry::vertex_count_for(resolution);
    let triangles = SphereGeometry::triangle_count_for(resolution);
    let format = IndexFormat::for_vertex_count(vertices);
    let index_bytes = match format {
        IndexFormat::U16 => 2,
        IndexFormat::U32 => 4,
    };

    println!("Planet mesh information");
    println!("=======================");
    println!("Resolution: {} vertices per face edge", resolution);
    println!();
    println!("  Vertices:  {:>12}", vertices);
    println!("  Triangles: {:>12}", triangles);
    println!("  Indices:   {:>12}", format!("{:?}", format));
    println!();

    let bytes_vertices = vertices * 16;
    let bytes_heights = vertices * 4;
    let bytes_shading = vertices * 16;
    let bytes_indices = triangles * 3 * index_bytes;
    println!("Device memory (per generation):");
    println!("  Vertices: {:>12} bytes ({:.2} MB)", bytes_vertices, mb(bytes_vertices));
    println!("  Heights:  {:>12} bytes ({:.2} MB)", bytes_heights, mb(bytes_heights));
    println!("  Shading:  {:>12} bytes ({:.2} MB)", bytes_shading, mb(bytes_shading));
    println!();
    println!("Mesh memory:");
    println!("  Indices:  {:>12} bytes ({:.2} MB)", bytes_indices, mb(bytes_indices));
}

fn mb(bytes: usize) -> f64 {
    bytes as f64 / 1024.0 / 1024.0
}
