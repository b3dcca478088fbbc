//! cue-gen - pool-cue GLB tool
//!
//! One subcommand per operation; all settings come from an optional cue.toml.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cue_gen::{config, cue, inspect, layer, smooth};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "cue-gen")]
#[command(about = "Pool-cue GLB generation and post-processing")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a cue GLB
    Generate {
        /// Output .glb file
        #[arg(short, long, default_value = "cue.glb")]
        output: PathBuf,

        /// Path to cue.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Preset to build (simplified, full, butt, realistic); overrides the config
        #[arg(short, long)]
        preset: Option<String>,
    },

    /// Append the customizable layer to an existing GLB
    AddLayer {
        /// Input .glb file
        input: PathBuf,

        /// Output .glb file (default: <input>_with_layer.glb)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to cue.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Measure the side rectangle in UV space
    InspectUv {
        /// Input .glb file
        input: PathBuf,

        /// Mesh to measure (default: first mesh)
        #[arg(short, long)]
        mesh: Option<String>,

        /// Path to cue.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Recompute normals (and optionally subdivide / re-project UVs)
    Smooth {
        /// Input .glb file
        input: PathBuf,

        /// Output .glb file (default: <input>_smooth.glb)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Path to cue.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Validate cue.toml without writing anything
    Check {
        /// Path to cue.toml
        #[arg(default_value = "cue.toml")]
        config: PathBuf,
    },
}

fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read input: {:?}", path))
}

fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("Failed to write output: {:?}", path))?;
    tracing::info!("Wrote {:?} ({} bytes)", path, bytes.len());
    Ok(())
}

/// `dir/name.glb` -> `dir/name<suffix>.glb`
fn with_suffix(input: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{}{}.glb", stem, suffix))
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            output,
            config,
            preset,
        } => {
            let mut config = config::load_config(config.as_deref())?;
            if let Some(preset) = preset {
                config.cue.preset = preset.parse()?;
                config.cue.sections.clear();
                config.cue.rings = None;
            }
            let built = cue::build_cue(&config.cue)?;
            write_output(&output, &built.glb)?;
            tracing::info!("Done!");
        }

        Commands::AddLayer {
            input,
            output,
            config,
        } => {
            let config = config::load_config(config.as_deref())?;
            let output = output.unwrap_or_else(|| with_suffix(&input, "_with_layer"));
            tracing::info!("Adding layer {:?} -> {:?}", input, output);
            let outcome = layer::add_customizable_layer(&read_input(&input)?, &config.layer)?;
            write_output(&output, &outcome.glb)?;
            tracing::info!("Done!");
        }

        Commands::InspectUv {
            input,
            mesh,
            config,
        } => {
            let config = config::load_config(config.as_deref())?;
            let lines = inspect::measure_uv(&read_input(&input)?, mesh.as_deref(), &config.inspect)
                .with_context(|| format!("Failed to inspect {:?}", input))?;
            for line in lines {
                println!("{}", line);
            }
        }

        Commands::Smooth {
            input,
            output,
            config,
        } => {
            let config = config::load_config(config.as_deref())?;
            let output = output.unwrap_or_else(|| with_suffix(&input, "_smooth"));
            tracing::info!("Smoothing {:?} -> {:?}", input, output);
            let outcome = smooth::smooth_glb(&read_input(&input)?, &config.smooth)?;
            write_output(&output, &outcome.glb)?;
            tracing::info!("Done!");
        }

        Commands::Check { config } => {
            tracing::info!("Checking config {:?}", config);
            let config = config::load_config(Some(config.as_path()))?;
            config.validate()?;
            tracing::info!("Config is valid!");
        }
    }

    Ok(())
}
