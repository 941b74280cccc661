//! `photolapse` CLI - build timelapse videos from daily photos

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use photolapse::DuplicatePolicy;

mod cmd;

#[derive(Parser)]
#[command(name = "photolapse")]
#[command(about = "Turn a folder of daily photos into a timelapse video")]
#[command(version)]
struct Cli {
    /// Config file (default: ROOT/photolapse.toml, then the user config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline: dates, frames, video and soundtrack
    Build {
        /// Project root containing photos/ and audio/
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Output frame rate
        #[arg(long)]
        fps: Option<u32>,

        /// Frames each photo stays on screen
        #[arg(long)]
        hold: Option<u32>,

        /// Skip the soundtrack stages
        #[arg(long)]
        no_audio: bool,

        /// How to handle duplicate timestamps without a stored correction
        #[arg(long, value_enum)]
        policy: Option<DuplicatePolicy>,
    },

    /// Resolve capture dates and print the photo timeline
    Dates {
        /// Project root containing photos/
        #[arg(default_value = ".")]
        root: PathBuf,

        /// How to handle duplicate timestamps without a stored correction
        #[arg(long, value_enum)]
        policy: Option<DuplicatePolicy>,

        /// Print the timeline as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Project root
        #[arg(default_value = ".")]
        root: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over -v
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let explicit = cli.config.as_deref();
    match cli.command {
        Commands::Build {
            root,
            fps,
            hold,
            no_audio,
            policy,
        } => {
            let overrides = cmd::Overrides {
                fps,
                hold,
                no_audio,
                policy,
            };
            let config = cmd::load_config(&root, explicit, &overrides)?;
            cmd::build::cmd_build(config).await?;
        }
        Commands::Dates { root, policy, json } => {
            let overrides = cmd::Overrides {
                policy,
                ..cmd::Overrides::default()
            };
            let config = cmd::load_config(&root, explicit, &overrides)?;
            cmd::dates::cmd_dates(config, json).await?;
        }
        Commands::Config { root } => {
            let config = cmd::load_config(&root, explicit, &cmd::Overrides::default())?;
            cmd::config::cmd_config(&config)?;
        }
    }

    Ok(())
}
