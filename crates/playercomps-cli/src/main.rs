// Player comparison entry point.
//
// Startup sequence:
// 1. Parse arguments, resolve the base directory
// 2. Initialize tracing (log to file, stdout is for results)
// 3. Copy default config files, load config
// 4. Build the similarity index from the configured tables
// 5. Run the requested query and print it

mod output;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use output::OutputFormat;
use playercomps_core::config::{self, Config};
use playercomps_engine::{build_index_from_paths, IndexOptions, SimilarityIndex};
use tracing::info;

#[derive(Parser)]
#[command(name = "playercomps")]
#[command(about = "Find statistically similar player seasons", long_about = None)]
struct Cli {
    /// Directory holding config/ (or defaults/) and the data files
    #[arg(long)]
    base_dir: Option<PathBuf>,

    /// Weight profile to use instead of the one in comps.toml
    #[arg(long)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the seasons most similar to a player's season
    Similar {
        /// Exact player name, e.g. "Stephen Curry"
        player: String,
        season: i32,
        /// Number of results (defaults to query.top_n)
        #[arg(long)]
        top: Option<usize>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// List player names in the index
    Players {
        /// Only players with a row in this season
        #[arg(long)]
        season: Option<i32>,
    },
    /// Show the stat lines for a player's season
    Stats {
        player: String,
        season: i32,
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let base_dir = match &cli.base_dir {
        Some(dir) => dir.clone(),
        None => config::resolve_base_dir(&std::env::current_dir()?),
    };

    init_tracing(&base_dir)?;
    info!("playercomps starting in {}", base_dir.display());

    let config = config::load_config(&base_dir).context("failed to load configuration")?;

    let index = load_index(&config, &base_dir, cli.profile.as_deref())?;

    match cli.command {
        Command::Similar {
            player,
            season,
            top,
            format,
        } => {
            let top_n = top.unwrap_or(config.top_n);
            let results = index.find_similar(&player, season, top_n)?;
            print!("{}", output::render_similar(&player, season, &results, format)?);
        }
        Command::Players { season } => {
            let names = match season {
                Some(season) => index.players_in(season),
                None => index.players(),
            };
            for name in names {
                println!("{name}");
            }
        }
        Command::Stats {
            player,
            season,
            format,
        } => {
            let lines = index.stat_lines(&player, season)?;
            print!("{}", output::render_stat_lines(&lines, format)?);
        }
    }

    Ok(())
}

/// Build the index from the tables named in the config.
fn load_index(
    config: &Config,
    base_dir: &Path,
    profile_override: Option<&str>,
) -> anyhow::Result<SimilarityIndex> {
    let profile = profile_override.unwrap_or(&config.weight_profile);
    let Some(weights) = config.weights.profile(profile) else {
        let known: Vec<&str> = config.weights.names().collect();
        bail!(
            "unknown weight profile `{}` (available: {})",
            profile,
            known.join(", ")
        );
    };
    info!("using weight profile `{}` ({} weighted stats)", profile, weights.len());

    let primary = base_dir.join(&config.data.primary);
    let shooting = config.data.shooting.as_ref().map(|p| base_dir.join(p));

    let options = IndexOptions::new(weights.clone())
        .with_season_filter(config.seasons)
        .with_drop_columns(config.data.drop_columns.clone());

    build_index_from_paths(&primary, shooting.as_deref(), &options)
        .with_context(|| format!("failed to build index from {}", primary.display()))
}

/// Initialize tracing to log to a file (stdout carries query output).
fn init_tracing(base_dir: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = base_dir.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("playercomps.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(
                    "playercomps=info,playercomps_core=info,playercomps_engine=info,warn",
                )),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
