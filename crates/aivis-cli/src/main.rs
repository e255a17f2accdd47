mod analyze;
mod render;
mod status;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "aivis")]
#[command(about = "Measure how often AI assistants mention a brand and its competitors")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Query every platform with generated prompts and score visibility
    Analyze {
        /// Analysis profile YAML (defaults to `AIVIS_PROFILE_PATH`)
        #[arg(long)]
        profile: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Also write the full JSON report to this file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Seed prompt generation for a reproducible prompt set
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print the prompt set `analyze` would send, without calling any platform
    Prompts {
        #[arg(long)]
        profile: Option<PathBuf>,

        #[arg(long)]
        seed: Option<u64>,
    },
    /// Send a short test prompt to each configured platform
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    dotenvy::dotenv().ok();
    let config = aivis_core::load_app_config()?;
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Analyze {
            profile,
            format,
            output,
            seed,
        }) => analyze::run_analyze(&config, profile.as_deref(), format, output.as_deref(), seed).await,
        Some(Commands::Prompts { profile, seed }) => {
            analyze::run_prompts(&config, profile.as_deref(), seed)
        }
        Some(Commands::Status) => status::run_status(&config).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}
