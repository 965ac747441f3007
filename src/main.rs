use clap::{Parser, Subcommand};
use loggen::cli::run::RunOverrides;
use loggen::config::resolve_config_path;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "loggen")]
#[command(about = "Synthetic server access log generator", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the log file (default)
    Run(RunOverrides),
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Report statistics for a generated log file
    Analyze {
        file: PathBuf,

        /// Parallel readers (defaults to the available parallelism)
        #[arg(long)]
        threads: Option<usize>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
    Validate,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "loggen=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config_path = resolve_config_path(cli.config.as_deref());

    match cli.command {
        Some(Commands::Run(overrides)) => {
            loggen::cli::run::run(config_path, overrides).await?;
        }
        None => {
            // Default behavior is to run
            loggen::cli::run::run(config_path, RunOverrides::default()).await?;
        }
        Some(Commands::Config { action }) => match action {
            ConfigAction::Init { stdout } => {
                loggen::cli::config::init(stdout)?;
            }
            ConfigAction::Validate => {
                loggen::cli::config::validate(config_path)?;
            }
        },
        Some(Commands::Analyze { file, threads }) => {
            loggen::cli::analyze::analyze(&file, threads).await?;
        }
    }

    Ok(())
}
