use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "runlog")]
#[command(about = "Follow the event log of a job run", long_about = None)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a run's events as they arrive
    Tail {
        run_id: String,
        /// Keep following after the backlog is delivered
        #[arg(long, short)]
        follow: bool,
        /// Poll instead of opening a live push session
        #[arg(long)]
        pull: bool,
        /// Print each node as a JSON line
        #[arg(long)]
        json: bool,
    },
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Init {
        #[arg(long)]
        stdout: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runlog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config_path = runlog::config::resolve_config_path(cli.config.as_deref());

    match cli.command {
        Commands::Tail {
            run_id,
            follow,
            pull,
            json,
        } => {
            let options = runlog::cli::tail::TailOptions {
                run_id,
                follow,
                pull,
                json,
            };
            runlog::cli::tail::tail(config_path, options).await?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { stdout } => {
                runlog::cli::config::init(stdout)?;
            }
        },
    }

    Ok(())
}
