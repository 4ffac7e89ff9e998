//! Stator line failure report CLI

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod tracing_config;

use commands::catalog::WindowChoice;
use tracing_config::LogFormat;

#[derive(Parser)]
#[command(name = "sttr")]
#[command(author, version, about = "Stator line failure report", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    settings: config::Settings,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Query the warehouse, build the report and post it
    Run {
        /// Print the payload instead of posting it
        #[arg(long)]
        dry_run: bool,

        /// Report as of this RFC 3339 timestamp instead of now
        #[arg(long)]
        at: Option<String>,

        /// Write run metrics in Prometheus text format to this file
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },

    /// Print the queries of one window
    Catalog {
        #[arg(long, value_enum, default_value_t = WindowChoice::Hourly)]
        window: WindowChoice,

        /// Render as of this RFC 3339 timestamp instead of now
        #[arg(long)]
        at: Option<String>,
    },

    /// Post a plain message through the Slack chat API
    Post {
        /// Channel id or name
        #[arg(long)]
        channel: String,

        /// Message text
        #[arg(long)]
        text: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_config::init(cli.verbose, cli.log_format);
    cli.settings.log_loaded();

    match cli.command {
        Commands::Run {
            dry_run,
            at,
            metrics_file,
        } => {
            commands::run::execute(
                &cli.settings,
                dry_run,
                at.as_deref(),
                metrics_file.as_deref(),
            )
            .await?;
        }
        Commands::Catalog { window, at } => {
            commands::catalog::execute(&cli.settings, window, at.as_deref())?;
        }
        Commands::Post { channel, text } => {
            commands::post::execute(&cli.settings, &channel, &text).await?;
        }
    }

    Ok(())
}
