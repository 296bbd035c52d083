//! Innovation Focus - Main Entry Point
//!
//! Builds the enriched investment dataset, fits the profit regression and
//! exports the dashboard document.

use clap::Parser;
use innovation_focus::cli::{cmd_analyze, cmd_build, cmd_dashboard, cmd_info, cmd_run, show_help, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "innovation_focus=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Build { paths }) => {
            cmd_build(&cli.builder_config(paths))?;
        }
        Some(Commands::Analyze { paths, options }) => {
            cmd_analyze(&cli.analyzer_config(paths, options))?;
        }
        Some(Commands::Dashboard { paths }) => {
            cmd_dashboard(&cli.dashboard_config(paths))?;
        }
        Some(Commands::Run { options }) => {
            cmd_run(&cli.pipeline_config(options))?;
        }
        Some(Commands::Info { data }) => {
            cmd_info(data)?;
        }
        None => {
            show_help();
        }
    }

    Ok(())
}
