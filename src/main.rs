//! Modplan CLI entry point.

use anyhow::Result;
use clap::Parser;
use modplan::cli::{commands, Cli, Commands};
use modplan::config::Settings;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.as_ref().map(PathBuf::from);

    // Load configuration first so its log level can act as the fallback
    let settings = Settings::load_from(config_path.as_ref())?;

    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("modplan={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match &cli.command {
        Commands::Ask { question, trace } => {
            commands::run_ask(question, *trace, settings).await?;
        }

        Commands::Chat => {
            commands::run_chat(settings).await?;
        }

        Commands::Search {
            query,
            level,
            limit,
            year,
        } => {
            commands::run_search(query, *level, *limit, year.as_deref(), settings).await?;
        }

        Commands::Module { code, year } => {
            commands::run_module(code, year.as_deref(), settings).await?;
        }

        Commands::Timetable {
            code,
            semester,
            year,
        } => {
            commands::run_timetable(code, *semester, year.as_deref(), settings).await?;
        }

        Commands::Eval { file, json, grade } => {
            commands::run_eval(file, *json, *grade, settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host.clone(), *port, settings).await?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings, config_path.as_ref()).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, settings, config_path.as_ref())?;
        }
    }

    Ok(())
}
