//! Campus CLI - keep an offline copy of the academic program catalog
//!
//! Pulls the remote catalog into a local `SQLite` database and browses it.

mod cli;
mod commands;
mod error;


use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::common::AppContext;
use crate::commands::config::run_config;
use crate::commands::history::run_history;
use crate::commands::list::run_list;
use crate::commands::services::run_services;
use crate::commands::show::run_show;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("campus=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let context = AppContext::load(cli.config, cli.db_path)?;

    match cli.command {
        Commands::Sync { service, json } => run_sync(service.as_deref(), json, &context).await?,
        Commands::Status { json } => run_status(json, &context).await?,
        Commands::List {
            limit,
            domain,
            json,
        } => run_list(limit, domain.as_deref(), json, &context).await?,
        Commands::Show { id, json } => run_show(&id, json, &context).await?,
        Commands::History { limit, json } => run_history(limit, json, &context).await?,
        Commands::Services => run_services(&context)?,
        Commands::Config { command } => run_config(command, &context)?,
    }

    Ok(())
}
