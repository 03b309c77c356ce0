use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "campus")]
#[command(about = "Browse and update the offline catalog of academic programs")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to the configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pull the remote catalog into the local database
    #[command(alias = "update")]
    Sync {
        /// Remote service name (defaults to the configured default)
        #[arg(long, value_name = "NAME")]
        service: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show when the local database was last updated
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List programs
    List {
        /// Number of programs to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Filter programs by domain
        #[arg(long)]
        domain: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one program
    Show {
        /// Program ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recent sync runs
    History {
        /// Number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List configured remote services
    Services,
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Add a remote service or update its URL
    AddService {
        /// Service name
        #[arg(long, value_name = "NAME")]
        name: String,
        /// Catalog endpoint returning every program
        #[arg(long, value_name = "URL")]
        url: String,
        /// Make this the default service
        #[arg(long)]
        default: bool,
    },
    /// Print the effective configuration
    Show,
}
