//! Command line argument definitions.

use clap::{Parser, Subcommand};

/// Anime Resolver - Resolve catalogue files into shows, seasons and episodes
#[derive(Parser, Debug)]
#[command(name = "anime-resolver")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Skip preflight checks
    #[arg(long, global = true)]
    pub skip_preflight: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve a file path to its file, episodes, season and show
    Path {
        /// Path of the media file
        #[arg(value_name = "PATH")]
        path: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a season by identifier (e.g. 123, a456, b789)
    Season {
        /// Season identifier
        #[arg(value_name = "ID")]
        id: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve the show owning a season
    Show {
        /// Season identifier
        #[arg(value_name = "SEASON_ID")]
        season_id: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the resolved tag tree of a series
    Tags {
        /// Native series id
        #[arg(value_name = "SERIES_ID")]
        series_id: u32,
    },

    /// Print the effective configuration
    Config,
}

impl Commands {
    /// Whether the command talks to the catalogue server.
    pub fn needs_server(&self) -> bool {
        !matches!(self, Commands::Config)
    }
}
