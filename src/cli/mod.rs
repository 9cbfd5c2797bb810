//! CLI module - Command-line interface for AnimeCalendar
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// AnimeCalendar - anime catalog, schedule and community
#[derive(Parser)]
#[command(name = "animecalendar")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    #[command(alias = "web")]
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },

    /// Search the catalog
    #[command(alias = "s")]
    Search {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
        /// Maximum results (1-25)
        #[arg(long, default_value = "10")]
        limit: u32,
    },

    /// Show the top rated anime
    Top {
        #[arg(long, default_value = "10")]
        limit: u32,
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Show the most popular anime
    Popular {
        #[arg(long, default_value = "10")]
        limit: u32,
        #[arg(long, default_value = "1")]
        page: u32,
    },

    /// Show what airs on a weekday (today when omitted)
    Schedule {
        /// monday, tuesday, ...
        weekday: Option<String>,
    },

    /// Show details about one anime
    #[command(alias = "i")]
    Info {
        /// Upstream (MyAnimeList) ID
        id: i32,
    },

    /// Import top scored anime into the local table
    Import {
        /// Number of new anime to import
        #[arg(long, default_value = "25")]
        limit: usize,
        /// Lowest score to consider
        #[arg(long, default_value = "6.5")]
        min_score: f64,
    },

    /// Manage the catalog cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Create a staff account, or reset its password if it exists
    CreateSuperuser {
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Grant or revoke VIP status
    Vip {
        username: String,
        #[arg(long)]
        revoke: bool,
    },

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Remove cached catalog entries
    Clear {
        /// Only the weekday schedules
        #[arg(long)]
        schedule: bool,

        /// Only one namespace (anime, search, top, popular, schedule, season)
        #[arg(long, conflicts_with = "schedule")]
        namespace: Option<String>,
    },
    /// Remove entries past their TTL
    Purge,
}

pub use commands::*;
