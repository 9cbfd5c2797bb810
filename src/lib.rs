pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{CacheCommands, Cli, Commands};
pub use config::Config;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);

    if config.observability.loki_enabled {
        let url = url::Url::parse(&config.observability.loki_url).context("Invalid Loki URL")?;

        let mut builder = tracing_loki::builder();
        for (key, value) in &config.observability.loki_labels {
            builder = builder.label(key.as_str(), value.as_str())?;
        }
        let (layer, task) = builder.build_url(url)?;

        tokio::spawn(task);

        registry.with(layer).init();
        info!(
            "Loki logging initialized at {}",
            config.observability.loki_url
        );
    } else {
        registry.init();
    }

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Serve { port } => cli::cmd_serve(config, port, prometheus_handle).await,

        Commands::Search { query, limit } => {
            cli::cmd_search_anime(config, &query.join(" "), limit).await
        }

        Commands::Top { limit, page } => cli::cmd_top(config, limit, page).await,

        Commands::Popular { limit, page } => cli::cmd_popular(config, limit, page).await,

        Commands::Schedule { weekday } => cli::cmd_schedule(config, weekday.as_deref()).await,

        Commands::Info { id } => cli::cmd_anime_info(config, id).await,

        Commands::Import { limit, min_score } => cli::cmd_import(config, limit, min_score).await,

        Commands::Cache { command } => match command {
            CacheCommands::Clear {
                schedule,
                namespace,
            } => cli::cmd_cache_clear(config, schedule, namespace.as_deref()).await,
            CacheCommands::Purge => cli::cmd_cache_purge(config).await,
        },

        Commands::CreateSuperuser { username, password } => {
            cli::cmd_create_superuser(config, &username, &password).await
        }

        Commands::Vip { username, revoke } => cli::cmd_vip(config, &username, revoke).await,

        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("config.toml already exists.");
            }
            Ok(())
        }
    }
}
