use crate::config::{CacheBackend, Config};
use crate::services::catalog_cache::Namespace;
use crate::state::SharedState;

fn warn_if_memory(config: &Config) -> bool {
    if config.cache.backend == CacheBackend::Memory {
        println!("The cache backend is 'memory'; it lives inside the server process.");
        println!("Use DELETE /api/system/cache on the running server instead.");
        return true;
    }
    false
}

pub async fn cmd_cache_clear(
    config: Config,
    schedule_only: bool,
    namespace: Option<&str>,
) -> anyhow::Result<()> {
    let namespace = namespace.map(str::parse::<Namespace>).transpose()?;

    if warn_if_memory(&config) {
        return Ok(());
    }

    let state = SharedState::new(config).await?;
    let removed = match namespace {
        Some(namespace) => state.catalog.clear_namespace(namespace).await,
        None if schedule_only => state.catalog.clear_schedule_cache().await,
        None => state.catalog.clear_all().await,
    };

    println!("✓ Removed {removed} cached entries");
    Ok(())
}

pub async fn cmd_cache_purge(config: Config) -> anyhow::Result<()> {
    if warn_if_memory(&config) {
        return Ok(());
    }

    let state = SharedState::new(config).await?;
    let removed = state.catalog.cache().purge_expired().await;

    println!("✓ Purged {removed} expired entries");
    Ok(())
}
