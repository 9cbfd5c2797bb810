//! Import command handler

use std::time::Duration;

use crate::config::Config;
use crate::services::{ImportOptions, import_top_scored};
use crate::state::SharedState;

pub async fn cmd_import(config: Config, limit: usize, min_score: f64) -> anyhow::Result<()> {
    let delay = Duration::from_millis(config.jikan.import_delay_ms);
    let state = SharedState::new(config).await?;

    println!("Importing up to {limit} anime with score >= {min_score}...");

    let options = ImportOptions {
        limit,
        min_score,
        delay,
    };
    let report = import_top_scored(&state.catalog, &state.store, &options).await;

    println!();
    println!("✓ Imported: {}", report.imported);
    println!("⊘ Already present: {}", report.skipped);
    if report.failed > 0 {
        println!("✗ Failed: {}", report.failed);
    }
    if let Some(reason) = &report.aborted {
        println!("⚠ Stopped early: {reason}");
    }

    let total = state.store.count_local_anime().await?;
    println!("Local catalog now holds {total} anime.");

    Ok(())
}
