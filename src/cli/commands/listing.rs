//! Catalog listing commands: search, top and popular.

use super::print_entries;
use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_search_anime(config: Config, query: &str, limit: u32) -> anyhow::Result<()> {
    println!("Searching for: {query}");

    let state = SharedState::new(config).await?;
    let results = state.catalog.search(query, limit).await;

    if results.is_empty() {
        println!("No anime found matching '{query}'");
        return Ok(());
    }

    println!();
    println!("Search Results:");
    println!("{:-<60}", "");
    print_entries(&results);

    Ok(())
}

pub async fn cmd_top(config: Config, limit: u32, page: u32) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let results = state.catalog.top_rated(limit, page).await;

    println!("Top Rated (page {page})");
    println!("{:-<60}", "");
    if results.is_empty() {
        println!("Catalog unavailable, try again later.");
    }
    print_entries(&results);

    Ok(())
}

pub async fn cmd_popular(config: Config, limit: u32, page: u32) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let results = state.catalog.popular(limit, page).await;

    println!("Most Popular (page {page})");
    println!("{:-<60}", "");
    if results.is_empty() {
        println!("Catalog unavailable, try again later.");
    }
    print_entries(&results);

    Ok(())
}
