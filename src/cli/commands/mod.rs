mod cache;
mod import;
mod info;
mod listing;
mod schedule;
mod serve;
mod users;

pub use cache::{cmd_cache_clear, cmd_cache_purge};
pub use import::cmd_import;
pub use info::cmd_anime_info;
pub use listing::{cmd_popular, cmd_search_anime, cmd_top};
pub use schedule::cmd_schedule;
pub use serve::cmd_serve;
pub use users::{cmd_create_superuser, cmd_vip};

use crate::models::{AiringStatus, CatalogEntry};

fn status_indicator(status: AiringStatus) -> &'static str {
    match status {
        AiringStatus::Airing => "🟢",
        AiringStatus::Finished => "✓",
        AiringStatus::Upcoming => "📅",
        AiringStatus::Paused => "⏸",
        AiringStatus::Unknown => "•",
    }
}

fn print_entries(entries: &[CatalogEntry]) {
    for entry in entries {
        let eps = entry
            .episodes
            .map_or_else(|| "? eps".to_string(), |e| format!("{e} eps"));
        let score = entry
            .score
            .map_or_else(|| "-".to_string(), |s| format!("{s:.2}"));

        let title = entry.display_title();
        println!("{} {title} ({eps})", status_indicator(entry.status));
        if title != entry.title {
            println!("  Romaji: {}", entry.title);
        }
        println!(
            "  ID: {} | Score: {score} | Genres: {}",
            entry.id,
            entry.genres.join(", ")
        );
    }
}
