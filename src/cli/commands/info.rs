use crate::config::Config;
use crate::domain::AnimeId;
use crate::state::SharedState;

pub async fn cmd_anime_info(config: Config, id: i32) -> anyhow::Result<()> {
    let anime_id = AnimeId::new(id);
    if !anime_id.is_valid() {
        println!("Invalid anime ID: {id}");
        return Ok(());
    }

    let state = SharedState::new(config).await?;
    let Some(anime) = state.catalog.get_by_id(anime_id).await else {
        println!("Anime {id} not found (or the catalog is unavailable).");
        return Ok(());
    };

    println!("Anime Info");
    println!("{:-<60}", "");
    println!("Title:     {}", anime.title);
    if let Some(en) = &anime.title_english {
        println!("English:   {en}");
    }
    println!("ID:        {}", anime.id);
    if let Some(kind) = &anime.kind {
        println!("Type:      {kind}");
    }
    println!(
        "Episodes:  {}",
        anime
            .episodes
            .map_or_else(|| "?".to_string(), |e| e.to_string())
    );
    println!("Status:    {}", anime.status.as_str());
    if let Some(score) = anime.score {
        println!("Score:     {score:.2}");
    }
    if let Some(rank) = anime.rank {
        println!("Rank:      #{rank}");
    }
    if !anime.aired.display.is_empty() {
        println!("Aired:     {}", anime.aired.display);
    }
    if let Some(broadcast) = &anime.broadcast {
        println!("Broadcast: {broadcast}");
    }
    if !anime.genres.is_empty() {
        println!("Genres:    {}", anime.genres.join(", "));
    }
    if !anime.url.is_empty() {
        println!("URL:       {}", anime.url);
    }

    if !anime.synopsis.is_empty() {
        println!();
        println!("{}", anime.synopsis);
    }

    let comments = state.store.list_comments_for_anime(anime_id).await?;
    println!();
    println!("Comments: {}", comments.len());

    Ok(())
}
