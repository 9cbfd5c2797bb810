use chrono::Local;

use super::print_entries;
use crate::config::Config;
use crate::domain::Weekday;
use crate::state::SharedState;

pub async fn cmd_schedule(config: Config, weekday: Option<&str>) -> anyhow::Result<()> {
    let weekday = match weekday {
        Some(day) => match day.parse::<Weekday>() {
            Ok(day) => day,
            Err(e) => {
                println!("{e}");
                println!(
                    "Use one of: monday, tuesday, wednesday, thursday, friday, saturday, sunday"
                );
                return Ok(());
            }
        },
        None => Weekday::from_date(Local::now().date_naive()),
    };

    let state = SharedState::new(config).await?;
    let day = state.catalog.schedule(weekday).await;

    println!("Airing on {} ({} shows)", day.weekday, day.entries.len());
    println!("{:-<60}", "");
    print_entries(&day.entries);

    Ok(())
}
