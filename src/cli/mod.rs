use anyhow::Result;

use crate::config::Settings;
use crate::db::{create_pool, get_teams, init_database_with_pool, seed_data, SqliteStore};
use crate::services::{RecordOutcome, ResultRecorder};

pub async fn seed(settings: &Settings) -> Result<()> {
    let pool = create_pool(&settings.database_url).await?;
    init_database_with_pool(&pool).await?;

    let fixtures = seed_data(&pool).await?;
    if fixtures == 0 {
        println!("📭 Database already has teams, nothing seeded.");
    } else {
        println!("✅ Seeded demo league with {} fixtures.", fixtures);
        println!("💡 Try: eloleague standings --league-id demo");
    }
    Ok(())
}

pub async fn show_standings(settings: &Settings, league_id: Option<&str>) -> Result<()> {
    let pool = create_pool(&settings.database_url).await?;
    init_database_with_pool(&pool).await?;

    let teams = get_teams(&pool, league_id).await?;
    if teams.is_empty() {
        println!("📭 No teams found. Create some first, or run: eloleague seed");
        return Ok(());
    }

    println!("🏆 Standings by Elo rating:\n");
    for (i, team) in teams.iter().enumerate() {
        println!("{:>3}. {:<30} {:>7.1}  ({})", i + 1, team.name, team.elo_rating, team.league_id);
    }
    Ok(())
}

pub async fn record_result(
    settings: &Settings,
    schedule_id: &str,
    home_score: u32,
    away_score: u32,
) -> Result<()> {
    let pool = create_pool(&settings.database_url).await?;
    init_database_with_pool(&pool).await?;

    let recorder = ResultRecorder::new(SqliteStore::new(pool));
    match recorder
        .record_result(schedule_id, home_score, away_score)
        .await?
    {
        RecordOutcome::Completed { winner, loser, .. } => {
            println!("✅ Match completed and ELO updated:");
            println!("   {:<30} {:>7.1}", winner.name, winner.elo_rating);
            println!("   {:<30} {:>7.1}", loser.name, loser.elo_rating);
        }
        RecordOutcome::AlreadyCompleted { schedule } => {
            println!(
                "ℹ️  Schedule {} was already completed ({}-{}), ratings unchanged.",
                schedule.id,
                schedule.home_score.unwrap_or_default(),
                schedule.away_score.unwrap_or_default()
            );
        }
    }
    Ok(())
}
