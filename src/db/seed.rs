use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use super::{insert_league, insert_schedule, insert_team};
use crate::error::Result;
use crate::models::{League, Schedule, ScheduleStatus, Team};
use crate::services::DEFAULT_RATING;

const DEMO_LEAGUE_ID: &str = "demo";

// (id, name)
const DEMO_TEAMS: [(&str, &str); 4] = [
    ("demo_1", "Harbour City Herons"),
    ("demo_2", "Northside Foxes"),
    ("demo_3", "Old Mill Rovers"),
    ("demo_4", "Riverside Athletic"),
];

/// Seeds one demo league with four teams and a full single round robin,
/// one fixture per day starting tomorrow. Does nothing if teams already exist.
pub async fn seed_data(pool: &SqlitePool) -> Result<usize> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM teams")
        .fetch_one(pool)
        .await?;

    if count > 0 {
        tracing::info!("Database already seeded ({} teams found), skipping.", count);
        return Ok(0);
    }

    tracing::info!("Seeding database with demo league...");
    let now = Utc::now();

    insert_league(
        pool,
        &League {
            id: DEMO_LEAGUE_ID.to_string(),
            name: "Demo League".to_string(),
            logo_url: None,
        },
    )
    .await?;

    for (id, name) in DEMO_TEAMS {
        let team = Team {
            id: id.to_string(),
            league_id: DEMO_LEAGUE_ID.to_string(),
            name: name.to_string(),
            elo_rating: DEFAULT_RATING,
            logo_url: None,
            created_at: now,
            updated_at: now,
        };
        insert_team(pool, &team).await?;
    }

    let mut fixtures = 0;
    for (i, (home_id, _)) in DEMO_TEAMS.iter().enumerate() {
        for (away_id, _) in DEMO_TEAMS.iter().skip(i + 1) {
            fixtures += 1;
            let schedule = Schedule {
                id: format!("{}_m{}", DEMO_LEAGUE_ID, fixtures),
                league_id: DEMO_LEAGUE_ID.to_string(),
                home_team_id: home_id.to_string(),
                away_team_id: away_id.to_string(),
                match_date: now + Duration::days(fixtures as i64),
                status: ScheduleStatus::Scheduled,
                home_score: None,
                away_score: None,
                created_at: now,
                updated_at: now,
            };
            insert_schedule(pool, &schedule).await?;
        }
    }

    tracing::info!("Database seeded with {} teams and {} fixtures.", DEMO_TEAMS.len(), fixtures);
    Ok(fixtures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, get_schedules, get_teams};

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let pool = create_test_pool().await;

        assert_eq!(seed_data(&pool).await.unwrap(), 6);
        assert_eq!(seed_data(&pool).await.unwrap(), 0);

        let teams = get_teams(&pool, Some(DEMO_LEAGUE_ID)).await.unwrap();
        assert_eq!(teams.len(), 4);
        assert!(teams.iter().all(|t| t.elo_rating == DEFAULT_RATING));

        let schedules = get_schedules(&pool, Some(DEMO_LEAGUE_ID), Some(ScheduleStatus::Scheduled))
            .await
            .unwrap();
        assert_eq!(schedules.len(), 6);
        assert!(schedules.iter().all(|s| s.home_team_id != s.away_team_id));
    }
}
