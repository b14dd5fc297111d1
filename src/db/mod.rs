pub mod seed;
pub mod store;

pub use seed::seed_data;
pub use store::{RatingCommit, ScheduleStore, SqliteStore};

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::str::FromStr;

use crate::error::{LeagueError, Result};
use crate::models::*;

pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);

    if !file_path.starts_with(":memory:") {
        if let Some(parent) = std::path::Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

/// Called from the CLI where no pool exists yet.
pub async fn init_database(database_url: &str) -> Result<()> {
    let pool = create_pool(database_url).await?;
    init_database_with_pool(&pool).await
}

/// Called from the server so schema creation shares the main pool.
pub async fn init_database_with_pool(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leagues (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            logo_url TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Team and schedule references are not foreign keys: a schedule may point
    // at a team that does not exist, which surfaces as TeamNotFound later.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id TEXT PRIMARY KEY,
            league_id TEXT NOT NULL,
            name TEXT NOT NULL,
            elo_rating REAL NOT NULL DEFAULT 1500.0,
            logo_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schedules (
            id TEXT PRIMARY KEY,
            league_id TEXT NOT NULL,
            home_team_id TEXT NOT NULL,
            away_team_id TEXT NOT NULL,
            match_date TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'scheduled',
            home_score INTEGER,
            away_score INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_teams_league ON teams(league_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_schedules_league ON schedules(league_id)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_schedules_status ON schedules(status)")
        .execute(pool)
        .await?;

    tracing::info!("Database initialized successfully");
    Ok(())
}

/// Fixed-width RFC 3339 so stored timestamps sort lexically.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .map_err(|e| anyhow::anyhow!("invalid stored timestamp '{}': {}", raw, e))?;
    Ok(parsed.with_timezone(&Utc))
}

fn map_insert_error(err: sqlx::Error, kind: &str, id: &str) -> LeagueError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            LeagueError::InvalidRequest(format!("{} '{}' already exists", kind, id))
        }
        _ => err.into(),
    }
}

// League operations
pub async fn insert_league(pool: &SqlitePool, league: &League) -> Result<()> {
    sqlx::query("INSERT INTO leagues (id, name, logo_url) VALUES (?, ?, ?)")
        .bind(&league.id)
        .bind(&league.name)
        .bind(&league.logo_url)
        .execute(pool)
        .await
        .map_err(|e| map_insert_error(e, "league", &league.id))?;

    Ok(())
}

pub async fn get_all_leagues(pool: &SqlitePool) -> Result<Vec<League>> {
    let rows = sqlx::query("SELECT * FROM leagues ORDER BY name")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| League {
            id: row.get("id"),
            name: row.get("name"),
            logo_url: row.get("logo_url"),
        })
        .collect())
}

// Team operations
fn team_from_row(row: &SqliteRow) -> Result<Team> {
    Ok(Team {
        id: row.get("id"),
        league_id: row.get("league_id"),
        name: row.get("name"),
        elo_rating: row.get("elo_rating"),
        logo_url: row.get("logo_url"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

pub async fn insert_team(pool: &SqlitePool, team: &Team) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO teams
        (id, league_id, name, elo_rating, logo_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&team.id)
    .bind(&team.league_id)
    .bind(&team.name)
    .bind(team.elo_rating)
    .bind(&team.logo_url)
    .bind(format_timestamp(team.created_at))
    .bind(format_timestamp(team.updated_at))
    .execute(pool)
    .await
    .map_err(|e| map_insert_error(e, "team", &team.id))?;

    Ok(())
}

pub async fn get_team_by_id(pool: &SqlitePool, team_id: &str) -> Result<Option<Team>> {
    let row = sqlx::query("SELECT * FROM teams WHERE id = ?")
        .bind(team_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(team_from_row).transpose()
}

/// Teams ordered by rating, strongest first.
pub async fn get_teams(pool: &SqlitePool, league_id: Option<&str>) -> Result<Vec<Team>> {
    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM teams");
    if let Some(league_id) = league_id {
        query.push(" WHERE league_id = ").push_bind(league_id);
    }
    query.push(" ORDER BY elo_rating DESC, name");

    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(team_from_row).collect()
}

pub async fn update_team_rating(pool: &SqlitePool, team_id: &str, elo_rating: f64) -> Result<bool> {
    let result = sqlx::query("UPDATE teams SET elo_rating = ?, updated_at = ? WHERE id = ?")
        .bind(elo_rating)
        .bind(format_timestamp(Utc::now()))
        .bind(team_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn update_team_logo(pool: &SqlitePool, team_id: &str, logo_url: &str) -> Result<bool> {
    let result = sqlx::query("UPDATE teams SET logo_url = ?, updated_at = ? WHERE id = ?")
        .bind(logo_url)
        .bind(format_timestamp(Utc::now()))
        .bind(team_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

// Schedule operations
fn schedule_from_row(row: &SqliteRow) -> Result<Schedule> {
    Ok(Schedule {
        id: row.get("id"),
        league_id: row.get("league_id"),
        home_team_id: row.get("home_team_id"),
        away_team_id: row.get("away_team_id"),
        match_date: parse_timestamp(&row.get::<String, _>("match_date"))?,
        status: row.get::<String, _>("status").parse()?,
        home_score: row.get("home_score"),
        away_score: row.get("away_score"),
        created_at: parse_timestamp(&row.get::<String, _>("created_at"))?,
        updated_at: parse_timestamp(&row.get::<String, _>("updated_at"))?,
    })
}

pub async fn insert_schedule(pool: &SqlitePool, schedule: &Schedule) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO schedules
        (id, league_id, home_team_id, away_team_id, match_date, status,
         home_score, away_score, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&schedule.id)
    .bind(&schedule.league_id)
    .bind(&schedule.home_team_id)
    .bind(&schedule.away_team_id)
    .bind(format_timestamp(schedule.match_date))
    .bind(schedule.status.as_str())
    .bind(schedule.home_score)
    .bind(schedule.away_score)
    .bind(format_timestamp(schedule.created_at))
    .bind(format_timestamp(schedule.updated_at))
    .execute(pool)
    .await
    .map_err(|e| map_insert_error(e, "schedule", &schedule.id))?;

    Ok(())
}

pub async fn get_schedule_by_id(pool: &SqlitePool, schedule_id: &str) -> Result<Option<Schedule>> {
    let row = sqlx::query("SELECT * FROM schedules WHERE id = ?")
        .bind(schedule_id)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(schedule_from_row).transpose()
}

pub async fn get_schedules(
    pool: &SqlitePool,
    league_id: Option<&str>,
    status: Option<ScheduleStatus>,
) -> Result<Vec<Schedule>> {
    let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM schedules WHERE 1=1");
    if let Some(league_id) = league_id {
        query.push(" AND league_id = ").push_bind(league_id);
    }
    if let Some(status) = status {
        query.push(" AND status = ").push_bind(status.as_str());
    }
    query.push(" ORDER BY match_date");

    let rows = query.build().fetch_all(pool).await?;
    rows.iter().map(schedule_from_row).collect()
}

/// Test pool: one connection that never expires, so the in-memory database
/// lives as long as the pool.
#[cfg(test)]
pub(crate) async fn create_test_pool() -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init_database_with_pool(&pool).await.unwrap();
    pool
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::Duration;

    pub fn team(id: &str, rating: f64) -> Team {
        let now = Utc::now();
        Team {
            id: id.to_string(),
            league_id: "league-1".to_string(),
            name: format!("Team {}", id),
            elo_rating: rating,
            logo_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn schedule(id: &str, home: &str, away: &str) -> Schedule {
        let now = Utc::now();
        Schedule {
            id: id.to_string(),
            league_id: "league-1".to_string(),
            home_team_id: home.to_string(),
            away_team_id: away.to_string(),
            match_date: now + Duration::hours(24),
            status: ScheduleStatus::Scheduled,
            home_score: None,
            away_score: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{schedule, team};
    use super::*;

    #[tokio::test]
    async fn test_team_round_trip_and_ordering() {
        let pool = create_test_pool().await;
        insert_team(&pool, &team("a", 1500.0)).await.unwrap();
        insert_team(&pool, &team("b", 1620.5)).await.unwrap();

        let fetched = get_team_by_id(&pool, "b").await.unwrap().unwrap();
        assert_eq!(fetched.elo_rating, 1620.5);
        assert!(get_team_by_id(&pool, "missing").await.unwrap().is_none());

        let teams = get_teams(&pool, Some("league-1")).await.unwrap();
        let ids: Vec<_> = teams.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert!(get_teams(&pool, Some("other")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_ids_are_rejected() {
        let pool = create_test_pool().await;
        insert_team(&pool, &team("a", 1500.0)).await.unwrap();

        let err = insert_team(&pool, &team("a", 1500.0)).await.unwrap_err();
        assert!(matches!(err, LeagueError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_schedule_filters() {
        let pool = create_test_pool().await;
        let mut canceled = schedule("s2", "a", "b");
        canceled.status = ScheduleStatus::Canceled;
        let mut other_league = schedule("s3", "c", "d");
        other_league.league_id = "league-2".to_string();

        insert_schedule(&pool, &schedule("s1", "a", "b")).await.unwrap();
        insert_schedule(&pool, &canceled).await.unwrap();
        insert_schedule(&pool, &other_league).await.unwrap();

        assert_eq!(get_schedules(&pool, None, None).await.unwrap().len(), 3);
        assert_eq!(get_schedules(&pool, Some("league-1"), None).await.unwrap().len(), 2);

        let scheduled = get_schedules(&pool, Some("league-1"), Some(ScheduleStatus::Scheduled))
            .await
            .unwrap();
        assert_eq!(scheduled.len(), 1);
        assert_eq!(scheduled[0].id, "s1");

        let stored = get_schedule_by_id(&pool, "s2").await.unwrap().unwrap();
        assert_eq!(stored.status, ScheduleStatus::Canceled);
    }

    #[tokio::test]
    async fn test_logo_update_reports_missing_team() {
        let pool = create_test_pool().await;
        insert_team(&pool, &team("a", 1500.0)).await.unwrap();

        assert!(update_team_logo(&pool, "a", "/uploads/a.png").await.unwrap());
        assert!(!update_team_logo(&pool, "zz", "/uploads/zz.png").await.unwrap());

        let fetched = get_team_by_id(&pool, "a").await.unwrap().unwrap();
        assert_eq!(fetched.logo_url.as_deref(), Some("/uploads/a.png"));
    }
}
