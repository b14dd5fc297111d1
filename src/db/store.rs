//! Store boundary used by the rating update engine.
//!
//! The engine only needs four lookups/writes plus an atomic commit. Keeping
//! them behind a trait lets the engine run against SQLite in production and
//! against purpose-built stores in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::{format_timestamp, get_schedule_by_id, get_team_by_id, update_team_rating};
use crate::error::{LeagueError, Result};
use crate::models::{Schedule, ScheduleStatus, Team};

/// Everything written when a scheduled match is finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingCommit {
    pub schedule_id: String,
    pub home_score: u32,
    pub away_score: u32,
    pub winner_id: String,
    pub winner_rating: f64,
    pub loser_id: String,
    pub loser_rating: f64,
    pub completed_at: DateTime<Utc>,
}

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn get_schedule(&self, schedule_id: &str) -> Result<Option<Schedule>>;

    async fn get_team(&self, team_id: &str) -> Result<Option<Team>>;

    /// Fails with `TeamNotFound` when no team has the given id.
    async fn set_team_rating(&self, team_id: &str, elo_rating: f64) -> Result<()>;

    /// Moves a schedule from `scheduled` to `completed`. Returns false when the
    /// schedule was not in `scheduled` state, in which case nothing is written.
    async fn complete_schedule(
        &self,
        schedule_id: &str,
        home_score: u32,
        away_score: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<bool>;

    /// Writes the completion and both ratings. Returns false if another
    /// writer finalized the schedule first; no rating is touched in that case.
    ///
    /// The default issues the conditional completion first, so a lost race
    /// never applies a rating delta, but a failure between the writes can
    /// leave the ratings stale. Stores with transactions should override it.
    async fn commit_result(&self, commit: &RatingCommit) -> Result<bool> {
        let completed = self
            .complete_schedule(
                &commit.schedule_id,
                commit.home_score,
                commit.away_score,
                commit.completed_at,
            )
            .await?;
        if !completed {
            return Ok(false);
        }

        self.set_team_rating(&commit.winner_id, commit.winner_rating)
            .await?;
        self.set_team_rating(&commit.loser_id, commit.loser_rating)
            .await?;
        Ok(true)
    }
}

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

const COMPLETE_SCHEDULE_SQL: &str = r#"
    UPDATE schedules
    SET status = ?, home_score = ?, away_score = ?, updated_at = ?
    WHERE id = ? AND status = ?
"#;

const SET_RATING_SQL: &str = "UPDATE teams SET elo_rating = ?, updated_at = ? WHERE id = ?";

#[async_trait]
impl ScheduleStore for SqliteStore {
    async fn get_schedule(&self, schedule_id: &str) -> Result<Option<Schedule>> {
        get_schedule_by_id(&self.pool, schedule_id).await
    }

    async fn get_team(&self, team_id: &str) -> Result<Option<Team>> {
        get_team_by_id(&self.pool, team_id).await
    }

    async fn set_team_rating(&self, team_id: &str, elo_rating: f64) -> Result<()> {
        if !update_team_rating(&self.pool, team_id, elo_rating).await? {
            return Err(LeagueError::TeamNotFound(team_id.to_string()));
        }
        Ok(())
    }

    async fn complete_schedule(
        &self,
        schedule_id: &str,
        home_score: u32,
        away_score: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(COMPLETE_SCHEDULE_SQL)
            .bind(ScheduleStatus::Completed.as_str())
            .bind(home_score)
            .bind(away_score)
            .bind(format_timestamp(completed_at))
            .bind(schedule_id)
            .bind(ScheduleStatus::Scheduled.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn commit_result(&self, commit: &RatingCommit) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let stamp = format_timestamp(commit.completed_at);

        // Compare-and-swap on status: only one writer can win the transition.
        let transitioned = sqlx::query(COMPLETE_SCHEDULE_SQL)
            .bind(ScheduleStatus::Completed.as_str())
            .bind(commit.home_score)
            .bind(commit.away_score)
            .bind(&stamp)
            .bind(&commit.schedule_id)
            .bind(ScheduleStatus::Scheduled.as_str())
            .execute(&mut *tx)
            .await?;

        if transitioned.rows_affected() != 1 {
            tx.rollback().await?;
            return Ok(false);
        }

        for (team_id, rating) in [
            (&commit.winner_id, commit.winner_rating),
            (&commit.loser_id, commit.loser_rating),
        ] {
            let updated = sqlx::query(SET_RATING_SQL)
                .bind(rating)
                .bind(&stamp)
                .bind(team_id)
                .execute(&mut *tx)
                .await?;
            if updated.rows_affected() != 1 {
                // Dropping the transaction rolls back the completion too.
                return Err(LeagueError::TeamNotFound(team_id.to_string()));
            }
        }

        tx.commit().await?;
        Ok(true)
    }
}
