use chrono::Utc;
use std::cmp::Ordering;

use crate::db::{RatingCommit, ScheduleStore};
use crate::error::{LeagueError, Result};
use crate::models::{Schedule, ScheduleStatus, Team};
use crate::services::EloCalculator;

#[derive(Debug, Clone, PartialEq)]
pub enum RecordOutcome {
    /// The schedule was finalized by this call and both ratings moved.
    Completed {
        schedule: Schedule,
        winner: Team,
        loser: Team,
    },
    /// The schedule was already completed; nothing was recomputed.
    AlreadyCompleted { schedule: Schedule },
}

/// Applies match results: decides winner and loser, moves both Elo ratings
/// and finalizes the schedule.
pub struct ResultRecorder<S> {
    store: S,
    elo_calculator: EloCalculator,
}

impl<S: ScheduleStore> ResultRecorder<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            elo_calculator: EloCalculator::new(),
        }
    }

    pub async fn record_result(
        &self,
        schedule_id: &str,
        home_score: u32,
        away_score: u32,
    ) -> Result<RecordOutcome> {
        let schedule = self
            .store
            .get_schedule(schedule_id)
            .await?
            .ok_or_else(|| LeagueError::ScheduleNotFound(schedule_id.to_string()))?;

        match schedule.status {
            ScheduleStatus::Completed => {
                tracing::info!("Schedule {} already completed, ignoring result", schedule_id);
                return Ok(RecordOutcome::AlreadyCompleted { schedule });
            }
            ScheduleStatus::Canceled => {
                return Err(LeagueError::ScheduleCanceled(schedule_id.to_string()));
            }
            ScheduleStatus::Scheduled => {}
        }

        let (winner_id, loser_id) = match home_score.cmp(&away_score) {
            Ordering::Greater => (&schedule.home_team_id, &schedule.away_team_id),
            Ordering::Less => (&schedule.away_team_id, &schedule.home_team_id),
            Ordering::Equal => {
                return Err(LeagueError::UnsupportedOutcome {
                    home: home_score,
                    away: away_score,
                })
            }
        };

        let (stored_home, stored_away) =
            match (i32::try_from(home_score), i32::try_from(away_score)) {
                (Ok(home), Ok(away)) => (home, away),
                _ => return Err(LeagueError::InvalidRequest("score out of range".to_string())),
            };

        let winner = self.load_team(winner_id).await?;
        let loser = self.load_team(loser_id).await?;

        let (winner_rating, loser_rating) = self
            .elo_calculator
            .rate_decisive(winner.elo_rating, loser.elo_rating);

        let commit = RatingCommit {
            schedule_id: schedule.id.clone(),
            home_score,
            away_score,
            winner_id: winner.id.clone(),
            winner_rating,
            loser_id: loser.id.clone(),
            loser_rating,
            completed_at: Utc::now(),
        };

        if !self.store.commit_result(&commit).await? {
            // Another request finalized the schedule between our read and write.
            tracing::info!("Schedule {} was completed concurrently", schedule_id);
            let schedule = self
                .store
                .get_schedule(schedule_id)
                .await?
                .ok_or_else(|| LeagueError::ScheduleNotFound(schedule_id.to_string()))?;
            return Ok(RecordOutcome::AlreadyCompleted { schedule });
        }

        tracing::info!(
            "Updated ELO ratings: {} ({:.1} -> {:.1}), {} ({:.1} -> {:.1})",
            winner.name,
            winner.elo_rating,
            winner_rating,
            loser.name,
            loser.elo_rating,
            loser_rating
        );

        let schedule = Schedule {
            status: ScheduleStatus::Completed,
            home_score: Some(stored_home),
            away_score: Some(stored_away),
            updated_at: commit.completed_at,
            ..schedule
        };
        let winner = Team {
            elo_rating: winner_rating,
            updated_at: commit.completed_at,
            ..winner
        };
        let loser = Team {
            elo_rating: loser_rating,
            updated_at: commit.completed_at,
            ..loser
        };

        Ok(RecordOutcome::Completed {
            schedule,
            winner,
            loser,
        })
    }

    async fn load_team(&self, team_id: &str) -> Result<Team> {
        self.store
            .get_team(team_id)
            .await?
            .ok_or_else(|| LeagueError::TeamNotFound(team_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::{schedule, team};
    use crate::db::{create_test_pool, insert_schedule, insert_team, SqliteStore};
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    async fn recorder_with(
        teams: &[(&str, f64)],
        schedules: &[Schedule],
    ) -> ResultRecorder<SqliteStore> {
        let pool = create_test_pool().await;
        for (id, rating) in teams {
            insert_team(&pool, &team(id, *rating)).await.unwrap();
        }
        for s in schedules {
            insert_schedule(&pool, s).await.unwrap();
        }
        ResultRecorder::new(SqliteStore::new(pool))
    }

    async fn rating(recorder: &ResultRecorder<SqliteStore>, id: &str) -> f64 {
        recorder.store.get_team(id).await.unwrap().unwrap().elo_rating
    }

    #[tokio::test]
    async fn test_home_win_updates_both_ratings() {
        let recorder = recorder_with(
            &[("home", 1500.0), ("away", 1500.0)],
            &[schedule("m1", "home", "away")],
        )
        .await;

        let outcome = recorder.record_result("m1", 2, 1).await.unwrap();
        match outcome {
            RecordOutcome::Completed { schedule, winner, loser } => {
                assert_eq!(schedule.status, ScheduleStatus::Completed);
                assert_eq!(winner.id, "home");
                assert_eq!(winner.elo_rating, 1516.0);
                assert_eq!(loser.id, "away");
                assert_eq!(loser.elo_rating, 1484.0);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        assert_eq!(rating(&recorder, "home").await, 1516.0);
        assert_eq!(rating(&recorder, "away").await, 1484.0);

        let stored = recorder.store.get_schedule("m1").await.unwrap().unwrap();
        assert_eq!(stored.status, ScheduleStatus::Completed);
        assert_eq!((stored.home_score, stored.away_score), (Some(2), Some(1)));
    }

    #[tokio::test]
    async fn test_away_win_picks_away_as_winner() {
        let recorder = recorder_with(
            &[("home", 1600.0), ("away", 1400.0)],
            &[schedule("m1", "home", "away")],
        )
        .await;

        recorder.record_result("m1", 0, 3).await.unwrap();

        assert!((rating(&recorder, "away").await - 1424.31).abs() < 0.01);
        assert!((rating(&recorder, "home").await - 1575.69).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_completed_schedule_is_a_no_op() {
        let recorder = recorder_with(
            &[("home", 1500.0), ("away", 1500.0)],
            &[schedule("m1", "home", "away")],
        )
        .await;
        recorder.record_result("m1", 2, 1).await.unwrap();

        let outcome = recorder.record_result("m1", 0, 5).await.unwrap();
        match outcome {
            RecordOutcome::AlreadyCompleted { schedule } => {
                assert_eq!((schedule.home_score, schedule.away_score), (Some(2), Some(1)));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(rating(&recorder, "home").await, 1516.0);
        assert_eq!(rating(&recorder, "away").await, 1484.0);
    }

    #[tokio::test]
    async fn test_tie_on_completed_schedule_is_a_no_op() {
        let recorder = recorder_with(
            &[("home", 1500.0), ("away", 1500.0)],
            &[schedule("m1", "home", "away")],
        )
        .await;
        recorder.record_result("m1", 3, 1).await.unwrap();

        let outcome = recorder.record_result("m1", 1, 1).await.unwrap();
        assert!(matches!(
            outcome,
            RecordOutcome::AlreadyCompleted { ref schedule }
                if schedule.home_score == Some(3) && schedule.away_score == Some(1)
        ));
        assert_eq!(rating(&recorder, "home").await, 1516.0);
        assert_eq!(rating(&recorder, "away").await, 1484.0);
    }

    #[tokio::test]
    async fn test_tie_is_rejected_without_writes() {
        let recorder = recorder_with(
            &[("home", 1500.0), ("away", 1550.0)],
            &[schedule("m1", "home", "away")],
        )
        .await;

        let err = recorder.record_result("m1", 1, 1).await.unwrap_err();
        assert!(matches!(err, LeagueError::UnsupportedOutcome { home: 1, away: 1 }));

        let stored = recorder.store.get_schedule("m1").await.unwrap().unwrap();
        assert_eq!(stored.status, ScheduleStatus::Scheduled);
        assert_eq!(stored.home_score, None);
        assert_eq!(rating(&recorder, "home").await, 1500.0);
        assert_eq!(rating(&recorder, "away").await, 1550.0);
    }

    #[tokio::test]
    async fn test_missing_schedule_and_team() {
        let recorder = recorder_with(&[("home", 1500.0)], &[schedule("m1", "home", "ghost")]).await;

        let err = recorder.record_result("nope", 1, 0).await.unwrap_err();
        assert!(matches!(err, LeagueError::ScheduleNotFound(id) if id == "nope"));

        let err = recorder.record_result("m1", 1, 0).await.unwrap_err();
        assert!(matches!(err, LeagueError::TeamNotFound(id) if id == "ghost"));

        let stored = recorder.store.get_schedule("m1").await.unwrap().unwrap();
        assert_eq!(stored.status, ScheduleStatus::Scheduled);
        assert_eq!(rating(&recorder, "home").await, 1500.0);
    }

    #[tokio::test]
    async fn test_canceled_schedule_is_rejected() {
        let mut canceled = schedule("m1", "home", "away");
        canceled.status = ScheduleStatus::Canceled;
        let recorder = recorder_with(&[("home", 1500.0), ("away", 1500.0)], &[canceled]).await;

        let err = recorder.record_result("m1", 3, 0).await.unwrap_err();
        assert!(matches!(err, LeagueError::ScheduleCanceled(_)));
        assert_eq!(rating(&recorder, "home").await, 1500.0);
    }

    /// Reports the schedule as still scheduled but refuses every commit, as if
    /// another request won the status swap in between.
    struct RacingStore {
        inner: SqliteStore,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl ScheduleStore for RacingStore {
        async fn get_schedule(&self, schedule_id: &str) -> Result<Option<Schedule>> {
            let mut found = self.inner.get_schedule(schedule_id).await?;
            if self.reads.fetch_add(1, AtomicOrdering::SeqCst) > 0 {
                if let Some(s) = found.as_mut() {
                    s.status = ScheduleStatus::Completed;
                }
            }
            Ok(found)
        }

        async fn get_team(&self, team_id: &str) -> Result<Option<Team>> {
            self.inner.get_team(team_id).await
        }

        async fn set_team_rating(&self, _team_id: &str, _elo_rating: f64) -> Result<()> {
            panic!("ratings must not be written after a lost race");
        }

        async fn complete_schedule(
            &self,
            _schedule_id: &str,
            _home_score: u32,
            _away_score: u32,
            _completed_at: DateTime<Utc>,
        ) -> Result<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_lost_race_reports_already_completed() {
        let pool = create_test_pool().await;
        insert_team(&pool, &team("home", 1500.0)).await.unwrap();
        insert_team(&pool, &team("away", 1500.0)).await.unwrap();
        insert_schedule(&pool, &schedule("m1", "home", "away")).await.unwrap();
        let recorder = ResultRecorder::new(RacingStore {
            inner: SqliteStore::new(pool),
            reads: AtomicUsize::new(0),
        });

        let outcome = recorder.record_result("m1", 1, 0).await.unwrap();
        assert!(matches!(outcome, RecordOutcome::AlreadyCompleted { .. }));
    }
}
