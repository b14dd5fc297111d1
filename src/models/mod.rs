use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LeagueError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: String,
    pub name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub league_id: String,
    pub name: String,
    pub elo_rating: f64,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleStatus {
    Scheduled,
    Completed,
    Canceled,
}

impl ScheduleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleStatus::Scheduled => "scheduled",
            ScheduleStatus::Completed => "completed",
            ScheduleStatus::Canceled => "canceled",
        }
    }
}

impl fmt::Display for ScheduleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScheduleStatus {
    type Err = LeagueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(ScheduleStatus::Scheduled),
            "completed" => Ok(ScheduleStatus::Completed),
            "canceled" => Ok(ScheduleStatus::Canceled),
            other => Err(LeagueError::InvalidRequest(format!(
                "unknown schedule status '{}'",
                other
            ))),
        }
    }
}

/// A match between two teams of a league.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: String,
    pub league_id: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub match_date: DateTime<Utc>,
    pub status: ScheduleStatus,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Admin request bodies

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLeagueRequest {
    pub id: Option<String>,
    pub name: String,
    pub logo_url: Option<String>,
}

/// Ratings are never accepted from clients; new teams start at the default.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTeamRequest {
    pub id: Option<String>,
    pub league_id: String,
    pub name: String,
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateScheduleRequest {
    pub id: Option<String>,
    pub league_id: String,
    pub home_team_id: String,
    pub away_team_id: String,
    pub match_date: Option<DateTime<Utc>>,
    pub status: Option<ScheduleStatus>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RecordResultRequest {
    pub home_score: u32,
    pub away_score: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    pub message: String,
    pub schedule: Schedule,
    pub winner: Option<Team>,
    pub loser: Option<Team>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogoUploaded {
    pub message: String,
    pub logo_url: String,
}

// API Response types
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}
