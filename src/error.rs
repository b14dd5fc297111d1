//! Error types for the league service.

pub type Result<T> = std::result::Result<T, LeagueError>;

#[derive(Debug, thiserror::Error)]
pub enum LeagueError {
    #[error("Tie games are not supported ({home}-{away})")]
    UnsupportedOutcome { home: u32, away: u32 },

    #[error("Schedule not found: {0}")]
    ScheduleNotFound(String),

    #[error("Team not found: {0}")]
    TeamNotFound(String),

    #[error("Schedule {0} is canceled")]
    ScheduleCanceled(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] anyhow::Error),

    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for LeagueError {
    fn from(err: sqlx::Error) -> Self {
        LeagueError::Persistence(err.into())
    }
}
