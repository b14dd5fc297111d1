use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::error::LeagueError;
use crate::models::ApiResponse;

/// Error returned by handlers, rendered as the standard JSON envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<LeagueError> for ApiError {
    fn from(err: LeagueError) -> Self {
        let status = match &err {
            // A dangling team reference is a broken record, not a transient fault.
            LeagueError::UnsupportedOutcome { .. }
            | LeagueError::TeamNotFound(_)
            | LeagueError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            LeagueError::ScheduleNotFound(_) => StatusCode::NOT_FOUND,
            LeagueError::ScheduleCanceled(_) => StatusCode::CONFLICT,
            LeagueError::Persistence(_) | LeagueError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {}", self.message);
        } else {
            tracing::debug!("Request rejected ({}): {}", self.status, self.message);
        }
        (self.status, Json(ApiResponse::<()>::error(self.message))).into_response()
    }
}
