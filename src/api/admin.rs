use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{Duration, Utc};

use super::{ApiError, AppState};
use crate::db::{get_team_by_id, insert_league, insert_schedule, insert_team, update_team_logo};
use crate::models::{
    ApiResponse, CreateLeagueRequest, CreateScheduleRequest, CreateTeamRequest, League,
    LogoUploaded, RecordResultRequest, ResultSummary, Schedule, ScheduleStatus, Team,
};
use crate::services::{RecordOutcome, ResultRecorder, DEFAULT_RATING};
use crate::utils::{is_safe_id, logo_file_name, resolve_id, validate_name};

/// Largest accepted logo upload.
pub const MAX_UPLOAD_BYTES: usize = 10 << 20;

type Created<T> = (StatusCode, Json<ApiResponse<T>>);

// POST /admin/leagues
pub async fn create_league(
    State(state): State<AppState>,
    Json(request): Json<CreateLeagueRequest>,
) -> Result<Created<League>, ApiError> {
    validate_name(&request.name)?;
    let league = League {
        id: resolve_id(request.id)?,
        name: request.name,
        logo_url: request.logo_url,
    };

    insert_league(state.store.pool(), &league).await?;
    tracing::info!("Created league {} ({})", league.name, league.id);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(league))))
}

// POST /admin/teams
pub async fn create_team(
    State(state): State<AppState>,
    Json(request): Json<CreateTeamRequest>,
) -> Result<Created<Team>, ApiError> {
    validate_name(&request.name)?;
    let now = Utc::now();
    let team = Team {
        id: resolve_id(request.id)?,
        league_id: request.league_id,
        name: request.name,
        elo_rating: DEFAULT_RATING,
        logo_url: request.logo_url,
        created_at: now,
        updated_at: now,
    };

    insert_team(state.store.pool(), &team).await?;
    tracing::info!("Created team {} ({})", team.name, team.id);
    Ok((StatusCode::CREATED, Json(ApiResponse::success(team))))
}

// POST /admin/schedules
pub async fn create_schedule(
    State(state): State<AppState>,
    Json(request): Json<CreateScheduleRequest>,
) -> Result<Created<Schedule>, ApiError> {
    let now = Utc::now();
    let schedule = Schedule {
        id: resolve_id(request.id)?,
        league_id: request.league_id,
        home_team_id: request.home_team_id,
        away_team_id: request.away_team_id,
        match_date: request.match_date.unwrap_or_else(|| now + Duration::hours(24)),
        status: request.status.unwrap_or(ScheduleStatus::Scheduled),
        home_score: None,
        away_score: None,
        created_at: now,
        updated_at: now,
    };

    insert_schedule(state.store.pool(), &schedule).await?;
    tracing::info!(
        "Created schedule {}: {} vs {} on {}",
        schedule.id,
        schedule.home_team_id,
        schedule.away_team_id,
        schedule.match_date
    );
    Ok((StatusCode::CREATED, Json(ApiResponse::success(schedule))))
}

// PUT /admin/schedules/{id}/result
pub async fn record_result(
    State(state): State<AppState>,
    Path(schedule_id): Path<String>,
    Json(request): Json<RecordResultRequest>,
) -> Result<Json<ApiResponse<ResultSummary>>, ApiError> {
    let recorder = ResultRecorder::new(state.store.clone());
    let outcome = recorder
        .record_result(&schedule_id, request.home_score, request.away_score)
        .await?;

    let summary = match outcome {
        RecordOutcome::Completed {
            schedule,
            winner,
            loser,
        } => ResultSummary {
            message: "Match completed and ELO updated".to_string(),
            schedule,
            winner: Some(winner),
            loser: Some(loser),
        },
        RecordOutcome::AlreadyCompleted { schedule } => ResultSummary {
            message: "Schedule already completed".to_string(),
            schedule,
            winner: None,
            loser: None,
        },
    };

    Ok(Json(ApiResponse::success(summary)))
}

// POST /admin/teams/{id}/logo
pub async fn upload_team_logo(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<LogoUploaded>>, ApiError> {
    if !is_safe_id(&team_id) {
        return Err(ApiError::bad_request(format!("invalid team id '{}'", team_id)));
    }
    if get_team_by_id(state.store.pool(), &team_id).await?.is_none() {
        return Err(ApiError::not_found(format!("Team not found: {}", team_id)));
    }

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Error parsing form data: {}", e)))?
    {
        if field.name() != Some("logo") {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Error reading the file: {}", e)))?;
        upload = Some((file_name, bytes));
        break;
    }

    let (original_name, bytes) =
        upload.ok_or_else(|| ApiError::bad_request("Error retrieving the file"))?;

    let file_name = logo_file_name(&team_id, original_name.as_deref());
    let upload_dir = &state.settings.upload_dir;
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(crate::error::LeagueError::from)?;
    tokio::fs::write(upload_dir.join(&file_name), &bytes)
        .await
        .map_err(crate::error::LeagueError::from)?;

    let logo_url = format!("/uploads/{}", file_name);
    update_team_logo(state.store.pool(), &team_id, &logo_url).await?;
    tracing::info!("Stored logo for team {} ({} bytes)", team_id, bytes.len());

    Ok(Json(ApiResponse::success(LogoUploaded {
        message: "Logo uploaded successfully".to_string(),
        logo_url,
    })))
}
