mod admin;
mod auth;
mod error;

pub use error::ApiError;

use axum::{
    extract::{DefaultBodyLimit, Query, State},
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::Settings;
use crate::db::{
    create_pool, get_all_leagues, get_schedules, get_teams, init_database_with_pool, SqliteStore,
};
use crate::models::{ApiResponse, League, Schedule, ScheduleStatus, Team};

#[derive(Clone)]
pub struct AppState {
    pub store: SqliteStore,
    pub settings: Arc<Settings>,
}

pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let pool = create_pool(&settings.database_url).await?;
    init_database_with_pool(&pool).await?;

    if settings.admin_credentials().is_none() {
        tracing::warn!(
            "ADMIN_USERNAME/ADMIN_PASSWORD not set, admin routes will refuse every request"
        );
    }

    let port = settings.port;
    let state = AppState {
        store: SqliteStore::new(pool),
        settings: Arc::new(settings),
    };
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!("League API server listening on port {}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/leagues", post(admin::create_league))
        .route("/teams", post(admin::create_team))
        .route("/schedules", post(admin::create_schedule))
        .route("/schedules/{id}/result", put(admin::record_result))
        .route(
            "/teams/{id}/logo",
            post(admin::upload_team_logo).layer(DefaultBodyLimit::max(admin::MAX_UPLOAD_BYTES)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin));

    Router::new()
        .route("/health", get(health_check))
        .route("/leagues", get(list_leagues))
        .route("/teams", get(list_teams))
        .route("/schedules", get(list_schedules))
        .nest("/admin", admin)
        .nest_service("/uploads", ServeDir::new(&state.settings.upload_dir))
        .fallback_service(ServeDir::new(&state.settings.web_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// Health check endpoint
async fn health_check() -> Json<ApiResponse<&'static str>> {
    Json(ApiResponse::success("League API is running"))
}

// GET /leagues
async fn list_leagues(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<League>>>, ApiError> {
    let leagues = get_all_leagues(state.store.pool()).await?;
    Ok(Json(ApiResponse::success(leagues)))
}

// GET /teams?league_id=
#[derive(Deserialize)]
struct TeamsQuery {
    league_id: Option<String>,
}

async fn list_teams(
    State(state): State<AppState>,
    Query(params): Query<TeamsQuery>,
) -> Result<Json<ApiResponse<Vec<Team>>>, ApiError> {
    let league_id = params.league_id.as_deref().filter(|id| !id.is_empty());
    let teams = get_teams(state.store.pool(), league_id).await?;
    Ok(Json(ApiResponse::success(teams)))
}

// GET /schedules?league_id=&status=
#[derive(Deserialize)]
struct SchedulesQuery {
    league_id: Option<String>,
    status: Option<String>,
}

async fn list_schedules(
    State(state): State<AppState>,
    Query(params): Query<SchedulesQuery>,
) -> Result<Json<ApiResponse<Vec<Schedule>>>, ApiError> {
    let league_id = params.league_id.as_deref().filter(|id| !id.is_empty());
    let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<ScheduleStatus>()?),
        None => None,
    };

    let schedules = get_schedules(state.store.pool(), league_id, status).await?;
    Ok(Json(ApiResponse::success(schedules)))
}
