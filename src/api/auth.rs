use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine};

use super::AppState;
use crate::models::ApiResponse;

#[derive(Debug, PartialEq, Eq)]
enum AuthCheck {
    Granted,
    /// No usable Basic credentials: the client should be prompted.
    Missing,
    Denied,
}

/// HTTP Basic gate in front of every admin route.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    match check(request.headers(), state.settings.admin_credentials()) {
        AuthCheck::Granted => next.run(request).await,
        AuthCheck::Missing => (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, r#"Basic realm="Restricted""#)],
            Json(ApiResponse::<()>::error("Unauthorized".to_string())),
        )
            .into_response(),
        AuthCheck::Denied => {
            tracing::warn!("Rejected admin request with invalid credentials");
            (
                StatusCode::FORBIDDEN,
                Json(ApiResponse::<()>::error("Forbidden".to_string())),
            )
                .into_response()
        }
    }
}

fn check(headers: &HeaderMap, expected: Option<(&str, &str)>) -> AuthCheck {
    let Some((username, password)) = basic_credentials(headers) else {
        return AuthCheck::Missing;
    };

    match expected {
        Some((user, pass)) if username == user && password == pass => AuthCheck::Granted,
        _ => AuthCheck::Denied,
    }
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
