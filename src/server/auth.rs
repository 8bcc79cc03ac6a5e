use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use super::response::ApiError;
use super::AppState;

/// Require `Authorization: Bearer <token>` when `auth.token` is configured.
///
/// With no token configured every request passes through untouched.
pub async fn require_bearer_token(
  State(state): State<AppState>,
  request: Request,
  next: Next,
) -> Result<Response, ApiError> {
  if let Some(expected) = state.auth_token.as_deref() {
    check_bearer(request.headers(), expected)?;
  }
  Ok(next.run(request).await)
}

fn check_bearer(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
  let token = headers
    .get(AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(|| ApiError::unauthorized("Unauthorized, token missing"))?;

  if token != expected {
    return Err(ApiError::unauthorized("Unauthorized, invalid token"));
  }
  Ok(())
}
