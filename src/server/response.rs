//! Response envelope and the errors handlers can return.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::pagination::{InvalidPagination, PaginationMeta};

/// Body shared by every endpoint: `{status, message, data?, pagination?}`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
  pub status: u16,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data: Option<T>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub pagination: Option<PaginationMeta>,
}

impl<T: Serialize> ApiResponse<T> {
  pub fn ok(message: impl Into<String>, data: T) -> Self {
    Self {
      status: StatusCode::OK.as_u16(),
      message: message.into(),
      data: Some(data),
      pagination: None,
    }
  }

  pub fn paginated(message: impl Into<String>, data: T, pagination: PaginationMeta) -> Self {
    Self {
      pagination: Some(pagination),
      ..Self::ok(message, data)
    }
  }
}

impl ApiResponse<()> {
  pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
    Self {
      status: status.as_u16(),
      message: message.into(),
      data: None,
      pagination: None,
    }
  }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
  fn into_response(self) -> Response {
    let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(self)).into_response()
  }
}

/// High-level API errors mapped to HTTP responses
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  InvalidParameters(String),
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  Unauthorized(String),
  #[error("{0}")]
  TooManyRequests(String),
  #[error("Unable to fetch country data")]
  UpstreamUnavailable,
  #[error("No country data available")]
  NoDataAvailable,
}

impl ApiError {
  pub fn invalid_parameters(msg: impl Into<String>) -> Self {
    Self::InvalidParameters(msg.into())
  }
  pub fn not_found(msg: impl Into<String>) -> Self {
    Self::NotFound(msg.into())
  }
  pub fn unauthorized(msg: impl Into<String>) -> Self {
    Self::Unauthorized(msg.into())
  }

  /// Record the data layer's error chain, then hide it behind a generic 500.
  pub fn upstream(err: color_eyre::Report) -> Self {
    tracing::error!(error = ?err, "Error fetching country data");
    Self::UpstreamUnavailable
  }

  pub fn status_code(&self) -> StatusCode {
    match self {
      ApiError::InvalidParameters(_) => StatusCode::BAD_REQUEST,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
      ApiError::UpstreamUnavailable | ApiError::NoDataAvailable => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<InvalidPagination> for ApiError {
  fn from(err: InvalidPagination) -> Self {
    Self::InvalidParameters(err.to_string())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status_code();
    let message = self.to_string();

    if status.is_server_error() {
      tracing::error!(status = status.as_u16(), %message, "request failed");
    } else {
      tracing::warn!(status = status.as_u16(), %message, "request rejected");
    }

    ApiResponse::message(status, message).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::Value;

  async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  #[tokio::test]
  async fn test_error_body_has_status_and_message_only() {
    let response = ApiError::not_found("No country found with code: XX").into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
      body_json(response).await,
      serde_json::json!({"status": 404, "message": "No country found with code: XX"})
    );
  }

  #[tokio::test]
  async fn test_upstream_error_hides_details() {
    let err = ApiError::upstream(color_eyre::eyre::eyre!("connection refused to 10.0.0.1"));
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Unable to fetch country data");
    assert!(!body.to_string().contains("10.0.0.1"));
  }

  #[test]
  fn test_status_mapping() {
    assert_eq!(ApiError::from(InvalidPagination).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(ApiError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(
      ApiError::TooManyRequests("slow down".into()).status_code(),
      StatusCode::TOO_MANY_REQUESTS
    );
    assert_eq!(ApiError::NoDataAvailable.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[tokio::test]
  async fn test_paginated_envelope_includes_pagination() {
    use crate::pagination::{LinkBuilder, PageRequest};

    let meta = PaginationMeta::new(PageRequest::default(), 1, &LinkBuilder::new("http://h/c"));
    let response = ApiResponse::paginated("ok", vec![1], meta).into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"], serde_json::json!([1]));
    assert_eq!(body["pagination"]["totalItems"], 1);
  }
}
