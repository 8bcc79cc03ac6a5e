//! Request extractors shared by the country handlers.

use axum::extract::{FromRequestParts, OriginalUri};
use axum::http::header::HOST;
use axum::http::request::Parts;
use std::convert::Infallible;

use super::AppState;

/// Query string pairs in request order, repeats included.
///
/// Kept raw (rather than deserialized into a struct) because the search
/// endpoint echoes every parameter back into its page links.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
  pub fn parse(query: Option<&str>) -> Self {
    let pairs = query
      .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
      .unwrap_or_default();
    Self(pairs)
  }

  /// First value for `name`.
  pub fn get(&self, name: &str) -> Option<&str> {
    self
      .0
      .iter()
      .find(|(k, _)| k == name)
      .map(|(_, v)| v.as_str())
  }

  pub fn get_owned(&self, name: &str) -> Option<String> {
    self.get(name).map(String::from)
  }

  pub fn into_pairs(self) -> Vec<(String, String)> {
    self.0
  }
}

impl<S: Send + Sync> FromRequestParts<S> for QueryParams {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    Ok(Self::parse(parts.uri.query()))
  }
}

/// Absolute URL of the requested path without its query, used for page links.
///
/// `server.public_url` wins when configured; otherwise the scheme comes from
/// `X-Forwarded-Proto` (default `http`) and the authority from `Host`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrl(pub String);

impl FromRequestParts<AppState> for BaseUrl {
  type Rejection = Infallible;

  async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
    let OriginalUri(uri) = OriginalUri::from_request_parts(parts, state).await?;
    let path = uri.path();

    if let Some(public_url) = &state.public_url {
      return Ok(Self(format!("{}{}", public_url.trim_end_matches('/'), path)));
    }

    let header = |name: &str| {
      parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    };
    let scheme = header("x-forwarded-proto").unwrap_or("http");
    let host = header(HOST.as_str()).unwrap_or("localhost");

    Ok(Self(format!("{scheme}://{host}{path}")))
  }
}
