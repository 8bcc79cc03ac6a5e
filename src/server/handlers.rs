//! Country endpoints.
//!
//! Every handler follows the same order: validate input, fetch the dataset
//! through the cached client, filter, then project and paginate.

use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::countries::filter::{self, SearchCriteria};
use crate::countries::{normalize_timezone, project, project_one, ProjectedCountry, RawCountryRecord};
use crate::pagination::{self, paginate, LinkBuilder, PageRequest};

use super::extract::{BaseUrl, QueryParams};
use super::response::{ApiError, ApiResponse};
use super::AppState;

type CountriesResponse = Result<ApiResponse<Vec<ProjectedCountry>>, ApiError>;

const MISSING_CRITERIA: &str =
  r#"At least one of "name", "region", "capital", or "timezone" query parameters is required"#;

pub async fn health() -> ApiResponse<()> {
  ApiResponse::message(StatusCode::OK, "ok")
}

/// `GET /countries`
pub async fn list_countries(
  State(state): State<AppState>,
  params: QueryParams,
  BaseUrl(base_url): BaseUrl,
) -> CountriesResponse {
  let request = PageRequest::parse(params.get("page"), params.get("limit"))?;

  tracing::info!(page = request.page, limit = request.limit, "Fetching data from the service");
  let countries = fetch_dataset(&state).await?;

  let page = paginate(project(&countries), request, &LinkBuilder::new(base_url));
  Ok(ApiResponse::paginated(
    "Country data retrieved successfully",
    page.items,
    page.meta,
  ))
}

/// `GET /countries/{code}`, matching cca2 or cca3.
pub async fn country_by_code(State(state): State<AppState>, Path(code): Path<String>) -> CountriesResponse {
  let code = code.trim();
  if code.is_empty() {
    return Err(ApiError::invalid_parameters("Country code is required"));
  }

  let countries = fetch_dataset(&state).await?;
  let country = filter::find_by_code(&countries, code)
    .ok_or_else(|| ApiError::not_found(format!("No country found with code: {}", code)))?;

  Ok(ApiResponse::ok(
    "Country data retrieved successfully",
    project_one(country),
  ))
}

/// `GET /countries/region/{region}`
pub async fn countries_by_region(
  State(state): State<AppState>,
  Path(region): Path<String>,
  params: QueryParams,
  BaseUrl(base_url): BaseUrl,
) -> CountriesResponse {
  let region = region.trim();
  if region.is_empty() {
    return Err(ApiError::invalid_parameters("Region is required"));
  }
  let request = PageRequest::parse(params.get("page"), params.get("limit"))?;

  let countries = fetch_dataset(&state).await?;
  let in_region = filter::filter_by_region(&countries, region);
  if in_region.is_empty() {
    return Err(ApiError::not_found(format!(
      "No countries found in region: {}",
      region
    )));
  }
  if request.is_past_end(in_region.len() as u64) {
    return Err(ApiError::not_found("Page not found"));
  }

  let page = paginate(project(in_region), request, &LinkBuilder::new(base_url));
  Ok(ApiResponse::paginated(
    format!("Countries in the {} region retrieved successfully", region),
    page.items,
    page.meta,
  ))
}

/// `GET /countries/search?name=&region=&capital=&timezone=`
///
/// Criteria combine with AND. Page links repeat every query parameter the
/// caller sent.
pub async fn search_countries(
  State(state): State<AppState>,
  params: QueryParams,
  BaseUrl(base_url): BaseUrl,
) -> CountriesResponse {
  let request = PageRequest::parse(params.get("page"), params.get("limit"))?;

  let criteria = SearchCriteria::new(
    params.get_owned("name"),
    params.get_owned("region"),
    params.get_owned("capital"),
    params.get_owned("timezone"),
  );
  if criteria.is_empty() {
    return Err(ApiError::invalid_parameters(MISSING_CRITERIA));
  }
  if let Some(tz) = &criteria.timezone {
    tracing::debug!(timezone = %tz, normalized = %normalize_timezone(tz), "Searching by timezone");
  }

  let countries = fetch_dataset(&state).await?;
  let matched = filter::search(&countries, &criteria);
  if matched.is_empty() {
    tracing::warn!(?criteria, "No countries found matching the search criteria");
    return Err(ApiError::not_found(
      "No countries found matching the search criteria",
    ));
  }

  let total_pages = pagination::total_pages(matched.len() as u64, request.limit);
  if request.page > total_pages {
    return Err(ApiError::invalid_parameters(format!(
      "Page {} does not exist. Total pages available: {}",
      request.page, total_pages
    )));
  }

  let links = LinkBuilder::new(base_url).with_params(params.into_pairs());
  let page = paginate(matched, request, &links).map(ProjectedCountry::from);
  Ok(ApiResponse::paginated(
    "Country search results",
    page.items,
    page.meta,
  ))
}

async fn fetch_dataset(state: &AppState) -> Result<Vec<RawCountryRecord>, ApiError> {
  let countries = state
    .countries
    .get_country_dataset()
    .await
    .map_err(ApiError::upstream)?;

  if countries.is_empty() {
    return Err(ApiError::NoDataAvailable);
  }
  Ok(countries)
}
