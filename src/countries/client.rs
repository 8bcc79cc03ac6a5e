use crate::config::UpstreamConfig;
use crate::countries::api_types::RawCountryRecord;
use color_eyre::{eyre::eyre, Result};
use url::Url;

/// Path of the full dataset, relative to the configured base URL
const ALL_COUNTRIES_PATH: &str = "v3.1/all";

/// REST Countries API client wrapper
#[derive(Clone)]
pub struct CountryApiClient {
  http: reqwest::Client,
  base_url: Url,
}

impl CountryApiClient {
  pub fn new(config: &UpstreamConfig) -> Result<Self> {
    let http = reqwest::Client::builder()
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url: parse_base_url(&config.base_url)?,
    })
  }

  /// Get every country in one call.
  ///
  /// Non-2xx responses, network failures and bodies that aren't a JSON array
  /// of countries are all errors. Nothing is retried.
  pub async fn get_all_countries(&self) -> Result<Vec<RawCountryRecord>> {
    let url = self
      .base_url
      .join(ALL_COUNTRIES_PATH)
      .map_err(|e| eyre!("Failed to build countries URL: {}", e))?;

    let response = self
      .http
      .get(url.clone())
      .send()
      .await
      .map_err(|e| eyre!("Failed to reach {}: {}", url, e))?
      .error_for_status()
      .map_err(|e| eyre!("Country API returned an error: {}", e))?;

    let body = response
      .text()
      .await
      .map_err(|e| eyre!("Failed to read country API response: {}", e))?;

    let countries: Vec<RawCountryRecord> = serde_json::from_str(&body)
      .map_err(|e| eyre!("Failed to parse country API response: {}", e))?;

    Ok(countries)
  }
}

/// Parse the configured base URL, making sure relative joins keep its path.
fn parse_base_url(raw: &str) -> Result<Url> {
  let with_slash = if raw.ends_with('/') {
    raw.to_string()
  } else {
    format!("{raw}/")
  };
  Url::parse(&with_slash).map_err(|e| eyre!("Invalid country API URL {}: {}", raw, e))
}

#[cfg(test)]
mod tests {
  use super::*;
  use wiremock::matchers::{method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn client_for(server: &MockServer) -> CountryApiClient {
    CountryApiClient::new(&UpstreamConfig {
      base_url: server.uri(),
    })
    .unwrap()
  }

  #[test]
  fn test_base_url_gets_trailing_slash() {
    let url = parse_base_url("https://restcountries.com/proxy").unwrap();
    assert_eq!(
      url.join(ALL_COUNTRIES_PATH).unwrap().as_str(),
      "https://restcountries.com/proxy/v3.1/all"
    );
    assert!(parse_base_url("not a url").is_err());
  }

  #[tokio::test]
  async fn test_get_all_countries_parses_array() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v3.1/all"))
      .respond_with(ResponseTemplate::new(200).set_body_raw(
        r#"[{"name":{"common":"Iceland"},"cca2":"IS","cca3":"ISL","region":"Europe","population":366425}]"#,
        "application/json",
      ))
      .expect(1)
      .mount(&server)
      .await;

    let countries = client_for(&server).get_all_countries().await.unwrap();
    assert_eq!(countries.len(), 1);
    assert_eq!(countries[0].name.common, "Iceland");
  }

  #[tokio::test]
  async fn test_non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v3.1/all"))
      .respond_with(ResponseTemplate::new(503))
      .mount(&server)
      .await;

    assert!(client_for(&server).get_all_countries().await.is_err());
  }

  #[tokio::test]
  async fn test_malformed_body_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/v3.1/all"))
      .respond_with(ResponseTemplate::new(200).set_body_string("{\"message\":\"oops\"}"))
      .mount(&server)
      .await;

    assert!(client_for(&server).get_all_countries().await.is_err());
  }
}
