//! Output shapes served to clients.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::api_types::RawCountryRecord;

/// Currency without its code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub symbol: Option<String>,
}

/// Normalized country served by every endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedCountry {
  pub name: String,
  pub population: u64,
  /// SVG flag if present, else PNG, else null
  pub flag: Option<String>,
  pub region: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub languages: Option<IndexMap<String, String>>,
  /// 2-letter code
  pub code: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub capital: Option<Vec<String>>,
  pub currencies: Vec<Currency>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timezones: Option<Vec<String>>,
}

impl From<&RawCountryRecord> for ProjectedCountry {
  fn from(record: &RawCountryRecord) -> Self {
    let flag = record.flags.as_ref().and_then(|flags| {
      [&flags.svg, &flags.png]
        .into_iter()
        .flatten()
        .find(|url| !url.is_empty())
        .cloned()
    });

    let currencies = record
      .currencies
      .as_ref()
      .map(|currencies| {
        currencies
          .values()
          .map(|c| Currency {
            name: c.name.clone(),
            symbol: c.symbol.clone(),
          })
          .collect()
      })
      .unwrap_or_default();

    ProjectedCountry {
      name: record.name.common.clone(),
      population: record.population,
      flag,
      region: record.region.clone(),
      languages: record.languages.clone(),
      code: record.cca2.clone(),
      capital: record.capital.clone(),
      currencies,
      timezones: record.timezones.clone(),
    }
  }
}

/// Project a collection of raw records, keeping their order.
pub fn project<'a>(records: impl IntoIterator<Item = &'a RawCountryRecord>) -> Vec<ProjectedCountry> {
  records.into_iter().map(ProjectedCountry::from).collect()
}

/// Project a single record. Clients always receive a sequence, even here.
pub fn project_one(record: &RawCountryRecord) -> Vec<ProjectedCountry> {
  vec![ProjectedCountry::from(record)]
}
