//! Serde types matching REST Countries API responses.
//!
//! These types are separate from the projected output types so the cached
//! dataset keeps the upstream shape. Fields the proxy never reads are kept in
//! `extra` catch-alls, so a record re-serializes to the same document it was
//! parsed from.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Nested field types
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawName {
  #[serde(default)]
  pub common: String,
  // official, nativeName, ...
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFlags {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub svg: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub png: Option<String>,
  // alt text
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCurrency {
  #[serde(default)]
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub symbol: Option<String>,
}

// ============================================================================
// Country record - one element of the `v3.1/all` array
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCountryRecord {
  #[serde(default)]
  pub name: RawName,
  #[serde(default)]
  pub population: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub flags: Option<RawFlags>,
  #[serde(default)]
  pub region: String,
  /// Language code to language name, in upstream order
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub languages: Option<IndexMap<String, String>>,
  #[serde(default)]
  pub cca2: String,
  #[serde(default)]
  pub cca3: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub capital: Option<Vec<String>>,
  /// Currency code to currency, in upstream order
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub currencies: Option<IndexMap<String, RawCurrency>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub timezones: Option<Vec<String>>,
  // Catch-all for everything else (tld, latlng, borders, ...)
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl RawCountryRecord {
  /// True when `code` equals the 2-letter or 3-letter code, ignoring case.
  pub fn has_code(&self, code: &str) -> bool {
    (!self.cca2.is_empty() && self.cca2.eq_ignore_ascii_case(code))
      || (!self.cca3.is_empty() && self.cca3.eq_ignore_ascii_case(code))
  }

  /// True when the region equals `region`, ignoring case.
  pub fn in_region(&self, region: &str) -> bool {
    self.region.to_lowercase() == region.to_lowercase()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const FINLAND: &str = r#"{
    "name": {"common": "Finland", "official": "Republic of Finland"},
    "tld": [".fi"],
    "cca2": "FI",
    "cca3": "FIN",
    "currencies": {"EUR": {"name": "Euro", "symbol": "€"}},
    "capital": ["Helsinki"],
    "region": "Europe",
    "languages": {"fin": "Finnish", "swe": "Swedish"},
    "population": 5530719,
    "timezones": ["UTC+02:00"],
    "flags": {"png": "https://flagcdn.com/w320/fi.png", "svg": "https://flagcdn.com/fi.svg", "alt": "Blue cross"}
  }"#;

  #[test]
  fn test_parses_used_fields() {
    let record: RawCountryRecord = serde_json::from_str(FINLAND).unwrap();
    assert_eq!(record.name.common, "Finland");
    assert_eq!(record.population, 5_530_719);
    assert_eq!(record.cca2, "FI");
    assert_eq!(record.capital.as_deref(), Some(&["Helsinki".to_string()][..]));
    let languages: Vec<_> = record.languages.unwrap().into_keys().collect();
    assert_eq!(languages, vec!["fin", "swe"]);
  }

  #[test]
  fn test_absent_optionals_stay_absent() {
    let record: RawCountryRecord =
      serde_json::from_str(r#"{"name": {"common": "Antarctica"}, "region": "Antarctic"}"#).unwrap();
    assert!(record.capital.is_none());
    assert!(record.timezones.is_none());
    assert!(record.flags.is_none());

    let value = serde_json::to_value(&record).unwrap();
    assert!(value.get("capital").is_none());
    assert!(value.get("timezones").is_none());
  }

  #[test]
  fn test_unknown_fields_survive_reserialization() {
    let record: RawCountryRecord = serde_json::from_str(FINLAND).unwrap();
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["tld"][0], ".fi");
    assert_eq!(value["name"]["official"], "Republic of Finland");
    assert_eq!(value["flags"]["alt"], "Blue cross");
  }

  #[test]
  fn test_has_code_matches_either_code_case_insensitively() {
    let record: RawCountryRecord = serde_json::from_str(FINLAND).unwrap();
    assert!(record.has_code("fi"));
    assert!(record.has_code("Fin"));
    assert!(!record.has_code("SE"));
    assert!(!RawCountryRecord::default().has_code(""));
  }
}
