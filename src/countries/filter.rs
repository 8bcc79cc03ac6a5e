//! Search predicates over raw country records.

use regex::Regex;
use std::sync::LazyLock;

use super::api_types::RawCountryRecord;

/// `<sign><1-2 digit hours>[:]<optional 2 digit minutes>`
static OFFSET_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^([+-])([0-9]{1,2}):?([0-9]{2})?$").expect("valid offset regex"));

/// Criteria accepted by the search endpoint.
///
/// Every present criterion must match; absent ones match everything. An
/// empty string counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
  pub name: Option<String>,
  pub region: Option<String>,
  pub capital: Option<String>,
  pub timezone: Option<String>,
}

impl SearchCriteria {
  pub fn new(
    name: Option<String>,
    region: Option<String>,
    capital: Option<String>,
    timezone: Option<String>,
  ) -> Self {
    let present = |v: Option<String>| v.filter(|s| !s.is_empty());
    Self {
      name: present(name),
      region: present(region),
      capital: present(capital),
      timezone: present(timezone),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.region.is_none() && self.capital.is_none() && self.timezone.is_none()
  }

  /// Prepare the criteria for repeated matching.
  fn compile(&self) -> CompiledCriteria {
    CompiledCriteria {
      name: self.name.as_deref().map(str::to_lowercase),
      region: self.region.as_deref().map(str::to_lowercase),
      capital: self.capital.as_deref().map(str::to_lowercase),
      timezone: self.timezone.as_deref().map(normalize_timezone),
    }
  }
}

/// Criteria with the query side already lowercased/normalized.
struct CompiledCriteria {
  name: Option<String>,
  region: Option<String>,
  capital: Option<String>,
  timezone: Option<String>,
}

impl CompiledCriteria {
  fn matches(&self, record: &RawCountryRecord) -> bool {
    let name_matches = self
      .name
      .as_ref()
      .map_or(true, |name| record.name.common.to_lowercase().contains(name.as_str()));

    let region_matches = self
      .region
      .as_ref()
      .map_or(true, |region| record.region.to_lowercase() == *region);

    let capital_matches = self.capital.as_ref().map_or(true, |capital| {
      record
        .capital
        .iter()
        .flatten()
        .any(|c| c.to_lowercase() == *capital)
    });

    let timezone_matches = self.timezone.as_ref().map_or(true, |timezone| {
      record
        .timezones
        .iter()
        .flatten()
        .any(|tz| normalize_timezone(tz) == *timezone)
    });

    name_matches && region_matches && capital_matches && timezone_matches
  }
}

/// Check a single record against the criteria.
pub fn matches(record: &RawCountryRecord, criteria: &SearchCriteria) -> bool {
  criteria.compile().matches(record)
}

/// Keep the records that satisfy the criteria, in their original order.
pub fn search<'a>(
  records: &'a [RawCountryRecord],
  criteria: &SearchCriteria,
) -> Vec<&'a RawCountryRecord> {
  let compiled = criteria.compile();
  records.iter().filter(|r| compiled.matches(r)).collect()
}

/// Keep the records in `region`, compared case-insensitively.
pub fn filter_by_region<'a>(records: &'a [RawCountryRecord], region: &str) -> Vec<&'a RawCountryRecord> {
  records.iter().filter(|r| r.in_region(region)).collect()
}

/// First record whose 2-letter or 3-letter code is `code`.
pub fn find_by_code<'a>(records: &'a [RawCountryRecord], code: &str) -> Option<&'a RawCountryRecord> {
  records.iter().find(|r| r.has_code(code))
}

/// Bring a UTC offset into the canonical `UTC±HH:MM` form.
///
/// `"+5"`, `"5"`, `"utc+5"` and `"UTC+05:00"` all normalize to
/// `"UTC+05:00"`. Input that doesn't look like an offset comes back
/// uppercased and `UTC`-prefixed but otherwise untouched, so comparisons
/// still work by plain equality.
pub fn normalize_timezone(tz: &str) -> String {
  let mut tz = tz.trim().to_uppercase();
  if !tz.starts_with("UTC") {
    tz.insert_str(0, "UTC");
  }

  let offset = &tz["UTC".len()..];
  let offset = if offset.starts_with('+') || offset.starts_with('-') {
    offset.to_string()
  } else {
    format!("+{offset}")
  };

  match OFFSET_PATTERN.captures(&offset) {
    Some(caps) => {
      let sign = &caps[1];
      let hours = &caps[2];
      let minutes = caps.get(3).map_or("00", |m| m.as_str());
      format!("UTC{sign}{hours:0>2}:{minutes}")
    }
    None => tz,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::countries::api_types::RawName;

  fn country(name: &str, region: &str, capital: &[&str], timezones: &[&str]) -> RawCountryRecord {
    RawCountryRecord {
      name: RawName {
        common: name.into(),
        ..Default::default()
      },
      region: region.into(),
      capital: Some(capital.iter().map(|s| s.to_string()).collect()),
      timezones: Some(timezones.iter().map(|s| s.to_string()).collect()),
      ..Default::default()
    }
  }

  fn criteria(name: &str, region: &str, capital: &str, timezone: &str) -> SearchCriteria {
    let opt = |s: &str| Some(s.to_string());
    SearchCriteria::new(opt(name), opt(region), opt(capital), opt(timezone))
  }

  #[test]
  fn test_normalize_timezone_equivalences() {
    assert_eq!(normalize_timezone("+5"), "UTC+05:00");
    assert_eq!(normalize_timezone("UTC+05:30"), "UTC+05:30");
    assert_eq!(normalize_timezone("-3"), "UTC-03:00");
    assert_eq!(normalize_timezone("+5:30"), "UTC+05:30");
    assert_eq!(normalize_timezone(" utc+0530 "), "UTC+05:30");
    assert_eq!(normalize_timezone("5"), "UTC+05:00");
    assert_eq!(normalize_timezone("UTC-12:00"), "UTC-12:00");
  }

  #[test]
  fn test_normalize_timezone_falls_back_unparsed() {
    assert_eq!(normalize_timezone("UTC"), "UTC");
    assert_eq!(normalize_timezone("europe/paris"), "UTCEUROPE/PARIS");
    assert_eq!(normalize_timezone("+5:3"), "UTC+5:3");
    // The hour group backtracks to one digit here, same as any offset regex would
    assert_eq!(normalize_timezone("+123"), "UTC+01:23");
  }

  #[test]
  fn test_normalize_timezone_only_accepts_ascii_digits() {
    // Arabic-Indic five
    assert_eq!(normalize_timezone("+\u{0665}"), "UTC+\u{0665}");
    assert_eq!(normalize_timezone("UTC+\u{0665}:30"), "UTC+\u{0665}:30");
  }

  #[test]
  fn test_normalize_timezone_is_idempotent() {
    for input in ["+5", "-3", "UTC+05:30", "utc", "0", "+5:3", "garbage", "-11:45", ""] {
      let once = normalize_timezone(input);
      assert_eq!(normalize_timezone(&once), once, "input {input:?}");
    }
  }

  #[test]
  fn test_empty_criteria_match_everything() {
    let record = country("Chile", "Americas", &["Santiago"], &["UTC-06:00"]);
    let empty = SearchCriteria::new(Some(String::new()), None, None, None);
    assert!(empty.is_empty());
    assert!(matches(&record, &empty));
  }

  #[test]
  fn test_name_is_case_insensitive_substring() {
    let record = country("United Kingdom", "Europe", &["London"], &["UTC"]);
    assert!(matches(&record, &criteria("kingdom", "", "", "")));
    assert!(matches(&record, &criteria("UNITED", "", "", "")));
    assert!(!matches(&record, &criteria("states", "", "", "")));
  }

  #[test]
  fn test_region_and_capital_are_case_insensitive_exact() {
    let record = country("South Africa", "Africa", &["Pretoria", "Bloemfontein", "Cape Town"], &["UTC+02:00"]);
    assert!(matches(&record, &criteria("", "africa", "", "")));
    assert!(!matches(&record, &criteria("", "afr", "", "")));
    assert!(matches(&record, &criteria("", "", "cape town", "")));
    assert!(!matches(&record, &criteria("", "", "cape", "")));
  }

  #[test]
  fn test_timezone_compares_normalized_forms() {
    let record = country("India", "Asia", &["New Delhi"], &["UTC+05:30"]);
    assert!(matches(&record, &criteria("", "", "", "+5:30")));
    assert!(matches(&record, &criteria("", "", "", "utc+0530")));
    assert!(!matches(&record, &criteria("", "", "", "+5")));
  }

  #[test]
  fn test_all_criteria_must_match() {
    let record = country("France", "Europe", &["Paris"], &["UTC+01:00"]);
    assert!(matches(&record, &criteria("fra", "europe", "paris", "+1")));
    assert!(!matches(&record, &criteria("fra", "asia", "paris", "+1")));
  }

  #[test]
  fn test_absent_capital_never_matches_capital_query() {
    let record = RawCountryRecord {
      region: "Antarctic".into(),
      ..Default::default()
    };
    assert!(!matches(&record, &criteria("", "", "anything", "")));
    assert!(matches(&record, &criteria("", "antarctic", "", "")));
  }

  #[test]
  fn test_lookup_helpers() {
    let records = vec![
      country("Peru", "Americas", &["Lima"], &["UTC-05:00"]),
      country("Spain", "Europe", &["Madrid"], &["UTC", "UTC+01:00"]),
    ];
    assert_eq!(filter_by_region(&records, "EUROPE").len(), 1);
    assert!(filter_by_region(&records, "Nonexistentia").is_empty());
    assert_eq!(search(&records, &criteria("", "", "", "+1")).len(), 1);
  }
}
