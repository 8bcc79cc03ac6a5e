//! Page slicing and navigation links for list-shaped responses.

use serde::Serialize;
use thiserror::Error;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Page or limit was missing a positive integer value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid pagination parameters. Page and limit must be positive numbers.")]
pub struct InvalidPagination;

/// A validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page: u64,
  pub limit: u64,
}

impl PageRequest {
  pub fn new(page: u64, limit: u64) -> Result<Self, InvalidPagination> {
    if page < 1 || limit < 1 {
      return Err(InvalidPagination);
    }
    Ok(Self { page, limit })
  }

  /// Parse raw query values. Missing or empty values take the defaults.
  pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self, InvalidPagination> {
    let page = parse_positive(page, DEFAULT_PAGE)?;
    let limit = parse_positive(limit, DEFAULT_LIMIT)?;
    Self::new(page, limit)
  }

  /// Number of items before this page.
  pub fn skip(&self) -> u64 {
    (self.page - 1).saturating_mul(self.limit)
  }

  /// True when the page starts at or after the last item.
  pub fn is_past_end(&self, total_items: u64) -> bool {
    self.skip() >= total_items
  }
}

impl Default for PageRequest {
  fn default() -> Self {
    Self {
      page: DEFAULT_PAGE,
      limit: DEFAULT_LIMIT,
    }
  }
}

fn parse_positive(raw: Option<&str>, default: u64) -> Result<u64, InvalidPagination> {
  match raw.map(str::trim).filter(|s| !s.is_empty()) {
    None => Ok(default),
    Some(s) => s
      .parse::<u64>()
      .ok()
      .filter(|&n| n >= 1)
      .ok_or(InvalidPagination),
  }
}

/// `ceil(total_items / limit)`; zero items means zero pages.
pub fn total_pages(total_items: u64, limit: u64) -> u64 {
  total_items.div_ceil(limit.max(1))
}

/// Builds page links from a base URL and the query parameters to carry.
///
/// Each link clones the parameters and overwrites `page` and `limit` in
/// place, appending them when they weren't there.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
  base_url: String,
  params: Vec<(String, String)>,
}

impl LinkBuilder {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      params: Vec::new(),
    }
  }

  /// Carry these query parameters into every link.
  pub fn with_params(mut self, params: Vec<(String, String)>) -> Self {
    self.params = params;
    self
  }

  pub fn href(&self, page: u64, limit: u64) -> String {
    let mut params = self.params.clone();
    set_param(&mut params, "page", page.to_string());
    set_param(&mut params, "limit", limit.to_string());

    let query = url::form_urlencoded::Serializer::new(String::new())
      .extend_pairs(params.iter())
      .finish();
    format!("{}?{}", self.base_url, query)
  }
}

/// Replace the first `key` and drop any repeats, or append it.
fn set_param(params: &mut Vec<(String, String)>, key: &str, value: String) {
  match params.iter().position(|(k, _)| k == key) {
    Some(index) => {
      params[index].1 = value;
      let mut seen = 0;
      params.retain(|(k, _)| {
        if k != key {
          return true;
        }
        seen += 1;
        seen == 1
      });
    }
    None => params.push((key.to_string(), value)),
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLinks {
  pub current: String,
  pub next: Option<String>,
  pub prev: Option<String>,
  pub first: String,
  pub last: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
  pub current_page: u64,
  pub total_pages: u64,
  pub total_items: u64,
  pub items_per_page: u64,
  pub has_next_page: bool,
  pub has_prev_page: bool,
  pub links: PageLinks,
}

impl PaginationMeta {
  pub fn new(request: PageRequest, total_items: u64, links: &LinkBuilder) -> Self {
    let PageRequest { page, limit } = request;
    let total_pages = total_pages(total_items, limit);
    let has_next_page = page < total_pages;
    let has_prev_page = page > 1;

    Self {
      current_page: page,
      total_pages,
      total_items,
      items_per_page: limit,
      has_next_page,
      has_prev_page,
      links: PageLinks {
        current: links.href(page, limit),
        next: has_next_page.then(|| links.href(page + 1, limit)),
        prev: has_prev_page.then(|| links.href(page - 1, limit)),
        first: links.href(1, limit),
        last: links.href(total_pages.max(1), limit),
      },
    }
  }
}

/// One page of items plus its metadata.
#[derive(Debug, Clone)]
pub struct Page<T> {
  pub items: Vec<T>,
  pub meta: PaginationMeta,
}

impl<T> Page<T> {
  pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
    Page {
      items: self.items.into_iter().map(f).collect(),
      meta: self.meta,
    }
  }
}

/// Slice `items` down to the requested page.
///
/// A page past the end is simply empty; callers that treat that as an error
/// check [`PageRequest::is_past_end`] or the total page count first.
pub fn paginate<T>(items: Vec<T>, request: PageRequest, links: &LinkBuilder) -> Page<T> {
  let total_items = items.len() as u64;
  let meta = PaginationMeta::new(request, total_items, links);

  let skip = usize::try_from(request.skip()).unwrap_or(usize::MAX);
  let limit = usize::try_from(request.limit).unwrap_or(usize::MAX);
  let items = items.into_iter().skip(skip).take(limit).collect();

  Page { items, meta }
}
