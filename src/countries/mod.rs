pub mod api_types;
pub mod cached_client;
pub mod client;
pub mod filter;
pub mod types;

pub use api_types::RawCountryRecord;
pub use cached_client::{CachedCountryClient, COUNTRY_DATA_KEY};
pub use client::CountryApiClient;
pub use filter::{normalize_timezone, SearchCriteria};
pub use types::{project, project_one, Currency, ProjectedCountry};
