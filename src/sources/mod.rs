//! Remote fetching and the property-source data model.

mod fetcher;
#[cfg(feature = "http")]
mod http;
mod property_source;

pub use fetcher::{FetchTarget, SourceFetcher};
#[cfg(feature = "http")]
pub use http::{HttpAuth, HttpFetcher, HttpFetcherBuilder};
pub use property_source::{EnvironmentDocument, PropertySource, SourceList};
