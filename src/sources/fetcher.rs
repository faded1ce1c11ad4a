//! Fetcher trait and request coordinates.

use super::EnvironmentDocument;
use crate::error::Result;
use async_trait::async_trait;

/// Resolved coordinates of one configuration request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTarget {
    /// Application name (may itself be a comma-separated list).
    pub application: String,
    /// Active profiles, at least one.
    pub profiles: Vec<String>,
    /// Branch, tag or revision.
    pub label: String,
}

impl FetchTarget {
    /// Profiles joined with commas, as the server expects them.
    pub fn profiles_joined(&self) -> String {
        self.profiles.join(",")
    }

    /// The three path segments `application`, `profiles`, `label`.
    ///
    /// A `/` in the label is written as `(_)` so branch names like
    /// `feature/login` stay a single segment.
    pub fn path_segments(&self) -> [String; 3] {
        [
            self.application.clone(),
            self.profiles_joined(),
            self.label.replace('/', "(_)"),
        ]
    }
}

/// Trait for fetching the environment document from a configuration server.
///
/// Implement this trait to plug in a custom transport, or a canned document in tests.
/// Fetching is one-shot: implementations must not retry.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Fetch the property sources for `target`, highest priority first.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::RemoteFetch`](crate::error::ConfigError::RemoteFetch)
    /// on transport failure, non-success status or malformed body.
    async fn fetch(&self, target: &FetchTarget) -> Result<EnvironmentDocument>;

    /// Get a human-readable name for this fetcher (for logging/debugging).
    fn name(&self) -> String;
}
