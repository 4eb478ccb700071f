//! Security advisory severities
//!
//! # Modules
//!
//! - [`bulletin`]: Fetches advisory documents and extracts their severity rating

pub mod bulletin;

pub use bulletin::SecurityBulletinFetcher;

#[cfg(test)]
use mockall::automock;

use indexmap::IndexMap;

/// Number of advisories per severity label, in first-seen order
pub type SeverityCounts = IndexMap<String, usize>;

/// Severity labels shown to the user, highest first
pub const KNOWN_SEVERITIES: [&str; 4] = ["Critical", "High", "Medium", "Low"];

/// Trait for resolving the severities of a set of advisory links
#[cfg_attr(test, automock)]
#[async_trait::async_trait]
pub trait SeverityFetcher: Send + Sync {
    /// Counts the severity labels of the advisories behind `urls`.
    ///
    /// Advisories that cannot be fetched or carry no severity are left out.
    async fn fetch_severities(&self, urls: &[String]) -> SeverityCounts;
}
