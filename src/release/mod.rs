//! Release data retrieval
//!
//! # Modules
//!
//! - [`api`]: HTTP access to the release API endpoints
//! - [`index`]: Cached list of releases per major version
//! - [`content`]: Cached, concurrently fetched release changelogs
//! - [`types`]: Release summaries and parsed release content

pub mod api;
pub mod content;
pub mod index;
pub mod types;

pub use api::{HttpReleaseApi, ReleaseApi};
pub use content::ReleaseContentFetcher;
pub use index::ReleaseIndexFetcher;
pub use types::{ReleaseContent, ReleaseSummary, ReleaseType};
