use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::changelog::change::{Change, ChangeKind};
use crate::changelog::parser::extract_advisory_links;
use crate::security::SeverityCounts;

/// Kind of release as reported by the release index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseType {
    Regular,
    Security,
    Development,
    #[serde(other)]
    Other,
}

/// Entry of the release index for a major version
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseSummary {
    pub version: String,
    #[serde(rename = "type")]
    pub release_type: ReleaseType,
    pub date: DateTime<FixedOffset>,
}

/// Parsed changelog and announcement of a single release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseContent {
    /// Version as reported by the API response
    pub version: String,
    /// Classified changes in changelog order
    pub changes: Vec<Change>,
    pub news_link: Option<String>,
    pub news: Option<String>,
    pub security_severities: SeverityCounts,
}

impl ReleaseContent {
    pub fn breaking_changes(&self) -> Vec<&Change> {
        self.changes_of_kind(ChangeKind::Breaking)
    }

    pub fn security_updates(&self) -> Vec<&Change> {
        self.changes_of_kind(ChangeKind::Security)
    }

    /// Advisory links mentioned in the release announcement
    pub fn security_advisories(&self) -> Vec<String> {
        self.news
            .as_deref()
            .map(extract_advisory_links)
            .unwrap_or_default()
    }

    /// A release is important when it contains a breaking change or a security fix
    pub fn is_important(&self) -> bool {
        self.changes
            .iter()
            .any(|c| matches!(c.kind(), ChangeKind::Breaking | ChangeKind::Security))
    }

    fn changes_of_kind(&self, kind: ChangeKind) -> Vec<&Change> {
        self.changes.iter().filter(|c| c.kind() == kind).collect()
    }
}
