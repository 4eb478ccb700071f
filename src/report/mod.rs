//! Update impact analysis
//!
//! [`UpdateImpactChecker::check`] runs the whole pipeline for a pair of versions:
//! normalize both bounds, fetch the release index of the installed major version, select
//! the releases in between, fetch their content and keep the ones that contain breaking
//! changes or security fixes.

pub mod format;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::changelog::ChangelogParser;
use crate::config::Config;
use crate::error::InputError;
use crate::release::{
    HttpReleaseApi, ReleaseApi, ReleaseContent, ReleaseContentFetcher, ReleaseIndexFetcher,
};
use crate::security::SecurityBulletinFetcher;
use crate::version::range::{filter_range, find_target_version};
use crate::version::{CoreVersion, normalize};

/// A release that contains breaking changes or security fixes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportantRelease {
    pub version: CoreVersion,
    pub content: ReleaseContent,
}

/// Result of analyzing the releases between two versions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The release index could not be retrieved
    IndexUnavailable { message: String },
    /// No release lies between the two versions
    NoIntermediateVersions,
    /// None of the intermediate releases could be retrieved
    NoReleaseInformation { requested: Vec<CoreVersion> },
    /// At least one intermediate release was retrieved
    Analyzed {
        /// Important releases in ascending version order
        important: Vec<ImportantRelease>,
        /// Requested releases that could not be retrieved, in index order
        missing: Vec<CoreVersion>,
        /// Number of releases whose content was retrieved
        analyzed: usize,
    },
}

/// Go/no-go signal handed back to the caller of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub from: CoreVersion,
    pub to: CoreVersion,
    pub outcome: ReportOutcome,
}

impl Report {
    pub fn has_important_changes(&self) -> bool {
        matches!(&self.outcome, ReportOutcome::Analyzed { important, .. } if !important.is_empty())
    }

    /// Decides whether the update may go ahead.
    ///
    /// `confirm` is only consulted when the session is interactive and important changes
    /// were found. Every other case proceeds.
    pub fn decide(&self, interactive: bool, confirm: impl FnOnce() -> bool) -> Decision {
        if !interactive || !self.has_important_changes() {
            return Decision::Proceed;
        }

        if confirm() {
            Decision::Proceed
        } else {
            Decision::Abort
        }
    }
}

/// Tracks whether a check has already run to completion in this session
#[derive(Debug, Default)]
pub struct CheckGate {
    completed: bool,
}

impl CheckGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

/// Runs the update impact analysis
pub struct UpdateImpactChecker {
    index: ReleaseIndexFetcher,
    contents: ReleaseContentFetcher,
}

impl UpdateImpactChecker {
    pub fn new(index: ReleaseIndexFetcher, contents: ReleaseContentFetcher) -> Self {
        Self { index, contents }
    }

    /// Wires the HTTP-backed fetchers described by `config` around an optional cache
    pub fn from_config(config: &Config, cache: Option<Arc<dyn CacheStore>>) -> Self {
        let timeout = Duration::from_secs(config.api.timeout_secs);
        let api: Arc<dyn ReleaseApi> = Arc::new(HttpReleaseApi::new(&config.api.base_url, timeout));

        let bulletins = Arc::new(SecurityBulletinFetcher::new(timeout, cache.clone()));
        let parser = Arc::new(ChangelogParser::with_severity_fetcher(bulletins));

        Self::new(
            ReleaseIndexFetcher::new(api.clone(), cache.clone()),
            ReleaseContentFetcher::new(api, cache, parser)
                .with_max_concurrent(config.fetch.max_concurrent),
        )
    }

    /// Analyzes the releases after `from` up to and including `to`.
    ///
    /// Invalid or non-increasing bounds are rejected before any request is made. Fetch
    /// failures never surface as errors; they are reflected in the [`ReportOutcome`].
    pub async fn check(&self, from: &str, to: &str) -> Result<Report, InputError> {
        let from_version =
            normalize(from).ok_or_else(|| InputError::InvalidVersion(from.to_string()))?;
        let to_version = normalize(to).ok_or_else(|| InputError::InvalidVersion(to.to_string()))?;

        if to_version <= from_version {
            return Err(InputError::NotIncreasing {
                from: from_version.to_string(),
                to: to_version.to_string(),
            });
        }

        let outcome = self.analyze(&from_version, &to_version).await;

        Ok(Report {
            from: from_version,
            to: to_version,
            outcome,
        })
    }

    /// Checks an update proposed by a dependency resolver.
    ///
    /// The target is the highest candidate above `installed`. Returns `None` when the
    /// installed version is unusable or no candidate is newer.
    pub async fn plan_impact_report<S: AsRef<str>>(
        &self,
        installed: &str,
        candidates: &[S],
    ) -> Option<Report> {
        let Some(current) = normalize(installed) else {
            debug!("Installed version {} is not a release version", installed);
            return None;
        };

        let target = find_target_version(candidates, &current)?;

        self.check(&current.to_string(), &target.to_string())
            .await
            .inspect_err(|e| warn!("Skipping update check: {}", e))
            .ok()
    }

    /// Like [`plan_impact_report`](Self::plan_impact_report), but runs at most one
    /// completed check per gate.
    ///
    /// The gate only closes once a report has been produced, so an event that proposes
    /// no update leaves it open for the next one.
    pub async fn plan_once<S: AsRef<str>>(
        &self,
        gate: &mut CheckGate,
        installed: &str,
        candidates: &[S],
    ) -> Option<Report> {
        if gate.completed {
            return None;
        }

        let report = self.plan_impact_report(installed, candidates).await?;
        gate.completed = true;
        Some(report)
    }

    async fn analyze(&self, from: &CoreVersion, to: &CoreVersion) -> ReportOutcome {
        let releases = match self.index.get_releases(from.major()).await {
            Ok(releases) => releases,
            Err(e) => {
                return ReportOutcome::IndexUnavailable {
                    message: e.to_string(),
                };
            }
        };

        let available: Vec<CoreVersion> = releases
            .iter()
            .filter_map(|r| normalize(&r.version))
            .collect();
        let requested = filter_range(&available, from, to);

        if requested.is_empty() {
            return ReportOutcome::NoIntermediateVersions;
        }

        info!("Checking {} releases between {} and {}", requested.len(), from, to);

        let mut contents = self.contents.get_contents(&requested).await;

        if contents.is_empty() {
            return ReportOutcome::NoReleaseInformation { requested };
        }

        let analyzed = contents.len();
        let mut missing = Vec::new();
        let mut important = Vec::new();

        for version in requested {
            match contents.remove(&version) {
                Some(content) if content.is_important() => {
                    important.push(ImportantRelease { version, content })
                }
                Some(_) => {}
                None => missing.push(version),
            }
        }

        important.sort_by(|a, b| a.version.cmp(&b.version));

        ReportOutcome::Analyzed {
            important,
            missing,
            analyzed,
        }
    }
}
