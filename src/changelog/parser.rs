//! Parser for release API responses and their changelog text

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::changelog::change::{BREAKING_TAG, Change, ChangeKind};
use crate::release::types::ReleaseContent;
use crate::security::{SeverityCounts, SeverityFetcher};

/// A changelog bullet: `* <date> <commit> [TAG][SUBTAG] text (attribution)`.
///
/// The text runs up to the last opening parenthesis on the line.
static CHANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\*\s+[\w-]+\s+\w+\s+\[([A-Z!]+)\](?:\[([A-Z]+)\])?\s*(.+)\(")
        .expect("valid change pattern")
});

static ADVISORY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https://typo3\.org/security/advisory/\S+").expect("valid advisory pattern")
});

/// Converts release content responses into [`ReleaseContent`].
///
/// When a [`SeverityFetcher`] is configured, the severities of every advisory linked from
/// the release announcement are attached to the result.
#[derive(Default)]
pub struct ChangelogParser {
    severity_fetcher: Option<Arc<dyn SeverityFetcher>>,
}

impl ChangelogParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_severity_fetcher(severity_fetcher: Arc<dyn SeverityFetcher>) -> Self {
        Self {
            severity_fetcher: Some(severity_fetcher),
        }
    }

    /// Parses a response of the release content endpoint.
    ///
    /// Expected shape:
    /// ```json
    /// {
    ///   "version": "12.4.31",
    ///   "release_notes": {
    ///     "version": "12.4.31",
    ///     "changes": "* 2025-05-20 812e327a748 [SECURITY] ... (thanks to ...)",
    ///     "news_link": "https://typo3.org/article/...",
    ///     "news": "..."
    ///   }
    /// }
    /// ```
    /// Missing fields yield empty values; the version falls back to `"unknown"`.
    pub async fn parse(&self, response: &Value) -> ReleaseContent {
        let notes = response.get("release_notes");

        let version = response
            .get("version")
            .and_then(Value::as_str)
            .or_else(|| note_field(notes, "version"))
            .unwrap_or("unknown")
            .to_string();

        let changes = note_field(notes, "changes")
            .map(extract_changes)
            .unwrap_or_default();

        let news_link = note_field(notes, "news_link").map(str::to_string);
        let news = note_field(notes, "news").map(str::to_string);

        let security_severities = self.fetch_severities(news.as_deref()).await;

        ReleaseContent {
            version,
            changes,
            news_link,
            news,
            security_severities,
        }
    }

    async fn fetch_severities(&self, news: Option<&str>) -> SeverityCounts {
        let (Some(fetcher), Some(news)) = (&self.severity_fetcher, news) else {
            return SeverityCounts::new();
        };

        let links = extract_advisory_links(news);
        if links.is_empty() {
            return SeverityCounts::new();
        }

        debug!("Fetching severities for {} advisories", links.len());
        fetcher.fetch_severities(&links).await
    }
}

fn note_field<'a>(notes: Option<&'a Value>, field: &str) -> Option<&'a str> {
    notes.and_then(|n| n.get(field)).and_then(Value::as_str)
}

/// Extracts classified changes from changelog text, in order of appearance.
///
/// Lines without a bracketed tag, a title or a trailing attribution are skipped.
pub fn extract_changes(text: &str) -> Vec<Change> {
    text.lines()
        .filter_map(|line| {
            let caps = CHANGE_PATTERN.captures(line)?;
            let tag = &caps[1];
            let sub_tag = caps.get(2).map(|m| m.as_str());
            let text = caps[3].trim();

            if text.is_empty() {
                return None;
            }

            let kind = ChangeKind::from_tag(tag);
            let title = match (tag, sub_tag) {
                (BREAKING_TAG, Some(sub_tag)) => format!("[{BREAKING_TAG}][{sub_tag}] {text}"),
                _ => format!("[{tag}] {text}"),
            };

            Some(Change::new(kind, title))
        })
        .collect()
}

/// Extracts security advisory links in first-seen order. Duplicates are kept.
pub fn extract_advisory_links(news: &str) -> Vec<String> {
    ADVISORY_PATTERN
        .find_iter(news)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::MockSeverityFetcher;
    use rstest::rstest;
    use serde_json::json;

    const CHANGES: &str = "Here is a list of what was fixed since 12.0.0:\n\n \
* 2025-05-20 812e327a748 [RELEASE] Release of TYPO3 12.0.0 (thanks to Alice Wonderland)\n \
* 2025-05-20 d3fe7991704 [!!!][TASK] Remove context sensitive help (thanks to Mad Hatter)\n \
* 2025-05-20 befb73ea328 [!!!][FEATURE] Add PSR-14 events for flex form parsing (thanks to Cheshire Cat)\n \
* 2025-05-20 0bb3acf2ef4 [!!!][TASK] Remove global jquery object window.$ (thanks to White Rabbit)\n \
* 2025-05-19 ff01ed2cfef [SECURITY] Disallow changing system maintainer details (thanks to Queen of Hearts)\n \
* 2025-05-19 6ef27d7d9e4 [SECURITY] Prevent MFA bypass for backend login (thanks to March Hare)\n \
* 2025-05-19 4179ae4929a [SECURITY] Enforce file extension and MIME-type consistency (thanks to Dormouse)\n \
* 2025-05-19 8ca71b977c9 [BUGFIX] Allow zero and blank string as valid type values (thanks to Caterpillar)\n \
* 2025-05-16 b16c0248470 [TASK] Use DI for LoadTcaService in UpgradeController (thanks to Tweedledum)\n \
* 2025-05-16 51971fe0061 [BUGFIX] Set up TCA in install tool's ext_tables.php tester (thanks to Tweedledee)\n \
* 2025-05-16 efeb7b6156f [BUGFIX] Fix returning records to previous stage in workspaces (thanks to Mock Turtle)\n \
* 2025-05-16 416ebedfc29 [BUGFIX] Avoid \"-\" as first char of filename in mail spooler (thanks to Gryphon)";

    const ADVISORY_1: &str = "https://typo3.org/security/advisory/typo3-core-sa-2025-001";
    const ADVISORY_2: &str = "https://typo3.org/security/advisory/typo3-core-sa-2025-002";

    #[test]
    fn extract_changes_classifies_every_tagged_line_in_order() {
        let changes = extract_changes(CHANGES);

        assert_eq!(changes.len(), 12);
        assert_eq!(
            changes[0],
            Change::Regular {
                title: "[RELEASE] Release of TYPO3 12.0.0".to_string()
            }
        );
        assert_eq!(
            changes[1],
            Change::Breaking {
                title: "[!!!][TASK] Remove context sensitive help".to_string()
            }
        );
        assert_eq!(
            changes[4],
            Change::Security {
                title: "[SECURITY] Disallow changing system maintainer details".to_string()
            }
        );
        assert_eq!(
            changes[11].title(),
            "[BUGFIX] Avoid \"-\" as first char of filename in mail spooler"
        );

        let kinds: Vec<_> = changes.iter().map(Change::kind).collect();
        assert_eq!(
            kinds.iter().filter(|k| **k == ChangeKind::Breaking).count(),
            3
        );
        assert_eq!(
            kinds.iter().filter(|k| **k == ChangeKind::Security).count(),
            3
        );
    }

    #[rstest]
    #[case("* 2025-05-20 abc123 [!!!][TASK] Drop API (thanks to A)", Some(Change::Breaking { title: "[!!!][TASK] Drop API".to_string() }))]
    #[case("* 2025-05-20 abc123 [!!!] Drop API (thanks to A)", Some(Change::Breaking { title: "[!!!] Drop API".to_string() }))]
    #[case("* 2025-05-20 abc123 [SECURITY] Fix XSS (thanks to A)", Some(Change::Security { title: "[SECURITY] Fix XSS".to_string() }))]
    #[case("* 2025-05-20 abc123 [FEATURE] Add thing (thanks to A)", Some(Change::Regular { title: "[FEATURE] Add thing".to_string() }))]
    #[case("* 2025-05-20 abc123 [BUGFIX] Handle foo() calls (thanks to A)", Some(Change::Regular { title: "[BUGFIX] Handle foo() calls".to_string() }))]
    #[case("* 2025-05-20 abc123 Release without tag (thanks to A)", None)]
    #[case("* 2024-09-10 812e327a748 [RELEASE] Release of TYPO3 12.4.20", None)]
    #[case("* 2025-05-20 [SECURITY] Fix XSS vulnerability (thanks to John)", None)]
    #[case("Here is a list of what was fixed since 12.0.0:", None)]
    #[case("* 2025-05-20 abc123 [!!!][TASK] (thanks to A)", None)]
    #[case("* 2025-05-20 abc123 [SECURITY]   (thanks to A)", None)]
    fn extract_changes_handles_single_line(#[case] line: &str, #[case] expected: Option<Change>) {
        assert_eq!(extract_changes(line).into_iter().next(), expected);
    }

    #[test]
    fn extract_changes_keeps_security_before_breaking_order() {
        let text = "* 2025-05-19 ff01ed2cfef [SECURITY] First (thanks to A)\n\
                    * 2025-05-20 d3fe7991704 [!!!][TASK] Second (thanks to B)";

        let kinds: Vec<_> = extract_changes(text).iter().map(Change::kind).collect();

        assert_eq!(kinds, vec![ChangeKind::Security, ChangeKind::Breaking]);
    }

    #[test]
    fn extract_changes_returns_empty_for_empty_text() {
        assert!(extract_changes("").is_empty());
    }

    #[test]
    fn extract_advisory_links_keeps_order_and_duplicates() {
        let news = format!(
            "Security bulletins:\n{ADVISORY_2}\nsee also {ADVISORY_1} and again {ADVISORY_2}\nhttps://typo3.org/article/other"
        );

        assert_eq!(
            extract_advisory_links(&news),
            vec![ADVISORY_2, ADVISORY_1, ADVISORY_2]
        );
    }

    #[tokio::test]
    async fn parse_extracts_version_news_and_changes() {
        let parser = ChangelogParser::new();

        let content = parser
            .parse(&json!({
                "version": "12.0.0",
                "release_notes": {
                    "version": "12.0.0",
                    "news_link": "https://typo3.org/article/typo3-v12-release",
                    "news": "TYPO3 v12.0 is here!",
                    "changes": CHANGES
                }
            }))
            .await;

        assert_eq!(content.version, "12.0.0");
        assert_eq!(
            content.news_link.as_deref(),
            Some("https://typo3.org/article/typo3-v12-release")
        );
        assert_eq!(content.news.as_deref(), Some("TYPO3 v12.0 is here!"));
        assert_eq!(content.changes.len(), 12);
        assert!(content.security_severities.is_empty());
    }

    #[rstest]
    #[case(json!({"release_notes": {"version": "12.4.2", "changes": ""}}), "12.4.2")]
    #[case(json!({"version": "12.4.3", "release_notes": {"version": "12.4.2"}}), "12.4.3")]
    #[case(json!({}), "unknown")]
    #[tokio::test]
    async fn parse_resolves_version(#[case] response: Value, #[case] expected: &str) {
        let content = ChangelogParser::new().parse(&response).await;

        assert_eq!(content.version, expected);
        assert!(content.changes.is_empty());
        assert_eq!(content.news_link, None);
    }

    #[tokio::test]
    async fn parse_fetches_severities_for_advisory_links() {
        let mut fetcher = MockSeverityFetcher::new();
        fetcher
            .expect_fetch_severities()
            .withf(|urls| urls == [ADVISORY_1.to_string(), ADVISORY_2.to_string()])
            .times(1)
            .returning(|_| SeverityCounts::from([("High".to_string(), 1), ("Low".to_string(), 1)]));

        let parser = ChangelogParser::with_severity_fetcher(Arc::new(fetcher));

        let content = parser
            .parse(&json!({
                "version": "12.4.31",
                "release_notes": {
                    "version": "12.4.31",
                    "changes": "* 2025-05-20 812e327a748 [SECURITY] Fix XSS vulnerability (thanks to John)",
                    "news": format!("Security bulletins:\n{ADVISORY_1}\n{ADVISORY_2}")
                }
            }))
            .await;

        assert_eq!(
            content.security_severities,
            SeverityCounts::from([("High".to_string(), 1), ("Low".to_string(), 1)])
        );
        assert_eq!(content.security_updates().len(), 1);
    }

    #[tokio::test]
    async fn parse_skips_severity_fetch_without_advisory_links() {
        let mut fetcher = MockSeverityFetcher::new();
        fetcher.expect_fetch_severities().times(0);

        let parser = ChangelogParser::with_severity_fetcher(Arc::new(fetcher));

        let content = parser
            .parse(&json!({
                "version": "12.4.20",
                "release_notes": {"news": "TYPO3 v12.4.20 is here!"}
            }))
            .await;

        assert!(content.security_severities.is_empty());
    }
}
