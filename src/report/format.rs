//! Plain-text rendering of reports

use std::fmt::Write;

use crate::release::ReleaseContent;
use crate::report::{Report, ReportOutcome};
use crate::security::{KNOWN_SEVERITIES, SeverityCounts};

pub const ALL_CLEAR: &str = "✓ No breaking changes or security updates found.";

pub const CONFIRMATION_PROMPT: &str =
    "⚠️ Breaking changes or security updates were found. Do you want to continue with the update? [y/N] ";

/// Renders the full report, one block per important release followed by status lines
pub fn format_report(report: &Report) -> String {
    let mut output = format!(
        "TYPO3 core will be updated from {} to {}\n",
        report.from, report.to
    );

    match &report.outcome {
        ReportOutcome::IndexUnavailable { message } => {
            output.push_str(message);
            output.push('\n');
        }
        ReportOutcome::NoIntermediateVersions => {
            output.push_str("No intermediate versions found.\n");
        }
        ReportOutcome::NoReleaseInformation { .. } => {
            output.push_str("Failed to fetch release information for all versions.\n");
            output.push_str(
                "The TYPO3 API might be temporarily unavailable. Proceeding with update.\n",
            );
        }
        ReportOutcome::Analyzed {
            important, missing, ..
        } => {
            for release in important {
                output.push_str(&format_release(&release.content));
            }

            if important.is_empty() {
                output.push_str(ALL_CLEAR);
                output.push('\n');
            }

            if !missing.is_empty() {
                let versions: Vec<String> = missing.iter().map(ToString::to_string).collect();
                let _ = writeln!(
                    output,
                    "Note: Could not fetch information for versions: {}",
                    versions.join(", ")
                );
            }
        }
    }

    output
}

/// Renders the changes, advisories and announcement link of one release
pub fn format_release(content: &ReleaseContent) -> String {
    let mut output = format!("\nChanges in version {}:\n", content.version);

    let breaking = content.breaking_changes();
    if !breaking.is_empty() {
        output.push_str("Breaking changes found:\n");
        for change in breaking {
            let _ = writeln!(output, "  ⚠️ {}", change.title());
        }
    }

    let security = content.security_updates();
    if !security.is_empty() {
        output.push_str("Security updates found:\n");
        for change in security {
            let _ = writeln!(output, "  ⚡ {}", change.title());
        }
        if let Some(severities) = format_severities(&content.security_severities) {
            let _ = writeln!(output, "  Severity: {}", severities);
        }
    }

    let advisories = content.security_advisories();
    if !advisories.is_empty() {
        output.push_str("\nSecurity advisories:\n");
        for advisory in advisories {
            let _ = writeln!(output, "  - {}", advisory);
        }
    }

    if let Some(link) = &content.news_link {
        let _ = writeln!(output, "\nRelease announcement: {}", link);
    }

    output
}

/// Summarizes known severity labels in priority order, e.g. `Critical: 1, High: 2`.
///
/// Unknown labels and zero counts are left out; `None` when nothing remains.
pub fn format_severities(counts: &SeverityCounts) -> Option<String> {
    let parts: Vec<String> = KNOWN_SEVERITIES
        .iter()
        .filter_map(|label| match counts.get(*label) {
            Some(&count) if count > 0 => Some(format!("{}: {}", label, count)),
            _ => None,
        })
        .collect();

    (!parts.is_empty()).then(|| parts.join(", "))
}
