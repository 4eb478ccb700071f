use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

/// Leading "v" marker or trailing pre-release decorator
static DECORATOR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^v|(-dev|-alpha|-beta|-rc\d*)$").expect("valid decorator pattern")
});

/// One to four dot-separated non-negative integers
static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+){0,3}$").expect("valid version pattern"));

/// Marks placeholder releases that were never published
const PLACEHOLDER: &str = "9999";

/// A canonical `major.minor.patch` core version.
///
/// Always has exactly three numeric segments; missing segments are zero-padded and a
/// fourth segment is dropped. Ordering compares segments numerically left to right.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoreVersion(Version);

impl CoreVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self(Version::new(major, minor, patch))
    }

    /// Leading segment, selects the release line to query
    pub fn major(&self) -> u64 {
        self.0.major
    }
}

/// Normalizes a version string to its canonical 3-part form.
///
/// Examples:
/// - "v12.4.1-dev" -> 12.4.1
/// - "12.0" -> 12.0.0
/// - "12.4.1.2" -> 12.4.1
/// - "12.9999.0" -> None (placeholder release)
/// - "0.0" -> None
pub fn normalize(raw: &str) -> Option<CoreVersion> {
    let clean = DECORATOR_PATTERN.replace_all(raw, "");

    if !VERSION_PATTERN.is_match(&clean) || clean.contains(PLACEHOLDER) {
        return None;
    }

    let mut segments = [0u64; 3];
    for (slot, part) in segments.iter_mut().zip(clean.split('.')) {
        *slot = part.parse().ok()?;
    }

    if segments == [0, 0, 0] {
        return None;
    }

    let [major, minor, patch] = segments;
    Some(CoreVersion::new(major, minor, patch))
}

impl fmt::Display for CoreVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0.major, self.0.minor, self.0.patch)
    }
}

impl FromStr for CoreVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s).ok_or_else(|| s.to_string())
    }
}
