//! Version range selection

use indexmap::IndexSet;

use crate::version::normalizer::{CoreVersion, normalize};

/// Returns the distinct versions `v` with `from < v <= to`, in first-seen order.
///
/// Index entries such as `12.4.2` and `12.4.2.1` share one canonical version and are
/// kept once.
pub fn filter_range(
    versions: &[CoreVersion],
    from: &CoreVersion,
    to: &CoreVersion,
) -> Vec<CoreVersion> {
    versions
        .iter()
        .filter(|v| *v > from && *v <= to)
        .cloned()
        .collect::<IndexSet<_>>()
        .into_iter()
        .collect()
}

/// Finds the highest candidate that normalizes to a version greater than `current`.
///
/// Candidates that fail to normalize are ignored.
pub fn find_target_version<S: AsRef<str>>(
    candidates: &[S],
    current: &CoreVersion,
) -> Option<CoreVersion> {
    candidates
        .iter()
        .filter_map(|c| normalize(c.as_ref()))
        .filter(|v| v > current)
        .max()
}
