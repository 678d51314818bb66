//! Version comparison for repository and installed package versions.
//!
//! Version strings are compared the way filenames with embedded versions
//! sort: the string is split into alternating numeric and non-numeric runs,
//! numeric runs compare as integers, and non-numeric runs compare
//! lexicographically.

use std::cmp::Ordering;

/// A single run of a version string: either all digits or all non-digits.
#[derive(Debug, PartialEq, Eq)]
enum Run<'a> {
    /// Consecutive ASCII digits, compared numerically.
    Numeric(&'a str),
    /// Everything else, compared lexicographically.
    Text(&'a str),
}

/// What: Split a version string into alternating numeric and text runs.
///
/// Inputs:
/// - `version`: Version string to split (e.g., "1.2.3rc1").
///
/// Output:
/// - Returns the runs in order (e.g., `1`, `.`, `2`, `.`, `3`, `rc`, `1`).
///
/// Details:
/// - A run boundary occurs wherever an ASCII digit meets a non-digit.
/// - The empty string produces no runs.
fn split_runs(version: &str) -> Vec<Run<'_>> {
    let mut runs = Vec::new();
    let bytes = version.as_bytes();
    let mut start = 0;

    while start < bytes.len() {
        let numeric = bytes[start].is_ascii_digit();
        let mut end = start + 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() == numeric {
            end += 1;
        }
        let run = &version[start..end];
        runs.push(if numeric {
            Run::Numeric(run)
        } else {
            Run::Text(run)
        });
        start = end;
    }

    runs
}

/// What: Compare two numeric runs as integers of arbitrary length.
///
/// Inputs:
/// - `a`, `b`: Runs consisting only of ASCII digits.
///
/// Output:
/// - Returns the numeric ordering of the two runs.
///
/// Details:
/// - Leading zeros are stripped so `007` equals `7`.
/// - After stripping, a longer run is the larger number; equal lengths fall
///   back to lexicographic comparison of the digits.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');

    match a.len().cmp(&b.len()) {
        Ordering::Equal => a.cmp(b),
        ord => ord,
    }
}

/// What: Compare two version strings.
///
/// Inputs:
/// - `a`: Left-hand version string.
/// - `b`: Right-hand version string.
///
/// Output:
/// - Returns `Ordering::Less` if `a < b`.
/// - Returns `Ordering::Equal` if `a == b`.
/// - Returns `Ordering::Greater` if `a > b`.
///
/// Details:
/// - Both strings are split into alternating numeric and non-numeric runs.
/// - Runs are compared pairwise: numeric against numeric compares as
///   integers, text against text compares lexicographically, and a numeric
///   run orders before a text run at the same position.
/// - When one string is a run-prefix of the other, the shorter orders first
///   (so "1.2.3" < "1.2.3rc1").
/// - Equal strings compare equal.
///
/// # Example
///
/// ```
/// use sbo_toolkit::version::compare_versions;
/// use std::cmp::Ordering;
///
/// assert_eq!(compare_versions("1.2.3", "1.2.4"), Ordering::Less);
/// assert_eq!(compare_versions("2.0", "1.9.9"), Ordering::Greater);
/// assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
/// assert_eq!(compare_versions("20180821", "20180821"), Ordering::Equal);
/// ```
#[must_use]
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let a_runs = split_runs(a);
    let b_runs = split_runs(b);

    for (a_run, b_run) in a_runs.iter().zip(b_runs.iter()) {
        let ord = match (a_run, b_run) {
            (Run::Numeric(x), Run::Numeric(y)) => compare_numeric(x, y),
            (Run::Text(x), Run::Text(y)) => x.cmp(y),
            (Run::Numeric(_), Run::Text(_)) => Ordering::Less,
            (Run::Text(_), Run::Numeric(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    a_runs.len().cmp(&b_runs.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_runs() {
        assert_eq!(
            split_runs("1.2rc3"),
            vec![
                Run::Numeric("1"),
                Run::Text("."),
                Run::Numeric("2"),
                Run::Text("rc"),
                Run::Numeric("3"),
            ]
        );
        assert!(split_runs("").is_empty());
    }

    #[test]
    fn test_compare_versions_basic() {
        assert_eq!(compare_versions("1.0.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("1.0.1", "1.0.0"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.0", "1.0.0"), Ordering::Equal);
        assert_eq!(compare_versions("2.0.0", "1.9.9"), Ordering::Greater);
    }

    #[test]
    fn test_compare_versions_numeric_runs() {
        // Multi-digit segments compare as numbers, not strings
        assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
        assert_eq!(compare_versions("1.10.0", "1.9.9"), Ordering::Greater);
        assert_eq!(compare_versions("10.0", "9.9"), Ordering::Greater);
        // Leading zeros are insignificant
        assert_eq!(compare_versions("1.07", "1.7"), Ordering::Equal);
    }

    #[test]
    fn test_compare_versions_prerelease_suffix() {
        // A proper run-prefix orders first
        assert_eq!(compare_versions("1.2.3", "1.2.3rc1"), Ordering::Less);
        assert_eq!(compare_versions("1.2.3rc1", "1.2.3"), Ordering::Greater);
        assert_eq!(compare_versions("1.2.3rc1", "1.2.3rc2"), Ordering::Less);
        assert_eq!(compare_versions("1.2.3a", "1.2.3b"), Ordering::Less);
    }

    #[test]
    fn test_compare_versions_mixed_runs() {
        // Numeric run orders before text run at the same position
        assert_eq!(compare_versions("1.2", "1.a"), Ordering::Less);
        assert_eq!(compare_versions("1.a", "1.2"), Ordering::Greater);
    }

    #[test]
    fn test_compare_versions_edge_cases() {
        assert_eq!(compare_versions("", ""), Ordering::Equal);
        assert_eq!(compare_versions("", "1"), Ordering::Less);
        assert_eq!(compare_versions("1", ""), Ordering::Greater);
        assert_eq!(compare_versions("20180821", "20180901"), Ordering::Less);
    }
}
