use regex::Regex;
use std::cmp::Ordering;
use std::sync::OnceLock;

static VERSION_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn version_pattern() -> Option<&'static Regex> {
    VERSION_PATTERN
        .get_or_init(|| Regex::new(r"\d+(?:\.\d+)*").ok())
        .as_ref()
}

/// Leading dotted-number run of a version string: `"5.1.73-log"` gives `[5, 1, 73]`.
pub fn numeric_components(version: &str) -> Option<Vec<u64>> {
    let found = version_pattern()?.find(version)?;
    found
        .as_str()
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// Whether `version` is at or above `threshold`.
///
/// Numbers are compared component by component with missing components
/// counting as zero, so `"10.1"` is above `"4.0"`. When either side carries no
/// number at all, the version truncated to the threshold's length is compared
/// as a string.
pub fn version_at_least(version: &str, threshold: &str) -> bool {
    match (numeric_components(version), numeric_components(threshold)) {
        (Some(actual), Some(wanted)) => compare_components(&actual, &wanted) != Ordering::Less,
        _ => {
            let prefix: String = version.chars().take(threshold.chars().count()).collect();
            prefix.as_str() >= threshold
        }
    }
}

fn compare_components(actual: &[u64], wanted: &[u64]) -> Ordering {
    let len = actual.len().max(wanted.len());
    for i in 0..len {
        let a = actual.get(i).copied().unwrap_or(0);
        let w = wanted.get(i).copied().unwrap_or(0);
        match a.cmp(&w) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}
