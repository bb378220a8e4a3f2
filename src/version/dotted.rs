//! Dotted numeric version strings
//!
//! Versions here are plain `.`-separated integer components. There is no
//! pre-release or build-metadata handling: `1.2.0-rc1` compares like `1.2.0`.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// Maximum number of components kept by [`normalize_version`] and [`extract_version`]
pub const MAX_COMPONENTS: usize = 3;

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+(\.\d+)?)").expect("version pattern is valid"));

/// Compare two dotted version strings component by component.
///
/// The shorter version is padded with zeros, so `1.2` equals `1.2.0`.
/// Components are compared numerically, so `1.10.0` is greater than `1.2.0`.
/// A component that is not a non-negative integer counts as `0`.
///
/// Examples:
/// - ("1.4.0", "1.5.0") -> Less
/// - ("1.2.0", "1.2") -> Equal
/// - ("1.10.0", "1.2.0") -> Greater
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<&str> = a.split('.').collect();
    let right: Vec<&str> = b.split('.').collect();
    let len = left.len().max(right.len());

    (0..len)
        .map(|i| {
            let l = left.get(i).map_or(0, |c| parse_component(c, a));
            let r = right.get(i).map_or(0, |c| parse_component(c, b));
            l.cmp(&r)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Parse a single component, degrading to `0` when it is not numeric.
fn parse_component(component: &str, version: &str) -> u64 {
    component.parse().unwrap_or_else(|_| {
        debug!(
            component,
            version, "non-numeric version component treated as 0"
        );
        0
    })
}

/// Strip a leading `v` and keep at most three components.
///
/// Examples:
/// - "v1.2.3.4" -> "1.2.3"
/// - "2.0" -> "2.0"
pub fn normalize_version(version: &str) -> String {
    let stripped = version.strip_prefix('v').unwrap_or(version);
    stripped
        .split('.')
        .take(MAX_COMPONENTS)
        .collect::<Vec<_>>()
        .join(".")
}

/// Pull the first `X.Y` or `X.Y.Z` pattern out of a string and pad it to three components.
///
/// Returns `None` when the input contains no such pattern.
///
/// Examples:
/// - "2.0" -> "2.0.0"
/// - "release-1.4.7-alpine" -> "1.4.7"
/// - "latest" -> None
pub fn extract_version(input: &str) -> Option<String> {
    let found = VERSION_PATTERN.captures(input)?.get(1)?.as_str();
    let mut parts: Vec<&str> = found.split('.').collect();
    parts.resize(MAX_COMPONENTS, "0");
    Some(parts.join("."))
}
