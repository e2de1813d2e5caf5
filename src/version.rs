//! Semantic-version parsing and "latest" selection.
//!
//! Versions are compared by semver precedence: `major.minor.patch`, then the
//! prerelease component (a release outranks any of its prereleases). Build
//! metadata does not take part in precedence.

use std::cmp::Ordering;

pub use semver::Version;

use crate::error::{Error, Result};

/// Strict semver parse. No `v` prefix, no missing components, no leading zeros.
pub fn parse_version(s: &str) -> Result<Version> {
    Version::parse(s).map_err(|e| Error::version_parse(s, e))
}

/// Canonical textual form used for every persisted or compared value.
#[must_use]
pub fn normalize(version: &Version) -> String {
    version.to_string()
}

/// Parses and normalizes in one step.
pub fn normalize_str(s: &str) -> Result<String> {
    parse_version(s).map(|v| normalize(&v))
}

#[must_use]
pub fn is_stable(version: &Version) -> bool {
    version.pre.is_empty()
}

/// Semver precedence, ignoring build metadata.
#[must_use]
pub fn cmp_precedence(a: &Version, b: &Version) -> Ordering {
    (a.major, a.minor, a.patch)
        .cmp(&(b.major, b.minor, b.patch))
        .then_with(|| a.pre.cmp(&b.pre))
}

/// Picks the highest-precedence version among `candidates`.
///
/// Names that do not parse are skipped. With `stable_only`, prereleases are
/// skipped too and there is no fallback to them: if only prereleases exist the
/// result is `None`.
pub fn resolve_latest<I, S>(candidates: I, stable_only: bool) -> Option<Version>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .filter_map(|name| Version::parse(name.as_ref()).ok())
        .filter(|v| !stable_only || is_stable(v))
        // build metadata only breaks ties so the choice is deterministic
        .max_by(|a, b| cmp_precedence(a, b).then_with(|| a.cmp(b)))
}
