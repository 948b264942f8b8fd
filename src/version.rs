//! Best-effort version resolution

use semver::Version;
use std::fmt::Display;

/// Reported when a version cannot be determined
pub const SENTINEL_VERSION: &str = "0.0.0";

/// Unwrap a version lookup, falling back to [`SENTINEL_VERSION`]
pub fn version_or_sentinel<E: Display>(lookup: Result<String, E>) -> String {
    match lookup {
        Ok(version) => version,
        Err(e) => {
            tracing::debug!(error = %e, "version lookup failed, reporting {}", SENTINEL_VERSION);
            SENTINEL_VERSION.to_string()
        }
    }
}

/// Parse a package version string
pub fn parse_version(raw: &str) -> Result<String, semver::Error> {
    let raw = raw.strip_prefix('v').unwrap_or(raw);
    Version::parse(raw).map(|v| v.to_string())
}

/// Version of this integration
pub fn liana_version() -> String {
    version_or_sentinel(parse_version(env!("CARGO_PKG_VERSION")))
}
