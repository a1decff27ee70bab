//! Server version parsing.

use std::cmp::Ordering;
use std::fmt;

/// Major/minor server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parse the leading `major[.minor]` of a version string.
    ///
    /// MariaDB servers reached through the MySQL protocol report versions
    /// like `5.5.5-10.6.12-MariaDB`; the `5.5.5-` prefix is skipped.
    pub fn parse(version: &str) -> Option<ServerVersion> {
        let version = version.trim();
        let version = version.strip_prefix("5.5.5-").unwrap_or(version);
        let mut parts = version
            .split(|c: char| !c.is_ascii_digit())
            .take_while(|p| !p.is_empty());
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
        Some(ServerVersion { major, minor })
    }

    /// Whether this version is at least `other`.
    pub fn at_least(&self, other: ServerVersion) -> bool {
        self.cmp(&other) != Ordering::Less
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
