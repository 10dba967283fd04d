//! Names, versions and the resolved release descriptor.

use serde::{Deserialize, Serialize};

use crate::{Arch, Checksum};

/// A normalized package name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PackageName(String);

impl PackageName {
    /// Create a new package name, normalizing the input to lowercase.
    pub fn new(name: &str) -> Self {
        Self(name.to_lowercase())
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.to_lowercase()
    }
}

/// A release version string.
///
/// Ordering follows semver when both sides parse; unparsable versions sort
/// after parsable ones and compare lexically among themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version(String);

impl Ord for Version {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (self.semver(), other.semver()) {
            (Some(a), Some(b)) => a.cmp(&b),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Version {
    /// Create a new version from the given string, dropping a leading `v`.
    pub fn new(v: &str) -> Self {
        Self(v.strip_prefix('v').unwrap_or(v).to_string())
    }

    /// Parse as semver, if possible.
    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(&self.0).ok()
    }

    /// Return the version string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// The concrete artifact selected for one install run.
///
/// Built once by the resolver and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseDescriptor {
    /// Package identifier (e.g. `muxy`).
    pub name: PackageName,
    /// Release version.
    pub version: Version,
    /// Selected architecture variant.
    pub arch: Arch,
    /// Download location of the zip artifact.
    pub url: String,
    /// Expected digest of the downloaded bytes.
    pub digest: Checksum,
}

impl ReleaseDescriptor {
    /// Last path segment of the URL (e.g. `darwin_amd64.zip`).
    pub fn file_name(&self) -> &str {
        self.url.rsplit('/').next().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_orders_by_semver() {
        let mut versions = vec![
            Version::new("0.0.10"),
            Version::new("v0.0.2"),
            Version::new("0.0.4"),
        ];
        versions.sort();
        let got: Vec<&str> = versions.iter().map(Version::as_str).collect();
        assert_eq!(got, ["0.0.2", "0.0.4", "0.0.10"]);
    }

    #[test]
    fn package_name_is_case_insensitive() {
        assert_eq!(PackageName::new("Muxy"), "muxy");
    }

    #[test]
    fn descriptor_file_name() {
        let d = ReleaseDescriptor {
            name: PackageName::new("muxy"),
            version: Version::new("0.0.4"),
            arch: Arch::Amd64,
            url: "https://example.com/v0.0.4/darwin_amd64.zip".to_string(),
            digest: Checksum::sha256(&"a".repeat(64)).unwrap(),
        };
        assert_eq!(d.file_name(), "darwin_amd64.zip");
    }
}
