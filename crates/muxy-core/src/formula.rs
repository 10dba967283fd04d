//! Declarative formula table.
//!
//! A single TOML document lists every published revision of the package.
//! Each revision maps `(version, arch)` to a download URL and a digest:
//!
//! ```toml
//! [package]
//! name = "muxy"
//! url = "https://github.com/mefellows/muxy/releases/download/v{version}/{tag}.zip"
//!
//! [tags]
//! amd64 = "darwin_amd64"
//! 386 = "darwin_386"
//!
//! [[release]]
//! version = "0.0.4"
//! amd64 = { sha256 = "..." }
//! 386 = { sha256 = "..." }
//! ```
//!
//! Everything is validated on load, so a [`Formula`] can resolve without
//! failing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::types::{
    Arch, Checksum, DigestAlgorithm, DigestError, PackageName, ReleaseDescriptor, Version,
};

/// The table shipped with this crate.
pub const BUILTIN_TABLE: &str = include_str!("../formula/muxy.toml");

/// Errors that can occur when loading or validating a formula table.
#[derive(Error, Debug)]
pub enum FormulaError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Empty field: {0}")]
    EmptyField(&'static str),

    #[error("Invalid URL template '{0}': {1}")]
    InvalidUrl(String, &'static str),

    #[error("Invalid version '{0}': expected semver")]
    InvalidVersion(String),

    #[error("Duplicate release version {0}")]
    DuplicateVersion(String),

    #[error("Release {version} has no {arch} entry")]
    MissingAsset { version: String, arch: Arch },

    #[error("Release {version} ({arch}) declares no sha1 or sha256 digest")]
    MissingDigest { version: String, arch: Arch },

    #[error("Release {version} ({arch}) declares both sha1 and sha256; pick one")]
    AmbiguousDigest { version: String, arch: Arch },

    #[error("Release {version} ({arch}): {source}")]
    Digest {
        version: String,
        arch: Arch,
        #[source]
        source: DigestError,
    },

    #[error("Architecture tags must be distinct, both are '{0}'")]
    DuplicateTag(String),

    #[error("Table has no releases")]
    NoReleases,

    #[error("Unknown version {0} (available: {1})")]
    UnknownVersion(String, String),
}

/// Host CPU family a package insists on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HostRequirement {
    /// x86 or x86_64 only.
    Intel,
}

#[derive(Debug, Deserialize)]
struct RawTable {
    package: RawPackage,
    tags: RawTags,
    #[serde(default, rename = "release")]
    releases: Vec<RawRelease>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    homepage: String,
    url: String,
    binary: Option<String>,
    requires: Option<HostRequirement>,
    test: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawTags {
    amd64: String,
    #[serde(rename = "386")]
    i386: String,
}

#[derive(Debug, Deserialize)]
struct RawRelease {
    version: String,
    amd64: Option<RawAsset>,
    #[serde(rename = "386")]
    i386: Option<RawAsset>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawAsset {
    sha1: Option<String>,
    sha256: Option<String>,
}

/// Package-level metadata shared by all revisions.
#[derive(Debug, Clone)]
pub struct PackageMeta {
    pub name: PackageName,
    pub description: String,
    pub homepage: String,
    /// URL with `{name}`, `{version}` and `{tag}` placeholders.
    pub url_template: String,
    /// Executable the archive must contain.
    pub binary: String,
    pub requires: Option<HostRequirement>,
    /// Arguments for the post-install smoke test.
    pub test_args: Vec<String>,
    amd64_tag: String,
    i386_tag: String,
}

impl PackageMeta {
    /// Asset tag for an architecture (e.g. `darwin_amd64`).
    pub fn tag(&self, arch: Arch) -> &str {
        match arch {
            Arch::Amd64 => &self.amd64_tag,
            Arch::I386 => &self.i386_tag,
        }
    }

    fn render_url(&self, version: &Version, arch: Arch) -> String {
        self.url_template
            .replace("{name}", self.name.as_str())
            .replace("{version}", version.as_str())
            .replace("{tag}", self.tag(arch))
    }
}

/// One published revision: a version and a digest per architecture.
#[derive(Debug, Clone)]
pub struct Release {
    pub version: Version,
    amd64: Checksum,
    i386: Checksum,
}

impl Release {
    /// Expected digest for an architecture.
    pub fn checksum(&self, arch: Arch) -> &Checksum {
        match arch {
            Arch::Amd64 => &self.amd64,
            Arch::I386 => &self.i386,
        }
    }
}

/// Validated set of revisions, sorted by ascending version.
#[derive(Debug, Clone)]
pub struct FormulaTable {
    package: PackageMeta,
    releases: Vec<Release>,
}

impl FormulaTable {
    /// Parse and validate a table from TOML.
    pub fn parse(content: &str) -> Result<Self, FormulaError> {
        let raw: RawTable = toml::from_str(content)?;
        Self::from_raw(raw)
    }

    /// Read a table from disk.
    pub fn load(path: &Path) -> Result<Self, FormulaError> {
        let content = std::fs::read_to_string(path).map_err(|source| FormulaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// The table compiled into this crate.
    pub fn builtin() -> Result<Self, FormulaError> {
        Self::parse(BUILTIN_TABLE)
    }

    /// Load `path` when given, otherwise fall back to the built-in table.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, FormulaError> {
        match path {
            Some(p) => {
                tracing::debug!(path = %p.display(), "loading formula table");
                Self::load(p)
            }
            None => Self::builtin(),
        }
    }

    fn from_raw(raw: RawTable) -> Result<Self, FormulaError> {
        let p = raw.package;
        if p.name.trim().is_empty() {
            return Err(FormulaError::EmptyField("package.name"));
        }
        validate_url_template(&p.url)?;

        let binary = p.binary.unwrap_or_else(|| p.name.clone());
        if binary.trim().is_empty() {
            return Err(FormulaError::EmptyField("package.binary"));
        }
        if raw.tags.amd64.is_empty() {
            return Err(FormulaError::EmptyField("tags.amd64"));
        }
        if raw.tags.i386.is_empty() {
            return Err(FormulaError::EmptyField("tags.386"));
        }
        if raw.tags.amd64 == raw.tags.i386 {
            return Err(FormulaError::DuplicateTag(raw.tags.amd64));
        }

        let package = PackageMeta {
            name: PackageName::new(&p.name),
            description: p.description,
            homepage: p.homepage,
            url_template: p.url,
            binary,
            requires: p.requires,
            test_args: p.test.unwrap_or_else(|| vec!["--version".to_string()]),
            amd64_tag: raw.tags.amd64,
            i386_tag: raw.tags.i386,
        };

        if raw.releases.is_empty() {
            return Err(FormulaError::NoReleases);
        }

        let mut seen = HashSet::new();
        let mut releases = Vec::with_capacity(raw.releases.len());
        for r in raw.releases {
            let version = Version::new(&r.version);
            if version.semver().is_none() {
                return Err(FormulaError::InvalidVersion(r.version));
            }
            if !seen.insert(version.clone()) {
                return Err(FormulaError::DuplicateVersion(version.to_string()));
            }
            let amd64 = asset_checksum(&version, Arch::Amd64, r.amd64)?;
            let i386 = asset_checksum(&version, Arch::I386, r.i386)?;
            releases.push(Release {
                version,
                amd64,
                i386,
            });
        }
        releases.sort_by(|a, b| a.version.cmp(&b.version));

        Ok(Self { package, releases })
    }

    pub fn package(&self) -> &PackageMeta {
        &self.package
    }

    /// All revisions, oldest first.
    pub fn releases(&self) -> &[Release] {
        &self.releases
    }

    pub fn versions(&self) -> Vec<&Version> {
        self.releases.iter().map(|r| &r.version).collect()
    }

    /// Newest revision.
    pub fn latest(&self) -> Formula<'_> {
        // from_raw rejects empty tables
        let release = &self.releases[self.releases.len() - 1];
        Formula {
            package: &self.package,
            release,
        }
    }

    /// Select a revision by version, or the newest one when `version` is `None`.
    pub fn formula(&self, version: Option<&str>) -> Result<Formula<'_>, FormulaError> {
        let Some(requested) = version else {
            return Ok(self.latest());
        };
        let wanted = Version::new(requested);
        self.releases
            .iter()
            .find(|r| r.version == wanted)
            .map(|release| Formula {
                package: &self.package,
                release,
            })
            .ok_or_else(|| {
                let available: Vec<&str> =
                    self.releases.iter().map(|r| r.version.as_str()).collect();
                FormulaError::UnknownVersion(wanted.to_string(), available.join(", "))
            })
    }
}

fn validate_url_template(url: &str) -> Result<(), FormulaError> {
    if url.is_empty() {
        return Err(FormulaError::EmptyField("package.url"));
    }
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(FormulaError::InvalidUrl(
            url.to_string(),
            "must start with http(s)://",
        ));
    }
    if !url.contains("{version}") {
        return Err(FormulaError::InvalidUrl(
            url.to_string(),
            "missing {version} placeholder",
        ));
    }
    if !url.contains("{tag}") {
        return Err(FormulaError::InvalidUrl(
            url.to_string(),
            "missing {tag} placeholder",
        ));
    }
    if !url.ends_with(".zip") {
        return Err(FormulaError::InvalidUrl(
            url.to_string(),
            "artifact must be a .zip archive",
        ));
    }
    Ok(())
}

fn asset_checksum(
    version: &Version,
    arch: Arch,
    asset: Option<RawAsset>,
) -> Result<Checksum, FormulaError> {
    let asset = asset.ok_or_else(|| FormulaError::MissingAsset {
        version: version.to_string(),
        arch,
    })?;
    let (algorithm, hex) = match (asset.sha1, asset.sha256) {
        (Some(hex), None) => (DigestAlgorithm::Sha1, hex),
        (None, Some(hex)) => (DigestAlgorithm::Sha256, hex),
        (None, None) => {
            return Err(FormulaError::MissingDigest {
                version: version.to_string(),
                arch,
            });
        }
        (Some(_), Some(_)) => {
            return Err(FormulaError::AmbiguousDigest {
                version: version.to_string(),
                arch,
            });
        }
    };
    Checksum::new(algorithm, &hex).map_err(|source| FormulaError::Digest {
        version: version.to_string(),
        arch,
        source,
    })
}

/// A single revision ready to resolve.
#[derive(Debug, Clone, Copy)]
pub struct Formula<'a> {
    package: &'a PackageMeta,
    release: &'a Release,
}

impl<'a> Formula<'a> {
    pub fn package(&self) -> &'a PackageMeta {
        self.package
    }

    pub fn version(&self) -> &'a Version {
        &self.release.version
    }

    /// Pick the artifact for a host of the given word size.
    ///
    /// Total and pure: the same flag always yields the same descriptor.
    pub fn resolve(&self, is_64_bit: bool) -> ReleaseDescriptor {
        self.resolve_arch(Arch::from_word_size(is_64_bit))
    }

    pub fn resolve_arch(&self, arch: Arch) -> ReleaseDescriptor {
        ReleaseDescriptor {
            name: self.package.name.clone(),
            version: self.release.version.clone(),
            arch,
            url: self.package.render_url(&self.release.version, arch),
            digest: self.release.checksum(arch).clone(),
        }
    }
}
