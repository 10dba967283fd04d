//! The install procedure: fetch, verify, extract, place.
//!
//! Steps run strictly in order and never retry. Any failure aborts the run;
//! everything fetched or unpacked lives in a private staging directory that
//! is removed on return, and the binary directory is only touched by the
//! final all-or-nothing placement.

use std::path::{Path, PathBuf};

use reqwest::Client;
use thiserror::Error;

use crate::Reporter;
use crate::io::download::{DownloadError, DownloadRequest, verify_file};
use crate::io::extract::{ExtractError, extract_zip, require_binary};
use crate::io::place::{PlaceError, place_files};
use crate::types::{Checksum, ReleaseDescriptor};

#[derive(Error, Debug)]
pub enum InstallError {
    #[error("Download failed")]
    Download(#[source] DownloadError),

    #[error("Digest mismatch for {artifact}: expected {expected}, got {actual}")]
    DigestMismatch {
        artifact: String,
        expected: Checksum,
        actual: String,
    },

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("Placement failed: {0}")]
    Placement(#[from] PlaceError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InstallError {
    fn from_download(err: DownloadError, artifact: &str) -> Self {
        match err {
            DownloadError::HashMismatch { expected, actual } => Self::DigestMismatch {
                artifact: artifact.to_string(),
                expected,
                actual,
            },
            other => Self::Download(other),
        }
    }
}

/// Where the verified artifact came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactSource {
    Download,
    Cache(PathBuf),
    Local(PathBuf),
}

/// What one install run needs besides the installer itself.
#[derive(Debug, Clone, Copy)]
pub struct InstallRequest<'a> {
    pub descriptor: &'a ReleaseDescriptor,
    /// Executable the archive must contain.
    pub binary: &'a str,
    pub bin_dir: &'a Path,
    /// Use this file instead of downloading. Still verified.
    pub artifact: Option<&'a Path>,
}

impl<'a> InstallRequest<'a> {
    pub fn new(descriptor: &'a ReleaseDescriptor, binary: &'a str, bin_dir: &'a Path) -> Self {
        Self {
            descriptor,
            binary,
            bin_dir,
            artifact: None,
        }
    }

    pub fn with_artifact(mut self, artifact: &'a Path) -> Self {
        self.artifact = Some(artifact);
        self
    }
}

/// Outcome of a successful install.
#[derive(Debug, Clone)]
pub struct InstallReceipt {
    pub descriptor: ReleaseDescriptor,
    pub source: ArtifactSource,
    /// Size of the verified archive in bytes.
    pub archive_size: u64,
    pub installed: Vec<PathBuf>,
}

/// Runs install requests. Holds the HTTP client, optional cache and reporter.
#[derive(Debug)]
pub struct Installer<R: Reporter> {
    client: Client,
    cache_dir: Option<PathBuf>,
    reporter: R,
}

impl<R: Reporter> Installer<R> {
    pub fn new(client: Client, reporter: R) -> Self {
        Self {
            client,
            cache_dir: None,
            reporter,
        }
    }

    /// Keep verified archives under `dir`, keyed by digest.
    pub fn with_cache(mut self, dir: PathBuf) -> Self {
        self.cache_dir = Some(dir);
        self
    }

    fn cache_file(&self, digest: &Checksum) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}-{}.zip", digest.algorithm(), digest.as_str())))
    }

    pub async fn install(&self, req: InstallRequest<'_>) -> Result<InstallReceipt, InstallError> {
        let descriptor = req.descriptor;
        let name = &descriptor.name;
        let version = &descriptor.version;

        let staging = tempfile::Builder::new().prefix("muxy-formula-").tempdir()?;
        let file_name = match descriptor.file_name() {
            "" => "artifact.zip",
            f => f,
        };
        let archive = staging.path().join(file_name);

        let source = match self.fetch(&req, &archive).await {
            Ok(source) => source,
            Err(e) => {
                if !matches!(e, InstallError::DigestMismatch { .. }) {
                    self.reporter.failed(name, version, &e.to_string());
                }
                return Err(e);
            }
        };
        let archive_size = std::fs::metadata(&archive)?.len();

        self.reporter.extracting(name, version);
        let extracted = staging.path().join("extract");
        let result = extract_zip(&archive, &extracted).and_then(|files| {
            require_binary(&files, req.binary)?;
            Ok(files)
        });
        let files = match result {
            Ok(files) => files,
            Err(e) => {
                self.reporter.failed(name, version, &e.to_string());
                return Err(e.into());
            }
        };

        self.reporter.installing(name, version);
        let installed = match place_files(&files, req.bin_dir, req.binary) {
            Ok(installed) => installed,
            Err(e) => {
                self.reporter.failed(name, version, &e.to_string());
                return Err(e.into());
            }
        };

        let detail = match &source {
            ArtifactSource::Download => "downloaded",
            ArtifactSource::Cache(_) => "cached",
            ArtifactSource::Local(_) => "local",
        };
        self.reporter.done(name, version, detail, Some(archive_size));
        tracing::info!(
            package = %name,
            version = %version,
            arch = %descriptor.arch,
            files = installed.len(),
            "installed"
        );

        Ok(InstallReceipt {
            descriptor: descriptor.clone(),
            source,
            archive_size,
            installed,
        })
    }

    /// Steps 2 and 3: obtain verified bytes at `archive`.
    async fn fetch(
        &self,
        req: &InstallRequest<'_>,
        archive: &Path,
    ) -> Result<ArtifactSource, InstallError> {
        let descriptor = req.descriptor;
        let digest = &descriptor.digest;

        if let Some(local) = req.artifact {
            tracing::debug!(path = %local.display(), "using local artifact");
            self.reporter
                .info(&format!("Using local artifact {}", local.display()));
            std::fs::copy(local, archive)?;
            self.verify_staged(descriptor, archive, &local.display().to_string())?;
            return Ok(ArtifactSource::Local(local.to_path_buf()));
        }

        let cache_file = self.cache_file(digest);
        if let Some(cached) = cache_file.as_deref().filter(|p| p.is_file()) {
            match verify_file(cached, digest) {
                Ok(_) => {
                    tracing::debug!(path = %cached.display(), "cache hit");
                    self.reporter
                        .info(&format!("Using cached artifact {}", cached.display()));
                    std::fs::copy(cached, archive)?;
                    return Ok(ArtifactSource::Cache(cached.to_path_buf()));
                }
                Err(e) => {
                    tracing::warn!(path = %cached.display(), error = %e, "discarding stale cache entry");
                    self.reporter.warning("Cached artifact failed verification; downloading again");
                    std::fs::remove_file(cached).ok();
                }
            }
        }

        DownloadRequest::new(&self.client, descriptor, archive, &self.reporter)
            .execute()
            .await
            .map_err(|e| InstallError::from_download(e, &descriptor.url))?;

        if let Some(cached) = cache_file {
            if let Err(e) = store_in_cache(archive, &cached) {
                tracing::warn!(path = %cached.display(), error = %e, "failed to cache artifact");
            }
        }

        Ok(ArtifactSource::Download)
    }

    fn verify_staged(
        &self,
        descriptor: &ReleaseDescriptor,
        archive: &Path,
        label: &str,
    ) -> Result<(), InstallError> {
        self.reporter.verifying(&descriptor.name, &descriptor.version);
        verify_file(archive, &descriptor.digest).map_err(|e| {
            if matches!(e, DownloadError::HashMismatch { .. }) {
                self.reporter
                    .failed(&descriptor.name, &descriptor.version, "hash mismatch");
                std::fs::remove_file(archive).ok();
            }
            InstallError::from_download(e, label)
        })?;
        Ok(())
    }
}

/// Copy a verified archive into the cache via a temp file + rename.
fn store_in_cache(archive: &Path, cached: &Path) -> std::io::Result<()> {
    let dir = cached
        .parent()
        .ok_or_else(|| std::io::Error::other("cache path has no parent"))?;
    std::fs::create_dir_all(dir)?;
    let tmp = tempfile::NamedTempFile::new_in(dir)?;
    std::fs::copy(archive, tmp.path())?;
    tmp.persist(cached).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NullReporter;
    use crate::formula::FormulaTable;
    use crate::io::extract::tests::build_zip;
    use crate::types::{DigestAlgorithm, PackageName, Version};
    use mockito::Server;

    /// Collects `info` and `warning` messages.
    #[derive(Clone, Default)]
    struct Recorder(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

    impl Recorder {
        fn messages(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl Reporter for Recorder {
        fn downloading(&self, _: &PackageName, _: &Version, _: u64, _: Option<u64>) {}
        fn verifying(&self, _: &PackageName, _: &Version) {}
        fn extracting(&self, _: &PackageName, _: &Version) {}
        fn installing(&self, _: &PackageName, _: &Version) {}
        fn done(&self, _: &PackageName, _: &Version, _: &str, _: Option<u64>) {}
        fn failed(&self, _: &PackageName, _: &Version, _: &str) {}
        fn info(&self, msg: &str) {
            self.0.lock().unwrap().push(format!("info: {msg}"));
        }
        fn warning(&self, msg: &str) {
            self.0.lock().unwrap().push(format!("warning: {msg}"));
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        zip_bytes: Vec<u8>,
    }

    impl Fixture {
        fn new(entries: &[(&str, &[u8], u32)]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let zip_path = dir.path().join("fixture.zip");
            build_zip(&zip_path, entries);
            let zip_bytes = std::fs::read(&zip_path).unwrap();
            Self { dir, zip_bytes }
        }

        fn muxy() -> Self {
            Self::new(&[
                ("muxy", b"#!/bin/sh\necho 0.0.4\n", 0o755),
                ("README.md", b"docs", 0o644),
            ])
        }

        /// A table whose digests match `digest_of` for both architectures.
        fn table(&self, base_url: &str, digest_of: &[u8]) -> FormulaTable {
            let sha = DigestAlgorithm::Sha256.compute(digest_of);
            FormulaTable::parse(&format!(
                r#"
[package]
name = "muxy"
url = "{base_url}/v{{version}}/{{tag}}.zip"

[tags]
amd64 = "darwin_amd64"
386 = "darwin_386"

[[release]]
version = "0.0.4"
amd64 = {{ sha256 = "{sha}" }}
386 = {{ sha256 = "{sha}" }}
"#
            ))
            .unwrap()
        }

        fn bin_dir(&self) -> PathBuf {
            self.dir.path().join("bin")
        }
    }

    #[tokio::test]
    async fn installs_downloaded_artifact() {
        let fx = Fixture::muxy();
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v0.0.4/darwin_amd64.zip")
            .with_status(200)
            .with_body(&fx.zip_bytes)
            .create_async()
            .await;

        let table = fx.table(&server.url(), &fx.zip_bytes);
        let descriptor = table.latest().resolve(true);
        let bin_dir = fx.bin_dir();

        let installer = Installer::new(Client::new(), NullReporter);
        let receipt = installer
            .install(InstallRequest::new(&descriptor, "muxy", &bin_dir))
            .await
            .unwrap();

        assert_eq!(receipt.source, ArtifactSource::Download);
        assert_eq!(receipt.installed.len(), 2);
        assert_eq!(receipt.archive_size, fx.zip_bytes.len() as u64);
        assert!(bin_dir.join("muxy").is_file());
        assert!(bin_dir.join("README.md").is_file());
    }

    #[tokio::test]
    async fn corrupted_artifact_aborts_before_placement() {
        let fx = Fixture::muxy();
        let mut server = Server::new_async().await;
        let mut corrupted = fx.zip_bytes.clone();
        let last = corrupted.len() - 1;
        corrupted[last] ^= 0xff;
        let _m = server
            .mock("GET", "/v0.0.4/darwin_386.zip")
            .with_status(200)
            .with_body(&corrupted)
            .create_async()
            .await;

        let table = fx.table(&server.url(), &fx.zip_bytes);
        let descriptor = table.latest().resolve(false);
        let bin_dir = fx.bin_dir();

        let installer = Installer::new(Client::new(), NullReporter);
        let err = installer
            .install(InstallRequest::new(&descriptor, "muxy", &bin_dir))
            .await
            .unwrap_err();

        assert!(matches!(err, InstallError::DigestMismatch { .. }));
        assert!(!bin_dir.exists());
    }

    #[tokio::test]
    async fn http_failure_is_a_download_error() {
        let fx = Fixture::muxy();
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v0.0.4/darwin_amd64.zip")
            .with_status(500)
            .create_async()
            .await;

        let table = fx.table(&server.url(), &fx.zip_bytes);
        let descriptor = table.latest().resolve(true);
        let bin_dir = fx.bin_dir();

        let err = Installer::new(Client::new(), NullReporter)
            .install(InstallRequest::new(&descriptor, "muxy", &bin_dir))
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::Download(_)));
        // The message names the step; the HTTP cause is only in the source chain.
        assert_eq!(err.to_string(), "Download failed");
        assert!(std::error::Error::source(&err).is_some());
        assert!(!bin_dir.exists());
    }

    #[tokio::test]
    async fn second_install_uses_cache() {
        let fx = Fixture::muxy();
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v0.0.4/darwin_amd64.zip")
            .with_status(200)
            .with_body(&fx.zip_bytes)
            .expect(1)
            .create_async()
            .await;

        let table = fx.table(&server.url(), &fx.zip_bytes);
        let descriptor = table.latest().resolve(true);
        let bin_dir = fx.bin_dir();
        let cache_dir = fx.dir.path().join("cache");

        let recorder = Recorder::default();
        let installer =
            Installer::new(Client::new(), recorder.clone()).with_cache(cache_dir.clone());
        let first = installer
            .install(InstallRequest::new(&descriptor, "muxy", &bin_dir))
            .await
            .unwrap();
        assert_eq!(first.source, ArtifactSource::Download);

        let second = installer
            .install(InstallRequest::new(&descriptor, "muxy", &bin_dir))
            .await
            .unwrap();
        assert!(matches!(second.source, ArtifactSource::Cache(_)));
        mock.assert_async().await;

        let messages = recorder.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("info: Using cached artifact"));
    }

    #[tokio::test]
    async fn stale_cache_entry_is_redownloaded() {
        let fx = Fixture::muxy();
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/v0.0.4/darwin_amd64.zip")
            .with_status(200)
            .with_body(&fx.zip_bytes)
            .create_async()
            .await;

        let table = fx.table(&server.url(), &fx.zip_bytes);
        let descriptor = table.latest().resolve(true);
        let cache_dir = fx.dir.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();
        let entry = cache_dir.join(format!("sha256-{}.zip", descriptor.digest.as_str()));
        std::fs::write(&entry, b"rotten").unwrap();

        let recorder = Recorder::default();
        let receipt = Installer::new(Client::new(), recorder.clone())
            .with_cache(cache_dir)
            .install(InstallRequest::new(&descriptor, "muxy", &fx.bin_dir()))
            .await
            .unwrap();

        assert_eq!(receipt.source, ArtifactSource::Download);
        assert!(recorder.messages()[0].starts_with("warning: Cached artifact failed"));
        assert_eq!(std::fs::read(&entry).unwrap(), fx.zip_bytes);
    }

    #[tokio::test]
    async fn local_artifact_is_verified() {
        let fx = Fixture::muxy();
        let local = fx.dir.path().join("darwin_amd64.zip");
        std::fs::write(&local, &fx.zip_bytes).unwrap();

        let table = fx.table("https://unreachable.invalid", &fx.zip_bytes);
        let descriptor = table.latest().resolve(true);
        let bin_dir = fx.bin_dir();

        let receipt = Installer::new(Client::new(), NullReporter)
            .install(InstallRequest::new(&descriptor, "muxy", &bin_dir).with_artifact(&local))
            .await
            .unwrap();
        assert_eq!(receipt.source, ArtifactSource::Local(local.clone()));
        assert!(bin_dir.join("muxy").is_file());

        let other = fx.table("https://unreachable.invalid", b"something else");
        let descriptor = other.latest().resolve(true);
        let err = Installer::new(Client::new(), NullReporter)
            .install(
                InstallRequest::new(&descriptor, "muxy", &fx.dir.path().join("bin2"))
                    .with_artifact(&local),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, InstallError::DigestMismatch { .. }));
        assert!(!fx.dir.path().join("bin2").exists());
    }

    #[tokio::test]
    async fn archive_without_binary_is_an_extraction_failure() {
        let fx = Fixture::new(&[("not-muxy", b"x", 0o755)]);
        let local = fx.dir.path().join("darwin_amd64.zip");
        std::fs::write(&local, &fx.zip_bytes).unwrap();

        let table = fx.table("https://unreachable.invalid", &fx.zip_bytes);
        let descriptor = table.latest().resolve(true);
        let bin_dir = fx.bin_dir();

        let err = Installer::new(Client::new(), NullReporter)
            .install(InstallRequest::new(&descriptor, "muxy", &bin_dir).with_artifact(&local))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            InstallError::Extraction(ExtractError::MissingBinary(_))
        ));
        assert!(!bin_dir.exists());
    }
}
