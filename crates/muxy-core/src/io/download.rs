//! Download and verification.
//!
//! Bytes are hashed while they stream to disk, so verification costs no
//! second pass. A file that fails verification is removed before the error
//! is returned.

use std::io::Read;
use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::Reporter;
use crate::types::{Checksum, DigestAlgorithm, ReleaseDescriptor};

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: Checksum, actual: String },
}

/// Request for a download operation
pub struct DownloadRequest<'a, R: Reporter> {
    pub client: &'a Client,
    pub descriptor: &'a ReleaseDescriptor,
    pub dest: &'a Path,
    pub reporter: &'a R,
}

impl<'a, R: Reporter> DownloadRequest<'a, R> {
    pub fn new(
        client: &'a Client,
        descriptor: &'a ReleaseDescriptor,
        dest: &'a Path,
        reporter: &'a R,
    ) -> Self {
        Self {
            client,
            descriptor,
            dest,
            reporter,
        }
    }

    /// Fetch `descriptor.url` into `dest` and verify it. Returns the byte count.
    pub async fn execute(self) -> Result<u64, DownloadError> {
        download_and_verify(self).await
    }
}

/// Stream `url` to disk while hashing, then compare against the expected digest.
pub async fn download_and_verify<R: Reporter>(
    req: DownloadRequest<'_, R>,
) -> Result<u64, DownloadError> {
    let DownloadRequest {
        client,
        descriptor,
        dest,
        reporter,
    } = req;
    let name = &descriptor.name;
    let version = &descriptor.version;

    tracing::debug!(url = %descriptor.url, dest = %dest.display(), "downloading artifact");

    let response = client
        .get(&descriptor.url)
        .header(reqwest::header::USER_AGENT, crate::USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let total_size = response.content_length();
    reporter.downloading(name, version, 0, total_size);

    let mut file = File::create(dest).await?;
    let mut stream = response.bytes_stream();
    let mut hasher = descriptor.digest.algorithm().hasher();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        hasher.update(&chunk);
        downloaded += chunk.len() as u64;
        reporter.downloading(name, version, downloaded, total_size);
    }

    file.flush().await?;
    drop(file);

    reporter.verifying(name, version);
    let actual_hash = hasher.finalize_hex();

    if !descriptor.digest.matches(&actual_hash) {
        reporter.failed(name, version, "hash mismatch");
        tokio::fs::remove_file(dest).await.ok();
        return Err(DownloadError::HashMismatch {
            expected: descriptor.digest.clone(),
            actual: actual_hash,
        });
    }

    tracing::debug!(bytes = downloaded, digest = %descriptor.digest, "artifact verified");
    Ok(downloaded)
}

/// Hash a file on disk (streaming, 64KB buffer).
pub fn hash_file(path: &Path, algorithm: DigestAlgorithm) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = algorithm.hasher();
    let mut buffer = [0u8; 65536];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize_hex())
}

/// Check a local file against an expected digest. Returns the computed hex.
pub fn verify_file(path: &Path, expected: &Checksum) -> Result<String, DownloadError> {
    let actual = hash_file(path, expected.algorithm())?;
    if expected.matches(&actual) {
        Ok(actual)
    } else {
        Err(DownloadError::HashMismatch {
            expected: expected.clone(),
            actual,
        })
    }
}
