//! Verify command

use anyhow::{Context, Result};
use muxy_core::io::download::{DownloadError, verify_file};
use muxy_schema::Checksum;
use std::path::Path;

use crate::ui::Output;

/// Check a local file against an expected digest.
pub fn verify(file: &Path, digest: &str, output: Output) -> Result<()> {
    let expected: Checksum = digest
        .parse()
        .with_context(|| format!("Invalid digest '{digest}'"))?;

    match verify_file(file, &expected) {
        Ok(_) => {
            output.success(&format!("{} matches {expected}", file.display()));
            Ok(())
        }
        Err(DownloadError::HashMismatch { expected, actual }) => {
            anyhow::bail!(
                "Digest mismatch for {}: expected {expected}, got {}:{actual}",
                file.display(),
                expected.algorithm()
            )
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", file.display())),
    }
}
