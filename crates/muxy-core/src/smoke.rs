//! Post-install self-test: run the installed binary and expect exit 0.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmokeTestError {
    #[error("{0} is not installed")]
    NotInstalled(PathBuf),

    #[error("Failed to run {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} exited with {status}: {stderr}")]
    Failed {
        path: PathBuf,
        status: std::process::ExitStatus,
        stderr: String,
    },
}

/// Run `binary` with `args`; returns trimmed stdout on success.
pub fn smoke_test(binary: &Path, args: &[String]) -> Result<String, SmokeTestError> {
    if !binary.is_file() {
        return Err(SmokeTestError::NotInstalled(binary.to_path_buf()));
    }

    tracing::debug!(binary = %binary.display(), ?args, "running smoke test");
    let output = Command::new(binary)
        .args(args)
        .output()
        .map_err(|source| SmokeTestError::Spawn {
            path: binary.to_path_buf(),
            source,
        })?;

    if !output.status.success() {
        return Err(SmokeTestError::Failed {
            path: binary.to_path_buf(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
