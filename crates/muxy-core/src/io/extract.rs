//! Archive extraction module
//!
//! Release artifacts are zip archives holding the executable at their root.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Invalid path in archive: {0}")]
    UnsafePath(String),

    #[error("Archive does not contain '{0}'")]
    MissingBinary(String),
}

/// Information about an extracted file
#[derive(Debug, Clone)]
pub struct ExtractedFile {
    /// Path relative to extraction root
    pub relative_path: PathBuf,
    /// Absolute path on disk
    pub absolute_path: PathBuf,
}

/// Extract a zip archive into `dest_dir`, returning the regular files written.
///
/// Entries whose names would escape `dest_dir` abort the whole extraction.
pub fn extract_zip(
    archive_path: &Path,
    dest_dir: &Path,
) -> Result<Vec<ExtractedFile>, ExtractError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    fs::create_dir_all(dest_dir)?;
    let mut extracted_files = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(relative_path) = file.enclosed_name().map(|p| p.to_path_buf()) else {
            return Err(ExtractError::UnsafePath(file.name().to_string()));
        };

        if file.is_dir() {
            fs::create_dir_all(dest_dir.join(&relative_path))?;
            continue;
        }

        let absolute_path = dest_dir.join(&relative_path);
        if let Some(p) = absolute_path.parent() {
            fs::create_dir_all(p)?;
        }

        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut file, &mut outfile)?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode & 0o7777))?;
        }

        extracted_files.push(ExtractedFile {
            relative_path,
            absolute_path,
        });
    }

    tracing::debug!(
        archive = %archive_path.display(),
        files = extracted_files.len(),
        "extracted archive"
    );
    Ok(extracted_files)
}

/// Ensure the declared executable is among the extracted files.
pub fn require_binary<'a>(
    files: &'a [ExtractedFile],
    binary: &str,
) -> Result<&'a ExtractedFile, ExtractError> {
    files
        .iter()
        .find(|f| f.relative_path == Path::new(binary))
        .ok_or_else(|| ExtractError::MissingBinary(binary.to_string()))
}
