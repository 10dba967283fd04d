//! All-or-nothing placement of extracted files into the binary directory.
//!
//! Files are first copied into a hidden staging directory created inside the
//! target directory, so the final step is a same-filesystem rename per file.
//! If any rename fails, files already moved are removed and anything they
//! replaced is put back.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::io::extract::ExtractedFile;

#[derive(Error, Debug)]
pub enum PlaceError {
    #[error("Failed to place {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Refusing to replace directory {0}")]
    TargetIsDirectory(PathBuf),
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PlaceError + '_ {
    move |source| PlaceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Copy every extracted file into `bin_dir`, keeping relative paths.
///
/// `binary` is forced executable. Returns the installed paths. On failure,
/// directories created for `bin_dir` itself are removed again.
pub fn place_files(
    files: &[ExtractedFile],
    bin_dir: &Path,
    binary: &str,
) -> Result<Vec<PathBuf>, PlaceError> {
    let created = create_missing_dirs(bin_dir)?;

    let result = stage_and_commit(files, bin_dir, binary);
    if result.is_err() {
        for dir in created.iter().rev() {
            fs::remove_dir(dir).ok();
        }
    }
    result
}

/// Create `dir` and any missing ancestors, returning those created, outermost first.
fn create_missing_dirs(dir: &Path) -> Result<Vec<PathBuf>, PlaceError> {
    let mut missing = Vec::new();
    let mut current = dir;
    while !current.exists() {
        missing.push(current.to_path_buf());
        match current.parent() {
            Some(p) => current = p,
            None => break,
        }
    }
    missing.reverse();

    let mut created = Vec::with_capacity(missing.len());
    for dir in missing {
        if let Err(e) = fs::create_dir(&dir) {
            for done in created.iter().rev() {
                fs::remove_dir(done).ok();
            }
            return Err(io_err(&dir)(e));
        }
        created.push(dir);
    }
    Ok(created)
}

fn stage_and_commit(
    files: &[ExtractedFile],
    bin_dir: &Path,
    binary: &str,
) -> Result<Vec<PathBuf>, PlaceError> {
    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(bin_dir)
        .map_err(io_err(bin_dir))?;
    let new_root = staging.path().join("new");

    let mut staged = Vec::with_capacity(files.len());
    for file in files {
        let src = new_root.join(&file.relative_path);
        if let Some(parent) = src.parent() {
            fs::create_dir_all(parent).map_err(io_err(parent))?;
        }
        fs::copy(&file.absolute_path, &src).map_err(io_err(&file.absolute_path))?;
        if file.relative_path == Path::new(binary) {
            make_executable(&src)?;
        }
        staged.push((src, bin_dir.join(&file.relative_path)));
    }

    let mut tx = Transaction {
        backup_root: staging.path().join("old"),
        placed: Vec::new(),
        backups: Vec::new(),
        created_dirs: Vec::new(),
    };

    for (src, target) in &staged {
        if let Err(e) = tx.commit(src, target) {
            tracing::warn!(path = %target.display(), error = %e, "placement failed, rolling back");
            tx.rollback();
            return Err(e);
        }
    }

    tracing::debug!(count = staged.len(), bin_dir = %bin_dir.display(), "files placed");
    Ok(staged.into_iter().map(|(_, target)| target).collect())
}

struct Transaction {
    backup_root: PathBuf,
    placed: Vec<PathBuf>,
    backups: Vec<(PathBuf, PathBuf)>,
    created_dirs: Vec<PathBuf>,
}

impl Transaction {
    fn commit(&mut self, src: &Path, target: &Path) -> Result<(), PlaceError> {
        if target.is_dir() {
            return Err(PlaceError::TargetIsDirectory(target.to_path_buf()));
        }

        if let Some(parent) = target.parent() {
            let created = create_missing_dirs(parent)?;
            self.created_dirs.extend(created);
        }

        if fs::symlink_metadata(target).is_ok() {
            fs::create_dir_all(&self.backup_root).map_err(io_err(&self.backup_root))?;
            let backup = self.backup_root.join(self.backups.len().to_string());
            fs::rename(target, &backup).map_err(io_err(target))?;
            self.backups.push((backup, target.to_path_buf()));
        }

        fs::rename(src, target).map_err(io_err(target))?;
        self.placed.push(target.to_path_buf());
        Ok(())
    }

    fn rollback(self) {
        for path in self.placed.iter().rev() {
            fs::remove_file(path).ok();
        }
        for (backup, original) in self.backups.iter().rev() {
            fs::rename(backup, original).ok();
        }
        for dir in self.created_dirs.iter().rev() {
            fs::remove_dir(dir).ok();
        }
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), PlaceError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(io_err(path))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), PlaceError> {
    Ok(())
}
