//! Hash command

use anyhow::{Context, Result};
use muxy_core::io::download::hash_file;
use muxy_schema::DigestAlgorithm;
use std::path::PathBuf;

/// Print `<hex> <path>` for each file.
pub fn hash(files: &[PathBuf], algorithm: DigestAlgorithm) -> Result<()> {
    for file in files {
        let hash = hash_file(file, algorithm)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        println!("{hash}  {}", file.display());
    }
    Ok(())
}
