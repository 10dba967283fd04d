//! muxy-formula - installer for prebuilt muxy releases
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! Resolves the release artifact for the host, downloads it, verifies its
//! digest and copies the archive contents into a binary directory.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.muxy-formula/
//! ├── bin/        # Installed executables
//! └── cache/      # Verified archives (by digest)
//! ```

pub mod cmd;
pub mod ui;

use clap::{Parser, Subcommand};
use muxy_schema::{Arch, DigestAlgorithm};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "muxy-formula")]
#[command(author, version = env!("MUXY_FORMULA_VERSION"), about = "Install prebuilt muxy releases")]
pub struct Cli {
    /// Formula table to use instead of the built-in one
    #[arg(long, global = true, env = "MUXY_FORMULA_TABLE")]
    pub table: Option<PathBuf>,

    /// Show what would happen without making changes
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the download URL and digest for a release
    Resolve {
        /// Release version (default: latest)
        #[arg(long)]
        version: Option<String>,
        /// Architecture variant (amd64 or 386; default: host word size)
        #[arg(long)]
        arch: Option<Arch>,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
    /// Download, verify and install a release
    Install {
        /// Release version (default: latest)
        #[arg(long)]
        version: Option<String>,
        /// Architecture variant; skips the host CPU check
        #[arg(long)]
        arch: Option<Arch>,
        /// Install from a local archive instead of downloading
        #[arg(long)]
        artifact: Option<PathBuf>,
        /// Destination directory (default: ~/.muxy-formula/bin)
        #[arg(long, env = "MUXY_FORMULA_BIN")]
        bin_dir: Option<PathBuf>,
        /// Do not read or write the download cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Run the installed binary's self-test
    Test {
        /// Directory holding the installed binary
        #[arg(long, env = "MUXY_FORMULA_BIN")]
        bin_dir: Option<PathBuf>,
    },
    /// List releases in the formula table
    List,
    /// Validate a formula table file
    Check {
        /// Table file to check
        path: PathBuf,
    },
    /// Compute digests of files (for formula authoring)
    Hash {
        /// Digest algorithm
        #[arg(long, short, default_value = "sha256")]
        algorithm: DigestAlgorithm,
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Check a file against an expected digest (sha1:<hex>, sha256:<hex> or bare hex)
    Verify {
        /// File to check
        file: PathBuf,
        /// Expected digest
        digest: String,
    },
}
