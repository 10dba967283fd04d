//! Console output and progress reporting.
//!
//! Status lines go to stderr so stdout stays clean for machine-readable
//! output (`resolve --json`, `hash`).

use crossterm::style::Stylize;
use muxy_core::Reporter;
use muxy_schema::{PackageName, Version};

/// A cheap, copyable handle for user-facing messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    quiet: bool,
}

impl Output {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn info(&self, msg: &str) {
        if !self.quiet {
            eprintln!("  {} {msg}", "•".dark_grey());
        }
    }

    pub fn success(&self, msg: &str) {
        if !self.quiet {
            eprintln!("  {} {msg}", "✓".green());
        }
    }

    pub fn warning(&self, msg: &str) {
        eprintln!("  {} {msg}", "!".yellow());
    }

    fn status(&self, name: &PackageName, version: &Version, status: &str) {
        if !self.quiet {
            eprintln!(
                "  {} {} {}",
                name.as_str().white().bold(),
                version.as_str().dark_grey(),
                status
            );
        }
    }
}

impl Reporter for Output {
    fn downloading(&self, name: &PackageName, version: &Version, current: u64, total: Option<u64>) {
        // One line per download; byte-level progress goes to the trace log.
        if current == 0 {
            let size = total.map(format_size).unwrap_or_default();
            let line = format!("downloading {size}");
            self.status(name, version, line.trim_end());
        } else {
            tracing::trace!(%name, current, ?total, "download progress");
        }
    }

    fn verifying(&self, name: &PackageName, version: &Version) {
        self.status(name, version, "verifying");
    }

    fn extracting(&self, name: &PackageName, version: &Version) {
        self.status(name, version, "extracting");
    }

    fn installing(&self, name: &PackageName, version: &Version) {
        self.status(name, version, "installing");
    }

    fn done(&self, name: &PackageName, version: &Version, detail: &str, size: Option<u64>) {
        let size = size.map(format_size).unwrap_or_default();
        let line = format!("{} {detail} {size}", "done".green());
        self.status(name, version, line.trim_end());
    }

    fn failed(&self, name: &PackageName, version: &Version, reason: &str) {
        eprintln!(
            "  {} {} {} {reason}",
            name.as_str().white().bold(),
            version.as_str().dark_grey(),
            "failed".red()
        );
    }

    fn info(&self, msg: &str) {
        Output::info(self, msg);
    }

    fn warning(&self, msg: &str) {
        Output::warning(self, msg);
    }
}

/// Human-readable byte size (e.g. `4.2 MB`).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}
