//! Install command

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use muxy_core::install::ArtifactSource;
use muxy_core::{InstallRequest, Installer};
use muxy_schema::Arch;
use std::path::{Path, PathBuf};

use crate::ui::{Output, format_size};

/// Options for a single install run.
#[derive(Debug, Default)]
pub struct InstallOptions {
    pub version: Option<String>,
    pub arch: Option<Arch>,
    pub artifact: Option<PathBuf>,
    pub bin_dir: Option<PathBuf>,
    pub no_cache: bool,
    pub dry_run: bool,
}

/// Resolve, fetch, verify and place a release.
pub async fn install(table: Option<&Path>, opts: InstallOptions, output: Output) -> Result<()> {
    let table = super::load_table(table)?;
    let formula = table.formula(opts.version.as_deref())?;
    let package = formula.package();
    let arch = super::select_arch(opts.arch, package, std::env::consts::ARCH)?;
    let descriptor = formula.resolve_arch(arch);
    let bin_dir = super::bin_dir(opts.bin_dir)?;

    if opts.dry_run {
        output.info(&format!(
            "Would install {} {} ({}) into {}",
            descriptor.name,
            descriptor.version,
            descriptor.arch,
            bin_dir.display()
        ));
        match &opts.artifact {
            Some(path) => output.info(&format!("  from {}", path.display())),
            None => output.info(&format!("  from {}", descriptor.url)),
        }
        output.info(&format!("  expecting {}", descriptor.digest));
        return Ok(());
    }

    let client = reqwest::Client::builder()
        .user_agent(muxy_core::USER_AGENT)
        .build()
        .context("Failed to build HTTP client")?;

    let mut installer = Installer::new(client, output);
    if !opts.no_cache {
        installer = installer.with_cache(muxy_core::cache_path()?);
    }

    let mut request = InstallRequest::new(&descriptor, &package.binary, &bin_dir);
    if let Some(path) = opts.artifact.as_deref() {
        request = request.with_artifact(path);
    }

    let receipt = installer.install(request).await?;

    let origin = match &receipt.source {
        ArtifactSource::Download => "downloaded".to_string(),
        ArtifactSource::Cache(_) => "from cache".to_string(),
        ArtifactSource::Local(path) => format!("from {}", path.display()),
    };
    output.success(&format!(
        "Installed {} {} ({}, {} {origin})",
        descriptor.name,
        descriptor.version,
        descriptor.arch,
        format_size(receipt.archive_size)
    ));
    if !output.is_quiet() {
        for path in &receipt.installed {
            eprintln!("    {}", path.display().to_string().dark_grey());
        }
    }

    if !on_path(&bin_dir) {
        output.warning(&format!(
            "{} is not on PATH; add it to run {} directly",
            bin_dir.display(),
            package.binary
        ));
    }
    Ok(())
}

fn on_path(dir: &Path) -> bool {
    std::env::var_os("PATH")
        .is_some_and(|paths| std::env::split_paths(&paths).any(|p| p == dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_dir_on_path() {
        let dir = std::env::temp_dir();
        let paths = std::env::var_os("PATH").unwrap_or_default();
        let on = std::env::split_paths(&paths).any(|p| p == dir);
        assert_eq!(on_path(&dir), on);
        assert!(!on_path(Path::new("/definitely/not/on/path")));
    }
}
