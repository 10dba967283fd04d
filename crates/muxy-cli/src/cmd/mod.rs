//! Command implementations.

pub mod check;
pub mod hash;
pub mod install;
pub mod list;
pub mod resolve;
pub mod test;
pub mod verify;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use muxy_core::FormulaTable;
use muxy_core::formula::{HostRequirement, PackageMeta};
use muxy_schema::Arch;

/// Load the table from `--table`, or the built-in one.
pub fn load_table(path: Option<&Path>) -> Result<FormulaTable> {
    FormulaTable::load_or_builtin(path).with_context(|| match path {
        Some(p) => format!("Invalid formula table {}", p.display()),
        None => "Built-in formula table is invalid".to_string(),
    })
}

/// Pick the architecture variant for this run.
///
/// An explicit `--arch` wins. Otherwise `host` (an architecture name such as
/// `std::env::consts::ARCH`) must satisfy the package's CPU requirement and
/// the variant follows the host word size.
pub fn select_arch(explicit: Option<Arch>, package: &PackageMeta, host: &str) -> Result<Arch> {
    if let Some(arch) = explicit {
        return Ok(arch);
    }
    if package.requires == Some(HostRequirement::Intel) {
        if let Err(host) = Arch::check_intel(host) {
            anyhow::bail!(
                "{} requires an Intel host (detected {host}); pass --arch amd64 or --arch 386 to override",
                package.name
            );
        }
    }
    Ok(Arch::host_word_size())
}

/// `--bin-dir`, or `~/.muxy-formula/bin`.
pub fn bin_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(dir) => Ok(dir),
        None => muxy_core::bin_path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNRESTRICTED: &str = r#"
[package]
name = "muxy"
url = "https://example.com/v{version}/{tag}.zip"

[tags]
amd64 = "darwin_amd64"
386 = "darwin_386"

[[release]]
version = "1.0.0"
amd64 = { sha1 = "a9993e364706816aba3e25717850c26c9cd0d89d" }
386 = { sha1 = "a9993e364706816aba3e25717850c26c9cd0d89d" }
"#;

    #[test]
    fn intel_requirement_refuses_other_hosts() {
        let table = FormulaTable::builtin().unwrap();
        let err = select_arch(None, table.package(), "aarch64").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("requires an Intel host"));
        assert!(msg.contains("aarch64"));
    }

    #[test]
    fn intel_requirement_accepts_intel_hosts() {
        let table = FormulaTable::builtin().unwrap();
        for host in ["x86_64", "x86"] {
            assert_eq!(
                select_arch(None, table.package(), host).unwrap(),
                Arch::host_word_size()
            );
        }
    }

    #[test]
    fn explicit_arch_skips_the_host_check() {
        let table = FormulaTable::builtin().unwrap();
        assert_eq!(
            select_arch(Some(Arch::I386), table.package(), "aarch64").unwrap(),
            Arch::I386
        );
    }

    #[test]
    fn unrestricted_package_allows_any_host() {
        let table = FormulaTable::parse(UNRESTRICTED).unwrap();
        assert!(select_arch(None, table.package(), "aarch64").is_ok());
    }
}
