//! Test command

use anyhow::Result;
use muxy_core::smoke::smoke_test;
use std::path::{Path, PathBuf};

use crate::ui::Output;

/// Run the installed binary with the formula's test arguments.
pub fn test(table: Option<&Path>, bin_dir: Option<PathBuf>, output: Output) -> Result<()> {
    let table = super::load_table(table)?;
    let package = table.package();
    let binary = super::bin_dir(bin_dir)?.join(&package.binary);

    let stdout = smoke_test(&binary, &package.test_args)?;
    output.success(&format!(
        "{} {} exited 0",
        package.binary,
        package.test_args.join(" ")
    ));
    if !stdout.is_empty() {
        println!("{stdout}");
    }
    Ok(())
}
