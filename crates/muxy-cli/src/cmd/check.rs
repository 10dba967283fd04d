//! Check command

use anyhow::{Context, Result};
use muxy_core::FormulaTable;
use std::path::Path;

use crate::ui::Output;

/// Validate a formula table file.
pub fn check(path: &Path, output: Output) -> Result<()> {
    let table = FormulaTable::load(path)
        .with_context(|| format!("Invalid formula table {}", path.display()))?;

    output.success("Formula table is valid");
    let package = table.package();
    println!("  Name: {}", package.name);
    println!("  Binary: {}", package.binary);
    println!("  URL: {}", package.url_template);
    let versions: Vec<&str> = table.versions().iter().map(|v| v.as_str()).collect();
    println!("  Releases: {}", versions.join(", "));

    if package.homepage.is_empty() {
        output.warning("No homepage defined");
    }
    Ok(())
}
