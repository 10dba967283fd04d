//! Resolve command

use anyhow::Result;
use crossterm::style::Stylize;
use muxy_schema::Arch;
use std::path::Path;

/// Print the descriptor for a release and architecture.
///
/// Without `--arch` the variant follows the word size of this build.
pub fn resolve(
    table: Option<&Path>,
    version: Option<&str>,
    arch: Option<Arch>,
    json: bool,
) -> Result<()> {
    let table = super::load_table(table)?;
    let formula = table.formula(version)?;
    let descriptor = match arch {
        Some(arch) => formula.resolve_arch(arch),
        None => formula.resolve(Arch::host_word_size().is_64_bit()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&descriptor)?);
        return Ok(());
    }

    let lw = 10;
    println!(
        "  {} {} {}",
        descriptor.name.as_str().white().bold(),
        descriptor.version.as_str().dark_grey(),
        format!("({})", descriptor.arch).dark_grey()
    );
    println!("  {:<lw$}{}", "url", descriptor.url);
    println!(
        "  {:<lw$}{}",
        descriptor.digest.algorithm().as_str(),
        descriptor.digest.as_str()
    );
    Ok(())
}
