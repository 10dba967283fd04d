//! List command

use anyhow::Result;
use crossterm::style::Stylize;
use muxy_schema::Arch;
use std::path::Path;

/// List every release in the table, newest first.
pub fn list(table: Option<&Path>) -> Result<()> {
    let table = super::load_table(table)?;
    let package = table.package();

    println!();
    println!("  {}", package.name.as_str().white().bold());
    if !package.description.is_empty() {
        println!("  {}", package.description);
    }
    if !package.homepage.is_empty() {
        println!("  {}", package.homepage.as_str().dark_grey());
    }
    println!();

    let latest = table.latest().version().clone();
    for release in table.releases().iter().rev() {
        let marker = if release.version == latest {
            " (latest)".green().to_string()
        } else {
            String::new()
        };
        println!("  {}{marker}", release.version.as_str().bold());
        for arch in Arch::ALL {
            let checksum = release.checksum(arch);
            println!(
                "    {:<14}{:<8}{}",
                package.tag(arch),
                checksum.algorithm().as_str(),
                checksum.as_str().dark_grey()
            );
        }
    }
    println!();
    Ok(())
}
