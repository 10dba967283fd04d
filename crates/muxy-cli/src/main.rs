//! muxy-formula - installer for prebuilt muxy releases

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use muxy_cli::cmd;
use muxy_cli::cmd::install::InstallOptions;
use muxy_cli::ui::Output;
use muxy_cli::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output::new(cli.quiet);
    let table = cli.table.as_deref();

    match cli.command {
        Commands::Resolve {
            version,
            arch,
            json,
        } => cmd::resolve::resolve(table, version.as_deref(), arch, json),
        Commands::Install {
            version,
            arch,
            artifact,
            bin_dir,
            no_cache,
        } => {
            let opts = InstallOptions {
                version,
                arch,
                artifact,
                bin_dir,
                no_cache,
                dry_run: cli.dry_run,
            };
            cmd::install::install(table, opts, output).await
        }
        Commands::Test { bin_dir } => cmd::test::test(table, bin_dir, output),
        Commands::List => cmd::list::list(table),
        Commands::Check { path } => cmd::check::check(&path, output),
        Commands::Hash { algorithm, files } => cmd::hash::hash(&files, algorithm),
        Commands::Verify { file, digest } => cmd::verify::verify(&file, &digest, output),
    }
}
