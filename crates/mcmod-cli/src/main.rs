//! mcmod - artifact acquisition CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use mcmod_cli::cmd;
use mcmod_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never tear the status line on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            source,
            target,
            jobs,
            cache_dir,
            extension,
            prefix,
        } => {
            let options = cmd::fetch::FetchOptions {
                jobs,
                cache_dir,
                extension,
                prefix,
            };
            cmd::fetch::fetch(&source, &target, options).await
        }
        Commands::Dump { source, json } => cmd::dump::dump(&source, json).await,
        Commands::Hash { algorithm, files } => cmd::hash::hash(&files, algorithm),
    }
}
