//! leadgen CLI — run and inspect lead-generation campaigns.
//!
//! Each invocation restores the named campaign from the local database,
//! applies one command, and writes the result back.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
