mod aggregate;
mod auth;
mod cli;
mod config;
mod dashboard;
mod error;
mod history;
mod model;
mod notify;
mod ordering;
mod output;
mod providers;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use log::info;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    output::print_banner();

    let cli = Cli::parse();
    info!("Starting ciradiator - CI pipeline radiator");
    cli.execute().await?;

    Ok(())
}
