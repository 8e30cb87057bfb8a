mod api;
mod cli;
mod config;
mod csv_parser;
mod features;
mod submitter;
mod template;
mod validation;
mod workflow;

use anyhow::Result;
use clap::Parser;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    log::debug!("roster-cli {}", env!("CARGO_PKG_VERSION"));
    cli::commands::run(cli).await
}
