//! Command handlers

pub mod check;
pub mod template;
pub mod workflow;

use anyhow::Result;

use super::{Cli, Commands};
use crate::config::Config;

/// Dispatch a parsed command line
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Enroll {
            course,
            file,
            section,
            create_section,
            yes,
        } => {
            let config = Config::load(cli.config.as_deref())?;
            let choice = match (section, create_section) {
                (Some(id), _) => workflow::TargetChoice::Existing(id),
                (None, Some(name)) => workflow::TargetChoice::Create(name),
                (None, None) => workflow::TargetChoice::Prompt,
            };
            workflow::handle_enroll(&config, course, &file, choice, yes).await
        }
        Commands::Sections { course, file, yes } => {
            let config = Config::load(cli.config.as_deref())?;
            workflow::handle_sections(&config, course, &file, yes).await
        }
        Commands::Check { kind, file } => check::handle_check(kind, &file),
        Commands::Template { kind, output } => template::handle_template(kind, output.as_deref()),
    }
}
