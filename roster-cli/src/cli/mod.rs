//! Command-line interface

pub mod commands;
pub mod render;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "roster-cli")]
#[command(version)]
#[command(about = "Bulk-modify a course roster from a CSV file")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.config/roster-cli/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add users to a section of a course
    Enroll {
        /// Course id
        #[arg(long)]
        course: u64,

        /// CSV file with LOGIN_ID and ROLE columns
        #[arg(short, long)]
        file: PathBuf,

        /// Section id to enroll into (prompted when omitted)
        #[arg(long, conflicts_with = "create_section")]
        section: Option<u64>,

        /// Create a new section with this name and enroll into it
        #[arg(long)]
        create_section: Option<String>,

        /// Submit without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Create sections in a course
    Sections {
        /// Course id
        #[arg(long)]
        course: u64,

        /// CSV file with a SECTION_NAME column
        #[arg(short, long)]
        file: PathBuf,

        /// Submit without asking for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Validate a file locally without contacting the server
    Check {
        #[arg(value_enum)]
        kind: FeatureKind,

        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print or save the CSV template for a feature
    Template {
        #[arg(value_enum)]
        kind: FeatureKind,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Which roster feature a local command applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FeatureKind {
    Enrollments,
    Sections,
}
