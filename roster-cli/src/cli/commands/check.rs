//! `check`: local validation only

use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use crate::cli::FeatureKind;
use crate::cli::render;
use crate::features::{self, Enrollments, Feature, LocalOutcome, Sections};

pub fn handle_check(kind: FeatureKind, file: &Path) -> Result<()> {
    let bytes = std::fs::read(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;

    match kind {
        FeatureKind::Enrollments => check::<Enrollments>(&bytes),
        FeatureKind::Sections => check::<Sections>(&bytes),
    }
}

fn check<F: Feature>(bytes: &[u8]) -> Result<()> {
    match features::validate_file::<F>(bytes) {
        LocalOutcome::SchemaInvalid(invalidations) => {
            println!("{}", "The file could not be used:".red().bold());
            render::render_invalidations(&invalidations);
            anyhow::bail!("{} schema problems", invalidations.len());
        }
        LocalOutcome::RowInvalid {
            invalidations,
            skipped_rows,
        } => {
            render::render_invalidations(&invalidations);
            render::render_skipped(&skipped_rows);
            anyhow::bail!("{} row problems", invalidations.len());
        }
        LocalOutcome::Valid {
            records,
            skipped_rows,
        } => {
            render::render_skipped(&skipped_rows);
            println!(
                "{} {} rows ready for {}",
                "✓".bright_green().bold(),
                records.len(),
                F::TITLE.to_lowercase()
            );
            Ok(())
        }
    }
}
