//! Terminal rendering for workflow state

use colored::*;

use crate::api::Target;
use crate::features::Feature;
use crate::submitter::SubmitError;
use crate::validation::{Invalidation, InvalidationType};
use crate::workflow::{ConfirmationReport, UploadState, ValidatedBatch, WorkflowStep};

pub fn render_step(step: WorkflowStep) {
    println!(
        "{} {}",
        format!("[{}/4]", step.number()).dimmed(),
        step.label().bold()
    );
}

fn severity(kind: InvalidationType) -> ColoredString {
    match kind {
        InvalidationType::Error => kind.label().red().bold(),
        InvalidationType::Warning => kind.label().yellow().bold(),
    }
}

/// Print invalidations as a row / severity / message table
pub fn render_invalidations(invalidations: &[Invalidation]) {
    for inv in invalidations {
        let row = inv
            .row_number
            .map(|r| format!("Row {}", r))
            .unwrap_or_else(|| "File".to_string());
        println!("  {:<8} {:<8} {}", row.cyan(), severity(inv.kind), inv.message);
    }
}

pub fn render_skipped(skipped_rows: &[usize]) {
    if skipped_rows.is_empty() {
        return;
    }
    let rows: Vec<String> = skipped_rows.iter().map(|r| r.to_string()).collect();
    println!(
        "{} Skipped {} rows with missing values: {}",
        "note:".yellow(),
        skipped_rows.len(),
        rows.join(", ")
    );
}

/// Show why an upload did not make it to review
pub fn render_upload(upload: &UploadState) {
    if let Some(name) = &upload.file_name {
        println!("File: {}", name.cyan());
    }
    if !upload.schema_invalidations.is_empty() {
        println!("{}", "The file could not be used:".red().bold());
        render_invalidations(&upload.schema_invalidations);
    }
    if !upload.row_invalidations.is_empty() {
        println!(
            "{}",
            format!("{} problems found:", upload.row_invalidations.len())
                .red()
                .bold()
        );
        render_invalidations(&upload.row_invalidations);
    }
    render_skipped(&upload.skipped_rows);
}

/// The confirmation table: one line per record, in file order
pub fn render_review<F: Feature>(batch: &ValidatedBatch<F::Record>, warnings: &[Invalidation]) {
    use crate::validation::RecordShape;

    println!(
        "{} {} records into {}",
        F::TITLE.bold(),
        batch.len(),
        batch.target.name.bright_green()
    );

    let widths: Vec<usize> = F::REQUIRED_HEADERS
        .iter()
        .map(|header| {
            batch
                .records
                .iter()
                .filter_map(|r| r.record.field(header))
                .map(|v| v.chars().count())
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = F::REQUIRED_HEADERS
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:<w$}", h, w = *w))
        .collect();
    println!("  {:<5} {}", "Row".bold(), header.join("  ").bold());

    for numbered in &batch.records {
        let cells: Vec<String> = F::REQUIRED_HEADERS
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{:<w$}", numbered.record.field(h).unwrap_or(""), w = *w))
            .collect();
        println!("  {:<5} {}", numbered.row_number, cells.join("  "));
    }

    if !warnings.is_empty() {
        println!();
        render_invalidations(warnings);
    }
}

pub fn render_submit_error(title: &str, error: &SubmitError, created: &[Target]) {
    println!("{} {}", format!("{} failed:", title).red().bold(), error);
    for row in &error.rows {
        let location = match (row.row_number, &row.input) {
            (Some(n), _) => format!("Row {}", n),
            (None, Some(input)) => format!("\"{}\"", input),
            (None, None) => "-".to_string(),
        };
        println!("  {:<8} {}", location.cyan(), row.message);
    }
    if !created.is_empty() {
        let names: Vec<&str> = created.iter().map(|t| t.name.as_str()).collect();
        println!(
            "{} {} were created before the failure: {}",
            "note:".yellow(),
            created.len(),
            names.join(", ")
        );
    }
    println!("Fix the file and upload it again.");
}

pub fn render_confirmation(report: &ConfirmationReport) {
    println!(
        "{} Submitted {} records to {}",
        "✓".bright_green().bold(),
        report.submitted,
        report.target_name.bright_green()
    );
    for target in &report.created {
        println!("  created {} ({})", target.name, target.id.to_string().dimmed());
    }
}

/// Label for a target in the selection prompt
pub fn target_label(target: &Target) -> String {
    match target.total_students {
        Some(count) => format!("{} ({} students)", target.name, count),
        None => target.name.clone(),
    }
}
