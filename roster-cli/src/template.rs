//! Downloadable CSV templates
//!
//! Generated from each feature's required headers so the template can never
//! drift from what the schema validator expects.

use anyhow::{Context, Result};
use csv::Writer;
use std::path::Path;

use crate::features::Feature;

/// The template file contents: header row plus one sample row
pub fn template_csv<F: Feature>() -> Result<String> {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(F::REQUIRED_HEADERS)
        .context("Failed to write template header")?;
    wtr.write_record(F::SAMPLE_ROW)
        .context("Failed to write template sample row")?;

    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to finish template: {}", e.error()))?;
    String::from_utf8(bytes).context("Template is not valid UTF-8")
}

/// Write the template to a file
pub fn write_template<F: Feature>(path: &Path) -> Result<()> {
    let contents = template_csv::<F>()?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write template: {}", path.display()))?;
    log::info!("{} template written to {}", F::TITLE, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{Enrollments, LocalOutcome, Sections, validate_file};

    #[test]
    fn test_enrollment_template() {
        assert_eq!(
            template_csv::<Enrollments>().unwrap(),
            "LOGIN_ID,ROLE\nstudentone,student\n"
        );
    }

    #[test]
    fn test_section_template() {
        assert_eq!(
            template_csv::<Sections>().unwrap(),
            "SECTION_NAME\nSection 001\n"
        );
    }

    #[test]
    fn test_templates_pass_validation() {
        let enrollments = template_csv::<Enrollments>().unwrap();
        assert!(matches!(
            validate_file::<Enrollments>(enrollments.as_bytes()),
            LocalOutcome::Valid { .. }
        ));

        let sections = template_csv::<Sections>().unwrap();
        assert!(matches!(
            validate_file::<Sections>(sections.as_bytes()),
            LocalOutcome::Valid { .. }
        ));
    }

    #[test]
    fn test_write_template() {
        let path = std::env::temp_dir().join(format!(
            "roster-cli-{}-{}",
            std::process::id(),
            Sections::TEMPLATE_FILE_NAME
        ));
        write_template::<Sections>(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(written.starts_with("SECTION_NAME\n"));
    }
}
