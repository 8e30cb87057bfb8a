//! `template`: print or save a CSV template

use anyhow::Result;
use std::path::Path;

use crate::cli::FeatureKind;
use crate::features::{Enrollments, Feature, Sections};
use crate::template::{template_csv, write_template};

pub fn handle_template(kind: FeatureKind, output: Option<&Path>) -> Result<()> {
    match kind {
        FeatureKind::Enrollments => emit::<Enrollments>(output),
        FeatureKind::Sections => emit::<Sections>(output),
    }
}

fn emit<F: Feature>(output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            write_template::<F>(path)?;
            println!("Wrote {}", path.display());
        }
        None => {
            print!("{}", template_csv::<F>()?);
            log::debug!("Suggested file name: {}", F::TEMPLATE_FILE_NAME);
        }
    }
    Ok(())
}
