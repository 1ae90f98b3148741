//! Standalone resolution of an extraction file

use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use serde_json::json;

use super::output::Output;
use super::timeline;
use crate::storage::{read_batch, Config};

/// Resolves a batch file against its own anchors plus any overrides
///
/// Uses the enclosing project's configuration when run inside one and the
/// defaults otherwise.
pub fn run(
    output: &Output,
    file: &Path,
    overrides: Vec<(String, NaiveDate)>,
    strict: bool,
) -> Result<()> {
    let config = Config::load()?;
    output.verbose_ctx(
        "resolve",
        &match &config.project_root {
            Some(root) => format!("Using project config from {}", root.display()),
            None => "Not in a project; using default config".to_string(),
        },
    );

    let batch = read_batch(file)?;
    let (mut anchors, milestones) = batch.into_milestones(0);
    for (name, date) in overrides {
        anchors.set(&name, date);
    }

    let report = config.resolver().resolve(&milestones, &anchors);
    output.verbose_ctx(
        "resolve",
        &format!(
            "{} milestone(s), {} unresolved",
            report.len(),
            report.unresolved().count()
        ),
    );

    timeline::render(
        output,
        &config,
        json!({ "source": file.display().to_string() }),
        &anchors,
        &milestones,
        &report,
    );

    timeline::enforce_strict(strict, &report)
}
