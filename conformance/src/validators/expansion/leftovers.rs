//! Leftover-placeholder validator.
//!
//! Audits every JSON document of the expanded directory. Any placeholder
//! still present is an unresolved reference or a template the expander
//! could not reach.

use std::path::Path;

use anyhow::{Context, Result};
use faultkb_expander::audit;
use faultkb_expander::batch::load_json;
use faultkb_schema::Database;
use walkdir::WalkDir;

use crate::report::{CheckReport, TestResult};

const VALIDATOR: &str = "expansion/leftovers";

/// Audits the JSON files directly inside `expanded`.
///
/// # Errors
///
/// Returns an error if the directory cannot be listed.
pub fn validate(expanded: &Path, db: &Database) -> Result<CheckReport> {
    let mut report = CheckReport::new();

    if !expanded.is_dir() {
        report.push(TestResult::fail_with_details(
            VALIDATOR,
            format!("{} not found; run faultkb-expand first", expanded.display()),
            Vec::new(),
        ));
        return Ok(report);
    }

    let mut documents = 0usize;
    let mut details = Vec::new();
    for entry in WalkDir::new(expanded).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.with_context(|| format!("Failed to list {}", expanded.display()))?;
        let file = entry.file_name().to_string_lossy().into_owned();
        if !entry.file_type().is_file() || !file.ends_with(".json") {
            continue;
        }
        documents += 1;
        match load_json(entry.path()) {
            Ok(document) => {
                details.extend(audit(&document, db).into_iter().map(|l| format!("{file}{l}")));
            }
            Err(err) => details.push(format!("{file}: {err:#}")),
        }
    }

    report.push(TestResult::from_failures(
        VALIDATOR,
        format!("No placeholders left in {documents} expanded document(s)"),
        format!("{} leftover placeholder(s) or unreadable document(s)", details.len()),
        details,
    ));
    Ok(report)
}
