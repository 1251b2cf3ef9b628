//! Error mapping validator.

use crate::knowledge::{check_error_mappings, KnowledgeSet};
use crate::report::{CheckReport, TestResult};

const VALIDATOR: &str = "knowledge/mappings";

/// Validates that every error is mapped exactly once to a non-empty list of
/// valid causes.
#[must_use]
pub fn validate(set: &KnowledgeSet) -> CheckReport {
    let mut report = CheckReport::new();
    let details: Vec<String> = check_error_mappings(set)
        .iter()
        .map(ToString::to_string)
        .collect();
    report.push(TestResult::from_failures(
        VALIDATOR,
        "All errors are mapped exactly once with valid causes",
        format!("{} error mapping violation(s)", details.len()),
        details,
    ));
    report
}
