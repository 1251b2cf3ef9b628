//! Component and problem reference validator.

use crate::knowledge::{check_references, KnowledgeSet};
use crate::report::{CheckReport, TestResult};

const VALIDATOR: &str = "knowledge/references";

/// Validates that every component and problem cited by a cause is declared.
#[must_use]
pub fn validate(set: &KnowledgeSet) -> CheckReport {
    let mut report = CheckReport::new();
    let details: Vec<String> = check_references(set).iter().map(ToString::to_string).collect();
    report.push(TestResult::from_failures(
        VALIDATOR,
        "All components and problems cited by diagnoses are declared",
        format!("{} undeclared reference(s)", details.len()),
        details,
    ));
    report
}
