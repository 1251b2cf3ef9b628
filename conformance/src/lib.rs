//! Consistency checks for an expanded fault-diagnosis knowledge base.
//!
//! Runs after `faultkb-expand` over the schema document and the expanded
//! directory, and aggregates every finding into one [`CheckReport`].
//!
//! # Checks
//!
//! | Check | Severity |
//! |-------|----------|
//! | Schema declarations | Failure |
//! | Leftover placeholders | Failure |
//! | Component and problem references | Failure |
//! | Error mappings | Failure |
//! | Entity fields and repeated keys | Warning |
//!
//! # Entry Point
//!
//! ```no_run
//! use faultkb_conformance::{run_all, KnowledgePaths};
//! use faultkb_expander::CheckConfig;
//! use std::path::PathBuf;
//!
//! let paths = KnowledgePaths {
//!     expanded: PathBuf::from("dknowledge_expanded"),
//!     schema: PathBuf::from("dknowledge/placeholders.json"),
//! };
//! let report = run_all(&paths, &CheckConfig::default()).expect("Failed to run checks");
//! assert!(report.all_passed());
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod knowledge;
pub mod report;
pub mod validators;

pub use knowledge::{check_error_mappings, check_references, KnowledgeSet, ReferentialError};
pub use report::{CheckReport, Severity, TestResult};

use faultkb_expander::batch::load_database;
use faultkb_expander::CheckConfig;

/// Paths required by the checker suite.
pub struct KnowledgePaths {
    /// Directory of expanded documents.
    pub expanded: std::path::PathBuf,
    /// Schema document the documents were expanded against.
    pub schema: std::path::PathBuf,
}

/// Runs all checks and returns the aggregated report.
///
/// Checks are run in this order:
/// 1. Schema declarations
/// 2. Leftover placeholders in every expanded document
/// 3. Component and problem references of diagnoses
/// 4. Error mappings
/// 5. Entity fields, message causes, and repeated keys
///
/// # Errors
///
/// Returns an error if the schema cannot be read, or if the expanded
/// directory cannot be listed or holds a malformed categorized document.
pub fn run_all(paths: &KnowledgePaths, checks: &CheckConfig) -> anyhow::Result<CheckReport> {
    let mut report = CheckReport::new();

    // 1. Declarations
    let (db, diagnostics) = load_database(&paths.schema)?;
    report.extend(validators::schema::declarations::validate(&db, &diagnostics));

    // 2. Leftovers
    report.extend(validators::expansion::leftovers::validate(&paths.expanded, &db)?);
    if !paths.expanded.is_dir() {
        return Ok(report);
    }

    // 3-5. Cross-document checks
    let set = KnowledgeSet::load(&paths.expanded, checks)?;
    report.extend(validators::knowledge::references::validate(&set));
    report.extend(validators::knowledge::mappings::validate(&set));
    report.extend(validators::knowledge::entities::validate(&set, checks));

    Ok(report)
}

#[cfg(test)]
mod tests_unit {
    use super::*;
    use faultkb_expander::batch::write_json;
    use serde_json::json;

    #[test]
    fn consistent_knowledge_base_passes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write_json(&root.join("placeholders.json"), &json!({"sets": {"SIDE": ["l", "r"]}}))
            .expect("schema");
        write_json(
            &root.join("components_a.json"),
            &json!({"light_l": {"type": "light", "name": "L", "name_spanish": "I",
                                "material_num": 1, "material_name": "lamp"}}),
        )
        .expect("components");
        write_json(&root.join("errors_a.json"), &json!({"error_light_l": {}})).expect("errors");
        write_json(
            &root.join("messages_a.json"),
            &json!({"msg_light_l": {"name": "Left light", "name_spanish": "Luz izquierda",
                                    "causes": {"components": ["light_l"], "problems": []}}}),
        )
        .expect("messages");
        write_json(
            &root.join("diagnoses_a.json"),
            &json!({"error_light_l": [{"component": "light_l", "probability": 1.0}]}),
        )
        .expect("diagnoses");

        let paths = KnowledgePaths {
            expanded: root.to_path_buf(),
            schema: root.join("placeholders.json"),
        };
        let report = run_all(&paths, &CheckConfig::default()).expect("run");
        assert!(report.all_passed(), "{:#?}", report.results);
        assert_eq!(report.warning_count(), 0);
        assert_eq!(report.results.len(), 1 + 1 + 1 + 1 + 4);
    }

    #[test]
    fn dangling_component_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write_json(&root.join("placeholders.json"), &json!({})).expect("schema");
        write_json(&root.join("errors_a.json"), &json!({"error_motor": {}})).expect("errors");
        write_json(
            &root.join("diagnoses_a.json"),
            &json!({"error_motor": [{"component": "motor_x", "probability": 0.5}]}),
        )
        .expect("diagnoses");

        let paths = KnowledgePaths {
            expanded: root.to_path_buf(),
            schema: root.join("placeholders.json"),
        };
        let report = run_all(&paths, &CheckConfig::default()).expect("run");
        assert_eq!(report.failure_count(), 1);
        let failure = report.results.iter().find(|r| r.is_failure()).expect("failure");
        assert_eq!(failure.validator, "knowledge/references");
        assert_eq!(failure.details.len(), 1);
        assert!(failure.details[0].contains("motor_x"));
    }
}
