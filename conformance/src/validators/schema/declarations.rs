//! Declaration validator.
//!
//! Reports every set, subset, function, and relation declaration the
//! placeholder database rejected.

use faultkb_schema::{Category, Database, Diagnostic};

use crate::report::{CheckReport, TestResult};

const VALIDATOR: &str = "schema/declarations";

/// Validates the declarations of a loaded schema.
///
/// `diagnostics` are the ones returned by [`Database::load`] for `db`.
#[must_use]
pub fn validate(db: &Database, diagnostics: &[Diagnostic]) -> CheckReport {
    let mut report = CheckReport::new();

    let details: Vec<String> = diagnostics
        .iter()
        .filter(|d| d.category() == Category::Declaration)
        .map(ToString::to_string)
        .collect();
    report.push(TestResult::from_failures(
        VALIDATOR,
        format!(
            "{} sets, {} functions, {} relations declared",
            db.sets().count(),
            db.functions().count(),
            db.relations().count()
        ),
        format!("{} invalid declaration(s)", details.len()),
        details,
    ));

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Severity;
    use serde_json::json;

    #[test]
    fn valid_schema_passes() {
        let (db, diagnostics) = Database::load(&json!({"sets": {"SIDE": ["l", "r"]}}));
        let report = validate(&db, &diagnostics);
        assert!(report.all_passed());
        // SAME[SIDE] is synthesized.
        assert_eq!(report.results[0].message, "1 sets, 1 functions, 0 relations declared");
    }

    #[test]
    fn every_invalid_declaration_is_listed() {
        let (db, diagnostics) = Database::load(&json!({
            "sets": {"SIDE": ["l", "r"], "EMPTY": []},
            "functions": {"ENG[SIDE]": {"l": "Left"}}
        }));
        let report = validate(&db, &diagnostics);
        let result = &report.results[0];
        assert_eq!(result.severity, Severity::Failure);
        assert_eq!(result.details.len(), 2);
        assert_eq!(result.message, "2 invalid declaration(s)");
    }
}
