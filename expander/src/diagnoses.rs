//! Diagnosis-group expansion.
//!
//! Each group shares one cause list among several error identifiers. The
//! output maps every concrete error identifier to its own copy of the causes,
//! with function placeholders in cause values evaluated at the element that
//! produced the identifier.

use std::collections::BTreeMap;

use faultkb_schema::grammar::substitute_str;
use faultkb_schema::{check_cause, Atom, Database, DiagnosisGroupList, DiagnosisMap, Diagnostic};
use serde_json::Value;
use tracing::debug;

use crate::resolve::Resolver;
use crate::Expansion;

/// Expands every group of `list` into a diagnosis map.
///
/// A group holding an invalid cause record is reported and skipped; the
/// remaining groups are still expanded. Error identifiers produced more than
/// once are reported, since the written map keeps only one cause list each.
#[must_use]
pub fn expand_diagnoses(list: &DiagnosisGroupList, db: &Database) -> Expansion<DiagnosisMap> {
    let mut resolver = Resolver::new(db);
    let mut output = DiagnosisMap::default();

    'groups: for (group_index, group) in list.groups.iter().enumerate() {
        for (cause_index, cause) in group.causes.iter().enumerate() {
            if let Err(violation) = check_cause(cause) {
                resolver.report(Diagnostic::InvalidCause {
                    group: group_index,
                    cause: cause_index,
                    violation,
                });
                continue 'groups;
            }
        }

        let errors = Value::Array(group.errors.iter().cloned().map(Value::String).collect());
        let Some((placeholder, set)) = resolver.driving_set(&errors) else {
            for error in &group.errors {
                output.entries.push((error.clone(), group.causes.clone()));
            }
            continue;
        };

        debug!(group = group_index, set = set.name(), "expanding diagnosis group");
        for error in &group.errors {
            for element in set.elements() {
                let key = substitute_str(error, &placeholder, &element.text());
                let causes = group
                    .causes
                    .iter()
                    .map(|cause| resolve_cause(&mut resolver, cause, element))
                    .collect();
                output.entries.push((key, causes));
            }
        }
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (error, _) in &output.entries {
        *counts.entry(error.as_str()).or_default() += 1;
    }
    for (error, count) in counts {
        if count > 1 {
            resolver.report(Diagnostic::DuplicateError {
                error: error.to_string(),
                count,
            });
        }
    }

    Expansion {
        output,
        diagnostics: resolver.into_diagnostics(),
    }
}

/// Evaluates function placeholders in the field values of `cause`. Field
/// names are never rewritten.
fn resolve_cause(resolver: &mut Resolver<'_>, cause: &Value, element: &Atom) -> Value {
    match cause {
        Value::Object(fields) => Value::Object(
            fields
                .iter()
                .map(|(name, value)| (name.clone(), resolver.apply_function(value, element)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultkb_schema::CauseViolation;
    use serde_json::json;

    fn db() -> Database {
        Database::load(&json!({
            "sets": {"SIDE": ["l", "r"], "ARM": [1, 2]},
            "functions": {"ESC[ARM]": {"1": "esc_front", "2": "esc_rear"}}
        }))
        .0
    }

    fn groups(value: Value) -> DiagnosisGroupList {
        DiagnosisGroupList::from_value(value).expect("diagnosis groups")
    }

    #[test]
    fn errors_times_elements() {
        let list = groups(json!([{
            "errors": ["error_motor_(ARM)_hot", "error_motor_(ARM)_stall"],
            "causes": [
                {"component": "motor_(SAME[ARM])", "probability": 0.6},
                {"component": "(ESC[ARM])", "probability": 0.3},
                {"problem_firmware": "firmware", "frequency": "rare"}
            ]
        }]));
        let expansion = expand_diagnoses(&list, &db());
        assert!(expansion.diagnostics.is_empty(), "{:?}", expansion.diagnostics);
        let keys: Vec<_> = expansion.output.entries.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            [
                "error_motor_1_hot",
                "error_motor_2_hot",
                "error_motor_1_stall",
                "error_motor_2_stall"
            ]
        );
        assert_eq!(
            expansion.output.entries[1].1,
            vec![
                json!({"component": "motor_2", "probability": 0.6}),
                json!({"component": "esc_rear", "probability": 0.3}),
                json!({"problem_firmware": "firmware", "frequency": "rare"})
            ]
        );
    }

    #[test]
    fn untemplated_group_copies_causes() {
        let list = groups(json!([{
            "group_errors": ["error_gps", "error_compass"],
            "group_causes": [{"component": "gps", "probability": 1.0}]
        }]));
        let expansion = expand_diagnoses(&list, &db());
        assert_eq!(
            expansion.output.to_value(),
            json!({
                "error_gps": [{"component": "gps", "probability": 1.0}],
                "error_compass": [{"component": "gps", "probability": 1.0}]
            })
        );
    }

    #[test]
    fn invalid_cause_skips_only_its_group() {
        let list = groups(json!([
            {"errors": ["error_a"], "causes": [{"component": "pdb"}]},
            {"errors": ["error_b"], "causes": [{"component": "pdb", "probability": 0.5}]}
        ]));
        let expansion = expand_diagnoses(&list, &db());
        assert_eq!(expansion.output.len(), 1);
        assert_eq!(expansion.output.entries[0].0, "error_b");
        assert_eq!(
            expansion.diagnostics,
            vec![Diagnostic::InvalidCause {
                group: 0,
                cause: 0,
                violation: CauseViolation::NoLikelihood
            }]
        );
    }

    #[test]
    fn error_listed_by_two_groups_is_reported() {
        let list = groups(json!([
            {"errors": ["error_power"], "causes": [{"component": "pdb", "probability": 0.5}]},
            {"errors": ["error_power"], "causes": [{"component": "gps", "probability": 0.5}]}
        ]));
        let expansion = expand_diagnoses(&list, &db());
        assert_eq!(expansion.output.len(), 2);
        assert_eq!(
            expansion.diagnostics,
            vec![Diagnostic::DuplicateError {
                error: "error_power".into(),
                count: 2
            }]
        );
    }

    #[test]
    fn plain_error_in_templated_group_is_reported() {
        let list = groups(json!([{
            "errors": ["error_light_(SIDE)", "error_pdb"],
            "causes": [{"component": "pdb", "probability": 1.0}]
        }]));
        let expansion = expand_diagnoses(&list, &db());
        assert_eq!(expansion.output.len(), 4);
        assert_eq!(
            expansion.diagnostics,
            vec![Diagnostic::DuplicateError {
                error: "error_pdb".into(),
                count: 2
            }]
        );
    }

    #[test]
    fn cause_keys_are_not_substituted() {
        let list = groups(json!([{
            "errors": ["error_(SIDE)"],
            "causes": [{"component": "x", "note_(SAME[SIDE])": "(SAME[SIDE])", "probability": 1}]
        }]));
        let expansion = expand_diagnoses(&list, &db());
        assert_eq!(
            expansion.output.entries[0].1[0],
            json!({"component": "x", "note_(SAME[SIDE])": "l", "probability": 1})
        );
    }

    #[test]
    fn cause_lists_keep_their_shape() {
        let list = groups(json!([{
            "errors": ["error_(SIDE)"],
            "causes": [
                {"component": "a", "probability": 0.5},
                {"component": "b", "probability": 0.5}
            ]
        }]));
        let expansion = expand_diagnoses(&list, &db());
        assert!(expansion
            .output
            .entries
            .iter()
            .all(|(_, causes)| causes.len() == 2));
    }
}
