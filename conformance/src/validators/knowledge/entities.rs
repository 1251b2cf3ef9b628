//! Entity catalog validator.
//!
//! Missing fields, message causes that cite undeclared entities, and keys
//! repeated across catalogs of one category are warnings: the knowledge base
//! stays usable, but the entries are incomplete or one file silently shadows
//! another.

use std::collections::{BTreeMap, BTreeSet};

use faultkb_expander::CheckConfig;
use serde_json::Value;

use crate::knowledge::{keys, Catalog, KnowledgeSet};
use crate::report::{CheckReport, TestResult};

const VALIDATOR: &str = "knowledge/entities";
const SOLUTIONS_KEY: &str = "solutions";
const CAUSES_KEY: &str = "causes";

/// Validates entity fields and key uniqueness.
#[must_use]
pub fn validate(set: &KnowledgeSet, checks: &CheckConfig) -> CheckReport {
    let mut report = CheckReport::new();

    let details = missing_fields(&set.components, &checks.component_fields);
    report.push(TestResult::from_warnings(
        VALIDATOR,
        "All components declare the required fields",
        format!("{} component(s) with missing fields", details.len()),
        details,
    ));

    let mut details = missing_fields(&set.problems, &checks.problem_fields);
    details.extend(empty_solutions(&set.problems));
    report.push(TestResult::from_warnings(
        VALIDATOR,
        "All problems declare the required fields and at least one solution",
        format!("{} incomplete problem(s)", details.len()),
        details,
    ));

    let mut details = missing_fields(&set.messages, &checks.message_fields);
    details.extend(message_causes(set, checks));
    report.push(TestResult::from_warnings(
        VALIDATOR,
        "All messages declare the required fields and cite declared causes",
        format!("{} incomplete message(s)", details.len()),
        details,
    ));

    let mut details = Vec::new();
    for (category, catalogs) in [
        ("component", &set.components),
        ("problem", &set.problems),
        ("error", &set.errors),
        ("message", &set.messages),
    ] {
        details.extend(repeated_keys(category, catalogs));
    }
    report.push(TestResult::from_warnings(
        VALIDATOR,
        "No entity key is declared twice",
        format!("{} repeated key(s)", details.len()),
        details,
    ));

    report
}

fn missing_fields(catalogs: &[Catalog], required: &[String]) -> Vec<String> {
    let mut details = Vec::new();
    for catalog in catalogs {
        for (key, attributes) in &catalog.entities.entries {
            let missing: Vec<&str> = required
                .iter()
                .filter(|field| !attributes.contains_key(field.as_str()))
                .map(String::as_str)
                .collect();
            if !missing.is_empty() {
                details.push(format!("{}: `{key}` lacks {}", catalog.file, missing.join(", ")));
            }
        }
    }
    details
}

fn empty_solutions(catalogs: &[Catalog]) -> Vec<String> {
    let mut details = Vec::new();
    for catalog in catalogs {
        for (key, attributes) in &catalog.entities.entries {
            let Some(solutions) = attributes.get(SOLUTIONS_KEY) else {
                continue;
            };
            if solutions.as_array().map_or(true, Vec::is_empty) {
                details.push(format!("{}: `{key}` has no solutions", catalog.file));
            }
        }
    }
    details
}

/// Checks the `causes` record of every message outside the exempt prefixes:
/// it must hold a `components` list and a `problems` list of declared keys.
fn message_causes(set: &KnowledgeSet, checks: &CheckConfig) -> Vec<String> {
    let components = keys(&set.components);
    let problems = keys(&set.problems);
    let mut details = Vec::new();
    for catalog in &set.messages {
        for (key, attributes) in &catalog.entities.entries {
            if checks
                .causeless_message_prefixes
                .iter()
                .any(|prefix| key.starts_with(prefix.as_str()))
            {
                continue;
            }
            let Some(Value::Object(causes)) = attributes.get(CAUSES_KEY) else {
                details.push(format!("{}: `{key}` has no causes record", catalog.file));
                continue;
            };
            for (field, declared) in [("components", &components), ("problems", &problems)] {
                details.extend(cited_keys(&catalog.file, key, field, causes.get(field), declared));
            }
        }
    }
    details
}

fn cited_keys(
    file: &str,
    key: &str,
    field: &str,
    cited: Option<&Value>,
    declared: &BTreeSet<&str>,
) -> Vec<String> {
    let Some(Value::Array(items)) = cited else {
        return vec![format!("{file}: `{key}` causes lack a {field} list")];
    };
    items
        .iter()
        .filter(|item| !item.as_str().is_some_and(|name| declared.contains(name)))
        .map(|item| match item.as_str() {
            Some(name) => format!("{file}: `{key}` cites undeclared {field} entry `{name}`"),
            None => format!("{file}: `{key}` cites non-string {field} entry {item}"),
        })
        .collect()
}

fn repeated_keys(category: &str, catalogs: &[Catalog]) -> Vec<String> {
    let mut seen: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for catalog in catalogs {
        for key in catalog.entities.keys() {
            seen.entry(key).or_default().push(&catalog.file);
        }
    }
    seen.into_iter()
        .filter(|(_, files)| files.len() > 1)
        .map(|(key, files)| format!("{category} `{key}` is declared in {}", files.join(", ")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Severity;
    use faultkb_schema::EntityMap;
    use serde_json::{json, Value};

    fn catalog(file: &str, value: Value) -> Catalog {
        Catalog {
            file: file.into(),
            entities: EntityMap::from_value(value).expect("entity map"),
        }
    }

    fn checks() -> CheckConfig {
        CheckConfig {
            component_fields: vec!["type".into(), "name".into()],
            ..CheckConfig::default()
        }
    }

    #[test]
    fn complete_catalogs_pass() {
        let set = KnowledgeSet {
            components: vec![catalog(
                "components_a.json",
                json!({"pdb": {"type": "board", "name": "PDB"}}),
            )],
            problems: vec![catalog(
                "problems_a.json",
                json!({"loose_wiring": {"name": "Loose wiring", "solutions": ["reseat"]}}),
            )],
            ..KnowledgeSet::default()
        };
        assert_eq!(validate(&set, &checks()).warning_count(), 0);
    }

    #[test]
    fn gaps_and_repeats_are_warnings() {
        let set = KnowledgeSet {
            components: vec![
                catalog("components_a.json", json!({"pdb": {"type": "board"}})),
                catalog("components_b.json", json!({"pdb": {"type": "board", "name": "PDB"}})),
            ],
            problems: vec![catalog(
                "problems_a.json",
                json!({"loose_wiring": {"name": "Loose wiring", "solutions": []}}),
            )],
            ..KnowledgeSet::default()
        };
        let report = validate(&set, &checks());
        assert!(report.all_passed());
        assert_eq!(report.warning_count(), 3);
        assert_eq!(report.results.len(), 4);
        assert_eq!(report.results[0].details, vec!["components_a.json: `pdb` lacks name"]);
        assert_eq!(
            report.results[1].details,
            vec!["problems_a.json: `loose_wiring` has no solutions"]
        );
        assert_eq!(
            report.results[3].details,
            vec!["component `pdb` is declared in components_a.json, components_b.json"]
        );
        assert_eq!(report.results[3].severity, Severity::Warning);
    }

    #[test]
    fn message_causes_must_cite_declared_entities() {
        let set = KnowledgeSet {
            components: vec![catalog("components_a.json", json!({"pdb": {}}))],
            problems: vec![catalog("problems_a.json", json!({"loose_wiring": {}}))],
            messages: vec![catalog(
                "messages_a.json",
                json!({
                    "msg_power": {
                        "name": "Power lost",
                        "name_spanish": "Sin energía",
                        "causes": {"components": ["pdb", "esc_9"], "problems": ["loose_wiring"]}
                    },
                    "msg_gps": {"name": "GPS lost", "name_spanish": "GPS perdido", "causes": {"components": []}},
                    "msg_bare": {"name": "Bare", "name_spanish": "Vacío"},
                    "warning_low_battery": {"name": "Low battery"},
                    "ribbon_arming": {"name": "Arming", "name_spanish": "Armando"}
                }),
            )],
            ..KnowledgeSet::default()
        };
        let report = validate(&set, &checks());
        assert!(report.all_passed());
        assert_eq!(report.results[2].severity, Severity::Warning);
        assert_eq!(
            report.results[2].details,
            vec![
                "messages_a.json: `warning_low_battery` lacks name_spanish",
                "messages_a.json: `msg_power` cites undeclared components entry `esc_9`",
                "messages_a.json: `msg_gps` causes lack a problems list",
                "messages_a.json: `msg_bare` has no causes record",
            ]
        );
    }
}
