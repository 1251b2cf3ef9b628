//! Leftover-placeholder auditor.
//!
//! Scans an expanded document for placeholder syntax that survived
//! expansion. The document is never modified.

use std::fmt;

use faultkb_schema::grammar::scan_all;
use faultkb_schema::{Database, Placeholder};
use serde_json::Value;

/// A placeholder found in expanded output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leftover {
    /// JSON pointer of the string holding it. For an object key the pointer
    /// names the key's entry.
    pub pointer: String,
    /// The occurrence.
    pub placeholder: Placeholder,
    /// Whether the database declares it. An unknown placeholder is an
    /// unresolved reference; a known one was not reached by the expander.
    pub known: bool,
}

impl fmt::Display for Leftover {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pointer = if self.pointer.is_empty() { "/" } else { self.pointer.as_str() };
        write!(
            f,
            "{pointer}: leftover {} `{}`{}",
            self.placeholder.kind(),
            self.placeholder.token(),
            if self.known { "" } else { " (undeclared)" }
        )
    }
}

/// Returns every placeholder occurrence in `document`, keys included, in
/// document order. Ignored acronyms are not reported.
#[must_use]
pub fn audit(document: &Value, db: &Database) -> Vec<Leftover> {
    let mut found = Vec::new();
    walk(document, String::new(), db, &mut found);
    found
}

fn walk(value: &Value, pointer: String, db: &Database, found: &mut Vec<Leftover>) {
    match value {
        Value::String(text) => collect(text, &pointer, db, found),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                walk(item, format!("{pointer}/{index}"), db, found);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let child = format!("{pointer}/{}", escape(key));
                collect(key, &child, db, found);
                walk(item, child, db, found);
            }
        }
        _ => {}
    }
}

fn collect(text: &str, pointer: &str, db: &Database, found: &mut Vec<Leftover>) {
    for placeholder in scan_all(text) {
        if matches!(&placeholder, Placeholder::Set(name) if db.is_ignored(name)) {
            continue;
        }
        found.push(Leftover {
            pointer: pointer.to_string(),
            known: db.is_known(&placeholder),
            placeholder,
        });
    }
}

/// Escapes a key as a JSON pointer reference token.
fn escape(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultkb_schema::Signature;
    use serde_json::json;

    fn db() -> Database {
        Database::load(&json!({
            "sets": {"SIDE": ["l", "r"]},
            "ignore": ["GNSS"]
        }))
        .0
    }

    #[test]
    fn clean_output_has_no_leftovers() {
        let doc = json!({"light_l": {"name": "Left light", "weight": 1.5, "tags": ["a", "b"]}});
        assert!(audit(&doc, &db()).is_empty());
    }

    #[test]
    fn finds_placeholders_in_keys_and_values() {
        let doc = json!({
            "light_(SIDE)": {"name": "(ENG[SIDE])"},
            "pairs": [["a", "b_(*MOTOR[ARM])"]]
        });
        let found = audit(&doc, &db());
        assert_eq!(
            found,
            vec![
                Leftover {
                    pointer: "/light_(SIDE)".into(),
                    placeholder: Placeholder::Set("SIDE".into()),
                    known: true,
                },
                Leftover {
                    pointer: "/light_(SIDE)/name".into(),
                    placeholder: Placeholder::Function(Signature::new("ENG", "SIDE")),
                    known: false,
                },
                Leftover {
                    pointer: "/pairs/0/1".into(),
                    placeholder: Placeholder::Relation(Signature::new("MOTOR", "ARM")),
                    known: false,
                },
            ]
        );
    }

    #[test]
    fn ignored_acronyms_are_not_leftovers() {
        let doc = json!({"gps": {"name": "Receiver (GNSS)"}});
        assert!(audit(&doc, &db()).is_empty());
    }

    #[test]
    fn pointer_tokens_are_escaped() {
        let doc = json!({"a/b~c": "(SIDE)"});
        let found = audit(&doc, &db());
        assert_eq!(found[0].pointer, "/a~1b~0c");
        assert_eq!(found[0].to_string(), "/a~1b~0c: leftover set `(SIDE)`");
    }
}
