//! Knowledge document shapes.
//!
//! Documents are parsed from `serde_json::Value` into one of three typed
//! shapes and written back as values. Object order is preserved end to end.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::diagnostic::CauseViolation;

/// Attribute mapping of one entity.
pub type Attributes = Map<String, Value>;

/// Error raised when a document does not have the expected shape.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A value had the wrong JSON type.
    #[error("expected {expected} at {location}")]
    Shape {
        /// What was expected.
        expected: &'static str,
        /// Where, as a key path.
        location: String,
    },
    /// Typed deserialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// The three document shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Entity key to attribute mapping (components, problems, errors).
    EntityMap,
    /// Ordered list of two-element identifier pairs (connections).
    PairList,
    /// Ordered list of `{errors, causes}` groups (diagnoses).
    DiagnosisGroupList,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DocumentKind::EntityMap => "entity map",
            DocumentKind::PairList => "pair list",
            DocumentKind::DiagnosisGroupList => "diagnosis group list",
        })
    }
}

/// A parsed knowledge document.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// See [`EntityMap`].
    EntityMap(EntityMap),
    /// See [`PairList`].
    PairList(PairList),
    /// See [`DiagnosisGroupList`].
    DiagnosisGroupList(DiagnosisGroupList),
}

impl Document {
    /// Parses `value` as a document of the given kind.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentError`] if the value does not have that shape.
    pub fn parse(kind: DocumentKind, value: Value) -> Result<Self, DocumentError> {
        Ok(match kind {
            DocumentKind::EntityMap => Document::EntityMap(EntityMap::from_value(value)?),
            DocumentKind::PairList => Document::PairList(PairList::from_value(value)?),
            DocumentKind::DiagnosisGroupList => {
                Document::DiagnosisGroupList(DiagnosisGroupList::from_value(value)?)
            }
        })
    }

    /// Returns the kind of this document.
    #[must_use]
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::EntityMap(_) => DocumentKind::EntityMap,
            Document::PairList(_) => DocumentKind::PairList,
            Document::DiagnosisGroupList(_) => DocumentKind::DiagnosisGroupList,
        }
    }

    /// Number of top-level entries (entities, pairs, or groups).
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Document::EntityMap(d) => d.len(),
            Document::PairList(d) => d.pairs.len(),
            Document::DiagnosisGroupList(d) => d.groups.len(),
        }
    }

    /// Returns true if the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mapping from entity key to attributes, in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityMap {
    /// Entries in document order.
    pub entries: Vec<(String, Attributes)>,
}

impl EntityMap {
    /// Parses an object of objects.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Shape`] if the value or one of its entries is
    /// not an object.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let Value::Object(outer) = value else {
            return Err(DocumentError::Shape {
                expected: "an object of entities",
                location: "/".into(),
            });
        };
        let mut entries = Vec::with_capacity(outer.len());
        for (key, inner) in outer {
            match inner {
                Value::Object(attributes) => entries.push((key, attributes)),
                _ => {
                    return Err(DocumentError::Shape {
                        expected: "an attribute object",
                        location: format!("/{key}"),
                    })
                }
            }
        }
        Ok(Self { entries })
    }

    /// Converts back into a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::Object(v.clone())))
                .collect(),
        )
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entity keys in document order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Attributes of the first entity named `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Attributes> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// Two linked entity identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair(pub String, pub String);

/// Ordered list of pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairList {
    /// Pairs in document order.
    pub pairs: Vec<Pair>,
}

impl PairList {
    /// Parses a list of two-element string lists.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Json`] if an element is not a pair of strings.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        Ok(Self {
            pairs: serde_json::from_value(value)?,
        })
    }

    /// Converts back into a JSON list.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Array(
            self.pairs
                .iter()
                .map(|Pair(a, b)| Value::Array(vec![Value::String(a.clone()), Value::String(b.clone())]))
                .collect(),
        )
    }
}

/// Errors sharing one list of causes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisGroup {
    /// Error identifiers, possibly templated.
    #[serde(alias = "group_errors")]
    pub errors: Vec<String>,
    /// Cause records, possibly templated. Kept as raw values so a malformed
    /// cause only invalidates its own group.
    #[serde(alias = "group_causes")]
    pub causes: Vec<Value>,
}

/// Ordered list of diagnosis groups.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosisGroupList {
    /// Groups in document order.
    pub groups: Vec<DiagnosisGroup>,
}

impl DiagnosisGroupList {
    /// Parses a list of `{errors, causes}` objects.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Json`] if a group lacks either list.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        Ok(Self {
            groups: serde_json::from_value(value)?,
        })
    }
}

/// Expanded diagnoses: error identifier to its cause list, in output order.
///
/// Repeated identifiers are kept so the consistency checks can report them;
/// [`DiagnosisMap::to_value`] keeps the last one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosisMap {
    /// Entries in output order.
    pub entries: Vec<(String, Vec<Value>)>,
}

impl DiagnosisMap {
    /// Parses an expanded diagnoses object.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Shape`] if the value is not an object of lists.
    pub fn from_value(value: Value) -> Result<Self, DocumentError> {
        let Value::Object(outer) = value else {
            return Err(DocumentError::Shape {
                expected: "an object of cause lists",
                location: "/".into(),
            });
        };
        let mut entries = Vec::with_capacity(outer.len());
        for (error, causes) in outer {
            match causes {
                Value::Array(list) => entries.push((error, list)),
                _ => {
                    return Err(DocumentError::Shape {
                        expected: "a cause list",
                        location: format!("/{error}"),
                    })
                }
            }
        }
        Ok(Self { entries })
    }

    /// Converts into a JSON object.
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::Array(v.clone())))
                .collect(),
        )
    }

    /// Number of entries, repeats included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Key naming the faulty component of a cause.
pub const COMPONENT_KEY: &str = "component";
/// Prefix of keys naming a generic problem of a cause.
pub const PROBLEM_PREFIX: &str = "problem_";
/// Keys giving the likelihood of a cause.
pub const LIKELIHOOD_KEYS: [&str; 2] = ["probability", "frequency"];

/// Checks the cause-record invariant: a `component` or `problem_*` key, and
/// a `probability` or `frequency` key.
///
/// # Errors
///
/// Returns the first [`CauseViolation`] found.
pub fn check_cause(cause: &Value) -> Result<(), CauseViolation> {
    let record = cause.as_object().ok_or(CauseViolation::NotARecord)?;
    let has_subject =
        record.contains_key(COMPONENT_KEY) || record.keys().any(|k| k.starts_with(PROBLEM_PREFIX));
    if !has_subject {
        return Err(CauseViolation::NoSubject);
    }
    if !LIKELIHOOD_KEYS.iter().any(|k| record.contains_key(*k)) {
        return Err(CauseViolation::NoLikelihood);
    }
    Ok(())
}

/// Returns true if `cause` satisfies the cause-record invariant.
#[must_use]
pub fn is_valid_cause(cause: &Value) -> bool {
    check_cause(cause).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cause_record_validation() {
        assert!(is_valid_cause(&json!({"component": "pdb", "probability": 0.5})));
        assert!(is_valid_cause(&json!({"problem_1": "loose", "frequency": "high"})));
        assert_eq!(
            check_cause(&json!({"component": "pdb"})),
            Err(CauseViolation::NoLikelihood)
        );
        assert_eq!(
            check_cause(&json!({"probability": 0.5})),
            Err(CauseViolation::NoSubject)
        );
        assert_eq!(check_cause(&json!("pdb")), Err(CauseViolation::NotARecord));
    }

    #[test]
    fn entity_map_keeps_order() {
        let value = json!({"b": {"name": "B"}, "a": {"name": "A"}});
        let map = EntityMap::from_value(value.clone()).expect("entity map");
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(map.to_value(), value);
        assert!(EntityMap::from_value(json!({"a": "x"})).is_err());
    }

    #[test]
    fn pair_list_rejects_triples() {
        assert!(PairList::from_value(json!([["a", "b"]])).is_ok());
        assert!(PairList::from_value(json!([["a", "b", "c"]])).is_err());
    }

    #[test]
    fn diagnosis_groups_accept_aliases() {
        let list = DiagnosisGroupList::from_value(json!([
            {"errors": ["e1"], "causes": []},
            {"group_errors": ["e2"], "group_causes": [{"component": "x", "probability": 1}]}
        ]))
        .expect("groups");
        assert_eq!(list.groups[1].errors, vec!["e2".to_string()]);
        assert_eq!(list.groups[1].causes.len(), 1);
    }

    #[test]
    fn documents_parse_by_kind() {
        let doc = Document::parse(DocumentKind::PairList, json!([["a", "b"]])).expect("pairs");
        assert_eq!(doc.kind(), DocumentKind::PairList);
        assert_eq!(doc.len(), 1);
        assert!(Document::parse(DocumentKind::EntityMap, json!([])).is_err());
    }
}
