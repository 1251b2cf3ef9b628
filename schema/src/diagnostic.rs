//! Diagnostics produced while loading declarations and expanding documents.
//!
//! Nothing in this crate prints or aborts on an authoring mistake. Each
//! problem becomes a [`Diagnostic`] returned next to whatever could still be
//! built, and callers decide what is fatal.

use serde_json::Value;
use thiserror::Error;

use crate::grammar::{Placeholder, PlaceholderKind, Signature};

/// Why a sequence is not a valid set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetViolation {
    /// The declaration is not a JSON array.
    #[error("not a list of values")]
    NotAList,
    /// The list is empty.
    #[error("no elements")]
    Empty,
    /// An element is neither a string nor a number.
    #[error("element {index} is not a string or number")]
    NonAtomic {
        /// Position of the offending element.
        index: usize,
    },
    /// Elements have different primitive types.
    #[error("elements mix strings and numbers")]
    MixedTypes,
    /// An element appears more than once.
    #[error("element `{element}` is repeated")]
    Duplicate {
        /// Text form of the repeated element.
        element: String,
    },
}

/// Why a subset declaration is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubsetViolation {
    /// The declaration is not `{ "set": ..., "elements": [...] }`.
    #[error("expected an object with `set` and `elements`")]
    Malformed,
    /// The named superset is not a declared set.
    #[error("superset `{0}` is not declared")]
    UnknownSuperset(String),
    /// The elements do not form a valid set.
    #[error("{0}")]
    Elements(SetViolation),
    /// An element is not part of the superset.
    #[error("element `{element}` is not in superset `{superset}`")]
    Foreign {
        /// Text form of the foreign element.
        element: String,
        /// Name of the superset.
        superset: String,
    },
}

/// Why a function or relation mapping is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingViolation {
    /// The argument set named in the signature is not declared.
    #[error("argument set `{0}` is not declared")]
    UnknownArgumentSet(String),
    /// The declaration is not a JSON object.
    #[error("mapping is not an object")]
    NotAMapping,
    /// Elements of the argument set without a mapped value.
    #[error("missing values for {}", .0.join(", "))]
    MissingKeys(Vec<String>),
    /// Keys that are not elements of the argument set.
    #[error("keys outside the argument set: {}", .0.join(", "))]
    ExtraKeys(Vec<String>),
    /// A function value is not a string or number.
    #[error("value for `{key}` is not a string or number")]
    NonAtomicValue {
        /// Offending key.
        key: String,
    },
    /// A function value is an empty string.
    #[error("value for `{key}` is empty")]
    EmptyValue {
        /// Offending key.
        key: String,
    },
    /// A relation image is not a valid set.
    #[error("image of `{key}` is invalid: {violation}")]
    InvalidImage {
        /// Offending key.
        key: String,
        /// Set check failure of the image.
        violation: SetViolation,
    },
}

/// Why a cause record is invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CauseViolation {
    /// The cause is not a JSON object.
    #[error("cause is not an object")]
    NotARecord,
    /// Neither `component` nor any `problem_*` key is present.
    #[error("no `component` or `problem_*` key")]
    NoSubject,
    /// Neither `probability` nor `frequency` is present.
    #[error("no `probability` or `frequency` key")]
    NoLikelihood,
}

/// Taxonomy of diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// A set, function, relation, or subset declaration is invalid.
    Declaration,
    /// A template names something the database does not declare, or calls it
    /// outside its domain.
    Reference,
    /// A diagnosis group contains an invalid cause record, or a document
    /// maps one error twice.
    Structural,
}

impl Category {
    /// Returns the lowercase name used in reports.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Declaration => "declaration",
            Category::Reference => "reference",
            Category::Structural => "structural",
        }
    }
}

/// A reported problem.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    /// A schema section has an unsupported shape.
    #[error("section `{section}` is malformed: {reason}")]
    MalformedSection {
        /// Section name (`sets`, `functions`, ...).
        section: String,
        /// What was wrong with it.
        reason: String,
    },
    /// A set name is not a valid identifier.
    #[error("`{name}` is not a valid set name")]
    MalformedName {
        /// Offending name.
        name: String,
    },
    /// A set declaration is invalid.
    #[error("set `{name}` is invalid ({violation}): {value}")]
    InvalidSet {
        /// Set name.
        name: String,
        /// What check failed.
        violation: SetViolation,
        /// Declared value.
        value: Value,
    },
    /// A subset declaration is invalid.
    #[error("subset `{name}` is invalid: {violation}")]
    InvalidSubset {
        /// Subset name.
        name: String,
        /// What check failed.
        violation: SubsetViolation,
    },
    /// A function or relation key is not `NAME[ARG]`.
    #[error("`{signature}` is not a `NAME[ARG]` signature")]
    MalformedSignature {
        /// Declared key.
        signature: String,
    },
    /// A function declaration is invalid.
    #[error("function `{signature}` is invalid: {violation}")]
    InvalidFunction {
        /// Function signature.
        signature: Signature,
        /// What check failed.
        violation: MappingViolation,
    },
    /// A relation declaration is invalid.
    #[error("relation `{signature}` is invalid: {violation}")]
    InvalidRelation {
        /// Relation signature.
        signature: Signature,
        /// What check failed.
        violation: MappingViolation,
    },
    /// A declared function collides with a built-in identity function.
    #[error("`{signature}` is reserved for the built-in identity function")]
    ReservedSignature {
        /// Declared signature.
        signature: Signature,
    },
    /// A placeholder names an undeclared set, function, or relation.
    #[error("unknown {kind} `{name}`")]
    UnknownReference {
        /// Form of the placeholder.
        kind: PlaceholderKind,
        /// Name or signature as written.
        name: String,
    },
    /// A function or relation was evaluated at an element it does not map.
    #[error("`{placeholder}` has no value for element `{element}`")]
    OutsideDomain {
        /// The call.
        placeholder: Placeholder,
        /// Text form of the driving element.
        element: String,
    },
    /// A cause record in a diagnosis group is invalid; the group was skipped.
    #[error("diagnosis group {group}, cause {cause}: {violation}")]
    InvalidCause {
        /// Index of the group in the document.
        group: usize,
        /// Index of the cause in the group.
        cause: usize,
        /// What check failed.
        violation: CauseViolation,
    },
    /// One document maps an error identifier to several cause lists; only
    /// the last one survives in the written map.
    #[error("error `{error}` is produced {count} times in one diagnoses document")]
    DuplicateError {
        /// Error identifier.
        error: String,
        /// Number of cause lists produced for it.
        count: usize,
    },
}

impl Diagnostic {
    /// Returns the taxonomy bucket of this diagnostic.
    #[must_use]
    pub fn category(&self) -> Category {
        match self {
            Diagnostic::MalformedSection { .. }
            | Diagnostic::MalformedName { .. }
            | Diagnostic::InvalidSet { .. }
            | Diagnostic::InvalidSubset { .. }
            | Diagnostic::MalformedSignature { .. }
            | Diagnostic::InvalidFunction { .. }
            | Diagnostic::InvalidRelation { .. }
            | Diagnostic::ReservedSignature { .. } => Category::Declaration,
            Diagnostic::UnknownReference { .. } | Diagnostic::OutsideDomain { .. } => {
                Category::Reference
            }
            Diagnostic::InvalidCause { .. } | Diagnostic::DuplicateError { .. } => {
                Category::Structural
            }
        }
    }

    /// Builds an unknown-reference diagnostic for `placeholder`.
    #[must_use]
    pub fn unknown(placeholder: &Placeholder) -> Self {
        Diagnostic::UnknownReference {
            kind: placeholder.kind(),
            name: match placeholder {
                Placeholder::Set(name) => name.clone(),
                Placeholder::Function(sig) | Placeholder::Relation(sig) => sig.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let d = Diagnostic::InvalidFunction {
            signature: Signature::new("ENG", "SIDE"),
            violation: MappingViolation::MissingKeys(vec!["r".into()]),
        };
        assert_eq!(
            d.to_string(),
            "function `ENG[SIDE]` is invalid: missing values for r"
        );
        assert_eq!(d.category(), Category::Declaration);
    }

    #[test]
    fn unknown_reference_uses_signature_text() {
        let d = Diagnostic::unknown(&Placeholder::Relation(Signature::new("MOTOR", "ARM")));
        assert_eq!(d.to_string(), "unknown relation `MOTOR[ARM]`");
        assert_eq!(d.category(), Category::Reference);
    }

    #[test]
    fn duplicate_error_is_structural() {
        let d = Diagnostic::DuplicateError {
            error: "error_power".into(),
            count: 2,
        };
        assert_eq!(
            d.to_string(),
            "error `error_power` is produced 2 times in one diagnoses document"
        );
        assert_eq!(d.category(), Category::Structural);
    }
}
