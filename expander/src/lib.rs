//! Template expansion for the fault-diagnosis knowledge base.
//!
//! Each knowledge document is expanded independently against an immutable
//! [`Database`]. Expansion is a pure function of the two: it never fails,
//! returning the expanded document together with every reference problem
//! it met, and running it twice gives the same result.
//!
//! | Document shape | Expander |
//! |----------------|----------|
//! | Entity map (components, problems, errors) | [`expand_entities`] |
//! | Pair list (connections) | [`expand_pairs`] |
//! | Diagnosis group list | [`expand_diagnoses`] |
//!
//! [`audit`] scans the output for placeholder syntax that survived, and
//! [`batch::run`] drives a whole directory.
//!
//! # Entry Point
//!
//! ```
//! use faultkb_expander::{audit, expand};
//! use faultkb_schema::{Database, Document, DocumentKind};
//! use serde_json::json;
//!
//! let (db, _) = Database::load(&json!({ "sets": { "SIDE": ["l", "r"] } }));
//! let document = Document::parse(
//!     DocumentKind::PairList,
//!     json!([["light_(SIDE)", "pdb"]]),
//! )?;
//! let expansion = expand(&document, &db);
//! let output = expansion.output.to_value();
//! assert_eq!(output, json!([["light_l", "pdb"], ["light_r", "pdb"]]));
//! assert!(audit(&output, &db).is_empty());
//! # Ok::<(), faultkb_schema::DocumentError>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod audit;
pub mod batch;
pub mod config;
pub mod diagnoses;
pub mod entities;
pub mod pairs;
mod resolve;

pub use audit::{audit, Leftover};
pub use batch::{run, BatchReport, FileOutcome};
pub use config::{CheckConfig, Config, PathsConfig, Route, RoutingConfig};
pub use diagnoses::expand_diagnoses;
pub use entities::expand_entities;
pub use pairs::expand_pairs;

use faultkb_schema::{Database, Diagnostic, DiagnosisMap, Document, EntityMap, PairList};
use serde_json::Value;

/// Output of one expansion together with what went wrong along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Expansion<T> {
    /// The expanded document.
    pub output: T,
    /// Unknown references, domain misses, and skipped diagnosis groups.
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Expansion<T> {
    fn map<U>(self, f: impl FnOnce(T) -> U) -> Expansion<U> {
        Expansion {
            output: f(self.output),
            diagnostics: self.diagnostics,
        }
    }
}

/// An expanded document.
#[derive(Debug, Clone, PartialEq)]
pub enum Expanded {
    /// Expanded entity map.
    EntityMap(EntityMap),
    /// Expanded pair list.
    PairList(PairList),
    /// Diagnosis groups expanded into a map from error to causes.
    Diagnoses(DiagnosisMap),
}

impl Expanded {
    /// Converts into the JSON written to the output directory.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Expanded::EntityMap(map) => map.to_value(),
            Expanded::PairList(list) => list.to_value(),
            Expanded::Diagnoses(map) => map.to_value(),
        }
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Expanded::EntityMap(map) => map.len(),
            Expanded::PairList(list) => list.pairs.len(),
            Expanded::Diagnoses(map) => map.len(),
        }
    }

    /// Returns true if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Expands `document` with the expander for its shape.
#[must_use]
pub fn expand(document: &Document, db: &Database) -> Expansion<Expanded> {
    match document {
        Document::EntityMap(map) => expand_entities(map, db).map(Expanded::EntityMap),
        Document::PairList(list) => expand_pairs(list, db).map(Expanded::PairList),
        Document::DiagnosisGroupList(groups) => {
            expand_diagnoses(groups, db).map(Expanded::Diagnoses)
        }
    }
}
