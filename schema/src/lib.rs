//! Placeholder grammar, placeholder database, and knowledge document model.
//!
//! Fault-diagnosis knowledge for near-identical product variants (left and
//! right engines, several arms, ...) is written as compact templates. A
//! template refers to declared sets, functions, and relations through
//! parenthesized placeholders; the `faultkb-expander` crate turns each
//! template into every concrete variant it implies.
//!
//! # Entry Point
//!
//! ```
//! use faultkb_schema::{Database, Placeholder, Signature};
//! use serde_json::json;
//!
//! let (db, diagnostics) = Database::load(&json!({
//!     "sets": { "SIDE": ["l", "r"] },
//!     "functions": { "ENG[SIDE]": { "l": "Left", "r": "Right" } }
//! }));
//! assert!(diagnostics.is_empty());
//!
//! let eng = db.function(&Signature::new("ENG", "SIDE")).unwrap();
//! let text = faultkb_schema::grammar::substitute_str(
//!     "light_(ENG[SIDE])",
//!     &Placeholder::Function(eng.signature().clone()),
//!     &eng.apply("l").unwrap().text(),
//! );
//! assert_eq!(text, "light_Left");
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod atom;
pub mod database;
pub mod declarations;
pub mod diagnostic;
pub mod document;
pub mod grammar;

pub use atom::{Atom, AtomKind};
pub use database::{substitute, Database};
pub use declarations::{is_valid_function, is_valid_set, Function, PlaceholderSet, Relation};
pub use diagnostic::{
    Category, CauseViolation, Diagnostic, MappingViolation, SetViolation, SubsetViolation,
};
pub use document::{
    check_cause, is_valid_cause, Attributes, DiagnosisGroup, DiagnosisGroupList, DiagnosisMap,
    Document, DocumentError, DocumentKind, EntityMap, Pair, PairList,
};
pub use grammar::{Placeholder, PlaceholderKind, Signature};
