//! Placeholder resolution against the database, collecting diagnostics.

use faultkb_schema::grammar::substitute_str;
use faultkb_schema::{
    substitute, Atom, Database, Diagnostic, Placeholder, PlaceholderKind, PlaceholderSet,
};
use serde_json::Value;
use tracing::debug;

/// Resolves placeholders for one document expansion.
///
/// Unknown references and domain misses are recorded and the occurrence is
/// left as written, so the auditor flags it in the output.
pub(crate) struct Resolver<'a> {
    db: &'a Database,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(db: &'a Database) -> Self {
        Self {
            db,
            diagnostics: Vec::new(),
        }
    }

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        debug!(%diagnostic, "expansion diagnostic");
        self.diagnostics.push(diagnostic);
    }

    pub(crate) fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Returns the first set placeholder in `value` and the set it names.
    /// An undeclared set is reported and yields `None`.
    pub(crate) fn driving_set(&mut self, value: &Value) -> Option<(Placeholder, &'a PlaceholderSet)> {
        let db = self.db;
        let placeholder = db.first_placeholder(value, PlaceholderKind::Set)?;
        let Placeholder::Set(name) = &placeholder else {
            return None;
        };
        match db.set(name) {
            Some(set) => Some((placeholder, set)),
            None => {
                self.report(Diagnostic::unknown(&placeholder));
                None
            }
        }
    }

    /// Returns true if `value` contains a set placeholder, declared or not.
    pub(crate) fn has_set(&self, value: &Value) -> bool {
        self.db
            .first_placeholder(value, PlaceholderKind::Set)
            .is_some()
    }

    /// Returns true if `value` contains a function placeholder.
    pub(crate) fn has_function(&self, value: &Value) -> bool {
        self.db
            .first_placeholder(value, PlaceholderKind::Function)
            .is_some()
    }

    /// Substitutes the first function placeholder of `value` by the
    /// function's value at `element`.
    pub(crate) fn apply_function(&mut self, value: &Value, element: &Atom) -> Value {
        match self.function_value(value, element) {
            Some((placeholder, replacement)) => substitute(value, &placeholder, &replacement),
            None => value.clone(),
        }
    }

    /// Same as [`Resolver::apply_function`] for an object key.
    pub(crate) fn apply_function_to_key(&mut self, key: &str, element: &Atom) -> String {
        let value = Value::String(key.to_string());
        match self.function_value(&value, element) {
            Some((placeholder, replacement)) => substitute_str(key, &placeholder, &replacement),
            None => key.to_string(),
        }
    }

    fn function_value(&mut self, value: &Value, element: &Atom) -> Option<(Placeholder, String)> {
        let db = self.db;
        let placeholder = db.first_placeholder(value, PlaceholderKind::Function)?;
        let Placeholder::Function(signature) = &placeholder else {
            return None;
        };
        let Some(function) = db.function(signature) else {
            self.report(Diagnostic::unknown(&placeholder));
            return None;
        };
        let element_text = element.text();
        match function.apply(&element_text) {
            Some(output) => Some((placeholder, output.text())),
            None => {
                self.report(Diagnostic::OutsideDomain {
                    placeholder,
                    element: element_text,
                });
                None
            }
        }
    }

    /// Returns the first relation placeholder of `value` and its image at
    /// `element`. Unknown relations and domain misses are reported.
    pub(crate) fn relation_image(
        &mut self,
        value: &Value,
        element: &Atom,
    ) -> Option<(Placeholder, &'a [Atom])> {
        let db = self.db;
        let placeholder = db.first_placeholder(value, PlaceholderKind::Relation)?;
        let Placeholder::Relation(signature) = &placeholder else {
            return None;
        };
        let Some(relation) = db.relation(signature) else {
            self.report(Diagnostic::unknown(&placeholder));
            return None;
        };
        let element_text = element.text();
        match relation.image(&element_text) {
            Some(image) => Some((placeholder, image)),
            None => {
                self.report(Diagnostic::OutsideDomain {
                    placeholder,
                    element: element_text,
                });
                None
            }
        }
    }

    /// Returns true if `value` contains a relation placeholder.
    pub(crate) fn has_relation(&self, value: &Value) -> bool {
        self.db
            .first_placeholder(value, PlaceholderKind::Relation)
            .is_some()
    }
}
