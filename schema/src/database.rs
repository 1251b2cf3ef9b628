//! The placeholder database.
//!
//! Built once from a schema document by [`Database::load`] and read-only
//! afterwards. Invalid declarations are reported and left out; everything
//! valid is kept, so a single authoring mistake never hides the rest of the
//! schema.
//!
//! # Schema document
//!
//! ```json
//! {
//!   "sets":      { "SIDE": ["l", "r"], "ARM": ["1", "2", "3", "4"] },
//!   "subsets":   { "FRONT": { "set": "ARM", "elements": ["1", "2"] } },
//!   "functions": { "ENG[SIDE]": { "l": "Left", "r": "Right" } },
//!   "relations": { "MOTOR[ARM]": { "1": ["1", "5"], "2": ["2", "6"],
//!                                  "3": ["3", "7"], "4": ["4", "8"] } },
//!   "ignore":    ["GNSS", "IMU"]
//! }
//! ```
//!
//! Each of the four declaration sections may also be written as a list of
//! single-entry objects.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::debug;

use crate::atom::Atom;
use crate::declarations::{
    check_function, check_relation, check_set, Function, PlaceholderSet, Relation,
};
use crate::diagnostic::{Diagnostic, SubsetViolation};
use crate::grammar::{self, Placeholder, PlaceholderKind, Signature, IDENTITY_FUNCTION};

/// Sets, functions, and relations available to templates.
#[derive(Debug, Clone, Default)]
pub struct Database {
    sets: BTreeMap<String, PlaceholderSet>,
    functions: BTreeMap<Signature, Function>,
    relations: BTreeMap<Signature, Relation>,
    /// Argument set of every function and relation signature.
    arguments: BTreeMap<Signature, String>,
    /// Subset names per superset.
    subsets: BTreeMap<String, Vec<String>>,
    /// Functions and relations derived for subsets rather than declared.
    derived: BTreeSet<Signature>,
    ignored: BTreeSet<String>,
}

impl Database {
    /// Builds the database from a schema document.
    ///
    /// Every declaration is attempted. Invalid ones are reported in the
    /// returned diagnostics and excluded from the database.
    #[must_use]
    pub fn load(schema: &Value) -> (Self, Vec<Diagnostic>) {
        let mut db = Database::default();
        let mut diagnostics = Vec::new();

        for (name, values) in section_entries(schema, "sets", &mut diagnostics) {
            if !grammar::is_identifier(&name) {
                diagnostics.push(Diagnostic::MalformedName { name });
                continue;
            }
            match check_set(&values) {
                Ok(elements) => {
                    db.sets
                        .insert(name.clone(), PlaceholderSet::from_checked(name, elements));
                }
                Err(violation) => diagnostics.push(Diagnostic::InvalidSet {
                    name,
                    violation,
                    value: values,
                }),
            }
        }

        for (name, decl) in section_entries(schema, "subsets", &mut diagnostics) {
            if !grammar::is_identifier(&name) {
                diagnostics.push(Diagnostic::MalformedName { name });
                continue;
            }
            match db.check_subset(&decl) {
                Ok((superset, elements)) => {
                    db.subsets.entry(superset).or_default().push(name.clone());
                    db.sets
                        .insert(name.clone(), PlaceholderSet::from_checked(name, elements));
                }
                Err(violation) => diagnostics.push(Diagnostic::InvalidSubset { name, violation }),
            }
        }

        for (key, mapping) in section_entries(schema, "functions", &mut diagnostics) {
            let Some(signature) = Signature::parse(&key) else {
                diagnostics.push(Diagnostic::MalformedSignature { signature: key });
                continue;
            };
            if signature.name == IDENTITY_FUNCTION {
                diagnostics.push(Diagnostic::ReservedSignature { signature });
                continue;
            }
            match check_function(&signature, &mapping, &db.sets) {
                Ok(function) => {
                    db.functions.insert(signature, function);
                }
                Err(violations) => {
                    diagnostics.extend(violations.into_iter().map(|violation| {
                        Diagnostic::InvalidFunction {
                            signature: signature.clone(),
                            violation,
                        }
                    }));
                }
            }
        }

        for (key, mapping) in section_entries(schema, "relations", &mut diagnostics) {
            let Some(signature) = Signature::parse(&key) else {
                diagnostics.push(Diagnostic::MalformedSignature { signature: key });
                continue;
            };
            match check_relation(&signature, &mapping, &db.sets) {
                Ok(relation) => {
                    db.relations.insert(signature, relation);
                }
                Err(violations) => {
                    diagnostics.extend(violations.into_iter().map(|violation| {
                        Diagnostic::InvalidRelation {
                            signature: signature.clone(),
                            violation,
                        }
                    }));
                }
            }
        }

        match schema.get("ignore") {
            None => {}
            Some(Value::Array(items)) => {
                for item in items {
                    match item.as_str() {
                        Some(token) => {
                            db.ignored.insert(token.to_string());
                        }
                        None => diagnostics.push(Diagnostic::MalformedSection {
                            section: "ignore".into(),
                            reason: format!("`{item}` is not a string"),
                        }),
                    }
                }
            }
            Some(_) => diagnostics.push(Diagnostic::MalformedSection {
                section: "ignore".into(),
                reason: "expected a list of names".into(),
            }),
        }

        db.derive_subset_declarations();
        db.add_identity_functions();
        db.index_arguments();

        debug!(
            sets = db.sets.len(),
            functions = db.functions.len(),
            relations = db.relations.len(),
            diagnostics = diagnostics.len(),
            "placeholder database loaded"
        );
        (db, diagnostics)
    }

    fn check_subset(&self, decl: &Value) -> Result<(String, Vec<Atom>), SubsetViolation> {
        let superset_name = decl
            .get("set")
            .and_then(Value::as_str)
            .ok_or(SubsetViolation::Malformed)?;
        let values = decl.get("elements").ok_or(SubsetViolation::Malformed)?;
        let superset = self
            .sets
            .get(superset_name)
            .ok_or_else(|| SubsetViolation::UnknownSuperset(superset_name.to_string()))?;
        let elements = check_set(values).map_err(SubsetViolation::Elements)?;
        if let Some(foreign) = elements.iter().find(|e| !superset.elements().contains(e)) {
            return Err(SubsetViolation::Foreign {
                element: foreign.text(),
                superset: superset_name.to_string(),
            });
        }
        Ok((superset_name.to_string(), elements))
    }

    /// Restricts every function and relation over a superset to each of its
    /// subsets, unless the restricted signature was declared explicitly.
    fn derive_subset_declarations(&mut self) {
        let mut functions = Vec::new();
        let mut relations = Vec::new();
        for (superset, subsets) in &self.subsets {
            for subset in subsets.iter().filter_map(|s| self.sets.get(s)) {
                for function in self.functions.values() {
                    if &function.signature().argument == superset {
                        functions.push(function.restrict(subset));
                    }
                }
                for relation in self.relations.values() {
                    if &relation.signature().argument == superset {
                        relations.push(relation.restrict(subset));
                    }
                }
            }
        }
        for function in functions {
            let signature = function.signature().clone();
            if !self.functions.contains_key(&signature) {
                self.derived.insert(signature.clone());
                self.functions.insert(signature, function);
            }
        }
        for relation in relations {
            let signature = relation.signature().clone();
            if !self.relations.contains_key(&signature) {
                self.derived.insert(signature.clone());
                self.relations.insert(signature, relation);
            }
        }
    }

    /// Synthesizes `SAME[S]` for every set `S`. Running it again leaves the
    /// function table unchanged.
    pub(crate) fn add_identity_functions(&mut self) {
        for set in self.sets.values() {
            let identity = Function::identity(set);
            self.functions.insert(identity.signature().clone(), identity);
        }
    }

    fn index_arguments(&mut self) {
        self.arguments = self
            .functions
            .keys()
            .chain(self.relations.keys())
            .map(|sig| (sig.clone(), sig.argument.clone()))
            .collect();
    }

    /// Looks up a set by name.
    #[must_use]
    pub fn set(&self, name: &str) -> Option<&PlaceholderSet> {
        self.sets.get(name)
    }

    /// Looks up a function by signature.
    #[must_use]
    pub fn function(&self, signature: &Signature) -> Option<&Function> {
        self.functions.get(signature)
    }

    /// Looks up a relation by signature.
    #[must_use]
    pub fn relation(&self, signature: &Signature) -> Option<&Relation> {
        self.relations.get(signature)
    }

    /// Returns the argument set of a function or relation signature.
    #[must_use]
    pub fn argument_set(&self, signature: &Signature) -> Option<&str> {
        self.arguments.get(signature).map(String::as_str)
    }

    /// All sets, ordered by name.
    pub fn sets(&self) -> impl Iterator<Item = &PlaceholderSet> {
        self.sets.values()
    }

    /// All functions (declared, derived, and built-in), ordered by signature.
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }

    /// All relations (declared and derived), ordered by signature.
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }

    /// Returns true if `signature` was derived for a subset.
    #[must_use]
    pub fn is_derived(&self, signature: &Signature) -> bool {
        self.derived.contains(signature)
    }

    /// Returns true if `(name)` is an ignored acronym rather than a set
    /// reference.
    #[must_use]
    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignored.contains(name)
    }

    /// Returns true if the placeholder names something this database declares.
    #[must_use]
    pub fn is_known(&self, placeholder: &Placeholder) -> bool {
        match placeholder {
            Placeholder::Set(name) => self.sets.contains_key(name),
            Placeholder::Function(sig) => self.functions.contains_key(sig),
            Placeholder::Relation(sig) => self.relations.contains_key(sig),
        }
    }

    /// Returns every occurrence of one placeholder form in `text`, plus an
    /// unknown-reference diagnostic for each occurrence this database does
    /// not declare. Unknown occurrences are still returned.
    #[must_use]
    pub fn extract(&self, text: &str, kind: PlaceholderKind) -> (Vec<Placeholder>, Vec<Diagnostic>) {
        let found: Vec<Placeholder> = grammar::scan(text, kind)
            .into_iter()
            .filter(|p| !self.ignores(p))
            .collect();
        let diagnostics = found
            .iter()
            .filter(|p| !self.is_known(p))
            .map(Diagnostic::unknown)
            .collect();
        (found, diagnostics)
    }

    /// Returns the first placeholder of `kind` in a string or, scanning in
    /// order, in the elements of a list or the values of an object.
    #[must_use]
    pub fn first_placeholder(&self, value: &Value, kind: PlaceholderKind) -> Option<Placeholder> {
        match value {
            Value::String(text) => self.first_placeholder_in(text, kind),
            Value::Array(items) => items.iter().find_map(|v| self.first_placeholder(v, kind)),
            Value::Object(map) => map.values().find_map(|v| self.first_placeholder(v, kind)),
            _ => None,
        }
    }

    /// Returns the first placeholder of `kind` in `text`.
    #[must_use]
    pub fn first_placeholder_in(&self, text: &str, kind: PlaceholderKind) -> Option<Placeholder> {
        grammar::scan(text, kind)
            .into_iter()
            .find(|p| !self.ignores(p))
    }

    fn ignores(&self, placeholder: &Placeholder) -> bool {
        matches!(placeholder, Placeholder::Set(name) if self.is_ignored(name))
    }
}

/// Replaces `placeholder` by `replacement` in a string, in every element of
/// a list, or in every value of an object. Object keys and non-string
/// scalars are left untouched.
#[must_use]
pub fn substitute(value: &Value, placeholder: &Placeholder, replacement: &str) -> Value {
    match value {
        Value::String(text) => Value::String(grammar::substitute_str(text, placeholder, replacement)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| substitute(v, placeholder, replacement))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, placeholder, replacement)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Reads a declaration section as `(key, value)` pairs in document order.
fn section_entries(schema: &Value, section: &str, diagnostics: &mut Vec<Diagnostic>) -> Vec<(String, Value)> {
    match schema.get(section) {
        None => Vec::new(),
        Some(Value::Object(map)) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        Some(Value::Array(items)) => {
            let mut entries = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                match item.as_object() {
                    Some(map) if map.len() == 1 => {
                        entries.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
                    }
                    _ => diagnostics.push(Diagnostic::MalformedSection {
                        section: section.to_string(),
                        reason: format!("entry {index} is not a single-entry object"),
                    }),
                }
            }
            entries
        }
        Some(_) => {
            diagnostics.push(Diagnostic::MalformedSection {
                section: section.to_string(),
                reason: "expected an object or a list of single-entry objects".into(),
            });
            Vec::new()
        }
    }
}
