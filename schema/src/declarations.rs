//! Set, function, and relation declarations and their well-formedness checks.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde_json::{Map, Value};

use crate::atom::Atom;
use crate::diagnostic::{MappingViolation, SetViolation};
use crate::grammar::Signature;

/// A named, ordered, non-empty sequence of unique atoms of one primitive type.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderSet {
    name: String,
    elements: Vec<Atom>,
}

impl PlaceholderSet {
    /// Checks `values` and builds the set.
    ///
    /// # Errors
    ///
    /// Returns the first [`SetViolation`] found.
    pub fn new(name: impl Into<String>, values: &Value) -> Result<Self, SetViolation> {
        let elements = check_set(values)?;
        Ok(Self {
            name: name.into(),
            elements,
        })
    }

    pub(crate) fn from_checked(name: impl Into<String>, elements: Vec<Atom>) -> Self {
        Self {
            name: name.into(),
            elements,
        }
    }

    /// Set name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Elements in declaration order.
    #[must_use]
    pub fn elements(&self) -> &[Atom] {
        &self.elements
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always false for a constructed set; present for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns true if an element has the text form `text`.
    #[must_use]
    pub fn contains_text(&self, text: &str) -> bool {
        self.elements.iter().any(|e| e.text() == text)
    }
}

/// A total mapping from every element of the argument set to an atom.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    signature: Signature,
    mapping: HashMap<String, Atom>,
}

impl Function {
    /// Signature `NAME[ARG]`.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Value at the element whose text form is `element`.
    #[must_use]
    pub fn apply(&self, element: &str) -> Option<&Atom> {
        self.mapping.get(element)
    }

    /// Number of mapped elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mapping.len()
    }

    /// Returns true if nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mapping.is_empty()
    }

    /// The identity function over `set`.
    #[must_use]
    pub fn identity(set: &PlaceholderSet) -> Self {
        Self {
            signature: Signature::identity(set.name()),
            mapping: set
                .elements()
                .iter()
                .map(|e| (e.text(), e.clone()))
                .collect(),
        }
    }

    /// The restriction of this function to the elements of `subset`.
    #[must_use]
    pub fn restrict(&self, subset: &PlaceholderSet) -> Self {
        Self {
            signature: self.signature.with_argument(subset.name()),
            mapping: restrict_map(&self.mapping, subset),
        }
    }
}

/// Like a [`Function`], but every element maps to a set of atoms.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    signature: Signature,
    mapping: HashMap<String, Vec<Atom>>,
}

impl Relation {
    /// Signature `NAME[ARG]`.
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Image of the element whose text form is `element`.
    #[must_use]
    pub fn image(&self, element: &str) -> Option<&[Atom]> {
        self.mapping.get(element).map(Vec::as_slice)
    }

    /// The restriction of this relation to the elements of `subset`.
    #[must_use]
    pub fn restrict(&self, subset: &PlaceholderSet) -> Self {
        Self {
            signature: self.signature.with_argument(subset.name()),
            mapping: restrict_map(&self.mapping, subset),
        }
    }
}

fn restrict_map<T: Clone>(mapping: &HashMap<String, T>, subset: &PlaceholderSet) -> HashMap<String, T> {
    subset
        .elements()
        .iter()
        .filter_map(|e| {
            let key = e.text();
            mapping.get(&key).map(|v| (key, v.clone()))
        })
        .collect()
}

/// Checks the set invariant and returns the elements as atoms.
///
/// # Errors
///
/// Returns the first [`SetViolation`] found: not a list, empty, non-atomic
/// element, mixed types, or a repeated element.
pub fn check_set(values: &Value) -> Result<Vec<Atom>, SetViolation> {
    let items = values.as_array().ok_or(SetViolation::NotAList)?;
    if items.is_empty() {
        return Err(SetViolation::Empty);
    }
    let mut atoms = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        atoms.push(Atom::from_value(item).ok_or(SetViolation::NonAtomic { index })?);
    }
    let kind = atoms[0].kind();
    if atoms.iter().any(|a| a.kind() != kind) {
        return Err(SetViolation::MixedTypes);
    }
    let mut seen = HashSet::new();
    for atom in &atoms {
        let text = atom.text();
        if !seen.insert(text.clone()) {
            return Err(SetViolation::Duplicate { element: text });
        }
    }
    Ok(atoms)
}

/// Returns true if `values` satisfies the set invariant.
#[must_use]
pub fn is_valid_set(values: &Value) -> bool {
    check_set(values).is_ok()
}

/// Checks that the keys of `mapping` are exactly the elements of `argument`.
fn check_domain(mapping: &Map<String, Value>, argument: &PlaceholderSet) -> Vec<MappingViolation> {
    let mut violations = Vec::new();
    let missing: Vec<String> = argument
        .elements()
        .iter()
        .map(Atom::text)
        .filter(|t| !mapping.contains_key(t))
        .collect();
    if !missing.is_empty() {
        violations.push(MappingViolation::MissingKeys(missing));
    }
    let extra: Vec<String> = mapping
        .keys()
        .filter(|k| !argument.contains_text(k))
        .cloned()
        .collect();
    if !extra.is_empty() {
        violations.push(MappingViolation::ExtraKeys(extra));
    }
    violations
}

fn argument_set<'a>(
    signature: &Signature,
    sets: &'a BTreeMap<String, PlaceholderSet>,
) -> Result<&'a PlaceholderSet, MappingViolation> {
    sets.get(&signature.argument)
        .ok_or_else(|| MappingViolation::UnknownArgumentSet(signature.argument.clone()))
}

/// Checks a function declaration for totality and atomic, non-empty values.
///
/// # Errors
///
/// Returns every [`MappingViolation`] found.
pub fn check_function(
    signature: &Signature,
    mapping: &Value,
    sets: &BTreeMap<String, PlaceholderSet>,
) -> Result<Function, Vec<MappingViolation>> {
    let argument = argument_set(signature, sets).map_err(|v| vec![v])?;
    let object = mapping
        .as_object()
        .ok_or_else(|| vec![MappingViolation::NotAMapping])?;
    let mut violations = check_domain(object, argument);
    let mut values = HashMap::with_capacity(object.len());
    for (key, value) in object {
        match Atom::from_value(value) {
            Some(Atom::Str(s)) if s.trim().is_empty() => {
                violations.push(MappingViolation::EmptyValue { key: key.clone() });
            }
            Some(atom) => {
                values.insert(key.clone(), atom);
            }
            None => violations.push(MappingViolation::NonAtomicValue { key: key.clone() }),
        }
    }
    if violations.is_empty() {
        Ok(Function {
            signature: signature.clone(),
            mapping: values,
        })
    } else {
        Err(violations)
    }
}

/// Returns true if `mapping` is a valid function declaration for `signature`.
///
/// Returns false for a malformed signature.
#[must_use]
pub fn is_valid_function(
    signature: &str,
    mapping: &Value,
    sets: &BTreeMap<String, PlaceholderSet>,
) -> bool {
    Signature::parse(signature)
        .map(|sig| check_function(&sig, mapping, sets).is_ok())
        .unwrap_or(false)
}

/// Checks a relation declaration: totality over the argument set, and every
/// image a valid set.
///
/// # Errors
///
/// Returns every [`MappingViolation`] found.
pub fn check_relation(
    signature: &Signature,
    mapping: &Value,
    sets: &BTreeMap<String, PlaceholderSet>,
) -> Result<Relation, Vec<MappingViolation>> {
    let argument = argument_set(signature, sets).map_err(|v| vec![v])?;
    let object = mapping
        .as_object()
        .ok_or_else(|| vec![MappingViolation::NotAMapping])?;
    let mut violations = check_domain(object, argument);
    let mut images = HashMap::with_capacity(object.len());
    for (key, value) in object {
        match check_set(value) {
            Ok(atoms) => {
                images.insert(key.clone(), atoms);
            }
            Err(violation) => violations.push(MappingViolation::InvalidImage {
                key: key.clone(),
                violation,
            }),
        }
    }
    if violations.is_empty() {
        Ok(Relation {
            signature: signature.clone(),
            mapping: images,
        })
    } else {
        Err(violations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn side() -> BTreeMap<String, PlaceholderSet> {
        let mut sets = BTreeMap::new();
        sets.insert(
            "SIDE".to_string(),
            PlaceholderSet::new("SIDE", &json!(["l", "r"])).expect("valid set"),
        );
        sets
    }

    #[test]
    fn set_validity() {
        assert!(!is_valid_set(&json!([])));
        assert!(is_valid_set(&json!(["l", "r"])));
        assert!(is_valid_set(&json!(["l"])));
        assert!(is_valid_set(&json!([1, 2, 3])));
        assert!(!is_valid_set(&json!(["l", "r", 1])));
        assert_eq!(check_set(&json!(["l", "r", 1])), Err(SetViolation::MixedTypes));
        assert_eq!(
            check_set(&json!(["l", "l"])),
            Err(SetViolation::Duplicate {
                element: "l".into()
            })
        );
        assert_eq!(check_set(&json!("l,r")), Err(SetViolation::NotAList));
        assert_eq!(
            check_set(&json!(["l", ["r"]])),
            Err(SetViolation::NonAtomic { index: 1 })
        );
    }

    #[test]
    fn function_totality() {
        let sets = side();
        assert!(is_valid_function(
            "ENG[SIDE]",
            &json!({"l": "Left", "r": "Right"}),
            &sets
        ));
        assert!(!is_valid_function("ENG[SIDE]", &json!({"l": "Left"}), &sets));
        assert!(!is_valid_function(
            "ENG[SIDE]",
            &json!({"l": "Left", "r": "Right", "x": "Extra"}),
            &sets
        ));
        assert!(!is_valid_function(
            "ENG[INVALID]",
            &json!({"l": "Left", "r": "Right"}),
            &sets
        ));
        assert!(!is_valid_function("ENG", &json!({"l": "Left", "r": "Right"}), &sets));
    }

    #[test]
    fn function_reports_all_violations() {
        let sets = side();
        let sig = Signature::new("ENG", "SIDE");
        let violations = check_function(&sig, &json!({"l": "", "x": "Extra"}), &sets)
            .expect_err("invalid function");
        assert!(violations.contains(&MappingViolation::MissingKeys(vec!["r".into()])));
        assert!(violations.contains(&MappingViolation::ExtraKeys(vec!["x".into()])));
        assert!(violations.contains(&MappingViolation::EmptyValue { key: "l".into() }));
    }

    #[test]
    fn relation_images_must_be_sets() {
        let sets = side();
        let sig = Signature::new("LIGHTS", "SIDE");
        let rel = check_relation(&sig, &json!({"l": ["1", "2"], "r": ["3"]}), &sets)
            .expect("valid relation");
        assert_eq!(rel.image("l").map(<[Atom]>::len), Some(2));

        let violations = check_relation(&sig, &json!({"l": [], "r": ["3", "3"]}), &sets)
            .expect_err("invalid relation");
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn identity_and_restriction() {
        let sets = side();
        let same = Function::identity(&sets["SIDE"]);
        assert_eq!(same.signature().to_string(), "SAME[SIDE]");
        assert_eq!(same.apply("l"), Some(&Atom::from("l")));

        let eng = check_function(
            &Signature::new("ENG", "SIDE"),
            &json!({"l": "Left", "r": "Right"}),
            &sets,
        )
        .expect("valid function");
        let left = PlaceholderSet::new("LEFT", &json!(["l"])).expect("valid set");
        let restricted = eng.restrict(&left);
        assert_eq!(restricted.signature().to_string(), "ENG[LEFT]");
        assert_eq!(restricted.len(), 1);
        assert_eq!(restricted.apply("r"), None);
    }
}
