//! Atomic placeholder values.
//!
//! Set elements, function outputs, and relation images are all atoms: a JSON
//! string or a JSON number. Templates are strings, so every atom also has a
//! canonical text form used for substitution and for function lookups (JSON
//! object keys are always strings).

use std::fmt;

use serde_json::{Number, Value};

/// Primitive type of an [`Atom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AtomKind {
    /// A JSON string.
    Text,
    /// A JSON number.
    Number,
}

impl AtomKind {
    /// Returns the lowercase name used in diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AtomKind::Text => "string",
            AtomKind::Number => "number",
        }
    }
}

/// A single atomic value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Atom {
    /// A string value, e.g. `"l"`.
    Str(String),
    /// A numeric value, e.g. `1`.
    Num(Number),
}

impl Atom {
    /// Converts a JSON value into an atom. Returns `None` for null, booleans,
    /// arrays, and objects.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(Atom::Str(s.clone())),
            Value::Number(n) => Some(Atom::Num(n.clone())),
            _ => None,
        }
    }

    /// Returns the primitive type of this atom.
    #[must_use]
    pub fn kind(&self) -> AtomKind {
        match self {
            Atom::Str(_) => AtomKind::Text,
            Atom::Num(_) => AtomKind::Number,
        }
    }

    /// Returns the text form substituted into templates.
    #[must_use]
    pub fn text(&self) -> String {
        match self {
            Atom::Str(s) => s.clone(),
            Atom::Num(n) => n.to_string(),
        }
    }

    /// Converts the atom back into a JSON value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Atom::Str(s) => Value::String(s.clone()),
            Atom::Num(n) => Value::Number(n.clone()),
        }
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Str(s) => f.write_str(s),
            Atom::Num(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Atom {
    fn from(s: &str) -> Self {
        Atom::Str(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn atoms_from_json() {
        assert_eq!(Atom::from_value(&json!("l")), Some(Atom::from("l")));
        assert_eq!(
            Atom::from_value(&json!(3)).map(|a| a.kind()),
            Some(AtomKind::Number)
        );
        assert_eq!(Atom::from_value(&json!(null)), None);
        assert_eq!(Atom::from_value(&json!(["l"])), None);
        assert_eq!(Atom::from_value(&json!(true)), None);
    }

    #[test]
    fn numeric_text_form() {
        let atom = Atom::from_value(&json!(5)).expect("numbers are atoms");
        assert_eq!(atom.text(), "5");
        assert_eq!(atom.to_value(), json!(5));
    }
}
