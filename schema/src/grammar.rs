//! Placeholder grammar.
//!
//! Three occurrence forms are recognized inside any string, each wrapped in
//! parentheses:
//!
//! | Form | Syntax | Example |
//! |------|--------|---------|
//! | Set reference | `(NAME)` | `cable_(SIDE)` |
//! | Function call | `(NAME[ARG])` | `light_(ENG[SIDE])` |
//! | Relation call | `(*NAME[ARG])` | `motor_(*MOTOR[ARM])` |
//!
//! `NAME` and `ARG` match `[A-Z][A-Z0-9_]*`. Placeholders never nest.

// The patterns below are literals exercised by the unit tests.
#![allow(clippy::expect_used)]

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Identifier syntax shared by set names, function names, and arguments.
pub const IDENTIFIER: &str = "[A-Z][A-Z0-9_]*";

/// Any placeholder occurrence. Group 1 is the relation star, group 2 the
/// name, group 3 the argument.
static OCCURRENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\((\*)?([A-Z][A-Z0-9_]*)(?:\[([A-Z][A-Z0-9_]*)\])?\)")
        .expect("occurrence pattern")
});

/// A complete `NAME[ARG]` signature.
static SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][A-Z0-9_]*)\[([A-Z][A-Z0-9_]*)\]$").expect("signature pattern")
});

/// A bare identifier.
static NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("identifier pattern"));

/// Returns true if `name` is a valid set or function identifier.
#[must_use]
pub fn is_identifier(name: &str) -> bool {
    NAME.is_match(name)
}

/// A function or relation signature `NAME[ARG]`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Signature {
    /// Function or relation name, e.g. `ENG`.
    pub name: String,
    /// Name of the argument set, e.g. `SIDE`.
    pub argument: String,
}

impl Signature {
    /// Builds a signature from its parts.
    pub fn new(name: impl Into<String>, argument: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            argument: argument.into(),
        }
    }

    /// Parses `NAME[ARG]`. Returns `None` if the text is not exactly one
    /// signature.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let caps = SIGNATURE.captures(text)?;
        Some(Self::new(&caps[1], &caps[2]))
    }

    /// Signature of the built-in identity function over `set`.
    #[must_use]
    pub fn identity(set: &str) -> Self {
        Self::new(IDENTITY_FUNCTION, set)
    }

    /// Returns the same function name applied to a different argument set.
    #[must_use]
    pub fn with_argument(&self, argument: &str) -> Self {
        Self::new(self.name.clone(), argument)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.name, self.argument)
    }
}

/// Name of the built-in identity function synthesized for every set.
pub const IDENTITY_FUNCTION: &str = "SAME";

/// The three placeholder forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// `(NAME)`
    Set,
    /// `(NAME[ARG])`
    Function,
    /// `(*NAME[ARG])`
    Relation,
}

impl PlaceholderKind {
    /// Returns the lowercase name used in diagnostics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PlaceholderKind::Set => "set",
            PlaceholderKind::Function => "function",
            PlaceholderKind::Relation => "relation",
        }
    }
}

impl fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single placeholder occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Placeholder {
    /// Reference to a set.
    Set(String),
    /// Call of a function.
    Function(Signature),
    /// Call of a relation.
    Relation(Signature),
}

impl Placeholder {
    /// Returns the form of this placeholder.
    #[must_use]
    pub fn kind(&self) -> PlaceholderKind {
        match self {
            Placeholder::Set(_) => PlaceholderKind::Set,
            Placeholder::Function(_) => PlaceholderKind::Function,
            Placeholder::Relation(_) => PlaceholderKind::Relation,
        }
    }

    /// Returns the parenthesized text as it appears in a template.
    #[must_use]
    pub fn token(&self) -> String {
        format!("({self})")
    }
}

impl fmt::Display for Placeholder {
    /// Formats the placeholder without its parentheses: `SIDE`,
    /// `ENG[SIDE]`, or `*MOTOR[ARM]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placeholder::Set(name) => f.write_str(name),
            Placeholder::Function(sig) => write!(f, "{sig}"),
            Placeholder::Relation(sig) => write!(f, "*{sig}"),
        }
    }
}

/// Returns every placeholder occurrence in `text`, in order of appearance.
#[must_use]
pub fn scan_all(text: &str) -> Vec<Placeholder> {
    OCCURRENCE
        .captures_iter(text)
        .filter_map(|caps| {
            let starred = caps.get(1).is_some();
            let name = caps[2].to_string();
            match (starred, caps.get(3)) {
                (false, None) => Some(Placeholder::Set(name)),
                (false, Some(arg)) => Some(Placeholder::Function(Signature::new(name, arg.as_str()))),
                (true, Some(arg)) => Some(Placeholder::Relation(Signature::new(name, arg.as_str()))),
                // `(*NAME)` is not a placeholder form.
                (true, None) => None,
            }
        })
        .collect()
}

/// Returns every occurrence of one placeholder form in `text`, in order.
#[must_use]
pub fn scan(text: &str, kind: PlaceholderKind) -> Vec<Placeholder> {
    scan_all(text)
        .into_iter()
        .filter(|p| p.kind() == kind)
        .collect()
}

/// Replaces every occurrence of `placeholder` (with its parentheses) in
/// `text` by `replacement`.
#[must_use]
pub fn substitute_str(text: &str, placeholder: &Placeholder, replacement: &str) -> String {
    text.replace(&placeholder.token(), replacement)
}
