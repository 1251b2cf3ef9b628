//! Pair-list expansion (connections).
//!
//! The first element's set drives iteration and the second element is
//! resolved at each set element through a function or a relation. A relation
//! emits one pair per element of its image. If only the second element holds
//! a set, it drives iteration and the first element is copied. A pair whose
//! first element names an undeclared set is reported and copied unchanged.

use faultkb_schema::grammar::substitute_str;
use faultkb_schema::{Database, Pair, PairList};
use serde_json::Value;
use tracing::debug;

use crate::resolve::Resolver;
use crate::Expansion;

/// Expands every templated pair of `list`.
#[must_use]
pub fn expand_pairs(list: &PairList, db: &Database) -> Expansion<PairList> {
    let mut resolver = Resolver::new(db);
    let mut pairs = Vec::with_capacity(list.pairs.len());

    for Pair(a, b) in &list.pairs {
        let a_value = Value::String(a.clone());
        let b_value = Value::String(b.clone());

        if resolver.has_set(&a_value) {
            let Some((placeholder, set)) = resolver.driving_set(&a_value) else {
                pairs.push(Pair(a.clone(), b.clone()));
                continue;
            };
            debug!(first = %a, second = %b, set = set.name(), "expanding pair");
            for element in set.elements() {
                let first = substitute_str(a, &placeholder, &element.text());
                if resolver.has_function(&b_value) {
                    let second = resolver.apply_function_to_key(b, element);
                    pairs.push(Pair(first, second));
                } else if resolver.has_relation(&b_value) {
                    match resolver.relation_image(&b_value, element) {
                        Some((relation, image)) => {
                            for output in image {
                                let second = substitute_str(b, &relation, &output.text());
                                pairs.push(Pair(first.clone(), second));
                            }
                        }
                        None => pairs.push(Pair(first, b.clone())),
                    }
                } else {
                    pairs.push(Pair(first, b.clone()));
                }
            }
        } else if let Some((placeholder, set)) = resolver.driving_set(&b_value) {
            debug!(first = %a, second = %b, set = set.name(), "expanding pair by second element");
            for element in set.elements() {
                let second = substitute_str(b, &placeholder, &element.text());
                pairs.push(Pair(a.clone(), second));
            }
        } else {
            pairs.push(Pair(a.clone(), b.clone()));
        }
    }

    Expansion {
        output: PairList { pairs },
        diagnostics: resolver.into_diagnostics(),
    }
}
