//! Entity-map expansion (components, problems, errors).
//!
//! A key holding a set placeholder becomes one entity per set element. In
//! each copy the function placeholders of attribute keys and values are
//! evaluated at that element.

use faultkb_schema::grammar::substitute_str;
use faultkb_schema::{Attributes, Database, EntityMap};
use serde_json::Value;
use tracing::debug;

use crate::resolve::Resolver;
use crate::Expansion;

/// Expands every templated key of `map`.
#[must_use]
pub fn expand_entities(map: &EntityMap, db: &Database) -> Expansion<EntityMap> {
    let mut resolver = Resolver::new(db);
    let mut output = EntityMap::default();

    for (key, attributes) in &map.entries {
        let Some((placeholder, set)) = resolver.driving_set(&Value::String(key.clone())) else {
            output.entries.push((key.clone(), attributes.clone()));
            continue;
        };
        debug!(key = %key, set = set.name(), "expanding entity");
        for element in set.elements() {
            let new_key = substitute_str(key, &placeholder, &element.text());
            let mut new_attributes = Attributes::with_capacity(attributes.len());
            for (name, value) in attributes {
                new_attributes.insert(
                    resolver.apply_function_to_key(name, element),
                    resolver.apply_function(value, element),
                );
            }
            output.entries.push((new_key, new_attributes));
        }
    }

    Expansion {
        output,
        diagnostics: resolver.into_diagnostics(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultkb_schema::{Diagnostic, PlaceholderKind};
    use serde_json::json;

    fn db() -> Database {
        Database::load(&json!({
            "sets": {"SIDE": ["l", "r"], "ARM": ["1", "2", "3", "4"]},
            "functions": {
                "ENG[SIDE]": {"l": "Left", "r": "Right"},
                "SPA[SIDE]": {"l": "Izquierda", "r": "Derecha"}
            }
        }))
        .0
    }

    fn entities(value: Value) -> EntityMap {
        EntityMap::from_value(value).expect("entity map")
    }

    #[test]
    fn one_entity_per_element() {
        let map = entities(json!({
            "aux_light_(SIDE)": {
                "type": "light",
                "name": "(ENG[SIDE]) auxiliary light",
                "name_spanish": "Luz auxiliar (SPA[SIDE])"
            },
            "pdb": {"type": "board", "name": "Power distribution board"}
        }));
        let expansion = expand_entities(&map, &db());
        assert!(expansion.diagnostics.is_empty());
        assert_eq!(
            expansion.output.to_value(),
            json!({
                "aux_light_l": {
                    "type": "light",
                    "name": "Left auxiliary light",
                    "name_spanish": "Luz auxiliar Izquierda"
                },
                "aux_light_r": {
                    "type": "light",
                    "name": "Right auxiliary light",
                    "name_spanish": "Luz auxiliar Derecha"
                },
                "pdb": {"type": "board", "name": "Power distribution board"}
            })
        );
    }

    #[test]
    fn cardinality_follows_the_set() {
        let map = entities(json!({"m(ARM)_esc": {}, "fixed": {}}));
        let expansion = expand_entities(&map, &db());
        assert_eq!(expansion.output.len(), 5);
    }

    #[test]
    fn identity_function_and_list_values() {
        let map = entities(json!({
            "cable_(SIDE)": {"ends": ["pdb", "light_(SAME[SIDE])"], "weight": 0.2}
        }));
        let expansion = expand_entities(&map, &db());
        assert_eq!(
            expansion.output.get("cable_r").map(|a| a["ends"].clone()),
            Some(json!(["pdb", "light_r"]))
        );
        assert_eq!(
            expansion.output.get("cable_l").map(|a| a["weight"].clone()),
            Some(json!(0.2))
        );
    }

    #[test]
    fn function_in_attribute_key() {
        let map = entities(json!({"x_(SIDE)": {"note_(ENG[SIDE])": "n"}}));
        let expansion = expand_entities(&map, &db());
        assert!(expansion
            .output
            .get("x_l")
            .is_some_and(|a| a.contains_key("note_Left")));
    }

    #[test]
    fn unknown_set_is_reported_and_copied() {
        let map = entities(json!({"leg_(LEG)": {"name": "Leg"}}));
        let expansion = expand_entities(&map, &db());
        assert_eq!(expansion.output, map);
        assert_eq!(
            expansion.diagnostics,
            vec![Diagnostic::UnknownReference {
                kind: PlaceholderKind::Set,
                name: "LEG".into()
            }]
        );
    }

    #[test]
    fn function_over_another_set_is_outside_domain() {
        let map = entities(json!({"m(ARM)": {"name": "(ENG[SIDE])"}}));
        let expansion = expand_entities(&map, &db());
        assert_eq!(expansion.output.len(), 4);
        assert_eq!(expansion.diagnostics.len(), 4);
        assert!(matches!(
            expansion.diagnostics[0],
            Diagnostic::OutsideDomain { .. }
        ));
    }

    #[test]
    fn expanded_documents_are_fixed_points() {
        let map = entities(json!({"aux_light_(SIDE)": {"name": "(ENG[SIDE])"}}));
        let once = expand_entities(&map, &db()).output;
        let twice = expand_entities(&once, &db());
        assert_eq!(twice.output, once);
        assert!(twice.diagnostics.is_empty());
    }
}
