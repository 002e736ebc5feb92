//! Vocabulary table invariants and value coercion properties.

use material_forge::value::{Value, ValueType, coerce};
use material_forge::vocab::Vocabulary;
use proptest::prelude::*;

#[test]
fn node_types_survive_the_generic_round_trip() {
    let vocab = Vocabulary::load_default().unwrap();

    for (renderer, profile, table) in vocab.node_type_tables() {
        for (specific, generic) in table {
            let Some(back) = vocab.renderer_node_type(renderer, profile, generic) else {
                panic!("no reverse mapping for {generic} in {}", renderer.key());
            };
            // Two specific types may share a generic tag; the canonical
            // reverse must at least map back onto the same generic.
            assert_eq!(
                vocab.generic_node_type(renderer, profile, back),
                Some(generic.as_str()),
                "{}/{profile:?}: {specific} -> {generic} -> {back} broke the pivot",
                renderer.key()
            );
            if back == specific {
                // The canonical entry round-trips exactly.
                assert_eq!(
                    vocab
                        .renderer_node_type(renderer, profile, generic)
                        .map(|t| vocab.generic_node_type(renderer, profile, t)),
                    Some(Some(generic.as_str()))
                );
            }
        }
    }
}

#[test]
fn every_generic_output_slot_has_an_index_where_sinks_exist() {
    let vocab = Vocabulary::load_default().unwrap();
    for renderer in [
        material_forge::vocab::Renderer::Arnold,
        material_forge::vocab::Renderer::Mtlx,
        material_forge::vocab::Renderer::RedshiftVopnet,
    ] {
        for slot in ["GENERIC::output_surface", "GENERIC::output_displacement"] {
            assert!(
                vocab.output_slot_index(renderer, slot).is_some(),
                "{} missing slot index for {slot}",
                renderer.key()
            );
        }
    }
}

proptest! {
    #[test]
    fn scalars_broadcast_into_any_vector_arity(x in -1.0e6f64..1.0e6, n in 2usize..=4) {
        let want = ValueType::FloatVec(n as u8);
        let coerced = coerce(Value::Float(x), want).unwrap();
        prop_assert_eq!(coerced, Value::Tuple(vec![x; n]));
    }

    #[test]
    fn matching_tuples_pass_through_unchanged(v in proptest::collection::vec(-1.0e6f64..1.0e6, 3)) {
        let coerced = coerce(Value::Tuple(v.clone()), ValueType::Rgb).unwrap();
        prop_assert_eq!(coerced, Value::Tuple(v));
    }

    #[test]
    fn singleton_tuples_unwrap_before_scalar_slots(x in -1.0e6f64..1.0e6) {
        let coerced = coerce(Value::Tuple(vec![x]), ValueType::Float).unwrap();
        prop_assert_eq!(coerced, Value::Float(x));
    }
}
