//! Tests for the JSON exchange format and deep copies

use phtree::application::example::{hominoidea, HOMINOIDEA_JSON};
use phtree::domain::{EditMode, LineageArena, LineageError, SpeciesDraft, SpeciesJson};
use phtree::util::testing::{root, tree_from_json};
use rstest::rstest;

// ============================================================
// toJSON / fromJSON
// ============================================================

#[test]
fn given_loaded_document_when_serializing_then_reproduces_input() {
    // Arrange
    let json = hominoidea().unwrap();
    let mut arena = LineageArena::new();
    let root = arena.from_json(&json, None).unwrap();

    // Act
    let written = arena.species(root).unwrap().to_json();

    // Assert
    assert_eq!(written, json);
}

#[test]
fn given_serialized_tree_when_reloading_then_structure_and_fields_match() {
    // Arrange
    let mut arena = LineageArena::new();
    let x = root(&mut arena, "x", -3.5, 10.0);
    arena
        .add_descendant(
            x,
            SpeciesDraft::new("y", 2.0, 4.0).description("first").image("https://example.org/y.png"),
            EditMode::InPlace,
        )
        .unwrap();
    let text = arena.species(x).unwrap().to_json_string(false).unwrap();

    // Act
    let mut other = LineageArena::new();
    let reloaded = other.from_json_str(&text).unwrap();

    // Assert
    let original = arena.species(x).unwrap();
    let copy = other.species(reloaded).unwrap();
    assert_eq!(copy.to_json(), original.to_json());
    let y = copy.find("y").unwrap();
    assert_eq!(y.apparition(), -1.5);
    assert_eq!(y.description(), Some("first"));
    assert_eq!(y.image(), Some("https://example.org/y.png"));
}

#[rstest]
#[case(-18.97, 0.763)]
#[case(0.1, 0.2)]
#[case(-25e6, 6e6)]
fn given_child_at_ancestor_extinction_when_reloading_then_succeeds(#[case] apparition: f64, #[case] duration: f64) {
    // Arrange
    let mut arena = LineageArena::new();
    let r = root(&mut arena, "r", apparition, duration);
    let c = arena
        .add_descendant(r, SpeciesDraft::new("c", duration, duration), EditMode::InPlace)
        .unwrap();
    arena
        .add_descendant(c, SpeciesDraft::new("g", duration, 1.0), EditMode::InPlace)
        .unwrap();
    let text = arena.species(r).unwrap().to_json_string(false).unwrap();

    // Act
    let mut other = LineageArena::new();
    let reloaded = other.from_json_str(&text).unwrap();

    // Assert
    let reloaded = other.species(reloaded).unwrap();
    let c = reloaded.find("c").unwrap();
    let g = reloaded.find("g").unwrap();
    assert!(reloaded.species().covers(c.apparition()));
    assert!(c.species().covers(g.apparition()));
    assert_eq!(reloaded.subtree_len(), 3);
}

#[test]
fn given_many_boundary_children_when_reloading_then_all_round_trips_succeed() {
    // Arrange
    let cases: Vec<(f64, f64)> = (1..2000)
        .map(|i| (-(i as f64) * 0.0131, i as f64 * 0.0007 + 0.001))
        .collect();

    for (apparition, duration) in cases {
        let mut arena = LineageArena::new();
        let r = root(&mut arena, "r", apparition, duration);
        arena
            .add_descendant(r, SpeciesDraft::new("c", duration, 1.0), EditMode::InPlace)
            .unwrap();
        let text = arena.species(r).unwrap().to_json_string(false).unwrap();

        // Act
        let result = LineageArena::new().from_json_str(&text);

        // Assert
        assert!(result.is_ok(), "({apparition}, {duration}): {result:?}");
    }
}

#[test]
fn given_deep_chain_when_reloading_then_every_generation_survives() {
    // Arrange
    const GENERATIONS: usize = 300;
    let mut arena = LineageArena::new();
    let first = root(&mut arena, "g0", 0.0, 1.0);
    let mut last = first;
    for generation in 1..GENERATIONS {
        last = arena
            .add_descendant(
                last,
                SpeciesDraft::new(format!("g{generation}"), 0.5, 1.0),
                EditMode::InPlace,
            )
            .unwrap();
    }
    let text = arena.species(first).unwrap().to_json_string(false).unwrap();

    // Act
    let mut other = LineageArena::new();
    let reloaded = other.from_json_str(&text).unwrap();

    // Assert
    let reloaded = other.species(reloaded).unwrap();
    assert_eq!(reloaded.subtree_len(), GENERATIONS);
    assert_eq!(reloaded.all_descendants().len(), GENERATIONS);
    assert_eq!(reloaded.steps_until_last_descendant(false), GENERATIONS - 1);
    assert_eq!(reloaded.to_json(), arena.species(first).unwrap().to_json());
}

#[test]
fn given_text_when_serializing_then_uses_camel_case_offsets() {
    // Arrange
    let mut arena = LineageArena::new();
    let x = tree_from_json(
        &mut arena,
        r#"{"name": "x", "apparition": 0, "duration": 10, "descendants": [{"name": "y", "afterApparition": 3, "duration": 1}]}"#,
    );

    // Act
    let text = arena.species(x).unwrap().to_json_string(false).unwrap();

    // Assert
    assert!(text.contains(r#""afterApparition":3.0"#), "{text}");
    assert!(!text.contains("description"), "{text}");
}

#[test]
fn given_no_apparition_when_loading_root_then_defaults_to_zero() {
    // Arrange
    let mut arena = LineageArena::new();

    // Act
    let x = tree_from_json(&mut arena, r#"{"name": "x", "duration": 1}"#);

    // Assert
    assert_eq!(arena.species(x).unwrap().apparition(), 0.0);
}

#[rstest]
#[case::zero_duration(r#"{"name": "x", "duration": 0}"#)]
#[case::child_outside(r#"{"name": "x", "duration": 5, "descendants": [{"name": "y", "afterApparition": 6, "duration": 1}]}"#)]
#[case::child_before(r#"{"name": "x", "duration": 5, "descendants": [{"name": "y", "afterApparition": -1, "duration": 1}]}"#)]
#[case::nested_child_outside(r#"{"name": "x", "duration": 5, "descendants": [{"name": "y", "afterApparition": 1, "duration": 1, "descendants": [{"name": "z", "afterApparition": 2, "duration": 1}]}]}"#)]
fn given_invalid_document_when_loading_then_nothing_is_inserted(#[case] text: &str) {
    // Arrange
    let mut arena = LineageArena::new();

    // Act
    let result = arena.from_json_str(text);

    // Assert
    assert!(result.is_err());
    assert!(arena.is_empty());
}

#[test]
fn given_malformed_text_when_loading_then_surfaces_parser_error() {
    // Arrange
    let mut arena = LineageArena::new();

    // Act
    let result = arena.from_json_str("{ not json");

    // Assert
    assert!(matches!(result, Err(LineageError::MalformedJson(_))));
}

#[test]
fn given_ancestor_when_loading_subtree_then_offsets_start_at_ancestor() {
    // Arrange
    let mut arena = LineageArena::new();
    let x = root(&mut arena, "x", 100.0, 10.0);
    let json: SpeciesJson = serde_json::from_str(r#"{"name": "y", "afterApparition": 4, "duration": 20}"#).unwrap();

    // Act
    let y = arena.from_json(&json, Some(x)).unwrap();

    // Assert
    let y_ref = arena.species(y).unwrap();
    assert_eq!(y_ref.apparition(), 104.0);
    assert_eq!(y_ref.ancestor().unwrap().id(), x);
    assert!(!y_ref.on_position());
}

// ============================================================
// Deep copies
// ============================================================

#[test]
fn given_node_when_copying_then_returns_same_row_in_isolated_clone() {
    // Arrange
    let mut arena = LineageArena::new();
    let root = tree_from_json(&mut arena, HOMINOIDEA_JSON);
    let pan = arena.species(root).unwrap().find("Pan").unwrap().id();
    let row = arena.species(root).unwrap().row_of(pan);

    // Act
    let copied = arena.copy(pan).unwrap();
    arena.set_name(copied, "Pan (edited)").unwrap();

    // Assert
    let copied_ref = arena.species(copied).unwrap();
    let clone_root = copied_ref.first_ancestor(false);
    assert_ne!(clone_root.id(), root);
    assert_eq!(clone_root.row_of(copied), row);
    assert_eq!(arena.species(pan).unwrap().name(), "Pan");
    assert_eq!(arena.len(), 22);
}

#[test]
fn given_tree_when_cloning_then_parity_and_child_order_are_preserved() {
    // Arrange
    let mut arena = LineageArena::new();
    let root = tree_from_json(&mut arena, HOMINOIDEA_JSON);

    // Act
    let clone = arena.clone_tree(root).unwrap();

    // Assert
    let original = arena.species(root).unwrap();
    let cloned = arena.species(clone).unwrap();
    let parities = |sp: phtree::domain::SpeciesRef<'_>| {
        sp.iter_subtree().map(|n| (n.name().to_string(), n.on_position())).collect::<Vec<_>>()
    };
    assert_eq!(parities(cloned), parities(original));
    assert_eq!(cloned.to_json(), original.to_json());
}

#[test]
fn given_several_roots_when_joining_then_hidden_root_spans_their_apparitions() {
    // Arrange
    let mut arena = LineageArena::new();
    let a = root(&mut arena, "a", -10.0, 5.0);
    let b = root(&mut arena, "b", -4.0, 5.0);

    // Act
    let common = arena.join_under_hidden_root(&[a, b]).unwrap();

    // Assert
    let common_ref = arena.species(common).unwrap();
    assert!(!common_ref.is_displayed());
    assert_eq!(common_ref.apparition(), -10.0);
    assert_eq!(common_ref.duration(), 6.0);
    assert_eq!(common_ref.descendants().count(), 2);
    assert!(arena.species(a).unwrap().is_root());
}

#[test]
fn given_no_roots_when_joining_then_fails() {
    // Arrange
    let mut arena = LineageArena::new();

    // Act
    let result = arena.join_under_hidden_root(&[]);

    // Assert
    assert!(matches!(result, Err(LineageError::EmptyJoin)));
}
