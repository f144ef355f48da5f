//! Tests for generation distances

use phtree::application::example::hominoidea;
use phtree::domain::{EditMode, LineageArena, SpeciesDraft, SpeciesId};
use phtree::util::testing::root;
use rstest::{fixture, rstest};

#[fixture]
fn sample() -> (LineageArena, SpeciesId) {
    let mut arena = LineageArena::new();
    let root = arena.from_json(&hominoidea().unwrap(), None).unwrap();
    (arena, root)
}

fn find(arena: &LineageArena, root: SpeciesId, name: &str) -> SpeciesId {
    arena.species(root).unwrap().find(name).unwrap().id()
}

#[rstest]
#[case("Hominoidea", 0)]
#[case("Hilobates", 1)]
#[case("Homo", 4)]
#[case("Pan Paniscus", 5)]
fn given_sample_tree_when_counting_steps_then_matches_depth(
    sample: (LineageArena, SpeciesId),
    #[case] name: &str,
    #[case] expected: usize,
) {
    // Arrange
    let (arena, root) = sample;
    let target = find(&arena, root, name);

    // Act
    let steps = arena.species(root).unwrap().steps_until(target, false);

    // Assert
    assert_eq!(steps, Some(expected));
}

#[rstest]
fn given_sample_tree_when_measuring_extent_then_deepest_leaf_wins(sample: (LineageArena, SpeciesId)) {
    // Arrange
    let (arena, root) = sample;

    // Act
    let extent = arena.species(root).unwrap().steps_until_last_descendant(false);

    // Assert
    assert_eq!(extent, 5);
}

#[rstest]
fn given_target_outside_subtree_when_counting_steps_then_not_found(sample: (LineageArena, SpeciesId)) {
    // Arrange
    let (arena, root) = sample;
    let pongo = arena.species(find(&arena, root, "Pongo")).unwrap();
    let homo = find(&arena, root, "Homo");

    // Act
    let chain = pongo.steps_chain(homo, false);
    let steps = pongo.steps_until(homo, false);

    // Assert
    assert!(chain.is_empty());
    assert_eq!(steps, None);
    assert!(!pongo.reaches(homo));
}

#[rstest]
fn given_chain_when_listing_then_runs_from_self_to_target(sample: (LineageArena, SpeciesId)) {
    // Arrange
    let (arena, root) = sample;
    let homininae = arena.species(find(&arena, root, "Homininae")).unwrap();
    let homo = find(&arena, root, "Homo");

    // Act
    let chain: Vec<&str> = homininae
        .steps_chain(homo, false)
        .into_iter()
        .map(|id| arena.species(id).unwrap().name())
        .collect();

    // Assert
    assert_eq!(chain, vec!["Homininae", "Hominini", "Homo"]);
}

#[test]
fn given_hidden_node_on_path_when_counting_steps_then_skipped_unless_included() {
    // Arrange
    let mut arena = LineageArena::new();
    let top = root(&mut arena, "top", 0.0, 10.0);
    let hidden = arena
        .add_descendant(top, SpeciesDraft::new("hidden", 1.0, 5.0).display(false), EditMode::InPlace)
        .unwrap();
    let leaf = arena
        .add_descendant(hidden, SpeciesDraft::new("leaf", 1.0, 1.0), EditMode::InPlace)
        .unwrap();
    let top_ref = arena.species(top).unwrap();

    // Act
    let visible = top_ref.steps_until(leaf, false);
    let all = top_ref.steps_until(leaf, true);

    // Assert
    assert_eq!(visible, Some(1));
    assert_eq!(all, Some(2));
    assert_eq!(top_ref.steps_chain(leaf, false), vec![top, leaf]);
    assert_eq!(top_ref.steps_until_last_descendant(true), 2);
}

#[test]
fn given_single_node_when_counting_steps_then_zero() {
    // Arrange
    let mut arena = LineageArena::new();
    let alone = root(&mut arena, "alone", 0.0, 1.0);

    // Act
    let alone_ref = arena.species(alone).unwrap();

    // Assert
    assert_eq!(alone_ref.steps_until(alone, false), Some(0));
    assert_eq!(alone_ref.steps_until_last_descendant(false), 0);
}
