//! Generation distances, the horizontal unit of step (cladogram) layouts.

use crate::domain::arena::{SpeciesId, SpeciesRef};

impl<'a> SpeciesRef<'a> {
    /// Unfiltered path from this species down to `target`, both included.
    fn path_to(&self, target: SpeciesId) -> Option<Vec<SpeciesId>> {
        let arena = self.arena();
        let mut path = Vec::new();
        let mut current = Some(target);
        while let Some(id) = current {
            path.push(id);
            if id == self.id() {
                path.reverse();
                return Some(path);
            }
            current = arena.get_node(id).and_then(|node| node.ancestor());
        }
        None
    }

    /// Whether `target` is this species or one of its descendants.
    pub fn reaches(&self, target: SpeciesId) -> bool {
        self.path_to(target).is_some()
    }

    /// Path from this species to `target`, keeping displayed nodes only
    /// unless `include_hidden` is set. Empty when `target` is not in the
    /// subtree.
    pub fn steps_chain(&self, target: SpeciesId, include_hidden: bool) -> Vec<SpeciesId> {
        let arena = self.arena();
        let mut path = self.path_to(target).unwrap_or_default();
        path.retain(|&id| include_hidden || arena.node(id).species().is_displayed());
        path
    }

    /// Number of generations between this species and `target`.
    ///
    /// None when `target` is unreachable.
    pub fn steps_until(&self, target: SpeciesId, include_hidden: bool) -> Option<usize> {
        if !self.reaches(target) {
            return None;
        }
        Some(self.steps_chain(target, include_hidden).len().saturating_sub(1))
    }

    /// Largest generation distance to any leaf of the subtree.
    pub fn steps_until_last_descendant(&self, include_hidden: bool) -> usize {
        self.iter_subtree()
            .filter(|sp| sp.is_leaf())
            .map(|leaf| self.steps_until(leaf.id(), include_hidden).unwrap_or(0))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{EditMode, LineageArena, Species, SpeciesDraft};

    #[test]
    fn given_hidden_middle_node_when_counting_steps_then_skipped_unless_included() {
        let mut arena = LineageArena::new();
        let root = arena.insert(Species::new("root", 0.0, 10.0).unwrap());
        let hidden = arena
            .add_descendant(
                root,
                SpeciesDraft::new("hidden", 1.0, 5.0).display(false),
                EditMode::InPlace,
            )
            .unwrap();
        let leaf = arena
            .add_descendant(hidden, SpeciesDraft::new("leaf", 1.0, 1.0), EditMode::InPlace)
            .unwrap();

        let root_ref = arena.species(root).unwrap();
        assert_eq!(root_ref.steps_chain(leaf, false), vec![root, leaf]);
        assert_eq!(root_ref.steps_until(leaf, false), Some(1));
        assert_eq!(root_ref.steps_until(leaf, true), Some(2));
        assert_eq!(root_ref.steps_until_last_descendant(true), 2);
    }

    #[test]
    fn given_sibling_when_counting_steps_then_not_found() {
        let mut arena = LineageArena::new();
        let root = arena.insert(Species::new("root", 0.0, 10.0).unwrap());
        let a = arena
            .add_descendant(root, SpeciesDraft::new("a", 1.0, 1.0), EditMode::InPlace)
            .unwrap();
        let b = arena
            .add_descendant(root, SpeciesDraft::new("b", 2.0, 1.0), EditMode::InPlace)
            .unwrap();

        let a_ref = arena.species(a).unwrap();
        assert_eq!(a_ref.steps_until(b, false), None);
        assert!(a_ref.steps_chain(b, false).is_empty());
        assert_eq!(a_ref.steps_until_last_descendant(false), 0);
    }
}
