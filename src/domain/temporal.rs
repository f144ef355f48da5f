//! Derived time getters.

use crate::domain::arena::SpeciesRef;

impl<'a> SpeciesRef<'a> {
    /// End of this species' own segment.
    pub fn extinction(&self) -> f64 {
        self.species().extinction()
    }

    /// Latest extinction over this species and its whole subtree.
    ///
    /// Descendant lineages may outlive the segment of their ancestor.
    pub fn absolute_extinction(&self) -> f64 {
        self.arena()
            .iter_subtree(self.id())
            .map(|(_, node)| node.species().extinction())
            .fold(self.extinction(), f64::max)
    }

    pub fn absolute_duration(&self) -> f64 {
        self.absolute_extinction() - self.apparition()
    }

    /// Top of the ancestor chain.
    ///
    /// Unless `include_hidden` is set, climbing stops below the first
    /// ancestor that is not displayed, so synthetic roots stay out of sight.
    pub fn first_ancestor(&self, include_hidden: bool) -> SpeciesRef<'a> {
        let mut current = *self;
        while let Some(ancestor) = current.ancestor() {
            if !(ancestor.is_displayed() || include_hidden) {
                break;
            }
            current = ancestor;
        }
        current
    }

    /// Absolute extinction of the visible tree this species belongs to.
    pub fn cousins_extinction(&self) -> f64 {
        self.first_ancestor(false).absolute_extinction()
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{EditMode, LineageArena, Species, SpeciesDraft};

    #[test]
    fn given_long_lived_descendant_when_aggregating_then_subtree_extinction_wins() {
        let mut arena = LineageArena::new();
        let root = arena.insert(Species::new("root", -10.0, 10.0).unwrap());
        let child = arena
            .add_descendant(root, SpeciesDraft::new("child", 10.0, 25.0), EditMode::InPlace)
            .unwrap();

        let root_ref = arena.species(root).unwrap();
        assert_eq!(root_ref.extinction(), 0.0);
        assert_eq!(root_ref.absolute_extinction(), 25.0);
        assert_eq!(root_ref.absolute_duration(), 35.0);
        assert_eq!(arena.species(child).unwrap().cousins_extinction(), 25.0);
    }
}
