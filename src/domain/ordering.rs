//! Balanced row ordering of a lineage subtree.
//!
//! For a node `n`, children are sorted by apparition (latest first, ties
//! broken by absolute extinction, latest first) and split into
//!
//! - sequential children, appearing at or after the extinction of `n`,
//! - concurrent children, appearing while `n` still exists.
//!
//! The sequential children are split in two halves around `n` (the parity
//! of `n` decides which half gets the odd one) and the concurrent children
//! follow:
//!
//! ```text
//! order(S[..split]) ++ [n] ++ order(S[split..]) ++ order(C)
//! ```
//!
//! The result is the single source of truth for vertical placement. It is
//! recomputed on every call; callers that cache it must invalidate on
//! mutation.

use std::collections::HashMap;

use itertools::Itertools;
use tracing::instrument;

use crate::domain::arena::{LineageArena, SpeciesId, SpeciesRef};

/// One ordering pass over a subtree.
///
/// Absolute extinctions are computed once, bottom-up, so sorting the
/// children of every node does not rescan their subtrees.
pub struct TreeOrderer<'a> {
    arena: &'a LineageArena,
    absolute_extinctions: HashMap<SpeciesId, f64>,
}

impl<'a> TreeOrderer<'a> {
    pub fn new(arena: &'a LineageArena, root: SpeciesId) -> Self {
        let mut absolute_extinctions = HashMap::new();
        for (id, node) in arena.iter_postorder(root) {
            let latest = node
                .descendants()
                .iter()
                .filter_map(|child| absolute_extinctions.get(child).copied())
                .fold(node.species().extinction(), f64::max);
            absolute_extinctions.insert(id, latest);
        }
        Self {
            arena,
            absolute_extinctions,
        }
    }

    /// Absolute extinction of a node of the ordered subtree.
    pub fn absolute_extinction(&self, id: SpeciesId) -> Option<f64> {
        self.absolute_extinctions.get(&id).copied()
    }

    /// Flattened ordering of the subtree rooted at `id`.
    #[instrument(level = "trace", skip(self))]
    pub fn order(&self, id: SpeciesId) -> Vec<SpeciesId> {
        let mut rows = Vec::with_capacity(self.absolute_extinctions.len());
        if !self.absolute_extinctions.contains_key(&id) {
            return rows;
        }

        let mut pending = vec![Step::Expand(id)];
        while let Some(step) = pending.pop() {
            match step {
                Step::Emit(id) => rows.push(id),
                Step::Expand(id) => self.expand(id, &mut pending),
            }
        }
        rows
    }

    /// Schedule the ordering of `id` on `pending`, last step first.
    fn expand(&self, id: SpeciesId, pending: &mut Vec<Step>) {
        let node = self.arena.node(id);
        if node.descendants().is_empty() {
            pending.push(Step::Emit(id));
            return;
        }

        let apparition = |child: &SpeciesId| self.arena.node(*child).species().apparition();
        let latest = |child: &SpeciesId| self.absolute_extinctions.get(child).copied().unwrap_or(f64::MIN);
        let extinction = node.species().extinction();

        let (sequential, concurrent): (Vec<SpeciesId>, Vec<SpeciesId>) = node
            .descendants()
            .iter()
            .copied()
            .sorted_by(|a, b| {
                apparition(b)
                    .total_cmp(&apparition(a))
                    .then_with(|| latest(b).total_cmp(&latest(a)))
            })
            .partition(|child| apparition(child) >= extinction);

        let split = if node.on_position() {
            sequential.len().div_ceil(2)
        } else {
            sequential.len() / 2
        };

        let after = sequential[split..].iter().chain(&concurrent);
        pending.extend(after.rev().map(|&child| Step::Expand(child)));
        pending.push(Step::Emit(id));
        pending.extend(sequential[..split].iter().rev().map(|&child| Step::Expand(child)));
    }
}

/// Unit of work of the ordering walk.
enum Step {
    /// Order the subtree of a node.
    Expand(SpeciesId),
    /// Append a node to the rows.
    Emit(SpeciesId),
}

impl<'a> SpeciesRef<'a> {
    /// Canonical row ordering of this species' subtree.
    pub fn all_descendants(&self) -> Vec<SpeciesId> {
        TreeOrderer::new(self.arena(), self.id()).order(self.id())
    }

    /// Row of `target` in [`SpeciesRef::all_descendants`].
    pub fn row_of(&self, target: SpeciesId) -> Option<usize> {
        self.all_descendants().iter().position(|&id| id == target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EditMode, Species, SpeciesDraft};

    #[test]
    fn given_leaf_when_ordering_then_returns_itself() {
        let mut arena = LineageArena::new();
        let leaf = arena.insert(Species::new("leaf", 0.0, 1.0).unwrap());

        assert_eq!(arena.species(leaf).unwrap().all_descendants(), vec![leaf]);
    }

    #[test]
    fn given_equal_apparitions_when_ordering_then_longer_branch_first() {
        let mut arena = LineageArena::new();
        let root = arena.insert(Species::new("root", 0.0, 10.0).unwrap());
        let short = arena
            .add_descendant(root, SpeciesDraft::new("short", 2.0, 1.0), EditMode::InPlace)
            .unwrap();
        let long = arena
            .add_descendant(root, SpeciesDraft::new("long", 2.0, 5.0), EditMode::InPlace)
            .unwrap();

        // both concurrent, so they follow the root
        assert_eq!(arena.species(root).unwrap().all_descendants(), vec![root, long, short]);
    }
}
