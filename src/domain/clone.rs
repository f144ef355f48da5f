//! Whole-tree deep copies.
//!
//! Editors never mutate the published tree: they copy it, edit the copy and
//! publish the copy's root, so no half-edited state is ever observable.

use tracing::{debug, instrument};

use crate::domain::arena::{LineageArena, SpeciesId};
use crate::domain::error::{LineageError, LineageResult};
use crate::domain::species::Species;

impl LineageArena {
    /// Structural deep copy of the subtree rooted at `root` as a new tree.
    ///
    /// Payloads, parities and child order are preserved, so the copy orders
    /// exactly like the source.
    #[instrument(level = "trace", skip(self))]
    pub fn clone_tree(&mut self, root: SpeciesId) -> LineageResult<SpeciesId> {
        self.try_node(root)?;
        let mut clone_root = None;
        let mut stack = vec![(root, None)];

        while let Some((source, parent)) = stack.pop() {
            let node = self.node(source);
            let species = node.species().clone();
            let on_position = node.on_position();
            let children = node.descendants().to_vec();

            let id = self.insert_node(species, parent, on_position);
            clone_root.get_or_insert(id);
            for child in children.into_iter().rev() {
                stack.push((child, Some(id)));
            }
        }

        clone_root.ok_or(LineageError::UnknownSpecies(root))
    }

    /// Copy the visible tree containing `id` and return the copy of `id`.
    ///
    /// The node is located by its row in the ordering of its first
    /// ancestor before cloning; the node at the same row of the clone's
    /// ordering is returned.
    #[instrument(level = "debug", skip(self))]
    pub fn copy(&mut self, id: SpeciesId) -> LineageResult<SpeciesId> {
        let (top, row) = {
            let top = self.try_species(id)?.first_ancestor(false);
            let row = top.row_of(id).ok_or(LineageError::UnknownSpecies(id))?;
            (top.id(), row)
        };

        let clone_top = self.clone_tree(top)?;
        let rows = self.try_species(clone_top)?.all_descendants();
        let copied = rows.get(row).copied().ok_or(LineageError::UnknownSpecies(id))?;
        debug!("copied {} as {}", id, copied);
        Ok(copied)
    }

    /// Copy several trees below a new hidden common root.
    ///
    /// The hidden root starts at the earliest root apparition and lasts
    /// until the latest one, so every copy starts inside its segment.
    #[instrument(level = "debug", skip(self))]
    pub fn join_under_hidden_root(&mut self, roots: &[SpeciesId]) -> LineageResult<SpeciesId> {
        if roots.is_empty() {
            return Err(LineageError::EmptyJoin);
        }
        let apparitions = roots
            .iter()
            .map(|&root| Ok(self.try_node(root)?.species().apparition()))
            .collect::<LineageResult<Vec<f64>>>()?;

        let start = apparitions.iter().copied().fold(f64::INFINITY, f64::min);
        let span = apparitions.iter().map(|a| a - start).fold(0.0, f64::max);
        let duration = if span > 0.0 { span } else { f64::EPSILON };
        let hidden = Species::new("", start, duration)?.hidden();

        let copies = roots
            .iter()
            .map(|&root| self.clone_tree(root))
            .collect::<LineageResult<Vec<SpeciesId>>>()?;
        let common = self.insert_node(hidden, None, true);
        for copy in copies {
            self.attach(common, copy);
        }
        debug!("joined {} trees below {}", roots.len(), common);
        Ok(common)
    }
}
