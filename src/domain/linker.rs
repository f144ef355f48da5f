//! Validated edge mutation between ancestors and descendants.
//!
//! Every operation checks its preconditions first and only then touches the
//! arena, so a returned error always means nothing changed.

use tracing::{debug, instrument, warn};

use crate::domain::arena::{check_ancestor_interval, check_descendant_interval, LineageArena, SpeciesId};
use crate::domain::error::{LineageError, LineageResult};
use crate::domain::species::{EditMode, SpeciesDraft};

/// Roots of the two trees left behind by removing an edge: the first
/// displayed ancestor of the upper part, and the detached node.
pub type SplitRoots = (SpeciesId, SpeciesId);

impl LineageArena {
    /// Whether `node` lies in the subtree rooted at `root` (itself included).
    pub(crate) fn is_within(&self, node: SpeciesId, root: SpeciesId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == root {
                return true;
            }
            current = self.get_node(id).and_then(|n| n.ancestor);
        }
        false
    }

    /// Unconditionally add the `ancestor` -> `descendant` edge.
    pub(crate) fn attach(&mut self, ancestor: SpeciesId, descendant: SpeciesId) {
        self.node_mut(ancestor).descendants.push(descendant);
        self.node_mut(descendant).ancestor = Some(ancestor);
    }

    /// Remove the edge above `id` on both sides; returns the former ancestor.
    pub(crate) fn detach(&mut self, id: SpeciesId) -> Option<SpeciesId> {
        let ancestor = self.node_mut(id).ancestor.take()?;
        if let Ok(parent) = self.try_node_mut(ancestor) {
            parent.descendants.retain(|&d| d != id);
        }
        Some(ancestor)
    }

    /// Make `ancestor` the ancestor of `id`.
    ///
    /// No-op when the edge already exists. Otherwise `ancestor` must cover
    /// the apparition of `id`; any previous ancestor of `id` is unlinked.
    #[instrument(level = "debug", skip(self))]
    pub fn link_ancestor(&mut self, id: SpeciesId, ancestor: SpeciesId) -> LineageResult<()> {
        let node = self.try_node(id)?;
        if node.ancestor == Some(ancestor) {
            return Ok(());
        }
        let parent = self.try_node(ancestor)?;
        check_ancestor_interval(&parent.species, &node.species)?;
        if self.is_within(ancestor, id) {
            return Err(LineageError::CycleDetected {
                ancestor: parent.species.name.clone(),
                descendant: node.species.name.clone(),
            });
        }

        self.detach(id);
        self.attach(ancestor, id);
        debug!("linked {} below {}", id, ancestor);
        Ok(())
    }

    /// Make `descendant` a descendant of `id`.
    ///
    /// No-op when the edge already exists. Otherwise the whole segment of
    /// `descendant` must lie inside the segment of `id`; the previous
    /// ancestor of `descendant` is unlinked first.
    #[instrument(level = "debug", skip(self))]
    pub fn link_descendant(&mut self, id: SpeciesId, descendant: SpeciesId) -> LineageResult<()> {
        let child = self.try_node(descendant)?;
        if child.ancestor == Some(id) {
            return Ok(());
        }
        let node = self.try_node(id)?;
        check_descendant_interval(&node.species, &child.species)?;
        if self.is_within(id, descendant) {
            return Err(LineageError::CycleDetected {
                ancestor: node.species.name.clone(),
                descendant: child.species.name.clone(),
            });
        }

        self.detach(descendant);
        self.attach(id, descendant);
        debug!("linked {} below {}", descendant, id);
        Ok(())
    }

    /// Link several descendants, skipping the ones that fail validation.
    ///
    /// Returns the rejected handles together with their errors.
    pub fn link_descendants(
        &mut self,
        id: SpeciesId,
        descendants: &[SpeciesId],
    ) -> Vec<(SpeciesId, LineageError)> {
        let mut rejected = Vec::new();
        for &descendant in descendants {
            if let Err(e) = self.link_descendant(id, descendant) {
                warn!("cannot link {} below {}: {}", descendant, id, e);
                rejected.push((descendant, e));
            }
        }
        rejected
    }

    /// Remove the edge between `id` and its ancestor.
    ///
    /// Returns None when `id` is already a root.
    #[instrument(level = "debug", skip(self))]
    pub fn unlink_ancestor(&mut self, id: SpeciesId) -> LineageResult<Option<SplitRoots>> {
        self.try_node(id)?;
        let Some(former) = self.detach(id) else {
            return Ok(None);
        };
        let upper = self.try_species(former)?.first_ancestor(false).id();
        debug!("unlinked {} from {}", id, former);
        Ok(Some((upper, id)))
    }

    /// Remove the edge between `id` and `descendant`.
    ///
    /// Returns None when `descendant` is not a descendant of `id`.
    #[instrument(level = "debug", skip(self))]
    pub fn unlink_descendant(
        &mut self,
        id: SpeciesId,
        descendant: SpeciesId,
    ) -> LineageResult<Option<SplitRoots>> {
        self.try_node(id)?;
        if self.try_node(descendant)?.ancestor != Some(id) {
            return Ok(None);
        }
        self.detach(descendant);
        let upper = self.try_species(id)?.first_ancestor(false).id();
        debug!("unlinked {} from {}", descendant, id);
        Ok(Some((upper, descendant)))
    }

    /// Strip `descendant` from the children of `id` only.
    ///
    /// The back-reference of `descendant` is left untouched; the caller is
    /// expected to relocate or drop the detached subtree. Returns whether
    /// anything was removed.
    pub fn remove_descendant(&mut self, id: SpeciesId, descendant: SpeciesId) -> LineageResult<bool> {
        let node = self.try_node_mut(id)?;
        let before = node.descendants.len();
        node.descendants.retain(|&d| d != descendant);
        Ok(node.descendants.len() != before)
    }

    /// Create a descendant of `id` starting `draft.offset` after its apparition.
    ///
    /// The offset must lie within `[0, duration]` of `id`. With
    /// [`EditMode::Copy`] the containing tree is cloned first, the child is
    /// added to the clone of `id`, and that clone is returned; otherwise the
    /// new child is returned.
    #[instrument(level = "debug", skip(self, draft), fields(name = %draft.name))]
    pub fn add_descendant(
        &mut self,
        id: SpeciesId,
        draft: SpeciesDraft,
        mode: EditMode,
    ) -> LineageResult<SpeciesId> {
        let parent = &self.try_node(id)?.species;
        if !parent.admits_offset(draft.offset) {
            return Err(LineageError::DescendantOutOfAncestorInterval {
                descendant: draft.name.clone(),
                ancestor: parent.name.clone(),
                reason: format!(
                    "apparition must be between the apparition ({}) and the extinction ({}) of the ancestor",
                    parent.apparition,
                    parent.extinction()
                ),
            });
        }
        let offset = draft.offset;
        let mut species = draft.into_species(0.0)?;

        let target = match mode {
            EditMode::InPlace => id,
            EditMode::Copy => self.copy(id)?,
        };
        let target_node = self.node(target);
        species.apparition = target_node.species.place_descendant(offset);
        let on_position = !target_node.on_position();

        let child = self.insert_node(species, Some(target), on_position);
        debug!("added descendant {} below {}", child, target);
        Ok(match mode {
            EditMode::InPlace => child,
            EditMode::Copy => target,
        })
    }

    /// Create an ancestor of `id` starting `draft.offset` before its apparition.
    ///
    /// The new ancestor must still exist when `id` appears, so
    /// `draft.duration >= draft.offset`. A previous ancestor of `id` is
    /// unlinked. With [`EditMode::Copy`] the operation applies to a clone and
    /// the clone of `id` is returned; otherwise the new ancestor is returned.
    #[instrument(level = "debug", skip(self, draft), fields(name = %draft.name))]
    pub fn add_ancestor(
        &mut self,
        id: SpeciesId,
        draft: SpeciesDraft,
        mode: EditMode,
    ) -> LineageResult<SpeciesId> {
        let current = &self.try_node(id)?.species;
        if !(draft.offset >= 0.0 && draft.offset.is_finite()) {
            return Err(LineageError::InvalidAncestorOffset {
                name: draft.name.clone(),
                reason: format!(
                    "apparition must be before or equal the apparition ({}) of the descendant {:?}",
                    current.apparition, current.name
                ),
            });
        }
        if !(draft.duration >= draft.offset) {
            return Err(LineageError::InvalidAncestorOffset {
                name: draft.name.clone(),
                reason: format!(
                    "extinction must be after or equal the apparition ({}) of the descendant {:?}",
                    current.apparition, current.name
                ),
            });
        }
        let offset = draft.offset;
        let mut species = draft.into_species(0.0)?;

        let target = match mode {
            EditMode::InPlace => id,
            EditMode::Copy => self.copy(id)?,
        };
        species.apparition = self.node(target).species.apparition - offset;

        let ancestor = self.insert_node(species, None, true);
        self.detach(target);
        self.attach(ancestor, target);
        debug!("added ancestor {} above {}", ancestor, target);
        Ok(match mode {
            EditMode::InPlace => ancestor,
            EditMode::Copy => target,
        })
    }
}
