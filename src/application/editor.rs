//! Copy-on-write editing of a published lineage tree
//!
//! Every edit copies the published tree, applies the change to the copy and
//! then publishes the copy's root. Nodes that are not part of the published
//! tree are dropped from the arena afterwards, so handles into a previous
//! version go stale instead of silently pointing at edited data.

use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    EditMode, LineageArena, LineageResult, Species, SpeciesDraft, SpeciesId, SpeciesJson, SpeciesRef,
};

/// Time span covered by the published tree, used for scale and present-time
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub apparition: f64,
    pub absolute_extinction: f64,
    pub absolute_duration: f64,
}

/// Edit session holding exactly one published tree (or none).
#[derive(Debug, Default)]
pub struct TreeEditor {
    arena: LineageArena,
    current: Option<SpeciesId>,
}

impl TreeEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Editor publishing the tree described by `json`.
    pub fn from_json(json: &SpeciesJson) -> ApplicationResult<Self> {
        let mut editor = Self::new();
        editor.load(json)?;
        Ok(editor)
    }

    pub fn arena(&self) -> &LineageArena {
        &self.arena
    }

    /// Root of the published tree.
    pub fn current(&self) -> Option<SpeciesRef<'_>> {
        self.current.and_then(|id| self.arena.species(id))
    }

    pub fn root(&self) -> ApplicationResult<SpeciesRef<'_>> {
        self.current().ok_or(ApplicationError::NoTree)
    }

    pub fn extent(&self) -> Option<Extent> {
        self.current().map(|root| Extent {
            apparition: root.apparition(),
            absolute_extinction: root.absolute_extinction(),
            absolute_duration: root.absolute_duration(),
        })
    }

    /// Handle of the first species called `name` in the published tree.
    pub fn find(&self, name: &str) -> ApplicationResult<SpeciesId> {
        self.root()?
            .find(name)
            .map(|sp| sp.id())
            .ok_or_else(|| ApplicationError::SpeciesNotFound(name.to_string()))
    }

    /// Replace the published tree with the one described by `json`.
    #[instrument(level = "debug", skip(self, json))]
    pub fn load(&mut self, json: &SpeciesJson) -> ApplicationResult<SpeciesId> {
        let root = self.arena.from_json(json, None)?;
        Ok(self.publish(root)?)
    }

    /// Publish a fresh one-node tree.
    pub fn create_empty(&mut self, name: &str) -> ApplicationResult<SpeciesId> {
        let root = self.arena.insert(Species::new(name, 0.0, 1.0)?);
        Ok(self.publish(root)?)
    }

    /// Drop the published tree.
    pub fn clear(&mut self) {
        self.arena = LineageArena::new();
        self.current = None;
    }

    /// Replace the payload of `id`; returns the edited node in the new tree.
    #[instrument(level = "debug", skip(self, update))]
    pub fn save_species(&mut self, id: SpeciesId, update: Species) -> ApplicationResult<SpeciesId> {
        self.ensure_published(id)?;
        let edited = self.on_copy(id, |arena, copy| {
            arena.update_species(copy, update)?;
            Ok(copy)
        })?;
        self.publish_containing(edited)?;
        Ok(edited)
    }

    /// Add a descendant below `id`; returns the new descendant.
    #[instrument(level = "debug", skip(self, draft))]
    pub fn create_descendant(&mut self, id: SpeciesId, draft: SpeciesDraft) -> ApplicationResult<SpeciesId> {
        self.ensure_published(id)?;
        let parent = self.arena.add_descendant(id, draft, EditMode::Copy)?;
        let child = self
            .arena
            .get_node(parent)
            .and_then(|node| node.descendants().last().copied())
            .ok_or(ApplicationError::NoTree)?;
        self.publish_containing(parent)?;
        Ok(child)
    }

    /// Add an ancestor above `id`; returns the new ancestor.
    #[instrument(level = "debug", skip(self, draft))]
    pub fn create_ancestor(&mut self, id: SpeciesId, draft: SpeciesDraft) -> ApplicationResult<SpeciesId> {
        self.ensure_published(id)?;
        let copy = self.arena.add_ancestor(id, draft.display(true), EditMode::Copy)?;
        let ancestor = self
            .arena
            .get_node(copy)
            .and_then(|node| node.ancestor())
            .ok_or(ApplicationError::NoTree)?;
        self.publish_containing(ancestor)?;
        Ok(ancestor)
    }

    /// Make `id` the new root, dropping everything above and beside it.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_ancestor(&mut self, id: SpeciesId) -> ApplicationResult<SpeciesId> {
        self.ensure_published(id)?;
        let copy = self.on_copy(id, |arena, copy| {
            arena.unlink_ancestor(copy)?;
            Ok(copy)
        })?;
        Ok(self.publish(copy)?)
    }

    /// Remove `id` and its subtree.
    ///
    /// Returns the new published root, or None when the root itself was
    /// deleted and nothing is left.
    #[instrument(level = "debug", skip(self))]
    pub fn delete_species(&mut self, id: SpeciesId) -> ApplicationResult<Option<SpeciesId>> {
        self.ensure_published(id)?;
        if self.root()?.id() == id {
            self.clear();
            return Ok(None);
        }

        let remaining = self.on_copy(id, |arena, copy| {
            let parent = arena.try_species(copy)?.ancestor().map(|a| a.id());
            arena.remove_tree(copy)?;
            Ok(parent)
        })?;
        match remaining {
            Some(parent) => Ok(Some(self.publish_containing(parent)?)),
            // the visible tree of `id` was `id` itself
            None => {
                self.clear();
                Ok(None)
            }
        }
    }

    fn ensure_published(&self, id: SpeciesId) -> ApplicationResult<()> {
        if self.root()?.reaches(id) {
            Ok(())
        } else {
            Err(ApplicationError::SpeciesNotFound(id.to_string()))
        }
    }

    /// Run `edit` on a copy of `id`; the copy is discarded if `edit` fails.
    fn on_copy<T>(
        &mut self,
        id: SpeciesId,
        edit: impl FnOnce(&mut LineageArena, SpeciesId) -> LineageResult<T>,
    ) -> ApplicationResult<T> {
        let copy = self.arena.copy(id)?;
        let clone_root = self.arena.try_species(copy)?.first_ancestor(true).id();
        match edit(&mut self.arena, copy) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.arena.remove_tree(clone_root)?;
                Err(e.into())
            }
        }
    }

    /// Publish the visible tree containing `id`.
    fn publish_containing(&mut self, id: SpeciesId) -> LineageResult<SpeciesId> {
        let top = self.arena.try_species(id)?.first_ancestor(false).id();
        self.publish(top)
    }

    fn publish(&mut self, root: SpeciesId) -> LineageResult<SpeciesId> {
        let removed = self.arena.retain_tree(root)?;
        self.current = Some(root);
        debug!("published {} ({} stale nodes dropped)", root, removed);
        Ok(root)
    }
}
