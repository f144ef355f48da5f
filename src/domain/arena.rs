use std::collections::HashSet;
use std::fmt;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument};

use crate::domain::error::{LineageError, LineageResult};
use crate::domain::species::{check_apparition, check_duration, non_empty, Species};

/// Handle of a species inside a [`LineageArena`].
///
/// Handles are generational: a handle to a removed node never resolves to a
/// node inserted later in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpeciesId(Index);

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{}.{}", slot, generation)
    }
}

/// Tree node in the arena-based lineage forest.
#[derive(Debug, Clone)]
pub struct SpeciesNode {
    /// Lineage data for this node
    pub(crate) species: Species,
    /// Non-owning back-reference, None for roots
    pub(crate) ancestor: Option<SpeciesId>,
    /// Owned children, in insertion order
    pub(crate) descendants: Vec<SpeciesId>,
    /// Branch-side parity, fixed at creation
    on_position: bool,
}

impl SpeciesNode {
    pub fn species(&self) -> &Species {
        &self.species
    }

    pub fn ancestor(&self) -> Option<SpeciesId> {
        self.ancestor
    }

    pub fn descendants(&self) -> &[SpeciesId] {
        &self.descendants
    }

    /// Parity used by the ordering to decide which side receives the extra
    /// sequential branch. Alternates generation to generation.
    pub fn on_position(&self) -> bool {
        self.on_position
    }
}

/// Arena-based forest of lineages.
///
/// A single arena may hold several independently rooted trees: unlinking an
/// edge or copying a tree simply adds another root. Descendant lists are the
/// owning direction; ancestor references are only used to walk upwards.
#[derive(Debug, Default)]
pub struct LineageArena {
    arena: Arena<SpeciesNode>,
}

impl LineageArena {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn contains(&self, id: SpeciesId) -> bool {
        self.arena.contains(id.0)
    }

    pub fn get_node(&self, id: SpeciesId) -> Option<&SpeciesNode> {
        self.arena.get(id.0)
    }

    /// Read-only cursor on a species, None for unknown handles.
    pub fn species(&self, id: SpeciesId) -> Option<SpeciesRef<'_>> {
        self.contains(id).then_some(SpeciesRef { arena: self, id })
    }

    /// Like [`LineageArena::species`], but reports unknown handles as errors.
    pub fn try_species(&self, id: SpeciesId) -> LineageResult<SpeciesRef<'_>> {
        self.species(id).ok_or(LineageError::UnknownSpecies(id))
    }

    /// Handles of every node without an ancestor.
    pub fn roots(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        self.arena
            .iter()
            .filter(|(_, node)| node.ancestor.is_none())
            .map(|(idx, _)| SpeciesId(idx))
    }

    pub(crate) fn try_node(&self, id: SpeciesId) -> LineageResult<&SpeciesNode> {
        self.arena.get(id.0).ok_or(LineageError::UnknownSpecies(id))
    }

    pub(crate) fn try_node_mut(&mut self, id: SpeciesId) -> LineageResult<&mut SpeciesNode> {
        self.arena.get_mut(id.0).ok_or(LineageError::UnknownSpecies(id))
    }

    /// Node lookup for handles reachable from a valid node. Links are kept
    /// mutually consistent, so such handles always resolve.
    pub(crate) fn node(&self, id: SpeciesId) -> &SpeciesNode {
        &self.arena[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: SpeciesId) -> &mut SpeciesNode {
        &mut self.arena[id.0]
    }

    /// Insert a free-standing species as the root of a new tree.
    #[instrument(level = "debug", skip(self))]
    pub fn insert(&mut self, species: Species) -> SpeciesId {
        self.insert_node(species, None, true)
    }

    /// Insert a node and attach it below `ancestor` without validation.
    pub(crate) fn insert_node(
        &mut self,
        species: Species,
        ancestor: Option<SpeciesId>,
        on_position: bool,
    ) -> SpeciesId {
        let node = SpeciesNode {
            species,
            ancestor,
            descendants: Vec::new(),
            on_position,
        };
        let id = SpeciesId(self.arena.insert(node));

        if let Some(ancestor_id) = ancestor {
            if let Some(parent) = self.arena.get_mut(ancestor_id.0) {
                parent.descendants.push(id);
            }
        }

        id
    }

    /// Create a species linked to an optional ancestor and adopting existing
    /// descendants.
    ///
    /// The ancestor must cover the new apparition and every descendant must
    /// satisfy the [`LineageArena::link_descendant`] rules; all checks run
    /// before anything is inserted. Adopted descendants are detached from
    /// their previous ancestor.
    #[instrument(level = "debug", skip(self, species), fields(name = %species.name))]
    pub fn construct(
        &mut self,
        species: Species,
        ancestor: Option<SpeciesId>,
        descendants: &[SpeciesId],
    ) -> LineageResult<SpeciesId> {
        let mut adopted: Vec<SpeciesId> = Vec::with_capacity(descendants.len());
        for &descendant in descendants {
            if !adopted.contains(&descendant) {
                adopted.push(descendant);
            }
        }

        let on_position = match ancestor {
            Some(ancestor_id) => {
                let parent = self.try_node(ancestor_id)?;
                check_ancestor_interval(&parent.species, &species)?;
                !parent.on_position
            }
            None => true,
        };
        for &descendant in &adopted {
            let child = self.try_node(descendant)?;
            check_descendant_interval(&species, &child.species)?;
            if let Some(ancestor_id) = ancestor {
                if self.is_within(ancestor_id, descendant) {
                    return Err(LineageError::CycleDetected {
                        ancestor: species.name.clone(),
                        descendant: child.species.name.clone(),
                    });
                }
            }
        }

        let id = self.insert_node(species, ancestor, on_position);
        for descendant in adopted {
            self.detach(descendant);
            self.attach(id, descendant);
        }
        debug!("constructed {} with {} descendants", id, self.node(id).descendants.len());
        Ok(id)
    }

    /// Pre-order iterator over the subtree rooted at `root`.
    pub fn iter_subtree(&self, root: SpeciesId) -> SubtreeIterator<'_> {
        SubtreeIterator::new(self, root)
    }

    /// Post-order iterator over the subtree rooted at `root`.
    pub fn iter_postorder(&self, root: SpeciesId) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self, root)
    }

    /// Detach `id` from its ancestor and drop it together with its subtree.
    ///
    /// Returns the number of removed nodes.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_tree(&mut self, id: SpeciesId) -> LineageResult<usize> {
        self.try_node(id)?;
        self.detach(id);
        let doomed: Vec<SpeciesId> = self.iter_subtree(id).map(|(idx, _)| idx).collect();
        for idx in &doomed {
            self.arena.remove(idx.0);
        }
        debug!("removed {} nodes below {}", doomed.len(), id);
        Ok(doomed.len())
    }

    /// Keep only the subtree rooted at `root`, which becomes a root.
    ///
    /// Every other node of the arena is dropped. Returns the number of
    /// removed nodes.
    #[instrument(level = "debug", skip(self))]
    pub fn retain_tree(&mut self, root: SpeciesId) -> LineageResult<usize> {
        self.try_node(root)?;
        self.detach(root);
        let keep: HashSet<SpeciesId> = self.iter_subtree(root).map(|(idx, _)| idx).collect();
        let before = self.arena.len();
        self.arena.retain(|idx, _| keep.contains(&SpeciesId(idx)));
        let removed = before - self.arena.len();
        debug!("retained {} nodes, removed {}", keep.len(), removed);
        Ok(removed)
    }

    // ============================================================
    // Field setters
    // ============================================================

    pub fn set_name(&mut self, id: SpeciesId, name: impl Into<String>) -> LineageResult<()> {
        self.try_node_mut(id)?.species.name = name.into();
        Ok(())
    }

    pub fn set_description(&mut self, id: SpeciesId, description: Option<String>) -> LineageResult<()> {
        self.try_node_mut(id)?.species.description = non_empty(description);
        Ok(())
    }

    pub fn set_image(&mut self, id: SpeciesId, image: Option<String>) -> LineageResult<()> {
        self.try_node_mut(id)?.species.image = non_empty(image);
        Ok(())
    }

    pub fn set_display(&mut self, id: SpeciesId, display: bool) -> LineageResult<()> {
        self.try_node_mut(id)?.species.display = display;
        Ok(())
    }

    /// Move the apparition, keeping the node inside its ancestor's interval
    /// and its descendants inside its own.
    pub fn set_apparition(&mut self, id: SpeciesId, apparition: f64) -> LineageResult<()> {
        let mut candidate = self.try_node(id)?.species.clone();
        check_apparition(&candidate.name, apparition)?;
        candidate.apparition = apparition;
        self.check_placement(id, &candidate)?;
        self.node_mut(id).species.apparition = apparition;
        debug!("{} apparition set to {}", id, apparition);
        Ok(())
    }

    /// Change the duration; every descendant must still start before the new
    /// extinction.
    pub fn set_duration(&mut self, id: SpeciesId, duration: f64) -> LineageResult<()> {
        let mut candidate = self.try_node(id)?.species.clone();
        check_duration(&candidate.name, duration)?;
        candidate.duration = duration;
        self.check_placement(id, &candidate)?;
        self.node_mut(id).species.duration = duration;
        debug!("{} duration set to {}", id, duration);
        Ok(())
    }

    /// Replace name, apparition, duration, description and image at once.
    ///
    /// The node's display flag and links are kept. Nothing changes unless the
    /// new values satisfy the containment invariant.
    #[instrument(level = "debug", skip(self, update), fields(name = %update.name))]
    pub fn update_species(&mut self, id: SpeciesId, mut update: Species) -> LineageResult<()> {
        let current = self.try_node(id)?;
        update.display = current.species.display;
        self.check_placement(id, &update)?;
        self.node_mut(id).species = update;
        Ok(())
    }

    /// Containment of `candidate` (the future payload of `id`) against the
    /// current ancestor and descendants of `id`.
    fn check_placement(&self, id: SpeciesId, candidate: &Species) -> LineageResult<()> {
        let node = self.try_node(id)?;
        if let Some(ancestor) = node.ancestor {
            check_ancestor_interval(&self.node(ancestor).species, candidate)?;
        }
        for &descendant in &node.descendants {
            let child = &self.node(descendant).species;
            if !candidate.covers(child.apparition) {
                return Err(LineageError::DescendantOutOfAncestorInterval {
                    descendant: child.name.clone(),
                    ancestor: candidate.name.clone(),
                    reason: format!(
                        "apparition {} is outside [{}, {}]",
                        child.apparition,
                        candidate.apparition,
                        candidate.extinction()
                    ),
                });
            }
        }
        Ok(())
    }
}

/// `ancestor` must start no later than `descendant` and still exist at its
/// apparition.
pub(crate) fn check_ancestor_interval(ancestor: &Species, descendant: &Species) -> LineageResult<()> {
    let reason = if ancestor.apparition > descendant.apparition {
        format!(
            "ancestor apparition ({}) must be before or equal the descendant apparition ({})",
            ancestor.apparition, descendant.apparition
        )
    } else if ancestor.extinction() < descendant.apparition {
        format!(
            "ancestor extinction ({}) must be after or equal the descendant apparition ({})",
            ancestor.extinction(),
            descendant.apparition
        )
    } else {
        return Ok(());
    };
    Err(LineageError::AncestorIntervalInconsistentWithDescendant {
        ancestor: ancestor.name.clone(),
        descendant: descendant.name.clone(),
        reason,
    })
}

/// `descendant` must start no earlier than `ancestor` and end no later.
pub(crate) fn check_descendant_interval(ancestor: &Species, descendant: &Species) -> LineageResult<()> {
    let reason = if descendant.apparition < ancestor.apparition {
        format!(
            "descendant apparition ({}) must be after or equal the ancestor apparition ({})",
            descendant.apparition, ancestor.apparition
        )
    } else if descendant.extinction() > ancestor.extinction() {
        format!(
            "descendant extinction ({}) must be before or equal the ancestor extinction ({})",
            descendant.extinction(),
            ancestor.extinction()
        )
    } else {
        return Ok(());
    };
    Err(LineageError::DescendantOutOfAncestorInterval {
        descendant: descendant.name.clone(),
        ancestor: ancestor.name.clone(),
        reason,
    })
}

/// Borrowed, read-only view of one species and its surroundings.
///
/// All read-side computations (time aggregates, ordering, step metrics,
/// serialization) hang off this type.
#[derive(Clone, Copy)]
pub struct SpeciesRef<'a> {
    arena: &'a LineageArena,
    id: SpeciesId,
}

impl fmt::Debug for SpeciesRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeciesRef")
            .field("id", &self.id)
            .field("species", self.species())
            .finish()
    }
}

impl PartialEq for SpeciesRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.arena, other.arena) && self.id == other.id
    }
}

impl<'a> SpeciesRef<'a> {
    pub fn id(&self) -> SpeciesId {
        self.id
    }

    pub fn arena(&self) -> &'a LineageArena {
        self.arena
    }

    pub(crate) fn node(&self) -> &'a SpeciesNode {
        self.arena.node(self.id)
    }

    /// Cursor on another node of the same arena.
    pub(crate) fn at(&self, id: SpeciesId) -> SpeciesRef<'a> {
        SpeciesRef {
            arena: self.arena,
            id,
        }
    }

    pub fn species(&self) -> &'a Species {
        &self.node().species
    }

    pub fn name(&self) -> &'a str {
        &self.species().name
    }

    pub fn apparition(&self) -> f64 {
        self.species().apparition
    }

    pub fn duration(&self) -> f64 {
        self.species().duration
    }

    pub fn description(&self) -> Option<&'a str> {
        self.species().description()
    }

    pub fn image(&self) -> Option<&'a str> {
        self.species().image()
    }

    pub fn is_displayed(&self) -> bool {
        self.species().display
    }

    pub fn on_position(&self) -> bool {
        self.node().on_position
    }

    pub fn ancestor(&self) -> Option<SpeciesRef<'a>> {
        self.node().ancestor.map(|id| self.at(id))
    }

    pub fn descendants(&self) -> impl Iterator<Item = SpeciesRef<'a>> + 'a {
        let arena = self.arena;
        self.node()
            .descendants
            .iter()
            .map(move |&id| SpeciesRef { arena, id })
    }

    pub fn is_root(&self) -> bool {
        self.node().ancestor.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.node().descendants.is_empty()
    }

    /// Pre-order walk of this species and everything below it.
    pub fn iter_subtree(&self) -> impl Iterator<Item = SpeciesRef<'a>> + 'a {
        let arena = self.arena;
        arena
            .iter_subtree(self.id)
            .map(move |(id, _)| SpeciesRef { arena, id })
    }

    /// Number of nodes in the subtree, this one included.
    pub fn subtree_len(&self) -> usize {
        self.arena.iter_subtree(self.id).count()
    }

    /// First species named `name` in a pre-order walk of the subtree.
    pub fn find(&self, name: &str) -> Option<SpeciesRef<'a>> {
        self.iter_subtree().find(|sp| sp.name() == name)
    }
}

pub struct SubtreeIterator<'a> {
    arena: &'a LineageArena,
    stack: Vec<SpeciesId>,
}

impl<'a> SubtreeIterator<'a> {
    fn new(arena: &'a LineageArena, root: SpeciesId) -> Self {
        let mut stack = Vec::new();
        if arena.contains(root) {
            stack.push(root);
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for SubtreeIterator<'a> {
    type Item = (SpeciesId, &'a SpeciesNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.descendants.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    arena: &'a LineageArena,
    stack: Vec<(SpeciesId, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(arena: &'a LineageArena, root: SpeciesId) -> Self {
        let mut stack = Vec::new();
        if arena.contains(root) {
            stack.push((root, false));
        }
        Self { arena, stack }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (SpeciesId, &'a SpeciesNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current) {
                if !visited {
                    self.stack.push((current, true));
                    for &child in node.descendants.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current, node));
                }
            }
        }
        None
    }
}
