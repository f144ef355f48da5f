//! JSON exchange format.
//!
//! ```json
//! {
//!   "name": "Hominoidea",
//!   "apparition": -25000000.0,
//!   "duration": 6000000.0,
//!   "descendants": [
//!     { "name": "Hylobates", "afterApparition": 6000000.0, "duration": 19000000.0 }
//!   ]
//! }
//! ```
//!
//! Only a true root carries `apparition`; every other node stores
//! `afterApparition`, its offset from the ancestor's apparition.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::{LineageArena, SpeciesId, SpeciesRef};
use crate::domain::error::{LineageError, LineageResult};
use crate::domain::species::Species;

/// Serialized form of a species and its subtree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesJson {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apparition: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after_apparition: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descendants: Option<Vec<SpeciesJson>>,
}

/// Parse a JSON document of any nesting depth.
///
/// Each generation adds two levels of nesting, so serde_json's default
/// recursion limit would cap documents at about 63 generations. The stack
/// grows on demand instead.
pub fn parse_species_json(text: &str) -> LineageResult<SpeciesJson> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    deserializer.disable_recursion_limit();
    let json = SpeciesJson::deserialize(serde_stacker::Deserializer::new(&mut deserializer))?;
    deserializer.end()?;
    Ok(json)
}

impl<'a> SpeciesRef<'a> {
    /// Serialized subtree, built bottom-up without recursion.
    pub fn to_json(&self) -> SpeciesJson {
        let arena = self.arena();
        let mut built: HashMap<SpeciesId, SpeciesJson> = HashMap::new();
        for (id, node) in arena.iter_postorder(self.id()) {
            let descendants: Vec<SpeciesJson> = node
                .descendants()
                .iter()
                .filter_map(|child| built.remove(child))
                .collect();
            let species = node.species();
            let ancestor = node.ancestor().map(|a| arena.node(a).species());
            built.insert(
                id,
                SpeciesJson {
                    name: species.name().to_string(),
                    apparition: ancestor.is_none().then_some(species.apparition()),
                    // Always within [0, ancestor duration]
                    after_apparition: ancestor
                        .map(|a| (species.apparition() - a.apparition()).clamp(0.0, a.duration())),
                    duration: Some(species.duration()),
                    description: species.description().map(str::to_string),
                    image: species.image().map(str::to_string),
                    descendants: (!descendants.is_empty()).then_some(descendants),
                },
            );
        }
        built.remove(&self.id()).unwrap_or_default()
    }

    pub fn to_json_string(&self, pretty: bool) -> LineageResult<String> {
        let json = self.to_json();
        let text = if pretty {
            serde_json::to_string_pretty(&json)?
        } else {
            serde_json::to_string(&json)?
        };
        Ok(text)
    }
}

/// A validated node waiting to be inserted.
struct Planned {
    species: Species,
    parent: Option<usize>,
    on_position: bool,
}

impl LineageArena {
    /// Rebuild a subtree from its JSON form, optionally below `ancestor`.
    ///
    /// Apparitions are absolute: the root uses `apparition` (or the
    /// ancestor's apparition when one is given, or 0) plus
    /// `afterApparition`; every descendant uses its ancestor's apparition
    /// plus its own `afterApparition`. A missing or non-positive duration and
    /// an offset outside `[0, duration]` of the ancestor are rejected before
    /// anything is inserted.
    #[instrument(level = "debug", skip(self, json), fields(name = %json.name))]
    pub fn from_json(&mut self, json: &SpeciesJson, ancestor: Option<SpeciesId>) -> LineageResult<SpeciesId> {
        let after = json.after_apparition.unwrap_or(0.0);
        let (apparition, on_position) = match ancestor {
            Some(ancestor_id) => {
                let parent = self.try_node(ancestor_id)?;
                let species = parent.species();
                if !species.admits_offset(after) {
                    return Err(offset_out_of_interval(&json.name, species, after));
                }
                (species.place_descendant(after), !parent.on_position())
            }
            None => (json.apparition.unwrap_or(0.0) + after, true),
        };

        let plan = plan_tree(json, apparition, on_position)?;
        let mut ids: Vec<SpeciesId> = Vec::with_capacity(plan.len());
        for planned in plan {
            let parent = match planned.parent {
                Some(index) => Some(ids[index]),
                None => ancestor,
            };
            ids.push(self.insert_node(planned.species, parent, planned.on_position));
        }
        debug!("loaded {} species", ids.len());
        Ok(ids[0])
    }

    /// Parse a JSON document and rebuild it as a new tree.
    pub fn from_json_str(&mut self, text: &str) -> LineageResult<SpeciesId> {
        let json = parse_species_json(text)?;
        self.from_json(&json, None)
    }
}

/// Validate a JSON subtree into pre-order insertion steps.
///
/// Every parent precedes its descendants, and siblings keep their document
/// order.
fn plan_tree(json: &SpeciesJson, apparition: f64, on_position: bool) -> LineageResult<Vec<Planned>> {
    let mut plan: Vec<Planned> = Vec::new();
    let mut pending: Vec<(&SpeciesJson, f64, Option<usize>, bool)> = vec![(json, apparition, None, on_position)];

    while let Some((json, apparition, parent, on_position)) = pending.pop() {
        let species = Species::new(json.name.clone(), apparition, json.duration.unwrap_or(0.0))?
            .with_description(json.description.clone())
            .with_image(json.image.clone());

        let index = plan.len();
        for child in json.descendants.iter().flatten().rev() {
            let after = child.after_apparition.unwrap_or(0.0);
            if !species.admits_offset(after) {
                return Err(offset_out_of_interval(&child.name, &species, after));
            }
            pending.push((child, species.place_descendant(after), Some(index), !on_position));
        }
        plan.push(Planned {
            species,
            parent,
            on_position,
        });
    }
    Ok(plan)
}

fn offset_out_of_interval(name: &str, ancestor: &Species, offset: f64) -> LineageError {
    LineageError::DescendantOutOfAncestorInterval {
        descendant: name.to_string(),
        ancestor: ancestor.name().to_string(),
        reason: format!(
            "afterApparition {} is outside [0, {}]",
            offset,
            ancestor.duration()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_missing_duration_when_loading_then_rejected_without_side_effects() {
        let mut arena = LineageArena::new();
        let text = r#"{"name": "root", "duration": 10, "descendants": [{"name": "child", "afterApparition": 1}]}"#;

        let result = arena.from_json_str(text);

        assert!(matches!(result, Err(LineageError::InvalidDuration { .. })));
        assert!(arena.is_empty());
    }

    #[test]
    fn given_non_root_when_serializing_then_offset_replaces_apparition() {
        let mut arena = LineageArena::new();
        let text = r#"{"name": "root", "apparition": -5, "duration": 10, "descendants": [{"name": "child", "afterApparition": 2, "duration": 1}]}"#;
        let root = arena.from_json_str(text).unwrap();
        let child = arena.species(root).unwrap().find("child").unwrap();

        let json = child.to_json();

        assert_eq!(child.apparition(), -3.0);
        assert_eq!(json.apparition, None);
        assert_eq!(json.after_apparition, Some(2.0));
        assert_eq!(json.descendants, None);
    }
}
