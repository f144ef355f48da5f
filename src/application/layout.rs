//! Drawing coordinates for a lineage tree
//!
//! Rows come from the canonical ordering; horizontal placement is either
//! proportional to elapsed time (chronological) or to generation count
//! (steps). A present-time cutoff hides every species appearing at or after
//! it and clips the segments that cross it; it only applies to the
//! chronological scale.

use serde::{Deserialize, Serialize};

use crate::domain::{SpeciesId, SpeciesRef};

/// Horizontal scale of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    #[default]
    Chronological,
    Steps,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub scale: ScaleMode,
    /// Width of the full (unclipped) drawing
    pub width: f64,
    pub row_height: f64,
    pub present_time: Option<f64>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            scale: ScaleMode::Chronological,
            width: 1000.0,
            row_height: 50.0,
            present_time: None,
        }
    }
}

/// Placement of one species.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRow {
    pub id: SpeciesId,
    pub row: usize,
    pub y: f64,
    pub x_start: f64,
    pub x_end: f64,
    /// Where the first visible descendant branches off; `x_end` for leaves
    pub x_branch: f64,
    pub displayed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TreeLayout {
    pub rows: Vec<LayoutRow>,
    pub width: f64,
    pub height: f64,
    /// Drawing units per time unit (chronological) or per generation (steps)
    pub scale_x: f64,
}

impl TreeLayout {
    pub fn row(&self, id: SpeciesId) -> Option<&LayoutRow> {
        self.rows.iter().find(|r| r.id == id)
    }
}

pub fn compute_layout(root: SpeciesRef<'_>, options: &LayoutOptions) -> TreeLayout {
    let arena = root.arena();
    let cutoff = match options.scale {
        ScaleMode::Chronological => options.present_time,
        ScaleMode::Steps => None,
    };
    let visible = |sp: &SpeciesRef<'_>| cutoff.map_or(true, |t| sp.apparition() < t);

    let ordered: Vec<SpeciesRef<'_>> = root
        .all_descendants()
        .into_iter()
        .filter_map(|id| arena.species(id))
        .filter(|sp| visible(sp))
        .collect();

    let absolute_duration = root.absolute_duration();
    let scale_x = match options.scale {
        ScaleMode::Chronological => options.width / absolute_duration,
        ScaleMode::Steps => options.width / (root.steps_until_last_descendant(false) + 1) as f64,
    };

    let rows = ordered
        .iter()
        .enumerate()
        .map(|(row, sp)| {
            let x_start = match options.scale {
                ScaleMode::Chronological => (sp.apparition() - root.apparition()) * scale_x,
                ScaleMode::Steps => root.steps_until(sp.id(), false).unwrap_or(0) as f64 * scale_x,
            };
            let length = match options.scale {
                ScaleMode::Chronological => {
                    let limit = cutoff.map_or(sp.absolute_duration(), |t| t - sp.apparition());
                    sp.duration().min(limit)
                }
                ScaleMode::Steps => 1.0,
            };
            let x_end = x_start + length * scale_x;
            let first_branch = sp
                .descendants()
                .filter(|d| visible(d))
                .map(|d| d.apparition())
                .reduce(f64::min);
            let x_branch = match (options.scale, first_branch) {
                (ScaleMode::Chronological, Some(apparition)) => {
                    x_start + (apparition - sp.apparition()) * scale_x
                }
                _ => x_end,
            };

            LayoutRow {
                id: sp.id(),
                row,
                y: row as f64 * options.row_height,
                x_start,
                x_end,
                x_branch,
                displayed: sp.is_displayed(),
            }
        })
        .collect::<Vec<_>>();

    let width = match cutoff {
        Some(t) => {
            (options.width * (t.min(root.absolute_extinction()) - root.apparition()) / absolute_duration).max(0.0)
        }
        None => options.width,
    };
    let height = options.row_height * (1 + rows.len()) as f64;

    TreeLayout {
        rows,
        width,
        height,
        scale_x,
    }
}
