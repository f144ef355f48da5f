//! Domain-level errors
//!
//! Every variant is raised before any mutation happens, so a failed
//! operation leaves the arena exactly as it was.

use thiserror::Error;

use crate::domain::arena::SpeciesId;

/// Domain errors represent violations of the lineage invariants.
#[derive(Error, Debug)]
pub enum LineageError {
    #[error("apparition of {name:?} must be a finite time, got {apparition}")]
    InvalidApparition { name: String, apparition: f64 },

    #[error("duration of {name:?} must be a finite value greater than 0, got {duration}")]
    InvalidDuration { name: String, duration: f64 },

    #[error("descendant {descendant:?} does not fit in the interval of {ancestor:?}: {reason}")]
    DescendantOutOfAncestorInterval {
        descendant: String,
        ancestor: String,
        reason: String,
    },

    #[error("ancestor {ancestor:?} is inconsistent with descendant {descendant:?}: {reason}")]
    AncestorIntervalInconsistentWithDescendant {
        ancestor: String,
        descendant: String,
        reason: String,
    },

    #[error("invalid ancestor offset for {name:?}: {reason}")]
    InvalidAncestorOffset { name: String, reason: String },

    #[error("linking {ancestor:?} above {descendant:?} would create a cycle")]
    CycleDetected { ancestor: String, descendant: String },

    #[error("unknown species: {0}")]
    UnknownSpecies(SpeciesId),

    #[error("cannot join an empty set of trees")]
    EmptyJoin,

    #[error(transparent)]
    MalformedJson(#[from] serde_json::Error),
}

/// Result type for lineage operations.
pub type LineageResult<T> = Result<T, LineageError>;
