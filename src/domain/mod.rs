//! Domain layer: the lineage model and its read-side algorithms
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod clone;
pub mod error;
pub mod linker;
pub mod ordering;
pub mod serializer;
pub mod species;
pub mod steps;
pub mod temporal;

pub use arena::{LineageArena, SpeciesId, SpeciesNode, SpeciesRef};
pub use error::{LineageError, LineageResult};
pub use linker::SplitRoots;
pub use ordering::TreeOrderer;
pub use serializer::{parse_species_json, SpeciesJson};
pub use species::{EditMode, Species, SpeciesDraft};
