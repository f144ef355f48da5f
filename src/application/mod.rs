//! Application layer: editing flows, layout and services
//!
//! This layer orchestrates domain logic and depends on I/O boundary traits.

pub mod editor;
pub mod error;
pub mod example;
pub mod layout;
pub mod services;

pub use editor::{Extent, TreeEditor};
pub use error::{ApplicationError, ApplicationResult, IoResultExt};
pub use layout::{compute_layout, LayoutOptions, LayoutRow, ScaleMode, TreeLayout};
