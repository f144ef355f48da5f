//! Lineage trees of species on a timeline.
//!
//! Species are stored in an arena ([`domain::LineageArena`]) and linked
//! into trees whose time intervals are validated on every edit. On top of
//! the tree the crate computes derived times, a balanced display ordering,
//! generation distances and drawing coordinates, and exchanges trees as
//! JSON documents.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
