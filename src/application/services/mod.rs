//! Application services
//!
//! Concrete services orchestrating domain logic over the I/O boundary
//! traits.

mod document;

pub use document::DocumentService;
