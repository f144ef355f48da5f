//! Shared test helpers: logging setup and small tree builders.

use std::env;
use std::sync::Once;

use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::{LineageArena, Species, SpeciesId};

static TEST_SETUP: Once = Once::new();

/// Install a global tracing subscriber once per test binary.
///
/// `RUST_LOG` is honoured; without it everything down to `debug` is shown.
pub fn init_test_setup() {
    TEST_SETUP.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        let layer = fmt::layer()
            .with_target(true)
            .with_test_writer()
            .with_span_events(FmtSpan::ENTER | FmtSpan::CLOSE)
            .with_filter(env_filter);

        if tracing::dispatcher::has_been_set() {
            return;
        }
        if let Err(e) = tracing_subscriber::registry().with(layer).try_init() {
            eprintln!("Error: Failed to set up logging: {}", e);
        }
        info!(
            "Test setup complete (RUST_LOG={})",
            env::var("RUST_LOG").unwrap_or_default()
        );
    });
}

/// Insert a root species, panicking on invalid input.
pub fn root(arena: &mut LineageArena, name: &str, apparition: f64, duration: f64) -> SpeciesId {
    let species = Species::new(name, apparition, duration)
        .unwrap_or_else(|e| panic!("invalid test species {name}: {e}"));
    arena.insert(species)
}

/// Build the tree described by a JSON literal.
pub fn tree_from_json(arena: &mut LineageArena, json: &str) -> SpeciesId {
    arena
        .from_json_str(json)
        .unwrap_or_else(|e| panic!("invalid test tree: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_repeated_calls_when_initializing_then_sets_up_once() {
        init_test_setup();
        init_test_setup();
        assert!(tracing::dispatcher::has_been_set());
    }
}
