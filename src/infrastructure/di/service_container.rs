//! Service container for dependency injection

use std::sync::Arc;

use crate::application::services::DocumentService;
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

/// Container holding the effective settings and all services.
pub struct ServiceContainer {
    pub settings: Arc<Settings>,
    pub fs: Arc<dyn FileSystem>,
    pub documents: DocumentService,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        let documents = DocumentService::new(Arc::clone(&fs));
        Self {
            settings: Arc::new(settings),
            fs,
            documents,
        }
    }
}
