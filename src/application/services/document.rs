//! Reading and writing tree documents
//!
//! A document is one JSON file holding a single root species with its
//! subtree.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::editor::TreeEditor;
use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::domain::{parse_species_json, SpeciesJson, SpeciesRef};
use crate::infrastructure::traits::FileSystem;

/// Document persistence service.
pub struct DocumentService {
    fs: Arc<dyn FileSystem>,
}

impl DocumentService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Parse the document at `path` without building a tree.
    pub fn read_json(&self, path: &Path) -> ApplicationResult<SpeciesJson> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::DocumentNotFound(path.to_path_buf()));
        }
        let content = self.fs.read_to_string(path).with_path_context("read", path)?;
        Ok(parse_species_json(&content)?)
    }

    /// Load the document at `path` into a fresh editor.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<TreeEditor> {
        let json = self.read_json(path)?;
        let editor = TreeEditor::from_json(&json)?;
        debug!("loaded {} species from {}", editor.arena().len(), path.display());
        Ok(editor)
    }

    /// Write the tree rooted at `root` to `path`, creating parent directories.
    #[instrument(level = "debug", skip(self, root), fields(root = %root.name()))]
    pub fn save(&self, path: &Path, root: SpeciesRef<'_>, pretty: bool) -> ApplicationResult<()> {
        let mut content = root.to_json_string(pretty)?;
        content.push('\n');
        self.fs.ensure_parent(path).with_path_context("create parent of", path)?;
        self.fs.write(path, &content).with_path_context("write", path)?;
        debug!("saved {} species to {}", root.subtree_len(), path.display());
        Ok(())
    }
}
