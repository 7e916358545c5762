//! JSON File Store - Order Documents on Disk
//!
//! Implements the `OrderStore` port over a single JSON file. Writes go
//! to a temporary sibling file first and are then renamed into place,
//! so the document on disk is always either the old or the new version.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, instrument};

use super::document;
use crate::ports::{OrderSet, OrderStore};

/// Order document stored as a JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    /// Path to the order document.
    path: PathBuf,
    /// Temporary path for atomic writes.
    tmp_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut tmp = path.clone().into_os_string();
        tmp.push(".tmp");
        Self {
            path,
            tmp_path: PathBuf::from(tmp),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents, for change detection.
    pub fn read_raw(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read order file: {}", self.path.display()))
    }
}

impl OrderStore for JsonFileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<OrderSet> {
        let json = self.read_raw()?;
        let set = document::decode(&json)
            .with_context(|| format!("Failed to import {}", self.path.display()))?;

        info!(makers = set.makers.len(), "Order document loaded");
        Ok(set)
    }

    #[instrument(skip(self, set), fields(path = %self.path.display()))]
    fn save(&self, set: &OrderSet) -> Result<()> {
        let json = document::encode(set).context("Failed to serialize order document")?;

        fs::write(&self.tmp_path, json.as_bytes())
            .with_context(|| format!("Failed to write {}", self.tmp_path.display()))?;

        // Atomic rename
        fs::rename(&self.tmp_path, &self.path)
            .with_context(|| format!("Failed to rename into {}", self.path.display()))?;

        info!(makers = set.makers.len(), "Order document saved");
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
