use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{
    config,
    domain::{metadata::CompleteMetadata, window::ReleaseWindow},
    storage::error::StorageError,
};

/// Reads and writes the complete metadata record.
///
/// The serving path only ever reads; writes come from offline commands.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn from_config(config: &config::MetadataSource) -> Self {
        Self::new(&config.path)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the record and checks its invariants.
    pub fn load(&self) -> Result<CompleteMetadata, StorageError> {
        let metadata = self.load_unchecked()?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Loads the record without checking its invariants
    pub fn load_unchecked(&self) -> Result<CompleteMetadata, StorageError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(self.path.clone()),
            _ => StorageError::Fs(e),
        })?;
        let metadata: CompleteMetadata = serde_json::from_str(&contents)?;
        debug!(
            "loaded metadata from {}: {} tracks, {} segments",
            self.path.to_string_lossy(),
            metadata.tracks.len(),
            metadata.segment_count
        );
        Ok(metadata)
    }

    pub fn save(&self, metadata: &CompleteMetadata) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(metadata)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Sets the release window of the stored record and recomputes its segment count.
    pub fn schedule(&self, window: ReleaseWindow) -> Result<CompleteMetadata, StorageError> {
        let mut metadata = self.load_unchecked()?;
        metadata.release_start = window.start();
        metadata.release_end = window.end();
        metadata.segment_count = metadata.counted_segments();
        metadata.validate()?;
        self.save(&metadata)?;
        Ok(metadata)
    }
}
