//! Per-source metadata persisted next to the generated output as
//! `<output>.map`.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::naming::OutputNaming;

/// Custom output naming, copy destinations and cached cross-file references.
/// Serialized with the PascalCase keys existing map files use.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DefinitionMapData {
    #[serde(alias = "customName")]
    pub custom_name: Option<String>,
    #[serde(alias = "copyPaths")]
    pub copy_paths: Vec<String>,
    #[serde(alias = "referenceMetadata")]
    pub reference_metadata: Vec<ReferenceMetadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ReferenceMetadata {
    /// Namespace-qualified type name.
    #[serde(alias = "typeName")]
    pub type_name: String,
    #[serde(alias = "projectName")]
    pub project_name: String,
    /// Declaring source file, relative to the project root.
    #[serde(alias = "projectItemName")]
    pub project_item_name: String,
}

impl DefinitionMapData {
    /// The custom name, ignoring blank values.
    pub fn custom_name(&self) -> Option<&str> {
        self.custom_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    /// Copy destinations, skipping blank entries.
    pub fn copy_paths(&self) -> impl Iterator<Item = &str> {
        self.copy_paths
            .iter()
            .map(String::as_str)
            .filter(|path| !path.trim().is_empty())
    }

    /// Record where a type lives. Entries stay unique per type name and sorted
    /// so the sidecar diffs cleanly.
    pub fn record_reference(&mut self, metadata: ReferenceMetadata) {
        match self
            .reference_metadata
            .binary_search_by(|existing| existing.type_name.cmp(&metadata.type_name))
        {
            Ok(idx) => self.reference_metadata[idx] = metadata,
            Err(idx) => self.reference_metadata.insert(idx, metadata),
        }
    }

    /// Find cached metadata by qualified name, or by simple name when the
    /// written name carries no namespace.
    pub fn find_reference(&self, written: &str) -> Option<&ReferenceMetadata> {
        self.reference_metadata
            .iter()
            .find(|meta| meta.type_name == written)
            .or_else(|| {
                self.reference_metadata.iter().find(|meta| {
                    meta.type_name.rsplit('.').next() == Some(written)
                        || meta.type_name.ends_with(&format!(".{written}"))
                })
            })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        let mut data: Self = serde_json::from_str(text)?;
        data.reference_metadata
            .sort_by(|a, b| a.type_name.cmp(&b.type_name));
        data.reference_metadata
            .dedup_by(|a, b| a.type_name == b.type_name);
        Ok(data)
    }
}

/// Loads and saves definition maps, keyed by generated output path.
pub trait DefinitionMapStore {
    /// Absent or unreadable metadata is `None`, never an error.
    fn load(&self, output: &Path) -> Option<DefinitionMapData>;

    fn save(&self, output: &Path, data: &DefinitionMapData) -> io::Result<()>;
}

/// Stores maps as `<output>.map` files on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSystemStore;

impl DefinitionMapStore for FileSystemStore {
    fn load(&self, output: &Path) -> Option<DefinitionMapData> {
        let path = OutputNaming::map_path(output);
        let text = fs::read_to_string(&path).ok()?;
        if text.trim().is_empty() {
            return None;
        }
        match DefinitionMapData::from_json(&text) {
            Ok(data) => Some(data),
            Err(err) => {
                debug!("ignoring malformed definition map {}: {err}", path.display());
                None
            }
        }
    }

    fn save(&self, output: &Path, data: &DefinitionMapData) -> io::Result<()> {
        let json = data.to_json().map_err(io::Error::other)?;
        crate::service::write_atomic(&OutputNaming::map_path(output), &json)
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::path::PathBuf;

    use super::*;

    /// In-memory store for tests.
    #[derive(Debug, Default)]
    pub struct MemoryStore {
        pub maps: RefCell<HashMap<PathBuf, DefinitionMapData>>,
    }

    impl MemoryStore {
        pub fn with(output: impl Into<PathBuf>, data: DefinitionMapData) -> Self {
            let store = Self::default();
            store.maps.borrow_mut().insert(output.into(), data);
            store
        }
    }

    impl DefinitionMapStore for MemoryStore {
        fn load(&self, output: &Path) -> Option<DefinitionMapData> {
            self.maps.borrow().get(output).cloned()
        }

        fn save(&self, output: &Path, data: &DefinitionMapData) -> io::Result<()> {
            self.maps
                .borrow_mut()
                .insert(output.to_path_buf(), data.clone());
            Ok(())
        }
    }
}
