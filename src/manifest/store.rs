// src/manifest/store.rs
//! Load/modify/save lifecycle for one manifest file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::constants::MANIFEST_FILE_PREFIX;
use crate::error::AppError;
use crate::manifest::{Manifest, ManifestEntry};
use crate::types::NotionId;

/// An open manifest bound to its file on disk.
///
/// A store always starts from [`ManifestStore::initialize`], which creates the
/// manifest directory and loads any previous file, so every store in hand is
/// ready for lookups and updates. Mutations stay in memory until [`save`] is
/// called.
///
/// Loading is faithful: entries come back exactly as they were saved,
/// `source` and timestamps included. Entries for pages the current crawl
/// never reached are kept, not pruned, which lets references to deleted or
/// unshared pages keep resolving.
///
/// [`save`]: ManifestStore::save
#[derive(Debug)]
pub struct ManifestStore {
    path: PathBuf,
    manifest: Manifest,
}

impl ManifestStore {
    /// Opens the manifest for `root` inside `dir`, creating the directory and
    /// starting from an empty manifest when no file exists yet.
    pub fn initialize(dir: &Path, root: &NotionId) -> Result<Self, AppError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}{}.json", MANIFEST_FILE_PREFIX, root));

        let manifest = match fs::read_to_string(&path) {
            Ok(content) => {
                let loaded: Manifest =
                    serde_json::from_str(&content).map_err(|source| AppError::JsonParseError {
                        path: path.clone(),
                        source,
                    })?;
                log::debug!(
                    "Loaded manifest {} with {} entries",
                    path.display(),
                    loaded.references.len()
                );
                loaded
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("No manifest at {}; starting empty", path.display());
                Manifest::empty()
            }
            Err(err) => return Err(AppError::Io(err)),
        };

        Ok(Self { path, manifest })
    }

    /// File this store reads from and writes to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read-only view of the full manifest.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn len(&self) -> usize {
        self.manifest.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.manifest.references.is_empty()
    }

    /// Looks up the entry for a page.
    pub fn entry(&self, id: &NotionId) -> Option<&ManifestEntry> {
        self.manifest.references.get(id)
    }

    pub fn has_entry(&self, id: &NotionId) -> bool {
        self.manifest.references.contains_key(id)
    }

    /// Inserts or replaces the entry for a page.
    pub fn update_entry(&mut self, id: NotionId, entry: ManifestEntry) {
        self.manifest.last_updated = Utc::now();
        self.manifest.references.insert(id, entry);
    }

    /// Removes an entry, returning it if it was present. Removing an absent
    /// entry is a no-op.
    pub fn remove_entry(&mut self, id: &NotionId) -> Option<ManifestEntry> {
        let removed = self.manifest.references.shift_remove(id);
        if removed.is_some() {
            self.manifest.last_updated = Utc::now();
        }
        removed
    }

    /// Iterates entries in manifest order.
    pub fn entries(&self) -> impl Iterator<Item = (&NotionId, &ManifestEntry)> {
        self.manifest.references.iter()
    }

    /// Writes the manifest to disk, replacing the previous file atomically.
    ///
    /// The JSON is written to a sibling temp file first and renamed into
    /// place, so a crash mid-write never leaves a truncated manifest behind.
    pub fn save(&self) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(&self.manifest).map_err(|err| {
            AppError::InternalError {
                message: format!("Failed to serialize manifest {}", self.path.display()),
                source: Some(Box::new(err)),
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes())?;
        fs::rename(&tmp, &self.path)?;

        log::debug!(
            "Saved manifest {} with {} entries",
            self.path.display(),
            self.manifest.references.len()
        );
        Ok(())
    }
}
