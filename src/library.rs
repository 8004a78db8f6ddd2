// Library listing module
// Each sub-directory of a library folder is a scannable root with an optional stored manifest

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use crate::config::Settings;
use crate::hash::error::IntegrityError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryEntry {
    pub name: String,
    pub path: PathBuf,
    /// Stored manifest for this root, when one exists
    pub manifest: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Library {
    root: PathBuf,
    entries: Vec<LibraryEntry>,
}

impl Library {
    /// List the sub-directories of `root`, sorted by name
    pub fn open(root: &Path, settings: &Settings) -> Result<Self, IntegrityError> {
        let to_error = |e| IntegrityError::Enumeration {
            path: root.to_path_buf(),
            source: e,
        };

        let mut entries = Vec::new();
        for entry in fs::read_dir(root).map_err(to_error)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Cannot read library entry in {}: {}", root.display(), e);
                    continue;
                }
            };

            // `is_dir` follows links, so a linked folder still lists as a root
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            let manifest = Some(settings.manifest_path_for(&name)).filter(|p| p.is_file());

            entries.push(LibraryEntry {
                name,
                path,
                manifest,
            });
        }

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    /// `<checksum_dir>/<name>.<extension>`
    pub fn manifest_path(checksum_dir: &Path, name: &str, extension: &str) -> PathBuf {
        checksum_dir.join(format!("{}.{}", name, extension.trim_start_matches('.')))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entries(&self) -> &[LibraryEntry] {
        &self.entries
    }

    /// Case-insensitive substring filter over root names
    pub fn search<'a>(&'a self, query: &'a str) -> impl Iterator<Item = &'a LibraryEntry> + 'a {
        let query = query.to_lowercase();
        self.entries
            .iter()
            .filter(move |entry| entry.name.to_lowercase().contains(&query))
    }
}
