// Directory scanning module
// Walks a root directory and yields canonical relative paths of regular files

use std::fs;
use std::path::Path;

use jwalk::WalkDir;
use tracing::warn;

use super::error::IntegrityError;
use super::path_utils;

/// Default reserved extension of manifest files, never enumerated
pub const DEFAULT_MANIFEST_EXTENSION: &str = "md5";

/// Enumerates regular files below a root
///
/// Symbolic links are never followed: a link to a file or to a directory is
/// skipped like any other non-regular entry. Hidden files are included.
#[derive(Debug, Clone)]
pub struct FileEnumerator {
    manifest_extension: String,
}

impl FileEnumerator {
    pub fn new() -> Self {
        Self {
            manifest_extension: DEFAULT_MANIFEST_EXTENSION.to_string(),
        }
    }

    /// Change the reserved extension; a leading dot is ignored
    pub fn with_manifest_extension(mut self, extension: &str) -> Self {
        self.manifest_extension = extension.trim_start_matches('.').to_string();
        self
    }

    pub fn manifest_extension(&self) -> &str {
        &self.manifest_extension
    }

    /// Recursively list every regular file under `root`
    ///
    /// Paths are relative to `root`, use `/` separators and come back sorted so
    /// repeated calls over an unchanged tree produce identical output.
    /// Unreadable sub-directories are logged and skipped; only a missing or
    /// non-directory root is an error.
    pub fn enumerate(&self, root: &Path) -> Result<Vec<String>, IntegrityError> {
        check_root(root)?;

        let mut files = Vec::new();

        for entry_result in WalkDir::new(root)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
        {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error walking directory under {}: {}", root.display(), e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if path_utils::has_manifest_extension(&name, &self.manifest_extension) {
                continue;
            }

            let path = entry.path();
            match path_utils::relative_to_root(&path, root) {
                Some(relative) => files.push(relative),
                None => warn!("Skipping path outside of root: {}", path.display()),
            }
        }

        files.sort();
        Ok(files)
    }
}

impl Default for FileEnumerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Fail fast when the scan root is missing or not a directory
pub fn check_root(root: &Path) -> Result<(), IntegrityError> {
    let metadata = fs::metadata(root)
        .map_err(|e| IntegrityError::from_io_error(e, "scanning directory", root.to_path_buf()))?;
    if !metadata.is_dir() {
        return Err(IntegrityError::NotADirectory {
            path: root.to_path_buf(),
        });
    }
    // Reading the root itself surfaces permission problems before any work starts
    fs::read_dir(root)
        .map_err(|e| IntegrityError::from_io_error(e, "scanning directory", root.to_path_buf()))?;
    Ok(())
}

// Tests live in tests/hash/scan_tests.rs
