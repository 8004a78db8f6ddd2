// Manifest format handler module
// Reads and writes checksum manifests in the common `<digest> *<path>` shape

use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexMap;
use tracing::debug;

use super::error::IntegrityError;
use super::path_utils;

/// Prefix of comment lines
pub const COMMENT_PREFIX: char = ';';

/// Legacy "binary mode" marker in front of the path
pub const BINARY_MARKER: char = '*';

/// One line of a manifest
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ManifestEntry {
    /// Canonical relative path (`/` separators)
    pub relative_path: String,
    /// Lowercase hex digest
    pub expected_digest: String,
}

impl ManifestEntry {
    pub fn new(relative_path: impl Into<String>, expected_digest: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            expected_digest: expected_digest.into().to_lowercase(),
        }
    }
}

/// Mapping from canonical relative path to expected digest
///
/// Keys are unique. Inserting a path that is already present replaces its
/// digest and keeps the original position, so a parsed manifest iterates in
/// first-seen order while the last digest for a path wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: IndexMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry; returns the digest it replaced, if any
    pub fn insert(&mut self, relative_path: String, digest: String) -> Option<String> {
        self.entries.insert(relative_path, digest.to_lowercase())
    }

    pub fn get(&self, relative_path: &str) -> Option<&str> {
        self.entries.get(relative_path).map(String::as_str)
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.entries.contains_key(relative_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(path, digest)` in manifest order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, d)| (p.as_str(), d.as_str()))
    }

    pub fn entries(&self) -> Vec<ManifestEntry> {
        self.iter()
            .map(|(path, digest)| ManifestEntry::new(path, digest))
            .collect()
    }
}

impl FromIterator<ManifestEntry> for Manifest {
    fn from_iter<I: IntoIterator<Item = ManifestEntry>>(iter: I) -> Self {
        let mut manifest = Manifest::new();
        for entry in iter {
            manifest.insert(entry.relative_path, entry.expected_digest);
        }
        manifest
    }
}

/// Codec for the manifest text format
pub struct ManifestCodec;

impl ManifestCodec {
    /// Parse manifest text
    ///
    /// Never fails: blank lines, `;` comments and lines without both a digest
    /// and a path are skipped so manifests from other tools stay readable.
    pub fn parse(text: &str) -> Manifest {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut manifest = Manifest::new();

        for (line_num, line) in text.lines().enumerate() {
            match Self::parse_line(line) {
                Some(entry) => {
                    if let Some(previous) =
                        manifest.insert(entry.relative_path.clone(), entry.expected_digest)
                    {
                        debug!(
                            "Manifest line {} overrides earlier digest {} for {}",
                            line_num + 1,
                            previous,
                            entry.relative_path
                        );
                    }
                }
                None => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() && !trimmed.starts_with(COMMENT_PREFIX) {
                        debug!("Skipping malformed manifest line {}: {}", line_num + 1, trimmed);
                    }
                }
            }
        }

        manifest
    }

    /// Parse a single manifest line
    ///
    /// Expected shape: `<digest><whitespace><path>`, split on the first run of
    /// whitespace only, so paths may contain spaces. Leading `*` markers are
    /// dropped and both separators are normalized.
    pub fn parse_line(line: &str) -> Option<ManifestEntry> {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_PREFIX) {
            return None;
        }

        let (digest, rest) = trimmed.split_once(char::is_whitespace)?;
        let path_token = rest.trim_start();
        if digest.is_empty() || path_token.is_empty() {
            return None;
        }

        let path = path_token.trim_start_matches(BINARY_MARKER);
        Some(ManifestEntry::new(
            path_utils::normalize_separators(path),
            digest,
        ))
    }

    /// Read and parse a manifest file
    ///
    /// Fails only when the file cannot be opened or is not valid UTF-8.
    pub fn read(path: &Path) -> Result<Manifest, IntegrityError> {
        let text = fs::read_to_string(path)
            .map_err(|e| IntegrityError::from_io_error(e, "reading manifest", path.to_path_buf()))?;
        Ok(Self::parse(&text))
    }

    /// Serialize one entry as `<digest> *<path>`
    pub fn format_entry(entry: &ManifestEntry) -> String {
        format!(
            "{} {}{}",
            entry.expected_digest, BINARY_MARKER, entry.relative_path
        )
    }

    /// Serialize entries in the order supplied, joined by `\n`
    pub fn serialize<'a, I>(entries: I) -> String
    where
        I: IntoIterator<Item = &'a ManifestEntry>,
    {
        entries
            .into_iter()
            .map(Self::format_entry)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Serialize a parsed manifest in its own order
    pub fn serialize_manifest(manifest: &Manifest) -> String {
        Self::serialize(&manifest.entries())
    }

    /// Write serialized entries to `path`, creating parent directories
    pub fn write(path: &Path, entries: &[ManifestEntry]) -> Result<(), IntegrityError> {
        let to_error =
            |e: io::Error| IntegrityError::from_io_error(e, "writing manifest", path.to_path_buf());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(to_error)?;
        }
        fs::write(path, Self::serialize(entries)).map_err(to_error)
    }
}

// Tests live in tests/hash/manifest_tests.rs
