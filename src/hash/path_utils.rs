// Path normalization utilities for cross-platform manifest handling
// Manifests may be written on Windows or Unix, so both separators are accepted
// on read and every key is stored in the canonical `/` form

use std::path::{Component, Path, PathBuf};

/// Separator used for every relative path handed out by the engine
pub const CANONICAL_SEPARATOR: char = '/';

/// Rewrite both `\` and `/` to the canonical separator
pub fn normalize_separators(path_str: &str) -> String {
    path_str.replace('\\', "/")
}

/// Convert a path relative to the scan root into its canonical string form
///
/// Returns `None` when the path contains anything other than plain
/// components (root, prefix, `.` or `..`), which never happens for paths
/// produced by walking below the root.
pub fn to_canonical(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy()),
            Component::CurDir => continue,
            _ => return None,
        }
    }
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

/// Strip `root` from `path` and return the canonical relative form
pub fn relative_to_root(path: &Path, root: &Path) -> Option<String> {
    path.strip_prefix(root).ok().and_then(to_canonical)
}

/// Check whether a canonical manifest path could point outside the root
///
/// Absolute paths, drive-letter paths and any `..` segment count as escaping.
pub fn escapes_root(canonical: &str) -> bool {
    if canonical.starts_with(CANONICAL_SEPARATOR) {
        return true;
    }
    let bytes = canonical.as_bytes();
    if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
        return true;
    }
    canonical.split(CANONICAL_SEPARATOR).any(|segment| segment == "..")
}

/// Resolve a canonical relative path below `root`
///
/// Yields `None` for paths that would escape the root, so callers never
/// touch anything outside the scanned tree.
pub fn resolve_under_root(root: &Path, canonical: &str) -> Option<PathBuf> {
    if canonical.is_empty() || escapes_root(canonical) {
        return None;
    }
    let mut resolved = root.to_path_buf();
    for segment in canonical.split(CANONICAL_SEPARATOR) {
        if segment.is_empty() || segment == "." {
            continue;
        }
        resolved.push(segment);
    }
    Some(resolved)
}

/// True when a file name carries the reserved manifest extension
pub fn has_manifest_extension(file_name: &str, extension: &str) -> bool {
    let extension = extension.trim_start_matches('.');
    if extension.is_empty() {
        return false;
    }
    file_name
        .strip_suffix(extension)
        .is_some_and(|stem| stem.ends_with('.'))
}
