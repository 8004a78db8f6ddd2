// Configuration module
// Defaults, then the TOML file, then TREESEAL_* environment variables

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::hash::error::IntegrityError;
use crate::hash::hash::{Algorithm, DEFAULT_CHUNK_SIZE};
use crate::hash::scan::DEFAULT_MANIFEST_EXTENSION;
use crate::library::Library;

const APP_DIR: &str = "treeseal";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Digest used for new manifests and for verification.
    pub algorithm: Algorithm,
    /// Read size for hashing, in bytes.
    pub chunk_size: usize,
    /// Reserved manifest extension, without the dot.
    pub manifest_extension: String,
    /// Where manifests are stored when no explicit path is given.
    pub checksum_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            manifest_extension: DEFAULT_MANIFEST_EXTENSION.to_string(),
            checksum_dir: default_checksum_dir(),
        }
    }
}

impl Settings {
    /// Default config file location, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load `path` when given, else the default file if it exists, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self, IntegrityError> {
        let mut settings = match path {
            Some(path) => Self::load_from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(default) => Self::load_from_file(&default)?,
                None => Self::default(),
            },
        };
        settings.merge_with_env()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, IntegrityError> {
        let content = fs::read_to_string(path).map_err(|e| IntegrityError::Config {
            path: path.to_path_buf(),
            reason: format!("failed to read config file: {}", e),
        })?;
        Self::from_toml(&content).map_err(|reason| IntegrityError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("invalid TOML: {}", e))
    }

    fn merge_with_env(&mut self) -> Result<(), IntegrityError> {
        self.merge_from(|key| std::env::var(key).ok())
    }

    fn merge_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), IntegrityError> {
        if let Some(algorithm) = lookup("TREESEAL_ALGORITHM") {
            self.algorithm = algorithm.parse()?;
        }
        if let Some(chunk_size) = lookup("TREESEAL_CHUNK_SIZE") {
            self.chunk_size = chunk_size.parse().map_err(|_| IntegrityError::Config {
                path: PathBuf::from("TREESEAL_CHUNK_SIZE"),
                reason: format!("invalid chunk size: {}", chunk_size),
            })?;
        }
        if let Some(dir) = lookup("TREESEAL_CHECKSUM_DIR") {
            self.checksum_dir = PathBuf::from(dir);
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<(), IntegrityError> {
        if self.chunk_size == 0 {
            return Err(IntegrityError::Config {
                path: PathBuf::from("chunk_size"),
                reason: "chunk_size must be greater than zero".to_string(),
            });
        }
        self.manifest_extension = self.manifest_extension.trim_start_matches('.').to_string();
        if self.manifest_extension.is_empty() {
            return Err(IntegrityError::Config {
                path: PathBuf::from("manifest_extension"),
                reason: "manifest_extension must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Stored manifest location for a root called `name`
    pub fn manifest_path_for(&self, name: &str) -> PathBuf {
        Library::manifest_path(&self.checksum_dir, name, &self.manifest_extension)
    }
}

fn default_checksum_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR).join("checksums"))
        .unwrap_or_else(|| PathBuf::from("Checksums"))
}
