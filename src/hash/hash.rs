// Hash computation module
// Provides the digest registry and the chunked, cancellable file hasher

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

use blake2::Blake2b512;
use blake3::Hasher as Blake3Hasher;
use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use sha3::Sha3_256;
use xxhash_rust::xxh3::Xxh3;

use super::error::IntegrityError;
use super::progress::CancellationToken;

/// Default read size for hashing, 64 KiB
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Trait for hash algorithm implementations
pub trait Hasher: Send {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize the hash and return the raw digest bytes
    fn finalize(self: Box<Self>) -> Vec<u8>;
}

/// Any RustCrypto digest (MD5, SHA families, BLAKE2)
pub struct DigestHasher<D>(D);

impl<D: Digest + Send> Hasher for DigestHasher<D> {
    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.0, data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().to_vec()
    }
}

pub struct Blake3Wrapper(Blake3Hasher);

impl Hasher for Blake3Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.0.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        self.0.finalize().as_bytes().to_vec()
    }
}

// XXH3 family, non-cryptographic; digests are emitted big-endian so the hex
// matches the canonical xxhsum output
pub struct Xxh3Wrapper {
    state: Xxh3,
    wide: bool,
}

impl Hasher for Xxh3Wrapper {
    fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    fn finalize(self: Box<Self>) -> Vec<u8> {
        if self.wide {
            self.state.digest128().to_be_bytes().to_vec()
        } else {
            self.state.digest().to_be_bytes().to_vec()
        }
    }
}

/// Content digest used for manifest entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Algorithm {
    #[default]
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Sha3_256,
    Blake2b,
    Blake3,
    Xxh3,
    Xxh128,
}

impl Algorithm {
    pub const ALL: [Algorithm; 9] = [
        Algorithm::Md5,
        Algorithm::Sha1,
        Algorithm::Sha256,
        Algorithm::Sha512,
        Algorithm::Sha3_256,
        Algorithm::Blake2b,
        Algorithm::Blake3,
        Algorithm::Xxh3,
        Algorithm::Xxh128,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::Md5 => "md5",
            Algorithm::Sha1 => "sha1",
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha512 => "sha512",
            Algorithm::Sha3_256 => "sha3-256",
            Algorithm::Blake2b => "blake2b",
            Algorithm::Blake3 => "blake3",
            Algorithm::Xxh3 => "xxh3",
            Algorithm::Xxh128 => "xxh128",
        }
    }

    pub fn output_bits(self) -> usize {
        match self {
            Algorithm::Md5 | Algorithm::Xxh128 => 128,
            Algorithm::Sha1 => 160,
            Algorithm::Sha256 | Algorithm::Sha3_256 | Algorithm::Blake3 => 256,
            Algorithm::Sha512 | Algorithm::Blake2b => 512,
            Algorithm::Xxh3 => 64,
        }
    }

    /// Length of the lowercase hex digest
    pub fn hex_len(self) -> usize {
        self.output_bits() / 4
    }

    pub fn is_cryptographic(self) -> bool {
        !matches!(self, Algorithm::Xxh3 | Algorithm::Xxh128)
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = IntegrityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(Algorithm::Md5),
            "sha1" | "sha-1" => Ok(Algorithm::Sha1),
            "sha256" | "sha-256" => Ok(Algorithm::Sha256),
            "sha512" | "sha-512" => Ok(Algorithm::Sha512),
            "sha3-256" | "sha3_256" => Ok(Algorithm::Sha3_256),
            "blake2b" | "blake2b-512" => Ok(Algorithm::Blake2b),
            "blake3" => Ok(Algorithm::Blake3),
            "xxh3" => Ok(Algorithm::Xxh3),
            "xxh128" => Ok(Algorithm::Xxh128),
            _ => Err(IntegrityError::UnsupportedAlgorithm {
                algorithm: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Algorithm {
    type Error = IntegrityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Algorithm> for String {
    fn from(value: Algorithm) -> Self {
        value.name().to_string()
    }
}

/// Information about a hash algorithm
#[derive(Debug, Clone, serde::Serialize)]
pub struct AlgorithmInfo {
    pub name: &'static str,
    pub output_bits: usize,
    pub cryptographic: bool,
}

/// Registry for hash algorithms
pub struct HashRegistry;

impl HashRegistry {
    /// Get a fresh hasher instance for the specified algorithm
    pub fn get_hasher(algorithm: Algorithm) -> Box<dyn Hasher> {
        match algorithm {
            Algorithm::Md5 => Box::new(DigestHasher(Md5::new())),
            Algorithm::Sha1 => Box::new(DigestHasher(Sha1::new())),
            Algorithm::Sha256 => Box::new(DigestHasher(Sha256::new())),
            Algorithm::Sha512 => Box::new(DigestHasher(Sha512::new())),
            Algorithm::Sha3_256 => Box::new(DigestHasher(Sha3_256::new())),
            Algorithm::Blake2b => Box::new(DigestHasher(Blake2b512::new())),
            Algorithm::Blake3 => Box::new(Blake3Wrapper(Blake3Hasher::new())),
            Algorithm::Xxh3 => Box::new(Xxh3Wrapper {
                state: Xxh3::new(),
                wide: false,
            }),
            Algorithm::Xxh128 => Box::new(Xxh3Wrapper {
                state: Xxh3::new(),
                wide: true,
            }),
        }
    }

    /// List all available hash algorithms
    pub fn list_algorithms() -> Vec<AlgorithmInfo> {
        Algorithm::ALL
            .iter()
            .map(|alg| AlgorithmInfo {
                name: alg.name(),
                output_bits: alg.output_bits(),
                cryptographic: alg.is_cryptographic(),
            })
            .collect()
    }
}

/// Result of hashing one file
#[derive(Debug)]
pub enum FileDigest {
    /// Lowercase hex digest of the full content
    Digest(String),
    /// The token was observed set mid-read; no digest is reported
    Cancelled,
    /// The file could not be opened or read
    Failed(IntegrityError),
}

impl FileDigest {
    pub fn digest(&self) -> Option<&str> {
        match self {
            FileDigest::Digest(hex) => Some(hex),
            _ => None,
        }
    }
}

/// Hash computer with streaming, cancellable I/O
#[derive(Debug, Clone)]
pub struct HashComputer {
    algorithm: Algorithm,
    chunk_size: usize,
}

impl HashComputer {
    pub fn new(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// A zero chunk size is bumped to one byte.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Digest an in-memory buffer
    pub fn digest_bytes(&self, data: &[u8]) -> String {
        let mut hasher = HashRegistry::get_hasher(self.algorithm);
        hasher.update(data);
        hex::encode(hasher.finalize())
    }

    /// Digest a file, checking `token` after every chunk
    pub fn digest(&self, path: &Path, token: &CancellationToken) -> FileDigest {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) => {
                return FileDigest::Failed(IntegrityError::from_io_error(
                    e,
                    "opening",
                    path.to_path_buf(),
                ))
            }
        };
        self.digest_reader(file, token)
            .map_err(|e| IntegrityError::from_io_error(e, "reading", path.to_path_buf()))
            .unwrap_or_else(FileDigest::Failed)
    }

    /// Digest any reader in chunks; the inner `FileDigest` is never `Failed`
    pub fn digest_reader<R: Read>(
        &self,
        mut reader: R,
        token: &CancellationToken,
    ) -> io::Result<FileDigest> {
        let mut hasher = HashRegistry::get_hasher(self.algorithm);
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let bytes_read = match reader.read(&mut buffer) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
            if token.is_cancelled() {
                return Ok(FileDigest::Cancelled);
            }
        }

        Ok(FileDigest::Digest(hex::encode(hasher.finalize())))
    }
}

impl Default for HashComputer {
    fn default() -> Self {
        Self::new(Algorithm::default())
    }
}

/// Case-insensitive comparison of two hex digests
pub fn digests_match(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}

// Tests live in tests/hash/hash_tests.rs
