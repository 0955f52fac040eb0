//! Content digests and validation-tag derivation.

use md5::Md5;
use serde::{Deserialize, Deserializer, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::str::FromStr;

/// Digest algorithm a catalog publishes for its artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1, as published by Modrinth-style catalogs.
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-512.
    Sha512,
    /// BLAKE3.
    Blake3,
}

impl HashAlgorithm {
    /// Every supported algorithm, weakest first.
    pub const ALL: [Self; 4] = [Self::Sha1, Self::Sha256, Self::Sha512, Self::Blake3];

    /// Length of a hex-encoded digest for this algorithm.
    pub fn hex_len(self) -> usize {
        match self {
            Self::Sha1 => 40,
            Self::Sha256 | Self::Blake3 => 64,
            Self::Sha512 => 128,
        }
    }

    /// Compute the lower-case hex digest of `data`.
    pub fn digest_hex(self, data: &[u8]) -> String {
        match self {
            Self::Sha1 => hex::encode(Sha1::digest(data)),
            Self::Sha256 => hex::encode(Sha256::digest(data)),
            Self::Sha512 => hex::encode(Sha512::digest(data)),
            Self::Blake3 => blake3::hash(data).to_hex().to_string(),
        }
    }

    /// Start an incremental hasher, for digesting a body as it streams in.
    pub fn hasher(self) -> ContentHasher {
        match self {
            Self::Sha1 => ContentHasher::Sha1(Sha1::new()),
            Self::Sha256 => ContentHasher::Sha256(Sha256::new()),
            Self::Sha512 => ContentHasher::Sha512(Sha512::new()),
            Self::Blake3 => ContentHasher::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    /// Name used in descriptor lists and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            "blake3" => Ok(Self::Blake3),
            other => Err(format!("unknown hash algorithm '{other}'")),
        }
    }
}

/// Incremental hasher for one of the supported [`HashAlgorithm`]s.
pub enum ContentHasher {
    /// SHA-1 state.
    Sha1(Sha1),
    /// SHA-256 state.
    Sha256(Sha256),
    /// SHA-512 state.
    Sha512(Sha512),
    /// BLAKE3 state (boxed, it is large).
    Blake3(Box<blake3::Hasher>),
}

impl ContentHasher {
    /// Feed a chunk of bytes.
    pub fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(chunk),
            Self::Sha256(h) => h.update(chunk),
            Self::Sha512(h) => h.update(chunk),
            Self::Blake3(h) => {
                h.update(chunk);
            }
        }
    }

    /// Finish and return the lower-case hex digest.
    pub fn finalize_hex(self) -> String {
        match self {
            Self::Sha1(h) => hex::encode(h.finalize()),
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
            Self::Blake3(h) => h.finalize().to_hex().to_string(),
        }
    }
}

impl fmt::Debug for ContentHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let algorithm = match self {
            Self::Sha1(_) => HashAlgorithm::Sha1,
            Self::Sha256(_) => HashAlgorithm::Sha256,
            Self::Sha512(_) => HashAlgorithm::Sha512,
            Self::Blake3(_) => HashAlgorithm::Blake3,
        };
        f.debug_tuple("ContentHasher").field(&algorithm).finish()
    }
}

/// Expected hex digest of an artifact.
///
/// Normalized to lower case at construction so comparisons against computed
/// digests are case-insensitive. Length is checked against the algorithm when
/// the owning descriptor is validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ExpectedDigest(String);

impl ExpectedDigest {
    /// Create a new `ExpectedDigest`, rejecting non-hex input.
    ///
    /// # Errors
    ///
    /// Returns an error string if `s` is empty or contains non-hex characters.
    pub fn new(s: impl Into<String>) -> Result<Self, String> {
        let s = s.into();
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("empty digest".to_string());
        }
        if !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("digest contains non-hex characters: '{trimmed}'"));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    /// Return the digest as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison with a computed hex digest.
    pub fn matches(&self, actual: &str) -> bool {
        self.0.eq_ignore_ascii_case(actual)
    }
}

impl<'de> Deserialize<'de> for ExpectedDigest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for ExpectedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExpectedDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How a descriptor derives a cache-validation tag from local bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagScheme {
    /// Quoted lower-case MD5 hex, the `ETag` form CDNs emit for whole objects.
    #[default]
    Md5,
}

impl TagScheme {
    /// Derive the tag a server would send for `data`.
    pub fn derive(self, data: &[u8]) -> String {
        match self {
            Self::Md5 => format!("\"{}\"", hex::encode(Md5::digest(data))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_known_vector() {
        assert_eq!(
            HashAlgorithm::Sha1.digest_hex(b"abc"),
            "a9993e364706816aba3e25717850c26c9cd0d89d"
        );
    }

    #[test]
    fn incremental_matches_one_shot() {
        for algorithm in [
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha512,
            HashAlgorithm::Blake3,
        ] {
            let mut hasher = algorithm.hasher();
            hasher.update(b"hello ");
            hasher.update(b"world");
            let streamed = hasher.finalize_hex();
            assert_eq!(streamed, algorithm.digest_hex(b"hello world"));
            assert_eq!(streamed.len(), algorithm.hex_len());
        }
    }

    #[test]
    fn expected_digest_is_case_insensitive() {
        let digest = ExpectedDigest::new("A9993E364706816ABA3E25717850C26C9CD0D89D").unwrap();
        assert_eq!(digest.as_str(), "a9993e364706816aba3e25717850c26c9cd0d89d");
        assert!(digest.matches("a9993e364706816aba3e25717850c26c9cd0d89d"));
        assert!(digest.matches("A9993E364706816ABA3E25717850C26C9CD0D89D"));
    }

    #[test]
    fn expected_digest_rejects_garbage() {
        assert!(ExpectedDigest::new("").is_err());
        assert!(ExpectedDigest::new("xyz").is_err());
    }

    #[test]
    fn md5_tag_is_quoted() {
        assert_eq!(
            TagScheme::Md5.derive(b"abc"),
            "\"900150983cd24fb0d6963f7d28e17f72\""
        );
    }

    #[test]
    fn algorithm_from_str() {
        assert_eq!("SHA1".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Sha1));
        assert!("crc32".parse::<HashAlgorithm>().is_err());
    }
}
