//! Download descriptors: the hand-off between an upstream resolver and the
//! acquisition engine.

use crate::hash::{ExpectedDigest, HashAlgorithm, TagScheme};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use url::Url;

/// Errors raised while validating a descriptor list.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// Two descriptors share the same target filename.
    #[error("Duplicate filename in descriptor list: {0}")]
    DuplicateFilename(String),

    /// The filename is empty or not a bare file name.
    #[error("Invalid filename: '{0}'")]
    InvalidFilename(String),

    /// The expected digest does not fit the declared algorithm.
    #[error("Invalid {algorithm} digest for {filename}: expected {expected} hex chars, got {actual}")]
    InvalidDigestLength {
        /// Descriptor the digest belongs to.
        filename: String,
        /// Declared algorithm.
        algorithm: HashAlgorithm,
        /// Hex length the algorithm produces.
        expected: usize,
        /// Hex length found.
        actual: usize,
    },

    /// The source URL is not fetchable over HTTP.
    #[error("Unsupported URL scheme for {filename}: {url}")]
    UnsupportedUrl {
        /// Descriptor the URL belongs to.
        filename: String,
        /// Offending URL.
        url: String,
    },
}

/// How an artifact's identity can be checked without trusting the filename.
///
/// Exactly one strategy applies per artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Capability {
    /// Nothing to verify against; the artifact is always downloaded.
    #[default]
    None,
    /// Strong digest published by the catalog.
    ContentHash {
        /// Digest algorithm.
        algorithm: HashAlgorithm,
        /// Expected hex digest.
        digest: ExpectedDigest,
    },
    /// Compare a locally derived tag with the server's `ETag`.
    ValidationTag {
        /// How the local tag is derived.
        #[serde(default)]
        scheme: TagScheme,
    },
}

impl Capability {
    /// Returns `true` if local candidates can be checked before any request.
    pub fn is_hash(&self) -> bool {
        matches!(self, Self::ContentHash { .. })
    }

    /// Returns `true` if the response `ETag` can resolve the artifact.
    pub fn is_tag(&self) -> bool {
        matches!(self, Self::ValidationTag { .. })
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::ContentHash { algorithm, digest } => write!(f, "{algorithm}:{digest}"),
            Self::ValidationTag { scheme } => match scheme {
                TagScheme::Md5 => f.write_str("etag (md5)"),
            },
        }
    }
}

/// One artifact to obtain: where it lands, where it comes from, and how to
/// recognize an existing copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    /// Target filename; unique within a run and used as the on-disk name.
    pub filename: String,
    /// Source URL.
    pub url: Url,
    /// Verification capability.
    #[serde(default, rename = "verify")]
    pub verification: Capability,
}

impl Descriptor {
    /// Create a descriptor with no verification capability.
    pub fn new(filename: impl Into<String>, url: Url) -> Self {
        Self {
            filename: filename.into(),
            url,
            verification: Capability::None,
        }
    }

    /// Attach a content hash.
    pub fn with_content_hash(mut self, algorithm: HashAlgorithm, digest: ExpectedDigest) -> Self {
        self.verification = Capability::ContentHash { algorithm, digest };
        self
    }

    /// Attach tag-based verification.
    pub fn with_validation_tag(mut self, scheme: TagScheme) -> Self {
        self.verification = Capability::ValidationTag { scheme };
        self
    }

    /// Validate this descriptor in isolation.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::InvalidFilename`] for empty names, names with path
    /// separators, or `.`/`..`; [`SchemaError::UnsupportedUrl`] for non-HTTP
    /// URLs; [`SchemaError::InvalidDigestLength`] if the digest does not fit
    /// the algorithm.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let name = self.filename.as_str();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.contains('\0')
        {
            return Err(SchemaError::InvalidFilename(self.filename.clone()));
        }

        if !matches!(self.url.scheme(), "http" | "https") {
            return Err(SchemaError::UnsupportedUrl {
                filename: self.filename.clone(),
                url: self.url.to_string(),
            });
        }

        if let Capability::ContentHash { algorithm, digest } = &self.verification {
            let expected = algorithm.hex_len();
            let actual = digest.as_str().len();
            if expected != actual {
                return Err(SchemaError::InvalidDigestLength {
                    filename: self.filename.clone(),
                    algorithm: *algorithm,
                    expected,
                    actual,
                });
            }
        }

        Ok(())
    }
}

/// Validate a whole list: every descriptor valid, filenames unique.
///
/// # Errors
///
/// Returns the first [`SchemaError`] encountered, in list order.
pub fn validate_descriptors(descriptors: &[Descriptor]) -> Result<(), SchemaError> {
    let mut seen = HashSet::with_capacity(descriptors.len());
    for descriptor in descriptors {
        descriptor.validate()?;
        if !seen.insert(descriptor.filename.as_str()) {
            return Err(SchemaError::DuplicateFilename(descriptor.filename.clone()));
        }
    }
    Ok(())
}

/// Serialized form of a descriptor list (`[[artifact]]` tables in TOML,
/// `{"artifact": [...]}` in JSON).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorList {
    /// Descriptors in manifest order.
    #[serde(default, rename = "artifact")]
    pub artifacts: Vec<Descriptor>,
}
