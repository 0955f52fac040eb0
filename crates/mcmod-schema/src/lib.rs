//! Shared types and wire format for mcmod.
//!
//! Upstream resolvers produce [`Descriptor`]s; the acquisition engine in
//! `mcmod-core` consumes them.

#![allow(clippy::missing_errors_doc)]

pub mod descriptor;
pub mod hash;

// Re-exports
pub use descriptor::{Capability, Descriptor, DescriptorList, SchemaError, validate_descriptors};
pub use hash::{ContentHasher, ExpectedDigest, HashAlgorithm, TagScheme};
pub use url::Url;
