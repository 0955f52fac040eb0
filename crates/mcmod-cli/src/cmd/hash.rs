//! Hash command

use std::path::PathBuf;

use anyhow::{Context, Result};
use mcmod_schema::{HashAlgorithm, TagScheme};

/// Print digests of local files for use in descriptor lists.
///
/// Without `algorithm`, every supported digest is printed along with the
/// md5 tag a CDN would send as its `ETag`.
pub fn hash(files: &[PathBuf], algorithm: Option<HashAlgorithm>) -> Result<()> {
    for path in files {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

        match algorithm {
            Some(algorithm) => {
                println!("{}  {}", algorithm.digest_hex(&bytes), path.display());
            }
            None => {
                println!("{}", path.display());
                for algorithm in HashAlgorithm::ALL {
                    println!("  {:<7} {}", algorithm.as_str(), algorithm.digest_hex(&bytes));
                }
                println!("  {:<7} {}", "etag", TagScheme::Md5.derive(&bytes));
            }
        }
    }
    Ok(())
}
