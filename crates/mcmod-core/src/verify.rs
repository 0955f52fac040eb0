//! Candidate verification.
//!
//! A candidate is checked by content hash first and by validation tag second,
//! against the same buffer, before its identity is declared unknown.

use mcmod_schema::Capability;

/// Result of checking a candidate against a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The candidate is the artifact.
    Matched,
    /// The candidate is something else.
    Mismatched,
    /// Identity cannot be decided with what is available.
    Unsupported,
}

impl Verdict {
    /// Returns `true` for [`Verdict::Matched`].
    pub fn is_match(self) -> bool {
        matches!(self, Self::Matched)
    }
}

/// Check `candidate` against the descriptor's capability.
///
/// `remote_tag` is the response's validation tag, when a request has been made
/// and the server supplied one.
pub fn verify(capability: &Capability, candidate: &[u8], remote_tag: Option<&str>) -> Verdict {
    match capability {
        Capability::ContentHash { algorithm, digest } => {
            if digest.matches(&algorithm.digest_hex(candidate)) {
                Verdict::Matched
            } else {
                Verdict::Mismatched
            }
        }
        Capability::ValidationTag { scheme } => match remote_tag {
            Some(remote) if scheme.derive(candidate) == remote.trim() => Verdict::Matched,
            Some(_) => Verdict::Mismatched,
            None => Verdict::Unsupported,
        },
        Capability::None => Verdict::Unsupported,
    }
}

/// A candidate after [`verify_blocking`].
#[derive(Debug)]
pub(crate) struct Checked {
    pub(crate) verdict: Verdict,
    /// Tag derived from a candidate that failed a tag comparison.
    pub(crate) local_tag: Option<String>,
    /// The candidate, handed back to the caller.
    pub(crate) bytes: Vec<u8>,
}

/// [`verify`] on the blocking pool. Digests of large artifacts must not run
/// on a runtime worker.
pub(crate) async fn verify_blocking(
    capability: &Capability,
    candidate: Vec<u8>,
    remote_tag: Option<&str>,
) -> std::io::Result<Checked> {
    let capability = capability.clone();
    let remote_tag = remote_tag.map(str::to_owned);
    tokio::task::spawn_blocking(move || {
        let verdict = verify(&capability, &candidate, remote_tag.as_deref());
        let local_tag = match (&capability, verdict) {
            (Capability::ValidationTag { scheme }, Verdict::Mismatched) => {
                Some(scheme.derive(&candidate))
            }
            _ => None,
        };
        Checked {
            verdict,
            local_tag,
            bytes: candidate,
        }
    })
    .await
    .map_err(std::io::Error::other)
}
