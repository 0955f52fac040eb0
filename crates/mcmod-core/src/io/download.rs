//! Streaming downloads.
//!
//! A request is issued first and its headers inspected before the caller
//! commits to the body, so a validation tag can resolve the artifact without
//! transferring it. Dropping a [`RemoteArtifact`] aborts the transfer.

use std::path::Path;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use mcmod_schema::{ExpectedDigest, HashAlgorithm, Url};
use reqwest::Client;
use reqwest::header::{ETAG, USER_AGENT};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::io::fs::remove_if_exists;
use crate::state::UNKNOWN_TOTAL;

/// Ways a single descriptor's acquisition can fail.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Connection failure or non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Local read or write failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The streamed body did not hash to the expected digest.
    #[error("Hash mismatch: expected {expected}, got {actual}")]
    HashMismatch {
        /// Digest from the descriptor.
        expected: String,
        /// Digest of the received body.
        actual: String,
    },
}

impl DownloadError {
    /// Filesystem failures end the whole run; everything else only ends the
    /// descriptor it happened in.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// A response whose headers have arrived but whose body is untouched.
#[derive(Debug)]
pub struct RemoteArtifact {
    response: reqwest::Response,
    etag: Option<String>,
    total: u64,
}

/// Issue a GET for `url` without reading the body.
///
/// # Errors
///
/// Returns [`DownloadError::Http`] if the request fails or the status is not
/// a success.
pub async fn request(client: &Client, url: &Url) -> Result<RemoteArtifact, DownloadError> {
    let response = client
        .get(url.clone())
        .header(USER_AGENT, crate::USER_AGENT)
        .send()
        .await?
        .error_for_status()?;

    let etag = response
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let total = response.content_length().unwrap_or(UNKNOWN_TOTAL);

    debug!(%url, ?etag, total, "response headers received");
    Ok(RemoteArtifact {
        response,
        etag,
        total,
    })
}

impl RemoteArtifact {
    /// The response's cache-validation tag, if the server sent one.
    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    /// Declared body length, or [`UNKNOWN_TOTAL`].
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Abandon the body; the connection is dropped without reading it.
    pub fn abort(self) {
        drop(self.response);
    }

    /// Stream the body into `dest`, creating or truncating it.
    ///
    /// `on_chunk` is called with the size of every chunk after it has been
    /// written. When `expected` is given the body is hashed as it streams and
    /// a mismatch removes `dest`. Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// [`DownloadError::Http`] if the body stream breaks, [`DownloadError::Io`]
    /// if the file cannot be written, [`DownloadError::HashMismatch`] if the
    /// digest differs.
    pub async fn stream_to(
        self,
        dest: &Path,
        expected: Option<(HashAlgorithm, &ExpectedDigest)>,
        on_chunk: impl FnMut(u64),
    ) -> Result<u64, DownloadError> {
        let file = File::create(dest).await?;
        stream_body(self.response.bytes_stream(), file, dest, expected, on_chunk).await
    }
}

async fn stream_body(
    mut stream: impl Unpin + Stream<Item = reqwest::Result<Bytes>>,
    mut file: File,
    dest: &Path,
    expected: Option<(HashAlgorithm, &ExpectedDigest)>,
    mut on_chunk: impl FnMut(u64),
) -> Result<u64, DownloadError> {
    let mut hasher = expected.map(|(algorithm, _)| algorithm.hasher());
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        if let Some(hasher) = hasher.as_mut() {
            hasher.update(&chunk);
        }
        let len = chunk.len() as u64;
        written += len;
        on_chunk(len);
    }

    file.flush().await?;
    drop(file);

    if let (Some(hasher), Some((_, expected))) = (hasher, expected) {
        let actual = hasher.finalize_hex();
        if !expected.matches(&actual) {
            remove_if_exists(dest).await?;
            return Err(DownloadError::HashMismatch {
                expected: expected.to_string(),
                actual,
            });
        }
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    #[tokio::test]
    async fn reads_headers_before_body() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/a.jar")
            .with_status(200)
            .with_header("etag", "\"abc\"")
            .with_body("0123456789")
            .create_async()
            .await;

        let client = Client::new();
        let url = Url::parse(&format!("{}/a.jar", server.url())).unwrap();
        let remote = request(&client, &url).await.unwrap();

        assert_eq!(remote.etag(), Some("\"abc\""));
        assert_eq!(remote.total(), 10);
        remote.abort();
    }

    #[tokio::test]
    async fn error_status_is_http_error() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/missing.jar")
            .with_status(404)
            .create_async()
            .await;

        let client = Client::new();
        let url = Url::parse(&format!("{}/missing.jar", server.url())).unwrap();
        let err = request(&client, &url).await.unwrap_err();
        assert!(matches!(err, DownloadError::Http(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn streams_and_verifies_body() {
        let mut server = Server::new_async().await;
        let body = b"artifact bytes".to_vec();
        let _m = server
            .mock("GET", "/a.jar")
            .with_status(200)
            .with_body(&body)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.jar");
        let digest = ExpectedDigest::new(HashAlgorithm::Sha256.digest_hex(&body)).unwrap();

        let client = Client::new();
        let url = Url::parse(&format!("{}/a.jar", server.url())).unwrap();
        let remote = request(&client, &url).await.unwrap();
        let mut seen = 0;
        let written = remote
            .stream_to(&dest, Some((HashAlgorithm::Sha256, &digest)), |n| seen += n)
            .await
            .unwrap();

        assert_eq!(written, body.len() as u64);
        assert_eq!(seen, written);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn digest_mismatch_removes_file() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("GET", "/a.jar")
            .with_status(200)
            .with_body("tampered")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("a.jar");
        let digest = ExpectedDigest::new(HashAlgorithm::Sha1.digest_hex(b"original")).unwrap();

        let client = Client::new();
        let url = Url::parse(&format!("{}/a.jar", server.url())).unwrap();
        let remote = request(&client, &url).await.unwrap();
        let err = remote
            .stream_to(&dest, Some((HashAlgorithm::Sha1, &digest)), |_| {})
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::HashMismatch { .. }));
        assert!(!dest.exists());
    }
}
