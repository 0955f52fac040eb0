//! Descriptor list loading.
//!
//! A list can live on disk, behind a `file://` URL, or on an HTTP server. It
//! is TOML (`[[artifact]]` tables) or JSON (a bare array or an object with an
//! `artifact` array); the format follows the extension and falls back to
//! sniffing the content.

use std::path::{Path, PathBuf};

use mcmod_schema::{Descriptor, DescriptorList};
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to fetch {url}: {source}")]
    Fetch { url: Url, source: reqwest::Error },

    #[error("Unsupported source: {0}")]
    Unsupported(String),

    #[error("Descriptor list is not valid UTF-8")]
    Encoding,

    #[error("Invalid TOML descriptor list: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON descriptor list: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where a descriptor list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Local(PathBuf),
    Remote(Url),
}

impl Source {
    /// Interpret a command-line argument as a path or URL.
    ///
    /// Anything that does not parse as an absolute URL is a path, as is a
    /// single-letter scheme (a Windows drive).
    pub fn parse(arg: &str) -> Result<Self, SourceError> {
        let Ok(url) = Url::parse(arg) else {
            return Ok(Self::Local(PathBuf::from(arg)));
        };
        match url.scheme() {
            "http" | "https" => Ok(Self::Remote(url)),
            "file" => url
                .to_file_path()
                .map(Self::Local)
                .map_err(|()| SourceError::Unsupported(arg.to_string())),
            scheme if scheme.len() == 1 => Ok(Self::Local(PathBuf::from(arg))),
            _ => Err(SourceError::Unsupported(arg.to_string())),
        }
    }

    fn format_hint(&self) -> Option<Format> {
        let ext = match self {
            Self::Local(path) => path.extension().and_then(|e| e.to_str()).map(str::to_owned),
            Self::Remote(url) => Path::new(url.path())
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_owned),
        };
        match ext?.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "toml" => Some(Format::Toml),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
}

impl Format {
    /// JSON starts with an object or an array of objects; a TOML list starts
    /// with `[[artifact]]`.
    fn sniff(text: &str) -> Self {
        let text = text.trim_start();
        if text.starts_with('{') {
            return Self::Json;
        }
        if let Some(rest) = text.strip_prefix('[') {
            if matches!(rest.trim_start().chars().next(), Some('{' | ']')) {
                return Self::Json;
            }
        }
        Self::Toml
    }
}

/// Load the descriptor list named by `arg`.
///
/// The list is parsed but not validated; callers validate before acting.
pub async fn load(client: &Client, arg: &str) -> Result<Vec<Descriptor>, SourceError> {
    let source = Source::parse(arg)?;
    let bytes = match &source {
        Source::Local(path) => tokio::fs::read(path).await.map_err(|e| SourceError::Read {
            path: path.clone(),
            source: e,
        })?,
        Source::Remote(url) => fetch(client, url).await?,
    };
    let text = String::from_utf8(bytes).map_err(|_| SourceError::Encoding)?;
    let format = source.format_hint().unwrap_or_else(|| Format::sniff(&text));
    debug!(?source, ?format, "parsing descriptor list");
    parse(&text, format)
}

async fn fetch(client: &Client, url: &Url) -> Result<Vec<u8>, SourceError> {
    let wrap = |source: reqwest::Error| SourceError::Fetch {
        url: url.clone(),
        source,
    };
    let response = client
        .get(url.clone())
        .send()
        .await
        .and_then(reqwest::Response::error_for_status)
        .map_err(wrap)?;
    let body = response.bytes().await.map_err(wrap)?;
    Ok(body.to_vec())
}

fn parse(text: &str, format: Format) -> Result<Vec<Descriptor>, SourceError> {
    match format {
        Format::Toml => Ok(toml::from_str::<DescriptorList>(text)?.artifacts),
        Format::Json => {
            let value: serde_json::Value = serde_json::from_str(text)?;
            if value.is_array() {
                Ok(serde_json::from_value(value)?)
            } else {
                Ok(serde_json::from_value::<DescriptorList>(value)?.artifacts)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcmod_schema::Capability;

    const TOML_LIST: &str = r#"
[[artifact]]
filename = "sodium.jar"
url = "https://cdn.example.com/sodium.jar"
verify = { kind = "content_hash", algorithm = "sha1", digest = "a9993e364706816aba3e25717850c26c9cd0d89d" }

[[artifact]]
filename = "lithium.jar"
url = "https://cdn.example.com/lithium.jar"
verify = { kind = "validation_tag" }
"#;

    const JSON_ARRAY: &str = r#"[
  { "filename": "a.jar", "url": "https://example.com/a.jar" }
]"#;

    #[test]
    fn parse_distinguishes_paths_and_urls() {
        assert_eq!(
            Source::parse("lists/mods.toml").unwrap(),
            Source::Local(PathBuf::from("lists/mods.toml"))
        );
        assert!(matches!(
            Source::parse("https://example.com/mods.json").unwrap(),
            Source::Remote(_)
        ));
        assert_eq!(
            Source::parse("file:///srv/mods.toml").unwrap(),
            Source::Local(PathBuf::from("/srv/mods.toml"))
        );
        assert!(matches!(
            Source::parse("ftp://example.com/mods.toml"),
            Err(SourceError::Unsupported(_))
        ));
    }

    #[test]
    fn sniffs_format() {
        assert_eq!(Format::sniff(TOML_LIST), Format::Toml);
        assert_eq!(Format::sniff(JSON_ARRAY), Format::Json);
        assert_eq!(Format::sniff("  []"), Format::Json);
        assert_eq!(Format::sniff(r#"{"artifact": []}"#), Format::Json);
    }

    #[test]
    fn parses_both_json_shapes() {
        let bare = parse(JSON_ARRAY, Format::Json).unwrap();
        let wrapped = parse(&format!(r#"{{"artifact": {JSON_ARRAY}}}"#), Format::Json).unwrap();
        assert_eq!(bare, wrapped);
        assert_eq!(bare[0].filename, "a.jar");
        assert_eq!(bare[0].verification, Capability::None);
    }

    #[tokio::test]
    async fn loads_local_toml_without_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("modlist");
        std::fs::write(&path, TOML_LIST).unwrap();

        let list = load(&Client::new(), path.to_str().unwrap()).await.unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].verification.is_hash());
        assert!(list[1].verification.is_tag());
    }

    #[tokio::test]
    async fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = load(&Client::new(), path.to_str().unwrap()).await.unwrap_err();
        assert!(matches!(err, SourceError::Read { .. }));
    }

    #[tokio::test]
    async fn loads_remote_json() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/mods.json")
            .with_status(200)
            .with_body(JSON_ARRAY)
            .create_async()
            .await;

        let url = format!("{}/mods.json", server.url());
        let list = load(&Client::new(), &url).await.unwrap();
        assert_eq!(list.len(), 1);
    }

    #[tokio::test]
    async fn remote_error_status_is_fetch_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/mods.toml")
            .with_status(500)
            .create_async()
            .await;

        let url = format!("{}/mods.toml", server.url());
        let err = load(&Client::new(), &url).await.unwrap_err();
        assert!(matches!(err, SourceError::Fetch { .. }));
    }
}
