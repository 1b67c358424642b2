//! Blob sinks: where the feed and the static map assets end up.
//!
//! - [`DirectorySink`] writes into a local directory, atomically per object
//! - [`HttpPutSink`] PUTs each object under a base URL with a public-read ACL,
//!   which S3-compatible stores and presigning gateways accept

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use eventmap_providers::{BoxFuture, ProviderError, http};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::config::SinkTarget;

/// Errors raised while storing an object.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The key cannot be used as an object name.
    #[error("invalid object key {0:?}")]
    InvalidKey(String),

    /// Writing to the local directory failed.
    #[error("failed to write {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The upload endpoint rejected the object or could not be reached.
    #[error("failed to upload {key}: {source}")]
    Upload {
        key: String,
        #[source]
        source: ProviderError,
    },

    /// The sink itself is misconfigured.
    #[error("invalid sink configuration: {0}")]
    Config(String),
}

/// Destination for published objects.
pub trait BlobSink: Send + Sync {
    /// Human-readable destination, for logs.
    fn describe(&self) -> String;

    /// Stores `body` under `key`, replacing any previous object.
    fn put_object<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<(), SinkError>>;
}

/// Opens the sink a target describes.
pub fn open(target: &SinkTarget, timeout: Duration) -> Result<Box<dyn BlobSink>, SinkError> {
    let sink: Box<dyn BlobSink> = match target {
        SinkTarget::Directory(root) => Box::new(DirectorySink::new(root)),
        SinkTarget::Storage { url, token } => {
            Box::new(HttpPutSink::new(url.clone(), token.clone(), timeout)?)
        }
    };
    Ok(sink)
}

/// Object keys are flat names: no separators, no parent references.
fn validate_key(key: &str) -> Result<(), SinkError> {
    let trimmed = key.trim();
    if trimmed.is_empty() || trimmed != key || key.contains(['/', '\\']) || key == "." || key == ".." {
        return Err(SinkError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Writes objects as files in a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    /// Creates a sink rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the target directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_atomic(root: &Path, key: &str, body: &[u8]) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(root)?;
        let target = root.join(key);
        let mut tmp = NamedTempFile::new_in(root)?;
        tmp.write_all(body)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;
        Ok(target)
    }
}

impl BlobSink for DirectorySink {
    fn describe(&self) -> String {
        format!("directory {}", self.root.display())
    }

    fn put_object<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
        _content_type: &'a str,
    ) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            validate_key(key)?;
            let root = self.root.clone();
            let owned_key = key.to_string();
            let size = body.len();

            let written = tokio::task::spawn_blocking(move || Self::write_atomic(&root, &owned_key, &body))
                .await
                .map_err(std::io::Error::other)
                .and_then(|result| result)
                .map_err(|source| SinkError::Io {
                    key: key.to_string(),
                    source,
                })?;

            info!(path = %written.display(), bytes = size, "Wrote object");
            Ok(())
        })
    }
}

/// Uploads objects with HTTP `PUT` under a base URL.
///
/// Requests carry an optional bearer token and the ACL header but are not
/// SigV4-signed. `STORAGE_URL` must therefore point at an endpoint that
/// accepts unsigned or token-authenticated PUTs (a presigned prefix or an
/// upload gateway), not at a raw S3 bucket.
#[derive(Debug, Clone)]
pub struct HttpPutSink {
    http_client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpPutSink {
    /// ACL header sent with every upload.
    pub const ACL_HEADER: &'static str = "x-amz-acl";

    /// Objects are world-readable: the map page fetches them directly.
    pub const ACL_PUBLIC_READ: &'static str = "public-read";

    /// Creates a sink that stores `key` at `{base_url}/{key}`.
    pub fn new(base_url: Url, token: Option<String>, timeout: Duration) -> Result<Self, SinkError> {
        if base_url.cannot_be_a_base() {
            return Err(SinkError::Config(format!("{} cannot hold objects", base_url)));
        }
        let http_client = http::build_client(timeout)
            .map_err(|e| SinkError::Config(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url,
            token,
        })
    }

    /// URL an object is uploaded to.
    pub fn object_url(&self, key: &str) -> Result<Url, SinkError> {
        validate_key(key)?;
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| SinkError::Config(format!("{} cannot hold objects", self.base_url)))?
            .pop_if_empty()
            .push(key);
        Ok(url)
    }
}

impl BlobSink for HttpPutSink {
    fn describe(&self) -> String {
        format!("storage {}", self.base_url)
    }

    fn put_object<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
        content_type: &'a str,
    ) -> BoxFuture<'a, Result<(), SinkError>> {
        Box::pin(async move {
            let url = self.object_url(key)?;
            let size = body.len();
            debug!(%url, bytes = size, "Uploading object");

            let mut request = self
                .http_client
                .put(url.clone())
                .header("Content-Type", content_type)
                .header(Self::ACL_HEADER, Self::ACL_PUBLIC_READ)
                .body(body);
            if let Some(token) = &self.token {
                request = request.bearer_auth(token);
            }

            http::send(request).await.map_err(|source| SinkError::Upload {
                key: key.to_string(),
                source: source.with_provider("storage"),
            })?;

            info!(%url, bytes = size, "Uploaded object");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn open_describes_the_target() {
        let dir = open(&SinkTarget::Directory("/srv/map".into()), Duration::from_secs(1)).unwrap();
        assert_eq!(dir.describe(), "directory /srv/map");

        let storage = open(
            &SinkTarget::Storage {
                url: Url::parse("https://bucket.example/map/").unwrap(),
                token: None,
            },
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(storage.describe(), "storage https://bucket.example/map/");
    }

    #[test]
    fn keys_must_be_flat_names() {
        assert!(validate_key("events.json").is_ok());
        for bad in ["", " events.json", "../events.json", "a/b", "a\\b", ".."] {
            assert!(matches!(validate_key(bad), Err(SinkError::InvalidKey(_))), "{bad:?}");
        }
    }

    mod directory {
        use super::*;

        #[tokio::test]
        async fn writes_and_replaces_objects() {
            let dir = tempfile::tempdir().unwrap();
            let sink = DirectorySink::new(dir.path().join("public"));

            sink.put_object("events.json", b"{\"v\":1}".to_vec(), "application/json")
                .await
                .unwrap();
            sink.put_object("events.json", b"{\"v\":2}".to_vec(), "application/json")
                .await
                .unwrap();

            let written = std::fs::read_to_string(dir.path().join("public/events.json")).unwrap();
            assert_eq!(written, "{\"v\":2}");

            let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("public"))
                .unwrap()
                .map(|entry| entry.unwrap().file_name())
                .collect();
            assert_eq!(leftovers, vec![std::ffi::OsString::from("events.json")]);
        }

        #[tokio::test]
        async fn rejects_path_keys() {
            let dir = tempfile::tempdir().unwrap();
            let sink = DirectorySink::new(dir.path());
            let err = sink
                .put_object("../escape.json", Vec::new(), "application/json")
                .await
                .unwrap_err();
            assert!(matches!(err, SinkError::InvalidKey(_)));
        }
    }

    mod http_put {
        use super::*;

        fn sink(base: &str, token: Option<&str>) -> HttpPutSink {
            HttpPutSink::new(
                Url::parse(base).unwrap(),
                token.map(String::from),
                Duration::from_secs(5),
            )
            .unwrap()
        }

        #[test]
        fn object_urls_append_the_key() {
            let with_slash = sink("https://bucket.example/map/", None);
            let without = sink("https://bucket.example/map", None);
            assert_eq!(
                with_slash.object_url("events.json").unwrap().as_str(),
                "https://bucket.example/map/events.json"
            );
            assert_eq!(
                without.object_url("events.json").unwrap().as_str(),
                "https://bucket.example/map/events.json"
            );
        }

        #[tokio::test]
        async fn puts_public_read_objects() {
            let server = MockServer::start().await;
            Mock::given(method("PUT"))
                .and(path("/bucket/events.json"))
                .and(header("x-amz-acl", "public-read"))
                .and(header("content-type", "application/json"))
                .and(header("authorization", "Bearer s3cret"))
                .and(body_string("{\"map_data\":[]}"))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server)
                .await;

            sink(&format!("{}/bucket", server.uri()), Some("s3cret"))
                .put_object("events.json", b"{\"map_data\":[]}".to_vec(), "application/json")
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn rejected_upload_is_an_error() {
            let server = MockServer::start().await;
            Mock::given(method("PUT"))
                .respond_with(ResponseTemplate::new(403))
                .mount(&server)
                .await;

            let err = sink(&server.uri(), None)
                .put_object("map.html", b"<html></html>".to_vec(), "text/html")
                .await
                .unwrap_err();
            assert!(matches!(err, SinkError::Upload { ref key, .. } if key == "map.html"));
        }
    }
}
