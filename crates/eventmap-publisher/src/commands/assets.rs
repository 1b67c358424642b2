//! `assets`: publish the map page and postal-code table.

use std::path::Path;

use eventmap_core::PostalCodeTable;
use tracing::info;

use crate::cli::AssetsArgs;
use crate::config::{EnvSource, SinkTarget, http_timeout_from_env};
use crate::error::{PublishError, PublishResult};
use crate::sink::{self, BlobSink};

/// Object key of the map page.
pub const MAP_HTML_KEY: &str = "map.html";

/// Object key of the postal-code table.
pub const ZIP_CODES_KEY: &str = "zip_codes.json";

/// Resolves the destination from the environment and uploads both assets.
pub async fn run(env: &impl EnvSource, args: AssetsArgs) -> PublishResult<()> {
    let target = SinkTarget::resolve(args.output_dir, SinkTarget::from_env(env)?)?;
    let sink = sink::open(&target, http_timeout_from_env(env)?)?;
    upload(sink.as_ref(), &args.map_html, &args.zip_codes).await
}

/// Uploads the files byte for byte.
///
/// The postal-code table is parsed first so a broken file never replaces a
/// working one.
pub async fn upload(sink: &dyn BlobSink, map_html: &Path, zip_codes: &Path) -> PublishResult<()> {
    let page = tokio::fs::read(map_html).await?;
    let table = tokio::fs::read(zip_codes).await?;

    let text = std::str::from_utf8(&table).map_err(|e| {
        PublishError::config(format!("{} is not UTF-8: {}", zip_codes.display(), e))
    })?;
    let parsed = PostalCodeTable::from_json(text)
        .map_err(|e| PublishError::config(format!("{}: {}", zip_codes.display(), e)))?;

    sink.put_object(MAP_HTML_KEY, page, "text/html; charset=utf-8").await?;
    sink.put_object(ZIP_CODES_KEY, table, "application/json").await?;
    info!(
        destination = %sink.describe(),
        postal_codes = parsed.len(),
        "Published map assets"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::DirectorySink;

    #[tokio::test]
    async fn copies_both_files() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let page = src.path().join("event_map.html");
        let zips = src.path().join("zips.json");
        std::fs::write(&page, "<html><body>map</body></html>").unwrap();
        std::fs::write(&zips, r#"{"02139": [42.36, -71.1], "02116": {"latitude": 42.35, "longitude": -71.08}}"#).unwrap();

        upload(&DirectorySink::new(out.path()), &page, &zips).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(out.path().join("map.html")).unwrap(),
            "<html><body>map</body></html>"
        );
        assert_eq!(
            std::fs::read(out.path().join("zip_codes.json")).unwrap(),
            std::fs::read(&zips).unwrap()
        );
    }

    #[tokio::test]
    async fn broken_zip_table_publishes_nothing() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let page = src.path().join("map.html");
        let zips = src.path().join("zips.json");
        std::fs::write(&page, "<html></html>").unwrap();
        std::fs::write(&zips, "not json").unwrap();

        let err = upload(&DirectorySink::new(out.path()), &page, &zips)
            .await
            .unwrap_err();
        assert!(matches!(err, PublishError::Config(_)));
        assert!(!out.path().join("map.html").exists());
    }

    #[tokio::test]
    async fn missing_file_is_an_io_error() {
        let out = tempfile::tempdir().unwrap();
        let err = upload(
            &DirectorySink::new(out.path()),
            Path::new("/nonexistent/map.html"),
            Path::new("/nonexistent/zips.json"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, PublishError::Io(_)));
    }
}
