//! Postal-code centroid table.
//!
//! Used to place events whose precise address is hidden by the source. The
//! table is a JSON object keyed by postal code whose values are either a
//! `[latitude, longitude]` pair or a `{"latitude": .., "longitude": ..}`
//! object.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::event::Coordinates;

/// Errors from loading a postal-code table.
#[derive(Debug, Error)]
pub enum PostalError {
    /// The table file could not be read.
    #[error("failed to read postal-code table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The table is not valid JSON of the expected shape.
    #[error("invalid postal-code table: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCentroid {
    Pair([f64; 2]),
    Object { latitude: f64, longitude: f64 },
}

impl From<RawCentroid> for Coordinates {
    fn from(raw: RawCentroid) -> Self {
        match raw {
            RawCentroid::Pair([latitude, longitude]) => Coordinates::new(latitude, longitude),
            RawCentroid::Object {
                latitude,
                longitude,
            } => Coordinates::new(latitude, longitude),
        }
    }
}

/// Postal code to centroid lookup.
#[derive(Debug, Clone, Default)]
pub struct PostalCodeTable {
    centroids: HashMap<String, Coordinates>,
}

impl PostalCodeTable {
    /// Parses a table from JSON text.
    pub fn from_json(json: &str) -> Result<Self, PostalError> {
        let raw: HashMap<String, RawCentroid> = serde_json::from_str(json)?;
        let centroids = raw
            .into_iter()
            .map(|(code, centroid)| (normalize_postal_code(&code), centroid.into()))
            .collect();
        Ok(Self { centroids })
    }

    /// Reads and parses a table file.
    pub fn load(path: &Path) -> Result<Self, PostalError> {
        let json = std::fs::read_to_string(path).map_err(|source| PostalError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_json(&json)?;
        debug!(path = %path.display(), entries = table.len(), "Loaded postal-code table");
        Ok(table)
    }

    /// Number of postal codes in the table.
    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    /// Returns the centroid for a postal code. ZIP+4 suffixes are ignored.
    pub fn lookup(&self, code: &str) -> Option<Coordinates> {
        self.centroids.get(&normalize_postal_code(code)).copied()
    }
}

fn normalize_postal_code(code: &str) -> String {
    let code = code.trim();
    code.split_once('-').map_or(code, |(base, _)| base).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_both_shapes() {
        let table = PostalCodeTable::from_json(
            r#"{"02139": [42.36, -71.10], "10001": {"latitude": 40.75, "longitude": -73.99}}"#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.lookup("02139"), Some(Coordinates::new(42.36, -71.10)));
        assert_eq!(table.lookup("10001"), Some(Coordinates::new(40.75, -73.99)));
    }

    #[test]
    fn zip_plus_four_and_whitespace() {
        let table = PostalCodeTable::from_json(r#"{"02139": [42.36, -71.10]}"#).unwrap();
        assert!(table.lookup(" 02139-4307 ").is_some());
        assert!(table.lookup("99999").is_none());
    }

    #[test]
    fn rejects_bad_shape() {
        let err = PostalCodeTable::from_json(r#"{"02139": "nowhere"}"#).unwrap_err();
        assert!(matches!(err, PostalError::Parse(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"94110": [37.75, -122.41]}}"#).unwrap();
        let table = PostalCodeTable::load(file.path()).unwrap();
        assert_eq!(table.lookup("94110"), Some(Coordinates::new(37.75, -122.41)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = PostalCodeTable::load(Path::new("/nonexistent/zip_codes.json")).unwrap_err();
        assert!(matches!(err, PostalError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/zip_codes.json"));
    }
}
