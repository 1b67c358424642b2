//! Forward geocoding of free-text addresses.

use std::time::Duration;

use eventmap_core::Coordinates;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ProviderError, ProviderResult};
use crate::http;
use crate::source::BoxFuture;

/// Default Mapbox API base URL.
pub const MAPBOX_API_BASE: &str = "https://api.mapbox.com";

/// Resolves an address query to coordinates.
pub trait Geocoder: Send + Sync {
    /// Returns the best match for `query`, or `None` if nothing matched.
    fn geocode<'a>(&'a self, query: &'a str) -> BoxFuture<'a, ProviderResult<Option<Coordinates>>>;
}

/// Tries `full` first, then `partial`.
///
/// Errors on either query are logged and treated as "no match".
pub async fn geocode_with_fallback(
    geocoder: &dyn Geocoder,
    full: &str,
    partial: &str,
) -> Option<Coordinates> {
    for query in [full, partial] {
        match geocoder.geocode(query).await {
            Ok(Some(coordinates)) => {
                debug!(query, "Geocoded address");
                return Some(coordinates);
            }
            Ok(None) => debug!(query, "No geocoding match"),
            Err(e) => warn!(query, error = %e, "Geocoding failed"),
        }
    }
    None
}

/// Mapbox places geocoder.
#[derive(Debug)]
pub struct MapboxGeocoder {
    http_client: reqwest::Client,
    access_token: String,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    /// `[longitude, latitude]`
    center: Option<[f64; 2]>,
}

impl MapboxGeocoder {
    /// Creates a geocoder against the public Mapbox API.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> ProviderResult<Self> {
        Self::with_base_url(access_token, MAPBOX_API_BASE, timeout)
    }

    /// Creates a geocoder against a custom base URL.
    pub fn with_base_url(
        access_token: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ProviderError::configuration(format!("invalid geocoder URL {}: {}", base_url, e))
                .with_provider("mapbox")
        })?;
        Ok(Self {
            http_client: http::build_client(timeout)?,
            access_token: access_token.into(),
            base_url,
        })
    }

    fn query_url(&self, query: &str) -> ProviderResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::configuration("geocoder URL cannot be a base"))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places"])
            .push(&format!("{}.json", query));
        url.query_pairs_mut()
            .append_pair("access_token", &self.access_token);
        Ok(url)
    }
}

impl Geocoder for MapboxGeocoder {
    fn geocode<'a>(&'a self, query: &'a str) -> BoxFuture<'a, ProviderResult<Option<Coordinates>>> {
        Box::pin(async move {
            let url = self.query_url(query)?;
            let collection: FeatureCollection = http::send_json(self.http_client.get(url))
                .await
                .map_err(|e| e.with_provider("mapbox"))?;

            Ok(collection
                .features
                .into_iter()
                .next()
                .and_then(|feature| feature.center)
                .map(|[longitude, latitude]| Coordinates::new(latitude, longitude)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn geocoder(server: &MockServer) -> MapboxGeocoder {
        MapboxGeocoder::with_base_url("tok", &server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn parses_center_as_lng_lat() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geocoding/v5/mapbox.places/02139%20Cambridge,%20MA.json"))
            .and(query_param("access_token", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "features": [{"center": [-71.10, 42.36]}]
            })))
            .mount(&server)
            .await;

        let found = geocoder(&server).geocode("02139 Cambridge, MA").await.unwrap();
        assert_eq!(found, Some(Coordinates::new(42.36, -71.10)));
    }

    #[tokio::test]
    async fn empty_features_is_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"features": []})),
            )
            .mount(&server)
            .await;

        assert_eq!(geocoder(&server).geocode("nowhere").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unauthorized_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = geocoder(&server).geocode("anything").await.unwrap_err();
        assert_eq!(err.code(), crate::error::ProviderErrorCode::AuthenticationFailed);
        assert_eq!(err.provider(), Some("mapbox"));
    }

    #[tokio::test]
    async fn fallback_tries_partial_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/geocoding/v5/mapbox.places/1%20Main%20St%2002139%20Cambridge,%20MA.json"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"features": []})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/geocoding/v5/mapbox.places/02139%20Cambridge,%20MA.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "features": [{"center": [-71.10, 42.36]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let geocoder = geocoder(&server);
        let found = geocode_with_fallback(
            &geocoder,
            "1 Main St 02139 Cambridge, MA",
            "02139 Cambridge, MA",
        )
        .await;
        assert_eq!(found, Some(Coordinates::new(42.36, -71.10)));
    }
}
