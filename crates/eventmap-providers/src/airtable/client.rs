//! Airtable REST client.

use std::time::Duration;

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::http;
use crate::paginate::{Page, decode_records, paginate};

/// Public API base URL.
pub const AIRTABLE_API_BASE: &str = "https://api.airtable.com";

/// A table row: record id plus typed fields.
#[derive(Debug, Clone, Deserialize)]
pub struct Record<F> {
    pub id: String,
    pub fields: F,
}

#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    records: Vec<serde_json::Value>,
    offset: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpdateBody<'a, T: Serialize> {
    fields: &'a T,
}

/// Thin client over the Airtable records API.
#[derive(Debug, Clone)]
pub struct AirtableClient {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_pages: usize,
}

impl AirtableClient {
    /// Creates a client against the public API.
    pub fn new(api_key: impl Into<String>, max_pages: usize, timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            http_client: http::build_client(timeout)?,
            api_key: api_key.into(),
            base_url: AIRTABLE_API_BASE.to_string(),
            max_pages,
        })
    }

    /// Points the client at another base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn table_url(&self, app: &str, table: &str) -> String {
        format!(
            "{}/v0/{}/{}",
            self.base_url,
            urlencoding::encode(app),
            urlencoding::encode(table)
        )
    }

    /// Lists every row of `table`, skipping rows whose fields do not parse.
    pub async fn list<F: DeserializeOwned>(&self, app: &str, table: &str) -> ProviderResult<Vec<Record<F>>> {
        let url = self.table_url(app, table);
        let label = format!("airtable:{}", table);

        let records = paginate(&label, self.max_pages, |offset| {
            let mut request = self.http_client.get(&url).bearer_auth(&self.api_key);
            if let Some(offset) = offset {
                request = request.query(&[("offset", offset)]);
            }
            let label = label.clone();
            async move {
                let page: ListPage = http::send_json(request)
                    .await
                    .map_err(|e| e.with_provider(&label))?;
                Ok(Page::new(decode_records(&label, page.records), page.offset))
            }
        })
        .await?;

        debug!(table, count = records.len(), "Listed Airtable rows");
        Ok(records)
    }

    /// Overwrites the given fields of one row.
    pub async fn update<T: Serialize + Sync>(
        &self,
        app: &str,
        table: &str,
        record_id: &str,
        fields: &T,
    ) -> ProviderResult<()> {
        let url = format!("{}/{}", self.table_url(app, table), urlencoding::encode(record_id));
        let body = serde_json::to_vec(&UpdateBody { fields }).map_err(|e| {
            ProviderError::internal(format!("failed to encode update: {}", e)).with_source(e)
        })?;
        let request = self
            .http_client
            .patch(&url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .body(body);
        http::send(request)
            .await
            .map_err(|e| e.with_provider(format!("airtable:{}", table)))?;
        Ok(())
    }
}

/// Accepts a string or a number, yielding a string.
///
/// Postal codes are sometimes typed as numbers in Airtable.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) => Ok(Some(s)),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!("expected string, got {}", other))),
    }
}

/// Accepts a number or a numeric string.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(n.as_f64()),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("expected number, got {:?}", s))),
        Some(other) => Err(de::Error::custom(format!("expected number, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Row {
        #[serde(rename = "Name")]
        name: String,
        #[serde(default, deserialize_with = "lenient_string")]
        zip: Option<String>,
        #[serde(default, deserialize_with = "lenient_f64")]
        lat: Option<f64>,
    }

    fn client(server: &MockServer, max_pages: usize) -> AirtableClient {
        AirtableClient::new("pat", max_pages, Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri())
    }

    #[tokio::test]
    async fn lists_with_offset_paging() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/app1/Hub%20Leaders"))
            .and(query_param("offset", "itr2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "records": [{"id": "rec3", "fields": {"Name": "C", "zip": 2139, "lat": "42.1"}}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v0/app1/Hub%20Leaders"))
            .and(header("authorization", "Bearer pat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "records": [
                    {"id": "rec1", "fields": {"Name": "A"}},
                    {"id": "rec2", "fields": {}}
                ],
                "offset": "itr2"
            })))
            .mount(&server)
            .await;

        let rows: Vec<Record<Row>> = client(&server, 10).list("app1", "Hub Leaders").await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rec1", "rec3"]);
        assert_eq!(rows[1].fields.name, "C");
        assert_eq!(rows[1].fields.zip.as_deref(), Some("2139"));
        assert_eq!(rows[1].fields.lat, Some(42.1));
    }

    #[tokio::test]
    async fn endless_offsets_stop_at_ceiling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "records": [{"id": "rec1", "fields": {"Name": "A"}}],
                "offset": "forever"
            })))
            .expect(3)
            .mount(&server)
            .await;

        let rows: Vec<Record<Row>> = client(&server, 3).list("app1", "Events").await.unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn update_patches_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/v0/app1/Events/rec9"))
            .and(body_json(serde_json::json!({"fields": {"latitude": 1.5, "longitude": 2.5}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "rec9"})))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, 1)
            .update(
                "app1",
                "Events",
                "rec9",
                &serde_json::json!({"latitude": 1.5, "longitude": 2.5}),
            )
            .await
            .unwrap();
    }
}
