//! Event-type dictionary loaded from the events base.

use eventmap_core::{DictionaryEntry, EventTypeDictionary, SourceKind};
use serde::Deserialize;
use tracing::{info, warn};

use super::client::AirtableClient;
use crate::error::ProviderResult;

/// Dictionary table.
pub const DICTIONARY_TABLE: &str = "Event Type Dictionary";

#[derive(Debug, Default, Deserialize)]
struct DictionaryFields {
    #[serde(rename = "Source")]
    source: Option<String>,
    source_event_type: Option<String>,
    map_event_type: Option<String>,
    #[serde(default)]
    exclude_from_map: bool,
    #[serde(default)]
    exclude_from_carousel: bool,
}

/// Loads the operator-maintained event-type dictionary.
pub async fn load_dictionary(client: &AirtableClient, app: &str) -> ProviderResult<EventTypeDictionary> {
    let rows = client.list::<DictionaryFields>(app, DICTIONARY_TABLE).await?;
    let total = rows.len();

    let entries = rows.into_iter().map(|row| {
        let fields = row.fields;
        let source = fields.source.as_deref().and_then(SourceKind::from_label);
        if source.is_none() {
            warn!(record = %row.id, label = ?fields.source, "Unrecognized dictionary source");
        }
        DictionaryEntry {
            source,
            source_event_type: fields.source_event_type.unwrap_or_default(),
            map_event_type: fields
                .map_event_type
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            exclude_from_map: fields.exclude_from_map,
            exclude_from_carousel: fields.exclude_from_carousel,
        }
    });

    let dictionary = EventTypeDictionary::new(entries);
    info!(rows = total, keys = dictionary.len(), "Loaded event-type dictionary");
    Ok(dictionary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn loads_entries_with_lenient_sources() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v0/appEvents/Event%20Type%20Dictionary"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "records": [
                    {"id": "rec1", "fields": {
                        "Source": "Mobilize America", "source_event_type": "PHONE_BANK",
                        "map_event_type": "Phonebank", "exclude_from_carousel": true
                    }},
                    {"id": "rec2", "fields": {
                        "Source": "EveryAction", "source_event_type": "Staff Meeting",
                        "exclude_from_map": true
                    }},
                    {"id": "rec3", "fields": {
                        "Source": "Carrier Pigeon", "source_event_type": "Coo"
                    }}
                ]
            })))
            .mount(&server)
            .await;

        let client = AirtableClient::new("pat", 5, Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri());
        let dictionary = load_dictionary(&client, "appEvents").await.unwrap();

        let phonebank = dictionary.lookup(SourceKind::Mobilize, "phone bank").unwrap();
        assert_eq!(phonebank.map_event_type.as_deref(), Some("Phonebank"));
        assert!(phonebank.exclude_from_carousel);
        assert!(
            dictionary
                .lookup(SourceKind::EveryAction, "staff_meeting")
                .unwrap()
                .exclude_from_map
        );
        assert!(dictionary.lookup(SourceKind::Airtable, "Coo").is_none());
    }

    #[tokio::test]
    async fn failure_propagates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let client = AirtableClient::new("pat", 5, Duration::from_secs(5))
            .unwrap()
            .with_base_url(server.uri());
        assert!(load_dictionary(&client, "appEvents").await.is_err());
    }
}
