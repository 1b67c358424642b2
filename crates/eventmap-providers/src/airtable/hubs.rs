//! Hub directory loaded from the hub-tracking base.

use std::collections::HashMap;

use eventmap_core::{Hub, HubDirectory};
use futures_util::future::try_join;
use serde::Deserialize;
use tracing::info;

use super::client::{AirtableClient, Record, lenient_f64};
use crate::error::ProviderResult;

/// Hubs table.
pub const HUBS_TABLE: &str = "Hubs";

/// Hub leaders table.
pub const LEADERS_TABLE: &str = "Hub Leaders";

#[derive(Debug, Default, Deserialize)]
struct HubFields {
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Email")]
    email: Option<String>,
    #[serde(rename = "Custom Map Email")]
    custom_map_email: Option<String>,
    #[serde(rename = "Hub Leaders", default)]
    leader_ids: Vec<String>,
    #[serde(rename = "Activity")]
    activity: Option<String>,
    #[serde(rename = "Map?", default)]
    on_map: bool,
    #[serde(rename = "Latitude", default, deserialize_with = "lenient_f64")]
    latitude: Option<f64>,
    #[serde(rename = "Longitude", default, deserialize_with = "lenient_f64")]
    longitude: Option<f64>,
    #[serde(rename = "City")]
    city: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LeaderFields {
    #[serde(rename = "Email")]
    email: Option<String>,
    #[serde(rename = "Deleted by Hubhub?", default)]
    deleted: bool,
}

/// Loads every hub with its owner, map and active leader emails.
///
/// Eligibility filtering happens when the directory is built.
pub async fn load_hub_directory(client: &AirtableClient, app: &str) -> ProviderResult<HubDirectory> {
    let (hubs, leaders) = try_join(
        client.list::<HubFields>(app, HUBS_TABLE),
        client.list::<LeaderFields>(app, LEADERS_TABLE),
    )
    .await?;

    let leader_emails: HashMap<String, String> = leaders
        .into_iter()
        .filter(|leader| !leader.fields.deleted)
        .filter_map(|leader| Some((leader.id, leader.fields.email?)))
        .collect();

    let total = hubs.len();
    let directory = HubDirectory::new(hubs.into_iter().map(|row| to_hub(row, &leader_emails)));
    info!(total, eligible = directory.len(), "Loaded hub directory");
    Ok(directory)
}

fn to_hub(row: Record<HubFields>, leader_emails: &HashMap<String, String>) -> Hub {
    let fields = row.fields;
    let emails = [fields.email, fields.custom_map_email]
        .into_iter()
        .flatten()
        .chain(
            fields
                .leader_ids
                .iter()
                .filter_map(|id| leader_emails.get(id).cloned()),
        )
        .collect();

    Hub {
        id: row.id,
        name: fields.name,
        emails,
        city: fields.city,
        latitude: fields.latitude,
        longitude: fields.longitude,
        activity: fields.activity,
        on_map: fields.on_map,
    }
}
