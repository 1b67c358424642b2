//! Hosted form definitions.
//!
//! The public form page has an undocumented JSON twin that carries the
//! banner image and header markup missing from the API's form listing.

use serde::Deserialize;
use tracing::debug;

use super::record::FormDetails;
use crate::http;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FormDefinition {
    banner_image_path: Option<String>,
    #[serde(default, rename = "form_elements")]
    form_elements: Vec<FormElement>,
}

#[derive(Debug, Deserialize)]
struct FormElement {
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    markup: Option<String>,
}

impl FormDefinition {
    fn header_markup(&self) -> Option<String> {
        self.form_elements
            .iter()
            .find(|el| el.name.as_deref() == Some("HeaderHtml") && el.kind.as_deref() == Some("markup"))
            .and_then(|el| el.markup.clone())
    }
}

/// Fetches a form definition. Any failure yields `None`.
pub(crate) async fn fetch_form_details(
    http_client: &reqwest::Client,
    definition_url: &str,
) -> Option<FormDetails> {
    let request = http_client
        .get(definition_url)
        .header("Content-Type", "application/json");
    match http::send_json::<FormDefinition>(request).await {
        Ok(definition) => Some(FormDetails {
            header_markup: definition.header_markup(),
            banner_image_url: definition.banner_image_path,
        }),
        Err(e) => {
            debug!(url = definition_url, error = %e, "Form definition unavailable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn extracts_banner_and_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/Forms/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "bannerImagePath": "https://cdn.example/banner.png",
                "form_elements": [
                    {"name": "FirstName", "type": "textbox"},
                    {"name": "HeaderHtml", "type": "markup", "markup": "<p>Join us</p>"}
                ]
            })))
            .mount(&server)
            .await;

        let client = http::build_client(Duration::from_secs(5)).unwrap();
        let details = fetch_form_details(&client, &format!("{}/v2/Forms/abc", server.uri()))
            .await
            .unwrap();
        assert_eq!(details.banner_image_url.as_deref(), Some("https://cdn.example/banner.png"));
        assert_eq!(details.header_markup.as_deref(), Some("<p>Join us</p>"));
    }

    #[tokio::test]
    async fn failure_degrades_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let client = http::build_client(Duration::from_secs(5)).unwrap();
        assert!(fetch_form_details(&client, &server.uri()).await.is_none());
    }
}
