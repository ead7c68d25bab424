//! Mailgun API client.

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use url::Url;

use crate::error::MailError;
use crate::payload::{FilePart, Payload, PayloadValue};

/// Mailgun's default (US region) API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.mailgun.net";

/// Client for the Mailgun message-send endpoint.
///
/// Holds one long-lived HTTP client; connection pooling is reqwest's
/// responsibility. Stateless between calls, so a single instance is shared
/// across every transport that sends through the same account.
#[derive(Debug, Clone)]
pub struct MailgunClient {
    http: reqwest::Client,
    api_key: String,
    endpoint: String,
}

/// Successful send acknowledgement from the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SendResponse {
    /// Provider message id, e.g. `<20240101000000.1234@mg.example.com>`.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub message: String,
}

impl MailgunClient {
    /// Create a client against the given endpoint, used as-is apart from a
    /// trailing slash. Prefer [`MailgunClient::from_config`], which also
    /// normalizes the endpoint.
    pub fn new(api_key: impl Into<String>, endpoint: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from configuration, normalizing the endpoint to
    /// `https://<host>`.
    pub fn from_config(config: &crate::config::MailgunConfig) -> Self {
        Self::new(config.secret.as_str(), &normalize_endpoint(&config.endpoint))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post one message to `/v3/<domain>/messages`.
    ///
    /// Exactly one outbound HTTP call; no retries, no batching.
    pub async fn send_message(
        &self,
        domain: &str,
        payload: &Payload,
    ) -> Result<SendResponse, MailError> {
        let url = format!("{}/v3/{}/messages", self.endpoint, domain);
        let form = build_form(payload)?;

        let response = self
            .http
            .post(&url)
            .basic_auth("api", Some(&self.api_key))
            .multipart(form)
            .send()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::error!(status = %status, %domain, "mailgun rejected the message");
            return Err(MailError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let acknowledged: SendResponse = serde_json::from_str(&body).unwrap_or_default();
        tracing::debug!(id = %acknowledged.id, %domain, "message accepted by mailgun");
        Ok(acknowledged)
    }
}

/// Render the flat field set as a multipart form.
///
/// List values repeat their field name once per entry; inline file parts use
/// the content-id as their filename, which is how Mailgun correlates `cid:`
/// references in the HTML body.
fn build_form(payload: &Payload) -> Result<Form, MailError> {
    let mut form = Form::new();

    for (name, value) in payload.fields() {
        match value {
            PayloadValue::Text(text) => {
                form = form.text(name.clone(), text.clone());
            }
            PayloadValue::List(values) => {
                for entry in values {
                    form = form.text(name.clone(), entry.clone());
                }
            }
        }
    }

    for part in payload.attachments() {
        form = form.part("attachment", file_part(part, &part.filename)?);
    }
    for part in payload.inline() {
        let filename = part.content_id.as_deref().unwrap_or(&part.filename);
        form = form.part("inline", file_part(part, filename)?);
    }

    Ok(form)
}

fn file_part(part: &FilePart, filename: &str) -> Result<Part, MailError> {
    Part::bytes(part.content.clone())
        .file_name(filename.to_string())
        .mime_str(&part.content_type)
        .map_err(|e| MailError::Build(e.to_string()))
}

/// Extract the host from a full URL or bare host string and force the secure
/// scheme.
fn normalize_endpoint(endpoint: &str) -> String {
    let host = Url::parse(endpoint)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned))
        .unwrap_or_else(|| {
            endpoint
                .trim()
                .trim_start_matches("https://")
                .trim_start_matches("http://")
                .trim_end_matches('/')
                .to_string()
        });

    format!("https://{host}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_from_full_url() {
        assert_eq!(
            normalize_endpoint("https://api.eu.mailgun.net"),
            "https://api.eu.mailgun.net"
        );
    }

    #[test]
    fn endpoint_from_url_with_path() {
        assert_eq!(
            normalize_endpoint("https://api.mailgun.net/v3/something"),
            "https://api.mailgun.net"
        );
    }

    #[test]
    fn endpoint_scheme_is_forced_secure() {
        assert_eq!(
            normalize_endpoint("http://api.mailgun.net"),
            "https://api.mailgun.net"
        );
    }

    #[test]
    fn endpoint_from_bare_host() {
        assert_eq!(
            normalize_endpoint("api.mailgun.net"),
            "https://api.mailgun.net"
        );
        assert_eq!(
            normalize_endpoint("api.mailgun.net/"),
            "https://api.mailgun.net"
        );
    }

    #[test]
    fn client_keeps_explicit_endpoint() {
        let client = MailgunClient::new("key-test", "http://127.0.0.1:8080/");
        assert_eq!(client.endpoint(), "http://127.0.0.1:8080");
    }
}
