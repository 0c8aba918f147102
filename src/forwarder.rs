use crate::config::Config;
use crate::error::{RelayError, Result};
use relay_core::model::HecEvent;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::warn;

const ERROR_BODY_MAX_BYTES: usize = 256;

/// Posts one event per request to an HTTP Event Collector.
pub struct HecForwarder {
    client: Client,
    url: String,
    authorization: String,
}

impl HecForwarder {
    pub fn new(config: &Config) -> Result<Self> {
        if config.tls_insecure {
            warn!(url = %config.hec_url, "certificate validation disabled for hec endpoint");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .danger_accept_invalid_certs(config.tls_insecure)
            .build()
            .map_err(RelayError::Client)?;

        Ok(Self {
            client,
            url: config.hec_url.clone(),
            authorization: config.hec_authorization(),
        })
    }

    /// Sends `event` once. Only HTTP 200 counts as delivered; nothing is retried.
    /// A response with another status is `Delivery`, no response at all is `Transport`.
    pub async fn deliver(&self, event: &HecEvent) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, &self.authorization)
            .json(event)
            .send()
            .await
            .map_err(|error| RelayError::transport("hec delivery", error))?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(RelayError::Delivery(format!(
            "hec returned {status}: {}",
            truncate_utf8(body.trim(), ERROR_BODY_MAX_BYTES)
        )))
    }
}

fn truncate_utf8(text: &str, limit_bytes: usize) -> String {
    if text.len() <= limit_bytes {
        return text.to_string();
    }

    let mut output = String::new();
    for character in text.chars() {
        if output.len() + character.len_utf8() > limit_bytes.saturating_sub(3) {
            break;
        }
        output.push(character);
    }
    output.push_str("...");
    output
}
