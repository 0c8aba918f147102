use crate::config::Config;
use crate::error::{RelayError, Result};
use relay_core::model::ReportRecord;
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, warn};

pub const PROCESSED_REPORTS_PATH: &str = "/api/public/v1/processed_reports";
pub const TOTAL_HEADER: &str = "Total";

/// Client for the paginated processed-reports endpoint.
pub struct ReportsClient {
    client: Client,
    endpoint: String,
    authorization: String,
    per_page: u32,
}

impl ReportsClient {
    pub fn new(config: &Config) -> Result<Self> {
        if config.tls_insecure {
            warn!(
                domain = %config.reports_domain,
                "certificate validation disabled for reports api"
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_seconds))
            .danger_accept_invalid_certs(config.tls_insecure)
            .build()
            .map_err(RelayError::Client)?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", config.reports_domain, PROCESSED_REPORTS_PATH),
            authorization: config.reports_authorization(),
            per_page: config.reports_per_page,
        })
    }

    /// Number of reports updated since `start_date`, read from the `Total`
    /// header of an unpaged query.
    pub async fn total_count(&self, start_date: &str) -> Result<u64> {
        let context = "page count request";
        let per_page = self.per_page.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, &self.authorization)
            .query(&[("per_page", per_page.as_str()), ("start_date", start_date)])
            .send()
            .await
            .map_err(|error| RelayError::transport(context, error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::status(context, status));
        }

        let total = parse_total_header(response.headers())?;
        debug!(total, start_date, "reports api total count");
        Ok(total)
    }

    pub async fn fetch_page(&self, page: u64, start_date: &str) -> Result<Vec<ReportRecord>> {
        let context = format!("page {page} request");
        let page_param = page.to_string();
        let per_page = self.per_page.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, &self.authorization)
            .query(&[
                ("page", page_param.as_str()),
                ("per_page", per_page.as_str()),
                ("start_date", start_date),
            ])
            .send()
            .await
            .map_err(|error| RelayError::transport(context.as_str(), error))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::status(context, status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|error| RelayError::transport(context.as_str(), error))?;

        decode_page(page, &body)
    }
}

pub fn parse_total_header(headers: &HeaderMap) -> Result<u64> {
    let value = headers
        .get(TOTAL_HEADER)
        .ok_or_else(|| RelayError::Pagination(format!("missing {TOTAL_HEADER} header")))?;

    parse_total_value(value)
}

fn parse_total_value(value: &HeaderValue) -> Result<u64> {
    let text = value
        .to_str()
        .map_err(|_| RelayError::Pagination(format!("{TOTAL_HEADER} header is not ascii")))?;

    text.trim().parse::<u64>().map_err(|_| {
        RelayError::Pagination(format!("{TOTAL_HEADER} header is not an integer: {text:?}"))
    })
}

/// Splits a page body into its records without re-encoding them.
pub fn decode_page(page: u64, body: &[u8]) -> Result<Vec<ReportRecord>> {
    serde_json::from_slice::<Vec<ReportRecord>>(body).map_err(|error| RelayError::Decode {
        page,
        message: error.to_string(),
    })
}
