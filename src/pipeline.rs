use crate::config::{Config, RecordErrorPolicy};
use crate::envelope::build_event;
use crate::error::{RelayError, Result};
use crate::forwarder::HecForwarder;
use crate::reports::ReportsClient;
use chrono::{DateTime, Duration, Utc};
use relay_core::model::HEC_DEFAULT_TRUNCATE_BYTES;
use relay_core::pagination::page_count;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

const START_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub start_date: String,
    pub total_reported: u64,
    pub pages_planned: u64,
    pub pages_fetched: u64,
    pub records_seen: u64,
    pub delivered: u64,
    pub skipped: u64,
    pub delivery_failed: u64,
    /// Set when a page body failed to decode and the remaining pages were not fetched.
    pub stopped_early: bool,
}

/// Start of the lookback window as sent in the `start_date` query parameter.
pub fn resolve_start_date(config: &Config, now: DateTime<Utc>) -> String {
    if let Some(start_date) = &config.start_date {
        return start_date.clone();
    }

    let lookback = Duration::try_minutes(i64::try_from(config.lookback_minutes).unwrap_or(i64::MAX))
        .unwrap_or(Duration::MAX);
    now.checked_sub_signed(lookback)
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
        .format(START_DATE_FORMAT)
        .to_string()
}

pub async fn run(config: &Config) -> Result<RunSummary> {
    let run_id = Uuid::new_v4();
    let span = info_span!("relay_run", %run_id);
    run_inner(config).instrument(span).await
}

async fn run_inner(config: &Config) -> Result<RunSummary> {
    let reports = ReportsClient::new(config)?;
    let forwarder = HecForwarder::new(config)?;

    let start_date = resolve_start_date(config, Utc::now());
    let total = reports.total_count(&start_date).await?;
    let pages = page_count(total, config.reports_per_page);

    let mut summary = RunSummary {
        start_date,
        total_reported: total,
        pages_planned: pages,
        ..RunSummary::default()
    };
    info!(
        start_date = %summary.start_date,
        total,
        pages,
        "starting processed report transfer"
    );

    for page in 1..=pages {
        let records = match reports.fetch_page(page, &summary.start_date).await {
            Ok(records) => records,
            Err(error @ RelayError::Decode { .. }) => {
                warn!(page, error = %error, "page body not decodable; ending run");
                summary.stopped_early = true;
                break;
            }
            Err(error) => return Err(error),
        };
        summary.pages_fetched += 1;
        debug!(page, records = records.len(), "fetched page");

        for (index, record) in records.iter().enumerate() {
            summary.records_seen += 1;

            let event = match build_event(record, config) {
                Ok(event) => event,
                Err(source) => {
                    let error = RelayError::Field {
                        page,
                        index,
                        source,
                    };
                    match config.record_error_policy {
                        RecordErrorPolicy::Skip => {
                            warn!(page, index, error = %error, "skipping record");
                            summary.skipped += 1;
                            continue;
                        }
                        RecordErrorPolicy::Abort => return Err(error),
                    }
                }
            };

            if event.event.len() > HEC_DEFAULT_TRUNCATE_BYTES {
                warn!(
                    page,
                    index,
                    bytes = event.event.len(),
                    limit = HEC_DEFAULT_TRUNCATE_BYTES,
                    "event exceeds default hec truncate limit"
                );
            }

            match forwarder.deliver(&event).await {
                Ok(()) => summary.delivered += 1,
                Err(error @ RelayError::Delivery(_)) => {
                    error!(page, index, kind = error.kind(), error = %error, "event not delivered");
                    summary.delivery_failed += 1;
                }
                Err(error) => {
                    error!(page, index, kind = error.kind(), error = %error, "hec unreachable; ending run");
                    return Err(error);
                }
            }
        }
    }

    info!(
        pages_fetched = summary.pages_fetched,
        records = summary.records_seen,
        delivered = summary.delivered,
        skipped = summary.skipped,
        delivery_failed = summary.delivery_failed,
        stopped_early = summary.stopped_early,
        "processed report transfer finished"
    );

    Ok(summary)
}
