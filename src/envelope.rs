use crate::config::Config;
use relay_core::model::{HEC_SOURCE, HEC_SOURCETYPE, HecEvent};
use relay_core::timestamps::{TimestampError, record_epoch_seconds};
use serde_json::value::RawValue;

/// Wraps one record for the collector. `event` carries the record's original
/// JSON text untouched.
pub fn build_event(record: &RawValue, config: &Config) -> Result<HecEvent, TimestampError> {
    let time = record_epoch_seconds(record, &config.timestamp_field)?;

    Ok(HecEvent {
        sourcetype: HEC_SOURCETYPE.to_string(),
        source: HEC_SOURCE.to_string(),
        time,
        host: config.reports_domain.clone(),
        index: config.hec_index.clone(),
        event: record.get().to_string(),
    })
}
