use chrono::NaiveDateTime;
use serde_json::value::RawValue;
use std::collections::HashMap;
use thiserror::Error;

/// `%Y-%m-%dT%H:%M:%S.%fZ` in chrono notation; `%.f` consumes the dot.
const RECORD_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
const MAX_FRACTION_DIGITS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("field `{0}` is missing")]
    Missing(String),
    #[error("field `{0}` is not a string")]
    NotAString(String),
    #[error("`{0}` does not match %Y-%m-%dT%H:%M:%S.%fZ")]
    Malformed(String),
}

/// Reads `field` from a raw record and converts it to Unix epoch seconds.
/// Sibling fields stay unparsed, so oversized numbers elsewhere in the record
/// cannot fail the lookup.
pub fn record_epoch_seconds(record: &RawValue, field: &str) -> Result<f64, TimestampError> {
    let fields: HashMap<String, &RawValue> = serde_json::from_str(record.get())
        .map_err(|_| TimestampError::Missing(field.to_string()))?;
    let value = fields
        .get(field)
        .ok_or_else(|| TimestampError::Missing(field.to_string()))?;
    let text: String = serde_json::from_str(value.get())
        .map_err(|_| TimestampError::NotAString(field.to_string()))?;

    parse_epoch_seconds(&text)
}

/// Parses a UTC timestamp such as `2019-06-07T10:15:30.123456Z` into epoch
/// seconds, keeping the fractional part.
pub fn parse_epoch_seconds(raw: &str) -> Result<f64, TimestampError> {
    if !has_fractional_seconds(raw) {
        return Err(TimestampError::Malformed(raw.to_string()));
    }

    let parsed = NaiveDateTime::parse_from_str(raw, RECORD_TIMESTAMP_FORMAT)
        .map_err(|_| TimestampError::Malformed(raw.to_string()))?
        .and_utc();

    Ok(parsed.timestamp() as f64 + f64::from(parsed.timestamp_subsec_nanos()) / 1e9)
}

fn has_fractional_seconds(raw: &str) -> bool {
    let Some(body) = raw.strip_suffix('Z') else {
        return false;
    };
    let Some((_, fraction)) = body.rsplit_once('.') else {
        return false;
    };

    (1..=MAX_FRACTION_DIGITS).contains(&fraction.len())
        && fraction.bytes().all(|byte| byte.is_ascii_digit())
}
