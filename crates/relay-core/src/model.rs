use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;

pub const HEC_SOURCETYPE: &str = "_json";
pub const HEC_SOURCE: &str = "api:processed_reports";

/// Default `TRUNCATE` limit of a stock Splunk install. Events longer than this
/// are cut unless props.conf raises it.
pub const HEC_DEFAULT_TRUNCATE_BYTES: usize = 10_000;

/// One processed report, kept as the exact JSON text the reporting API sent.
pub type ReportRecord = Box<RawValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HecEvent {
    pub sourcetype: String,
    pub source: String,
    pub time: f64,
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    pub event: String,
}

impl HecEvent {
    /// Decodes the `event` payload back into JSON.
    pub fn record(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.event)
    }
}
