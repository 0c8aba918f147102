use anyhow::{Context, Result, anyhow};
use relay_core::pagination::DEFAULT_PER_PAGE;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const CONFIG_PATH_VAR: &str = "RELAY_CONFIG";
const DEFAULT_HEC_INDEX: &str = "triage";
const DEFAULT_TIMESTAMP_FIELD: &str = "updated_at";
const DEFAULT_LOOKBACK_MINUTES: u64 = 120;
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// What to do with a record whose timestamp field is missing or malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordErrorPolicy {
    #[default]
    Skip,
    Abort,
}

impl FromStr for RecordErrorPolicy {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(RecordErrorPolicy::Skip),
            "abort" => Ok(RecordErrorPolicy::Abort),
            _ => Err("expected `skip` or `abort`"),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub reports_domain: String,
    pub reports_api_account: String,
    pub reports_api_token: String,
    pub reports_per_page: u32,
    pub hec_url: String,
    pub hec_token: String,
    pub hec_index: Option<String>,
    pub lookback_minutes: u64,
    pub start_date: Option<String>,
    pub timestamp_field: String,
    pub tls_insecure: bool,
    pub http_timeout_seconds: u64,
    pub record_error_policy: RecordErrorPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("reports_domain", &self.reports_domain)
            .field("reports_api_account", &self.reports_api_account)
            .field("reports_api_token", &"<redacted>")
            .field("reports_per_page", &self.reports_per_page)
            .field("hec_url", &self.hec_url)
            .field("hec_token", &"<redacted>")
            .field("hec_index", &self.hec_index)
            .field("lookback_minutes", &self.lookback_minutes)
            .field("start_date", &self.start_date)
            .field("timestamp_field", &self.timestamp_field)
            .field("tls_insecure", &self.tls_insecure)
            .field("http_timeout_seconds", &self.http_timeout_seconds)
            .field("record_error_policy", &self.record_error_policy)
            .finish()
    }
}

impl Config {
    /// Builds the config from the process environment, layered over the TOML
    /// file named by `RELAY_CONFIG` when that variable is set.
    pub fn load() -> Result<Self> {
        let vars = env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
            .collect::<HashMap<_, _>>();
        let config_path = vars
            .get(CONFIG_PATH_VAR)
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty());
        let settings = match config_path {
            Some(path) => Settings::with_file(vars, Path::new(&path))?,
            None => Settings::new(vars, toml::Table::new()),
        };

        Self::from_settings(&settings)
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let config = Self {
            reports_domain: settings
                .required("REPORTS_DOMAIN")?
                .trim()
                .trim_end_matches('/')
                .to_string(),
            reports_api_account: settings.required("REPORTS_API_ACCOUNT")?,
            reports_api_token: settings.required("REPORTS_API_TOKEN")?,
            reports_per_page: settings.u32_or("REPORTS_PER_PAGE", DEFAULT_PER_PAGE)?,
            hec_url: settings.required("HEC_URL")?.trim().to_string(),
            hec_token: settings.required("HEC_TOKEN")?,
            hec_index: hec_index(settings.get("HEC_INDEX")),
            lookback_minutes: settings.u64_or("RELAY_LOOKBACK_MINUTES", DEFAULT_LOOKBACK_MINUTES)?,
            start_date: settings
                .get("RELAY_START_DATE")
                .map(|value| value.trim().to_string()),
            timestamp_field: settings
                .get("RELAY_TIMESTAMP_FIELD")
                .map(|value| value.trim().to_string())
                .unwrap_or_else(|| DEFAULT_TIMESTAMP_FIELD.to_string()),
            tls_insecure: settings.bool_or("RELAY_TLS_INSECURE", false),
            http_timeout_seconds: settings
                .u64_or("RELAY_HTTP_TIMEOUT_SECONDS", DEFAULT_HTTP_TIMEOUT_SECONDS)?,
            record_error_policy: settings
                .get("RELAY_RECORD_ERROR_POLICY")
                .map(|value| {
                    value
                        .parse::<RecordErrorPolicy>()
                        .map_err(|reason| anyhow!("invalid RELAY_RECORD_ERROR_POLICY: {reason}"))
                })
                .transpose()?
                .unwrap_or_default(),
        };

        if config.reports_per_page == 0 {
            return Err(anyhow!("REPORTS_PER_PAGE must be a positive integer"));
        }

        if config.lookback_minutes == 0 {
            return Err(anyhow!("RELAY_LOOKBACK_MINUTES must be a positive integer"));
        }

        if config.http_timeout_seconds == 0 {
            return Err(anyhow!("RELAY_HTTP_TIMEOUT_SECONDS must be greater than 0"));
        }

        if !config.reports_domain.starts_with("http://")
            && !config.reports_domain.starts_with("https://")
        {
            return Err(anyhow!(
                "REPORTS_DOMAIN must include the scheme, e.g. https://triage.example.com"
            ));
        }

        Ok(config)
    }

    pub fn reports_authorization(&self) -> String {
        format!(
            "Token token={}:{}",
            self.reports_api_account, self.reports_api_token
        )
    }

    pub fn hec_authorization(&self) -> String {
        format!("Splunk {}", self.hec_token)
    }
}

fn hec_index(raw: Option<String>) -> Option<String> {
    match raw {
        None => Some(DEFAULT_HEC_INDEX.to_string()),
        Some(value) if value.trim().eq_ignore_ascii_case("none") => None,
        Some(value) => Some(value.trim().to_string()),
    }
}

/// Raw key/value view of the configuration sources. Environment entries win
/// over file entries; file keys are the lowercase form of the variable names.
#[derive(Clone, Default)]
pub struct Settings {
    env: HashMap<String, String>,
    file: toml::Table,
}

impl Settings {
    pub fn new(env: HashMap<String, String>, file: toml::Table) -> Self {
        Self { env, file }
    }

    pub fn with_file(env: HashMap<String, String>, path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let file = raw
            .parse::<toml::Table>()
            .with_context(|| format!("parse config file {}", path.display()))?;
        Ok(Self::new(env, file))
    }

    /// Returns the value for `name`, or `None` when unset or blank everywhere.
    /// A blank env var does not mask a file entry.
    pub fn get(&self, name: &str) -> Option<String> {
        if let Some(value) = self.env.get(name).filter(|value| !value.trim().is_empty()) {
            return Some(value.clone());
        }

        let value = self.file.get(&name.to_ascii_lowercase())?;
        let text = match value {
            toml::Value::String(text) => text.clone(),
            toml::Value::Integer(number) => number.to_string(),
            toml::Value::Boolean(flag) => flag.to_string(),
            other => other.to_string(),
        };
        Some(text).filter(|text| !text.trim().is_empty())
    }

    fn required(&self, name: &str) -> Result<String> {
        self.get(name)
            .with_context(|| format!("missing required setting: {name}"))
    }

    fn u32_or(&self, name: &str, default: u32) -> Result<u32> {
        self.get(name)
            .map(|value| {
                value
                    .trim()
                    .parse::<u32>()
                    .with_context(|| format!("invalid u32 for {name}"))
            })
            .transpose()
            .map(|value| value.unwrap_or(default))
    }

    fn u64_or(&self, name: &str, default: u64) -> Result<u64> {
        self.get(name)
            .map(|value| {
                value
                    .trim()
                    .parse::<u64>()
                    .with_context(|| format!("invalid u64 for {name}"))
            })
            .transpose()
            .map(|value| value.unwrap_or(default))
    }

    fn bool_or(&self, name: &str, default: bool) -> bool {
        match self.get(name) {
            Some(value) => matches!(
                value.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ),
            None => default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env_of(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn minimal_env() -> HashMap<String, String> {
        env_of(&[
            ("REPORTS_DOMAIN", "https://triage.example.com/"),
            ("REPORTS_API_ACCOUNT", "analyst@example.com"),
            ("REPORTS_API_TOKEN", "abc123"),
            ("HEC_URL", "https://splunk.example.com:8088/services/collector"),
            ("HEC_TOKEN", "hec-token"),
        ])
    }

    #[test]
    fn applies_defaults() {
        let settings = Settings::new(minimal_env(), toml::Table::new());
        let config = Config::from_settings(&settings).expect("valid config");

        assert_eq!(config.reports_domain, "https://triage.example.com");
        assert_eq!(config.reports_per_page, 50);
        assert_eq!(config.hec_index.as_deref(), Some("triage"));
        assert_eq!(config.lookback_minutes, 120);
        assert_eq!(config.start_date, None);
        assert_eq!(config.timestamp_field, "updated_at");
        assert!(!config.tls_insecure);
        assert_eq!(config.http_timeout_seconds, 30);
        assert_eq!(config.record_error_policy, RecordErrorPolicy::Skip);
    }

    #[test]
    fn builds_authorization_headers() {
        let settings = Settings::new(minimal_env(), toml::Table::new());
        let config = Config::from_settings(&settings).expect("valid config");

        assert_eq!(
            config.reports_authorization(),
            "Token token=analyst@example.com:abc123"
        );
        assert_eq!(config.hec_authorization(), "Splunk hec-token");
    }

    #[test]
    fn missing_required_setting_is_named() {
        let mut env = minimal_env();
        env.remove("HEC_TOKEN");
        let error = Config::from_settings(&Settings::new(env, toml::Table::new()))
            .expect_err("hec token is required");
        assert!(error.to_string().contains("HEC_TOKEN"), "got: {error}");
    }

    #[test]
    fn rejects_zero_page_size_and_timeout() {
        let mut env = minimal_env();
        env.insert("REPORTS_PER_PAGE".to_string(), "0".to_string());
        assert!(Config::from_settings(&Settings::new(env, toml::Table::new())).is_err());

        let mut env = minimal_env();
        env.insert("RELAY_HTTP_TIMEOUT_SECONDS".to_string(), "0".to_string());
        assert!(Config::from_settings(&Settings::new(env, toml::Table::new())).is_err());
    }

    #[test]
    fn rejects_domain_without_scheme() {
        let mut env = minimal_env();
        env.insert("REPORTS_DOMAIN".to_string(), "triage.example.com".to_string());
        assert!(Config::from_settings(&Settings::new(env, toml::Table::new())).is_err());
    }

    #[test]
    fn parses_overrides() {
        let mut env = minimal_env();
        env.insert("HEC_INDEX".to_string(), "none".to_string());
        env.insert("RELAY_TLS_INSECURE".to_string(), "yes".to_string());
        env.insert("RELAY_RECORD_ERROR_POLICY".to_string(), "Abort".to_string());
        env.insert("RELAY_TIMESTAMP_FIELD".to_string(), "created_at".to_string());
        env.insert("RELAY_START_DATE".to_string(), "2019-06-07T08:00".to_string());

        let config =
            Config::from_settings(&Settings::new(env, toml::Table::new())).expect("valid config");
        assert_eq!(config.hec_index, None);
        assert!(config.tls_insecure);
        assert_eq!(config.record_error_policy, RecordErrorPolicy::Abort);
        assert_eq!(config.timestamp_field, "created_at");
        assert_eq!(config.start_date.as_deref(), Some("2019-06-07T08:00"));
    }

    #[test]
    fn rejects_unknown_record_policy() {
        let mut env = minimal_env();
        env.insert("RELAY_RECORD_ERROR_POLICY".to_string(), "ignore".to_string());
        assert!(Config::from_settings(&Settings::new(env, toml::Table::new())).is_err());
    }

    #[test]
    fn file_values_fill_gaps_and_env_wins() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(
            file,
            r#"
reports_domain = "https://file.example.com"
reports_api_account = "file@example.com"
reports_api_token = "from-file"
hec_url = "https://splunk.example.com:8088/services/collector"
hec_token = "file-token"
reports_per_page = 25
relay_tls_insecure = true
"#
        )
        .expect("write config");

        let env = env_of(&[("HEC_TOKEN", "env-token"), ("REPORTS_DOMAIN", "  ")]);
        let settings = Settings::with_file(env, file.path()).expect("load settings");
        let config = Config::from_settings(&settings).expect("valid config");

        assert_eq!(config.reports_domain, "https://file.example.com");
        assert_eq!(config.hec_token, "env-token");
        assert_eq!(config.reports_per_page, 25);
        assert!(config.tls_insecure);
    }

    #[test]
    fn debug_output_redacts_tokens() {
        let settings = Settings::new(minimal_env(), toml::Table::new());
        let config = Config::from_settings(&settings).expect("valid config");
        let rendered = format!("{config:?}");

        assert!(!rendered.contains("abc123"));
        assert!(!rendered.contains("hec-token"));
        assert!(rendered.contains("<redacted>"));
    }
}
