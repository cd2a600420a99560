//! Client configuration and the persisted settings file.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RossumError};

/// Default Elis API endpoint.
pub const DEFAULT_API_URL: &str = "https://all.rir.rossum.ai";

/// Locale sent when the caller does not provide one.
pub const DEFAULT_LOCALE: &str = "en_GB";

/// Default upload limit (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Quality filter applied by the service to extracted fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filter {
    /// Only the high quality subset of fields.
    #[default]
    Best,
    /// Every extracted field, including low-score candidates.
    All,
}

impl Filter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Filter::Best => "best",
            Filter::All => "all",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Filter {
    type Err = RossumError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "best" => Ok(Filter::Best),
            "all" => Ok(Filter::All),
            other => Err(RossumError::Validation(format!(
                "filter can be one of {{best, all}}, not {}",
                other
            ))),
        }
    }
}

/// Connection and extraction options for one client instance.
#[derive(Clone)]
pub struct ClientConfig {
    /// Secret API key.
    pub api_key: String,

    /// Base URL without trailing slash.
    pub base_url: String,

    /// Locale hint (e.g. `en_US`), defaults to `en_GB` when unset.
    pub locale: Option<String>,

    /// Ask the service to extract table content.
    pub tables: bool,

    /// Field quality filter.
    pub filter: Filter,
}

impl ClientConfig {
    /// Create a configuration for the default endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RossumError::Config(
                "API key must not be empty".to_string(),
            ));
        }

        Ok(Self {
            api_key,
            base_url: DEFAULT_API_URL.to_string(),
            locale: None,
            tables: true,
            filter: Filter::Best,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_tables(mut self, tables: bool) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Locale to send, falling back to the default.
    pub fn effective_locale(&self) -> &str {
        self.locale.as_deref().unwrap_or(DEFAULT_LOCALE)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("locale", &self.locale)
            .field("tables", &self.tables)
            .field("filter", &self.filter)
            .finish()
    }
}

/// Wait policy between status checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollPolicy {
    /// Wait after the first status check, in milliseconds.
    pub interval_ms: u64,

    /// Upper bound for a single wait, in milliseconds.
    pub max_interval_ms: u64,

    /// Multiplier applied to the wait after each check (1.0 = fixed interval).
    pub backoff_factor: f64,

    /// Maximum number of status checks.
    pub max_attempts: u32,

    /// Maximum total polling time, in seconds.
    pub max_duration_secs: u64,

    /// Consecutive network failures tolerated on status checks.
    pub max_network_retries: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval_ms: 5_000,
            max_interval_ms: 30_000,
            backoff_factor: 1.0,
            max_attempts: 120,
            max_duration_secs: 600,
            max_network_retries: 3,
        }
    }
}

impl PollPolicy {
    /// Fixed-interval policy.
    pub fn fixed(interval: Duration, max_attempts: u32, max_duration: Duration) -> Self {
        Self {
            interval_ms: duration_ms(interval),
            max_interval_ms: duration_ms(interval),
            backoff_factor: 1.0,
            max_attempts,
            max_duration_secs: max_duration.as_secs().max(1),
            max_network_retries: Self::default().max_network_retries,
        }
    }

    pub fn with_backoff(mut self, factor: f64, max_interval: Duration) -> Self {
        self.backoff_factor = factor;
        self.max_interval_ms = duration_ms(max_interval);
        self
    }

    pub fn with_network_retries(mut self, retries: u32) -> Self {
        self.max_network_retries = retries;
        self
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    /// Wait after the given status check (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(64) as i32;
        let factor = if self.backoff_factor.is_finite() && self.backoff_factor >= 1.0 {
            self.backoff_factor
        } else {
            1.0
        };
        let ceiling = self.max_interval_ms.max(self.interval_ms) as f64;
        let millis = (self.interval_ms as f64 * factor.powi(exponent)).min(ceiling);
        Duration::from_millis(millis as u64)
    }

    /// Reject policies that could never complete a check.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(RossumError::Config(
                "polling.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_duration_secs == 0 {
            return Err(RossumError::Config(
                "polling.max_duration_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Persisted settings for the command-line client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RossumSettings {
    /// Endpoint and credentials.
    pub api: ApiSettings,

    /// Extraction defaults.
    pub extraction: ExtractionSettings,

    /// Polling policy.
    pub polling: PollPolicy,

    /// Upload limits.
    pub upload: UploadSettings,
}

/// Endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Base URL of the Elis API.
    pub base_url: String,

    /// API key. The environment variable takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_key: None,
        }
    }
}

/// Extraction defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub locale: String,
    pub filter: Filter,
    pub tables: bool,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            locale: DEFAULT_LOCALE.to_string(),
            filter: Filter::Best,
            tables: true,
        }
    }
}

/// Upload limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Largest document accepted for upload, in bytes.
    pub max_bytes: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl RossumSettings {
    /// Load settings from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content).map_err(|e| {
            RossumError::Config(format!("invalid settings file {}: {}", path.display(), e))
        })?;
        settings.polling.validate()?;
        Ok(settings)
    }

    /// Save settings to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Build a client configuration using these settings for everything but the key.
    pub fn client_config(&self, api_key: impl Into<String>) -> Result<ClientConfig> {
        Ok(ClientConfig::new(api_key)?
            .with_base_url(self.api.base_url.as_str())
            .with_locale(self.extraction.locale.as_str())
            .with_tables(self.extraction.tables)
            .with_filter(self.extraction.filter))
    }
}
