//! Subcommands and the settings/credential plumbing they share.

pub mod batch;
pub mod config;
pub mod extract;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rossum_core::{CancellationToken, ClientConfig, Filter, RossumClient, RossumError, RossumSettings};

/// Environment variable holding the API key.
pub const ENV_API_KEY: &str = "ROSSUM_API_KEY";

/// Environment variable overriding the API base URL.
pub const ENV_API_URL: &str = "ROSSUM_API_URL";

const MISSING_API_KEY: &str = "Please provide API key via `ROSSUM_API_KEY` environment variable, \
the --api-key option or the `api.api_key` setting.\n\
You can sign-up for free at https://rossum.ai/developers/#sign-in";

/// Connection options shared by commands that talk to the service.
#[derive(Args, Debug, Clone, Default)]
pub struct ApiArgs {
    /// API key (defaults to $ROSSUM_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// API base URL (defaults to $ROSSUM_API_URL)
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,
}

/// Field quality filter.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FilterArg {
    /// Only high quality fields (recommended)
    Best,
    /// Every extracted field, including low-score candidates
    All,
}

impl From<FilterArg> for Filter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::Best => Filter::Best,
            FilterArg::All => Filter::All,
        }
    }
}

/// Default location of the settings file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rossum")
        .join("config.json")
}

/// Load settings from the given file, or from the default location if it exists.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<RossumSettings> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_config_path();
            if !path.exists() {
                return Ok(RossumSettings::default());
            }
            path
        }
    };

    let settings = RossumSettings::from_file(&path)
        .with_context(|| format!("failed to load settings from {}", path.display()))?;
    Ok(settings)
}

/// Resolve the client configuration: flag, then environment, then settings file.
pub fn resolve_client_config<F>(
    settings: &RossumSettings,
    api: &ApiArgs,
    env: F,
) -> Result<ClientConfig, RossumError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |value: &String| !value.trim().is_empty();

    let api_key = api
        .api_key
        .clone()
        .filter(non_empty)
        .or_else(|| env(ENV_API_KEY).filter(non_empty))
        .or_else(|| settings.api.api_key.clone().filter(non_empty))
        .ok_or_else(|| RossumError::Config(MISSING_API_KEY.to_string()))?;

    let mut config = settings.client_config(api_key)?;
    if let Some(url) = api
        .api_url
        .clone()
        .filter(non_empty)
        .or_else(|| env(ENV_API_URL).filter(non_empty))
    {
        config = config.with_base_url(url);
    }

    Ok(config)
}

/// Build a client from settings, flags and the process environment.
pub fn build_client(settings: &RossumSettings, api: &ApiArgs) -> anyhow::Result<RossumClient> {
    let config = resolve_client_config(settings, api, |name| std::env::var(name).ok())?;
    let client = RossumClient::new(config)?
        .with_poll_policy(settings.polling.clone())
        .with_max_upload_bytes(settings.upload.max_bytes);
    Ok(client)
}

/// Cancellation token fired on Ctrl-C.
pub fn ctrl_c_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
    cancel
}

/// Spinner shown while a document is being processed.
pub fn spinner(message: &str) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    Ok(pb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rossum_core::ErrorKind;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_missing_api_key() {
        let err = resolve_client_config(&RossumSettings::default(), &ApiArgs::default(), no_env)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.to_string().contains("ROSSUM_API_KEY"));
    }

    #[test]
    fn test_flag_overrides_environment_and_settings() {
        let mut settings = RossumSettings::default();
        settings.api.api_key = Some("from-settings".to_string());
        let api = ApiArgs {
            api_key: Some("from-flag".to_string()),
            api_url: None,
        };

        let config = resolve_client_config(&settings, &api, |_| Some("from-env".to_string())).unwrap();
        assert_eq!(config.api_key, "from-flag");
    }

    #[test]
    fn test_environment_overrides_settings() {
        let mut settings = RossumSettings::default();
        settings.api.api_key = Some("from-settings".to_string());
        settings.api.base_url = "https://settings.example.com".to_string();

        let env = |name: &str| match name {
            ENV_API_KEY => Some("from-env".to_string()),
            ENV_API_URL => Some("https://env.example.com/".to_string()),
            _ => None,
        };

        let config = resolve_client_config(&settings, &ApiArgs::default(), env).unwrap();
        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.base_url, "https://env.example.com");
    }

    #[test]
    fn test_settings_key_used_last() {
        let mut settings = RossumSettings::default();
        settings.api.api_key = Some("from-settings".to_string());

        let env = |name: &str| (name == ENV_API_KEY).then(|| "  ".to_string());
        let config = resolve_client_config(&settings, &ApiArgs::default(), env).unwrap();
        assert_eq!(config.api_key, "from-settings");
        assert_eq!(config.base_url, "https://all.rir.rossum.ai");
    }

    #[test]
    fn test_load_settings_missing_explicit_file() {
        let err = load_settings(Some(Path::new("/nonexistent/rossum.json"))).unwrap_err();
        assert!(err.to_string().contains("failed to load settings"));
    }
}
