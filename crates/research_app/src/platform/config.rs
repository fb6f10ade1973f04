use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use engine_logging::engine_info;
use research_engine::{parse_base_url, ReconnectPolicy, StreamSettings};
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "research.ron";
pub const API_BASE_ENV: &str = "RESEARCH_API_BASE_URL";
pub const AUTH_BASE_ENV: &str = "RESEARCH_AUTH_BASE_URL";

const DEFAULT_BASE_URL: &str = "http://localhost:8085/";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub auth_base_url: String,
    pub output_dir: PathBuf,
    pub session_file: PathBuf,
    /// Timeout for auth and single-shot analysis requests.
    pub request_timeout_secs: u64,
    pub stream: StreamConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub connect_timeout_secs: u64,
    pub max_reconnect_attempts: u32,
    pub initial_retry_ms: u64,
    pub max_retry_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            auth_base_url: DEFAULT_BASE_URL.to_string(),
            output_dir: PathBuf::from("exports"),
            session_file: PathBuf::from(".research_session.ron"),
            request_timeout_secs: 120,
            stream: StreamConfig::default(),
        }
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        let policy = ReconnectPolicy::default();
        Self {
            connect_timeout_secs: 10,
            max_reconnect_attempts: policy.max_attempts,
            initial_retry_ms: duration_ms(policy.initial_delay),
            max_retry_ms: duration_ms(policy.max_delay),
        }
    }
}

impl AppConfig {
    /// Reads `explicit` (which must exist) or the optional default file, then
    /// applies environment overrides. Not validated: CLI overrides still apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_FILE);
                if path.exists() {
                    Self::from_file(path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: AppConfig = ron::from_str(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        engine_info!("loaded config from {:?}", path);
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(API_BASE_ENV).filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(url) = lookup(AUTH_BASE_ENV).filter(|v| !v.trim().is_empty()) {
            self.auth_base_url = url;
        }
    }

    /// `--api-base` / `--auth-base` have the final say.
    pub fn apply_cli(&mut self, api_base: Option<String>, auth_base: Option<String>) {
        if let Some(url) = api_base {
            self.api_base_url = url;
        }
        if let Some(url) = auth_base {
            self.auth_base_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.api_base()?;
        self.auth_base()?;
        if self.stream.initial_retry_ms > self.stream.max_retry_ms {
            bail!(
                "stream.initial_retry_ms ({}) exceeds stream.max_retry_ms ({})",
                self.stream.initial_retry_ms,
                self.stream.max_retry_ms
            );
        }
        Ok(())
    }

    pub fn api_base(&self) -> Result<Url> {
        parse_base_url(&self.api_base_url)
            .with_context(|| format!("invalid api_base_url {:?}", self.api_base_url))
    }

    pub fn auth_base(&self) -> Result<Url> {
        parse_base_url(&self.auth_base_url)
            .with_context(|| format!("invalid auth_base_url {:?}", self.auth_base_url))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn stream_settings(&self) -> Result<StreamSettings> {
        let mut settings = StreamSettings::new(self.api_base()?);
        settings.connect_timeout = Duration::from_secs(self.stream.connect_timeout_secs);
        settings.reconnect = ReconnectPolicy {
            max_attempts: self.stream.max_reconnect_attempts,
            initial_delay: Duration::from_millis(self.stream.initial_retry_ms),
            max_delay: Duration::from_millis(self.stream.max_retry_ms),
        };
        Ok(settings)
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
