//! Configuration management for the techfeed CLI and client

use config::{Config as ConfigLoader, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::error::{FeedError, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Persisted CLI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub endpoint: String,
    pub timeout: u64,
    pub verbose: bool,
    pub storage_dir: PathBuf,
    pub token_storage_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_BASE_URL.to_string(),
            timeout: default_timeout(),
            verbose: false,
            storage_dir: default_storage_dir(),
            token_storage_enabled: true,
        }
    }
}

impl Config {
    pub async fn load() -> Result<Self> {
        Self::load_from(&default_config_path()).await
    }

    /// Load settings, writing defaults when the file is missing or unreadable
    pub async fn load_from(config_file: &Path) -> Result<Self> {
        if config_file.exists() {
            let content = fs::read_to_string(config_file).await?;

            match serde_json::from_str::<Self>(&content) {
                Ok(config) => Ok(config),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable config {}: {}", config_file.display(), e);
                    let config = Self::default();
                    config.save(config_file).await?;
                    Ok(config)
                }
            }
        } else {
            let config = Self::default();
            config.save(config_file).await?;
            Ok(config)
        }
    }

    pub async fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, content).await?;
        Ok(())
    }

    pub fn session_file(&self) -> PathBuf {
        self.storage_dir.join("session.json")
    }

    pub fn to_client_config(&self) -> Result<ClientConfig> {
        let use_proxy = !self.endpoint.contains("localhost") && !self.endpoint.contains("127.0.0.1");

        let token_storage = TokenStorageConfig {
            enabled: self.token_storage_enabled,
            storage_path: self
                .token_storage_enabled
                .then(|| self.session_file().to_string_lossy().to_string()),
        };

        ClientConfigBuilder::new()
            .base_url(&self.endpoint)
            .timeout(self.timeout)
            .verbose(self.verbose)
            .use_proxy(use_proxy)
            .token_storage(token_storage)
            .build()
    }
}

pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("techfeed")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.json")
}

pub fn default_storage_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("techfeed")
}

/// Edits the persisted settings behind the `config` subcommand
pub struct ConfigService {
    config: Config,
    config_path: PathBuf,
}

impl ConfigService {
    pub fn new(config: Config) -> Self {
        Self::with_config_path(config, default_config_path())
    }

    pub fn with_config_path(config: Config, config_path: PathBuf) -> Self {
        Self {
            config,
            config_path,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Endpoint", self.config.endpoint.clone()),
            ("Timeout", format!("{}s", self.config.timeout)),
            ("Verbose", self.config.verbose.to_string()),
            ("Storage", self.config.storage_dir.display().to_string()),
            (
                "Token storage",
                if self.config.token_storage_enabled {
                    "enabled".to_string()
                } else {
                    "disabled".to_string()
                },
            ),
            ("Config file", self.config_path.display().to_string()),
        ]
    }

    pub async fn set_endpoint(&mut self, url: &str) -> Result<()> {
        let url = url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FeedError::invalid_endpoint(format!(
                "Endpoint must start with http:// or https://: {}",
                url
            )));
        }
        self.config.endpoint = url.trim_end_matches('/').to_string();
        self.config.save(&self.config_path).await
    }

    pub async fn set_timeout(&mut self, seconds: u64) -> Result<()> {
        if seconds == 0 {
            return Err(FeedError::invalid_input("Timeout must be at least 1 second"));
        }
        self.config.timeout = seconds;
        self.config.save(&self.config_path).await
    }

    pub async fn set_verbose(&mut self, enabled: &str) -> Result<()> {
        self.config.verbose = match enabled.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" => true,
            "false" | "off" | "no" | "0" => false,
            other => {
                return Err(FeedError::invalid_input(format!(
                    "Expected true/false, got '{}'",
                    other
                )))
            }
        };
        self.config.save(&self.config_path).await
    }

    pub async fn reset(&mut self) -> Result<()> {
        self.config = Config::default();
        self.config.save(&self.config_path).await
    }
}

/// Session storage configuration
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct TokenStorageConfig {
    #[serde(default)]
    pub enabled: bool,
    pub storage_path: Option<String>,
}

/// Client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub token_storage: TokenStorageConfig,
    #[serde(default = "default_use_proxy")]
    pub use_proxy: bool,
    #[serde(default = "default_guest_login_path")]
    pub guest_login_path: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    #[serde(default = "default_logout_path")]
    pub logout_path: String,
    #[serde(default = "default_refresh_header")]
    pub refresh_header: String,
    #[serde(default = "default_me_path")]
    pub me_path: String,
    /// Read (GET) and replace (PUT) a signed-in user's keywords
    #[serde(default = "default_user_keywords_path")]
    pub user_keywords_path: String,
    #[serde(default = "default_recommend_keywords_path")]
    pub recommend_keywords_path: String,
    /// Where auto-logout navigates to
    #[serde(default = "default_login_route")]
    pub login_route: String,
    #[serde(default = "default_notify_window_ms")]
    pub notify_window_ms: u64,
    #[serde(default = "default_logout_delay_ms")]
    pub logout_delay_ms: u64,
    /// Persist the refresh token returned by the refresh endpoint
    #[serde(default)]
    pub rotate_refresh_token: bool,
}

fn default_timeout() -> u64 {
    10
}

fn default_use_proxy() -> bool {
    true
}

fn default_guest_login_path() -> String {
    "/api/auth/guest".to_string()
}

fn default_refresh_path() -> String {
    "/api/auth/refresh".to_string()
}

fn default_logout_path() -> String {
    "/api/auth/logout".to_string()
}

fn default_refresh_header() -> String {
    "X-Refresh-Token".to_string()
}

fn default_me_path() -> String {
    "/api/user/me".to_string()
}

fn default_user_keywords_path() -> String {
    "/api/user/keywords".to_string()
}

fn default_recommend_keywords_path() -> String {
    "/api/keywords/recommend".to_string()
}

fn default_login_route() -> String {
    "/login".to_string()
}

fn default_notify_window_ms() -> u64 {
    5000
}

fn default_logout_delay_ms() -> u64 {
    1000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: default_timeout(),
            verbose: false,
            token_storage: TokenStorageConfig::default(),
            use_proxy: default_use_proxy(),
            guest_login_path: default_guest_login_path(),
            refresh_path: default_refresh_path(),
            logout_path: default_logout_path(),
            refresh_header: default_refresh_header(),
            me_path: default_me_path(),
            user_keywords_path: default_user_keywords_path(),
            recommend_keywords_path: default_recommend_keywords_path(),
            login_route: default_login_route(),
            notify_window_ms: default_notify_window_ms(),
            logout_delay_ms: default_logout_delay_ms(),
            rotate_refresh_token: false,
        }
    }
}

/// Builder for ClientConfig
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    timeout: Option<u64>,
    verbose: Option<bool>,
    token_storage: Option<TokenStorageConfig>,
    config_file: Option<PathBuf>,
    use_proxy: Option<bool>,
    rotate_refresh_token: Option<bool>,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    pub fn use_proxy(mut self, use_proxy: bool) -> Self {
        self.use_proxy = Some(use_proxy);
        self
    }

    pub fn token_storage(mut self, token_storage: TokenStorageConfig) -> Self {
        self.token_storage = Some(token_storage);
        self
    }

    pub fn rotate_refresh_token(mut self, rotate: bool) -> Self {
        self.rotate_refresh_token = Some(rotate);
        self
    }

    pub fn config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        let mut config = ClientConfig::from_file_and_env(self.config_file.as_deref())?;

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(verbose) = self.verbose {
            config.verbose = verbose;
        }
        if let Some(token_storage) = self.token_storage {
            config.token_storage = token_storage;
        }
        if let Some(use_proxy) = self.use_proxy {
            config.use_proxy = use_proxy;
        }
        if let Some(rotate) = self.rotate_refresh_token {
            config.rotate_refresh_token = rotate;
        }

        config.validate()?;
        Ok(config)
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Defaults, then the optional file, then `TECHFEED_*` environment variables
    pub fn from_file_and_env<P: AsRef<Path>>(config_file: Option<P>) -> Result<Self> {
        let mut builder = ConfigLoader::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("timeout", 10)?
            .set_default("verbose", false)?
            .set_default("use_proxy", true)?;

        if let Some(config_path) = config_file {
            if config_path.as_ref().exists() {
                builder = builder.add_source(File::from(config_path.as_ref()));
            }
        }
        builder = builder.add_source(Environment::with_prefix("TECHFEED").try_parsing(true));

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(FeedError::invalid_endpoint("Base URL cannot be empty"));
        }
        if self.timeout == 0 {
            return Err(FeedError::config("Timeout must be at least 1 second"));
        }
        for (name, path) in [
            ("guest_login_path", &self.guest_login_path),
            ("refresh_path", &self.refresh_path),
            ("logout_path", &self.logout_path),
            ("me_path", &self.me_path),
            ("user_keywords_path", &self.user_keywords_path),
            ("recommend_keywords_path", &self.recommend_keywords_path),
        ] {
            if !path.starts_with('/') {
                return Err(FeedError::config(format!(
                    "{} must start with '/': {}",
                    name, path
                )));
            }
        }
        Ok(())
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        let endpoint = endpoint.strip_prefix('/').unwrap_or(endpoint);
        let base_url = if self.base_url.starts_with("http://") || self.base_url.starts_with("https://")
        {
            self.base_url.clone()
        } else {
            format!("https://{}", self.base_url)
        };

        format!("{}/{}", base_url.trim_end_matches('/'), endpoint)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn notify_window(&self) -> Duration {
        Duration::from_millis(self.notify_window_ms)
    }

    pub fn logout_delay(&self) -> Duration {
        Duration::from_millis(self.logout_delay_ms)
    }

    /// Path component of a request target, without query string
    fn path_of(target: &str) -> &str {
        let without_query = target.split('?').next().unwrap_or(target);
        match without_query.find("://") {
            Some(scheme_end) => {
                let rest = &without_query[scheme_end + 3..];
                rest.find('/').map(|i| &rest[i..]).unwrap_or("/")
            }
            None => without_query,
        }
    }

    pub fn is_refresh_endpoint(&self, target: &str) -> bool {
        Self::path_of(target).ends_with(self.refresh_path.as_str())
    }

    pub fn is_logout_endpoint(&self, target: &str) -> bool {
        Self::path_of(target).ends_with(self.logout_path.as_str())
    }
}
