//! Configuration loading.
//!
//! Non-secret settings live in `~/.messenger-gateway/config.toml`. Secrets
//! never appear in TOML: the file names the `.env` entries that hold them
//! (see [`crate::credentials`]). Every section has defaults, so an empty file
//! is valid.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::credentials::Credentials;
use crate::messenger::client::{DEFAULT_API_HOST, DEFAULT_API_SCHEME, DEFAULT_API_VERSION};
use crate::messenger::ClientConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Graph API endpoint and credential names.
    #[serde(default)]
    pub messenger: MessengerConfig,

    /// Webhook endpoint settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// Graph API endpoint and the `.env` keys holding its secrets.
#[derive(Debug, Clone, Deserialize)]
pub struct MessengerConfig {
    /// Graph API host.
    #[serde(default = "default_api_host")]
    pub api_host: String,

    /// Graph API version segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// URL scheme; `http` only makes sense against a local mock.
    #[serde(default = "default_api_scheme")]
    pub api_scheme: String,

    /// Credential key holding the app secret.
    #[serde(default = "default_app_secret_env")]
    pub app_secret_env: String,

    /// Credential key holding the global page access token. When that entry
    /// is absent, tokens are resolved per page.
    #[serde(default = "default_access_token_env")]
    pub access_token_env: String,

    /// Credential key holding the webhook verify token.
    #[serde(default = "default_verify_token_env")]
    pub verify_token_env: String,
}

impl Default for MessengerConfig {
    fn default() -> Self {
        Self {
            api_host: default_api_host(),
            api_version: default_api_version(),
            api_scheme: default_api_scheme(),
            app_secret_env: default_app_secret_env(),
            access_token_env: default_access_token_env(),
            verify_token_env: default_verify_token_env(),
        }
    }
}

impl MessengerConfig {
    /// Build the client configuration from these settings and loaded secrets.
    ///
    /// # Errors
    ///
    /// Returns an error when the app secret is missing or the endpoint
    /// settings are invalid.
    pub fn client_config(&self, credentials: &Credentials) -> anyhow::Result<ClientConfig> {
        let app_secret = credentials.require(&self.app_secret_env)?;
        let access_token = credentials
            .get(&self.access_token_env)
            .unwrap_or_default()
            .to_owned();
        let verify_token = credentials
            .get(&self.verify_token_env)
            .unwrap_or_default()
            .to_owned();

        let config = ClientConfig::new(
            &self.api_host,
            &self.api_version,
            app_secret,
            access_token,
            verify_token,
        )?
        .with_scheme(&self.api_scheme)?;
        Ok(config)
    }
}

/// Webhook endpoint settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address to listen on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Route the platform calls.
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,

    /// Capacity of the channel between the endpoint and the application.
    #[serde(default = "default_channel_buffer_size")]
    pub channel_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            webhook_path: default_webhook_path(),
            channel_buffer_size: default_channel_buffer_size(),
        }
    }
}

impl ServerConfig {
    /// Parse the bind address.
    ///
    /// # Errors
    ///
    /// Returns an error if `bind` is not a socket address.
    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        self.bind
            .parse()
            .with_context(|| format!("invalid server.bind address: {}", self.bind))
    }
}

// Default value functions for serde

fn default_api_host() -> String {
    DEFAULT_API_HOST.to_owned()
}
fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_owned()
}
fn default_api_scheme() -> String {
    DEFAULT_API_SCHEME.to_owned()
}
fn default_app_secret_env() -> String {
    "MESSENGER_APP_SECRET".to_owned()
}
fn default_access_token_env() -> String {
    "MESSENGER_ACCESS_TOKEN".to_owned()
}
fn default_verify_token_env() -> String {
    "MESSENGER_VERIFY_TOKEN".to_owned()
}
fn default_bind() -> String {
    "127.0.0.1:3978".to_owned()
}
fn default_webhook_path() -> String {
    "/api/messages".to_owned()
}
fn default_channel_buffer_size() -> usize {
    64
}

/// Filesystem locations used at runtime.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
    /// `~/.messenger-gateway`
    pub root: PathBuf,
    /// `~/.messenger-gateway/config.toml`
    pub config_toml: PathBuf,
    /// `~/.messenger-gateway/.env`
    pub env_file: PathBuf,
    /// `~/.messenger-gateway/logs`
    pub logs_dir: PathBuf,
}

/// Resolve the default config directory (`~/.messenger-gateway/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".messenger-gateway"))
}

/// Resolve all runtime paths under [`config_dir`].
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn runtime_paths() -> anyhow::Result<RuntimePaths> {
    let root = config_dir()?;
    Ok(RuntimePaths {
        config_toml: root.join("config.toml"),
        env_file: root.join(".env"),
        logs_dir: root.join("logs"),
        root,
    })
}

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config at {}", path.display()))?;
    Ok(config)
}

/// Load `~/.messenger-gateway/config.toml`, or defaults when it does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_default_config() -> anyhow::Result<Config> {
    let paths = runtime_paths()?;
    if !paths.config_toml.exists() {
        return Ok(Config::default());
    }
    load_config(&paths.config_toml)
}
