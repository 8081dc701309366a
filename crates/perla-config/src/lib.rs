//! Shared configuration for the perla CLI.
//!
//! TOML entries, password resolution (env + keyring + plaintext), and
//! translation to `perla_core::ConnectionParams`. The CLI layers its
//! flag overrides on top.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use perla_core::{ConnectionParams, DEFAULT_POLL_INTERVAL, DEFAULT_PORT, DEFAULT_TIMEOUT};

/// Keyring service name under which passwords are stored.
pub const KEYRING_SERVICE: &str = "perla";

/// Environment variable consulted for the password of any entry.
pub const PASSWORD_ENV: &str = "PERLA_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no entry named '{name}'")]
    UnknownEntry { name: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl From<perla_core::CoreError> for ConfigError {
    fn from(err: perla_core::CoreError) -> Self {
        match err {
            perla_core::CoreError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Validation {
                field: "entry".into(),
                reason: other.to_string(),
            },
        }
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Entry used when `--entry` is not given.
    pub default_entry: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named appliances.
    #[serde(default)]
    pub entries: HashMap<String, Entry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_entry: Some("default".into()),
            defaults: Defaults::default(),
            entries: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the entry to use, honoring an explicit choice first.
    pub fn entry_name<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_entry.as_deref())
            .unwrap_or("default")
    }

    pub fn entry(&self, name: &str) -> Result<&Entry, ConfigError> {
        self.entries.get(name).ok_or_else(|| ConfigError::UnknownEntry {
            name: name.to_owned(),
        })
    }

    /// `host:port` identities of every configured entry.
    pub fn unique_ids(&self) -> HashSet<String> {
        self.entries.values().map(Entry::unique_id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Fetch timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Poll interval in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}
fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

/// One configured appliance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Entry {
    /// Host name or IP address, without scheme.
    pub host: String,

    /// TCP port; absent means 80.
    pub port: Option<u16>,

    /// Username for Basic auth; absent or empty means no auth.
    pub username: Option<String>,

    /// Password in plaintext. Prefer the keyring or `password_env`.
    pub password: Option<String>,

    /// Environment variable name containing the password.
    pub password_env: Option<String>,

    /// Override poll interval (seconds).
    pub poll_interval: Option<u64>,

    /// Override fetch timeout (seconds).
    pub timeout: Option<u64>,
}

impl Entry {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Some(DEFAULT_PORT),
            username: None,
            password: None,
            password_env: None,
            poll_interval: None,
            timeout: None,
        }
    }

    pub fn unique_id(&self) -> String {
        format!("{}:{}", self.host.trim(), self.port.unwrap_or(80))
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "perla", "perla").map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("perla");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment.
///
/// Nested keys use a double underscore: `PERLA_DEFAULTS__TIMEOUT=20`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("PERLA_").split("__").ignore(&["password"]));

    Ok(figment.extract()?)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    debug!(path = %path.display(), "config saved");
    Ok(())
}

// ── Keyring ─────────────────────────────────────────────────────────

fn keyring_entry(entry_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{entry_name}/password"),
    )?)
}

/// Store an entry's password in the system keyring.
pub fn store_password(entry_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(entry_name)?.set_password(password)?;
    Ok(())
}

/// Remove an entry's password from the system keyring, if present.
pub fn delete_password(entry_name: &str) -> Result<(), ConfigError> {
    match keyring_entry(entry_name)?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
        Err(e) => Err(e.into()),
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve an entry's password without CLI flags.
///
/// Order: the entry's `password_env` variable, `PERLA_PASSWORD`, the
/// system keyring, then the plaintext `password` field. `None` means the
/// appliance is used without a password.
pub fn resolve_password(entry: &Entry, entry_name: &str) -> Option<SecretString> {
    // 1. Entry's password_env → env var lookup
    if let Some(ref env_name) = entry.password_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. Global env var
    if let Ok(val) = std::env::var(PASSWORD_ENV) {
        return Some(SecretString::from(val));
    }

    // 3. System keyring
    if let Some(secret) = keyring_entry(entry_name)
        .ok()
        .and_then(|e| e.get_password().ok())
    {
        return Some(SecretString::from(secret));
    }

    // 4. Plaintext in config
    entry.password.clone().map(SecretString::from)
}

/// Build `ConnectionParams` from an entry, no CLI flag overrides.
///
/// Entry-level overrides win over `defaults`. The result is validated.
pub fn entry_to_params(
    entry: &Entry,
    entry_name: &str,
    defaults: &Defaults,
) -> Result<ConnectionParams, ConfigError> {
    let mut params = ConnectionParams::new(entry.host.as_str())
        .with_poll_interval(Duration::from_secs(
            entry.poll_interval.unwrap_or(defaults.poll_interval),
        ))
        .with_timeout(Duration::from_secs(entry.timeout.unwrap_or(defaults.timeout)));

    if let Some(port) = entry.port.filter(|p| *p != 0) {
        params = params.with_port(port);
    }

    if let Some(username) = entry.username.as_deref().filter(|u| !u.trim().is_empty()) {
        let password =
            resolve_password(entry, entry_name).unwrap_or_else(|| SecretString::from(String::new()));
        params = params.with_credentials(username, password);
    }

    params.validate()?;
    Ok(params)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn entry_name_prefers_explicit() {
        let cfg = Config::default();
        assert_eq!(cfg.entry_name(Some("cellar")), "cellar");
        assert_eq!(cfg.entry_name(None), "default");
    }

    #[test]
    fn unique_id_defaults_to_port_80() {
        let mut entry = Entry::new(" 10.0.0.9 ");
        assert_eq!(entry.unique_id(), "10.0.0.9:8080");
        entry.port = None;
        assert_eq!(entry.unique_id(), "10.0.0.9:80");
    }

    #[test]
    fn entry_overrides_defaults() {
        let entry = Entry {
            poll_interval: Some(60),
            ..Entry::new("perla.local")
        };
        let params = entry_to_params(&entry, "test", &Defaults::default()).unwrap();

        assert_eq!(params.poll_interval, Duration::from_secs(60));
        assert_eq!(params.timeout, DEFAULT_TIMEOUT);
        assert_eq!(params.port, Some(8080));
        assert!(params.credentials.is_none());
    }

    #[test]
    fn out_of_range_interval_is_rejected() {
        let entry = Entry {
            poll_interval: Some(1),
            ..Entry::new("perla.local")
        };
        let err = entry_to_params(&entry, "test", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "poll_interval"));
    }

    #[test]
    fn unknown_entry_is_an_error() {
        let cfg = Config::default();
        assert!(matches!(cfg.entry("nope"), Err(ConfigError::UnknownEntry { .. })));
    }
}
