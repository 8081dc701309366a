//! CLI configuration: thin wrapper around `perla_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--host, --port, --username, --timeout).

use perla_core::ConnectionParams;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use perla_config::{
    Config, Entry, config_path, delete_password, load_config_or_default, save_config,
    store_password,
};

/// The entry a command runs against, after flag overrides.
#[derive(Debug)]
pub struct ResolvedEntry {
    pub name: String,
    pub params: ConnectionParams,
}

/// Resolve connection parameters from config + global flags.
///
/// Flags win over the entry. With no matching entry, `--host` alone is
/// enough to build an ad-hoc one.
pub fn resolve_entry(
    global: &GlobalOpts,
    cfg: &Config,
    interval: Option<u64>,
) -> Result<ResolvedEntry, CliError> {
    let name = cfg.entry_name(global.entry.as_deref()).to_owned();

    let base = match (cfg.entries.get(&name), global.host.as_deref()) {
        (Some(entry), _) => entry.clone(),
        (None, Some(host)) => Entry::new(host),
        (None, None) if global.entry.is_some() => {
            return Err(CliError::EntryNotFound {
                available: available_entries(cfg),
                name,
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    let entry = apply_overrides(base, global, interval);
    let params = perla_config::entry_to_params(&entry, &name, &cfg.defaults)?;
    Ok(ResolvedEntry { name, params })
}

fn apply_overrides(mut entry: Entry, global: &GlobalOpts, interval: Option<u64>) -> Entry {
    if let Some(ref host) = global.host {
        entry.host.clone_from(host);
    }
    if let Some(port) = global.port {
        entry.port = Some(port);
    }
    if let Some(ref username) = global.username {
        entry.username = Some(username.clone());
    }
    if let Some(timeout) = global.timeout {
        entry.timeout = Some(timeout);
    }
    if let Some(interval) = interval {
        entry.poll_interval = Some(interval);
    }
    entry
}

/// Comma-separated, sorted entry names for help text.
pub fn available_entries(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.entries.keys().map(String::as_str).collect();
    names.sort_unstable();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}
