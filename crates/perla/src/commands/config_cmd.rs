//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

const MASK: &str = "****";

/// Copy of `cfg` safe to print: plaintext passwords replaced.
fn masked(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    for entry in cfg.entries.values_mut() {
        if entry.password.is_some() {
            entry.password = Some(MASK.into());
        }
    }
    cfg
}

/// One line per entry, default marked with `*`.
fn entry_lines(cfg: &Config) -> String {
    let default = cfg.default_entry.as_deref().unwrap_or_default();
    let mut names: Vec<&String> = cfg.entries.keys().collect();
    names.sort_unstable();
    names
        .into_iter()
        .map(|name| {
            let marker = if name == default { " *" } else { "" };
            format!("{name}{marker}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn ensure_exists(cfg: &Config, name: &str) -> Result<(), CliError> {
    if cfg.entries.contains_key(name) {
        Ok(())
    } else {
        Err(CliError::EntryNotFound {
            name: name.to_owned(),
            available: config::available_entries(cfg),
        })
    }
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = masked(&config::load_config_or_default());
            let out = output::render_single(global.output, &cfg, |c| format!("{c:#?}"), entry_lines)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Remove { name } => {
            let mut cfg = config::load_config_or_default();
            ensure_exists(&cfg, &name)?;

            cfg.entries.remove(&name);
            if cfg.default_entry.as_deref() == Some(name.as_str()) {
                cfg.default_entry = None;
            }
            if let Err(e) = config::delete_password(&name) {
                tracing::warn!(entry = %name, error = %e, "could not remove keyring password");
            }
            config::save_config(&cfg)?;
            eprintln!("✓ Removed entry '{name}'");
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            ensure_exists(&cfg, &name)?;

            cfg.default_entry = Some(name.clone());
            config::save_config(&cfg)?;
            eprintln!("✓ Default entry set to '{name}'");
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::config::Entry;

    use super::*;

    fn sample() -> Config {
        let mut cfg = Config::default();
        let mut entry = Entry::new("192.168.1.40");
        entry.username = Some("admin".into());
        entry.password = Some("hunter2".into());
        cfg.entries.insert("default".into(), entry);
        cfg.entries.insert("cellar".into(), Entry::new("perla.local"));
        cfg
    }

    #[test]
    fn masked_hides_plaintext_passwords() {
        let cfg = masked(&sample());
        assert_eq!(cfg.entries["default"].password.as_deref(), Some(MASK));
        assert_eq!(cfg.entries["cellar"].password, None);
        assert!(!format!("{cfg:?}").contains("hunter2"));
    }

    #[test]
    fn entry_lines_marks_default() {
        assert_eq!(entry_lines(&sample()), "cellar\ndefault *");
    }

    #[test]
    fn ensure_exists_lists_available() {
        let err = ensure_exists(&sample(), "garage").unwrap_err();
        match err {
            CliError::EntryNotFound { name, available } => {
                assert_eq!(name, "garage");
                assert_eq!(available, "cellar, default");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
