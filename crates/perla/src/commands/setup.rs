//! `perla setup`: interactive or flag-driven appliance setup.

use std::io::IsTerminal;
use std::time::Duration;

use dialoguer::Input;
use secrecy::{ExposeSecret, SecretString};

use perla_core::setup::{BASE_ERROR, ERROR_CANNOT_CONNECT};
use perla_core::{DEFAULT_POLL_INTERVAL, DEFAULT_PORT, SetupFlow, SetupInput, SetupOutcome, translations};

use crate::cli::{GlobalOpts, SetupArgs};
use crate::config::{self, Config, Entry};
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn prompt_input(global: &GlobalOpts, args: &SetupArgs) -> Result<SetupInput, CliError> {
    eprintln!("💧 BWT Perla setup");
    eprintln!("   Config path: {}\n", config::config_path().display());

    let host: String = Input::new()
        .with_prompt(translations::field_label("host"))
        .with_initial_text(global.host.clone().unwrap_or_default())
        .interact_text()
        .map_err(prompt_err)?;

    let port: u16 = Input::new()
        .with_prompt(translations::field_label("port"))
        .default(global.port.unwrap_or(DEFAULT_PORT))
        .interact_text()
        .map_err(prompt_err)?;

    let username: String = Input::new()
        .with_prompt(translations::field_label("username"))
        .default(global.username.clone().unwrap_or_default())
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;

    let password = if username.trim().is_empty() {
        String::new()
    } else {
        rpassword::prompt_password(format!("{}: ", translations::field_label("password")))
            .map_err(prompt_err)?
    };

    let poll_interval_secs: u64 = Input::new()
        .with_prompt(translations::field_label("poll_interval"))
        .default(args.interval.unwrap_or(DEFAULT_POLL_INTERVAL.as_secs()))
        .interact_text()
        .map_err(prompt_err)?;

    Ok(SetupInput {
        host,
        port: Some(port),
        username,
        password: SecretString::from(password),
        poll_interval_secs,
    })
}

fn flag_input(global: &GlobalOpts, args: &SetupArgs) -> Result<SetupInput, CliError> {
    let host = global.host.clone().ok_or_else(|| CliError::Validation {
        field: "host".into(),
        reason: "--host is required with --non-interactive".into(),
    })?;

    let password = args
        .password_env
        .as_deref()
        .and_then(|name| std::env::var(name).ok())
        .or_else(|| std::env::var(perla_config::PASSWORD_ENV).ok())
        .unwrap_or_default();

    Ok(SetupInput {
        host,
        port: Some(global.port.unwrap_or(DEFAULT_PORT)),
        username: global.username.clone().unwrap_or_default(),
        password: SecretString::from(password),
        poll_interval_secs: args.interval.unwrap_or(DEFAULT_POLL_INTERVAL.as_secs()),
    })
}

fn form_error(errors: &std::collections::BTreeMap<String, String>) -> CliError {
    if errors.get(BASE_ERROR).map(String::as_str) == Some(ERROR_CANNOT_CONNECT) {
        return CliError::SetupFailed {
            message: translations::config_error(ERROR_CANNOT_CONNECT).to_owned(),
            help: "Check host and port, then retry. Add -vv to see the underlying error.".into(),
        };
    }

    let (field, key) = errors
        .iter()
        .find(|(field, _)| field.as_str() != BASE_ERROR)
        .map_or(("input", "unknown"), |(f, k)| (f.as_str(), k.as_str()));
    CliError::Validation {
        field: field.to_owned(),
        reason: translations::config_error(key).to_owned(),
    }
}

/// Build the entry to save. The password goes to exactly one place.
fn build_entry(
    input: &SetupInput,
    args: &SetupArgs,
    name: &str,
) -> Result<Entry, CliError> {
    let username = Some(input.username.trim().to_owned()).filter(|u| !u.is_empty());
    let password = input.password.expose_secret();

    let plaintext = if username.is_none() || password.is_empty() || args.password_env.is_some() {
        None
    } else if args.keyring {
        config::store_password(name, password)?;
        eprintln!("   ✓ Password stored in system keyring");
        None
    } else {
        Some(password.to_owned())
    };

    Ok(Entry {
        host: input.host.trim().to_owned(),
        port: input.port.filter(|p| *p != 0),
        username,
        password: plaintext,
        password_env: args.password_env.clone(),
        poll_interval: Some(input.poll_interval_secs),
        timeout: None,
    })
}

pub async fn handle(args: SetupArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let mut cfg: Config = config::load_config_or_default();
    let name = args
        .name
        .clone()
        .or_else(|| global.entry.clone())
        .unwrap_or_else(|| "default".into());

    if cfg.entries.contains_key(&name) {
        return Err(CliError::AlreadyConfigured {
            message: format!("Entry '{name}' already exists"),
        });
    }

    let interactive =
        !args.non_interactive && global.host.is_none() && std::io::stdin().is_terminal();
    let input = if interactive {
        prompt_input(global, &args)?
    } else {
        flag_input(global, &args)?
    };

    let timeout = Duration::from_secs(global.timeout.unwrap_or(cfg.defaults.timeout));
    let flow = SetupFlow::new().with_timeout(timeout);

    match flow.submit(&input, &cfg.unique_ids()).await {
        SetupOutcome::CreateEntry {
            title, unique_id, ..
        } => {
            let entry = build_entry(&input, &args, &name)?;
            let first = cfg.entries.is_empty();
            cfg.entries.insert(name.clone(), entry);
            if args.set_default || first {
                cfg.default_entry = Some(name.clone());
            }
            config::save_config(&cfg)?;

            tracing::info!(%unique_id, entry = %name, "entry saved");
            output::print_output(&format!("✓ {title} saved as entry '{name}'"), global.quiet);
            Ok(())
        }
        SetupOutcome::ShowForm { errors } => Err(form_error(&errors)),
        SetupOutcome::Abort { reason } => Err(CliError::AlreadyConfigured {
            message: translations::config_abort(&reason).to_owned(),
        }),
    }
}
