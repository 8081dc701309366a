mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use perla_core::Coordinator;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // No appliance connection needed
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "perla", &mut std::io::stdout());
            Ok(())
        }

        Command::Setup(args) => commands::setup::handle(args, &cli.global).await,

        cmd => {
            let cfg = config::load_config_or_default();
            let interval = match cmd {
                Command::Watch(ref args) => args.interval,
                _ => None,
            };
            let resolved = config::resolve_entry(&cli.global, &cfg, interval)?;
            let coordinator = Coordinator::new(resolved.params)?;

            tracing::debug!(command = ?cmd, entry = %resolved.name, "dispatching command");
            commands::dispatch(cmd, &coordinator, &resolved.name, &cli.global).await
        }
    }
}
