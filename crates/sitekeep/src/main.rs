mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use sitekeep_core::TaskKind;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, LogFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose, cli.global.log_format);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8, format: LogFormat) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // stdout carries command output; logs go to stderr.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.with_target(false).init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Some(Command::Completions(args)) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "sitekeep", &mut std::io::stdout());
            Ok(())
        }
        Some(Command::Analyze(args)) => commands::analyze::handle(&args, &cli.global).await,
        Some(Command::History(args)) => commands::history::handle(&args, &cli.global).await,
        Some(Command::Ping(args)) => {
            commands::task::handle(&args, TaskKind::Uptime, &cli.global).await
        }
        Some(Command::Backup(args)) => {
            commands::task::handle(&args, TaskKind::Backup, &cli.global).await
        }
        None => commands::worker::run(cli.once, &cli.global).await,
    }
}
