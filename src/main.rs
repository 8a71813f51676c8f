mod config;
mod console;
mod error;
mod logger;
mod models;
mod runner;
mod scheduler;
mod sysinfo;
mod tasks;
mod ui;
mod utils;

use anyhow::Context;
use clap::Parser;
use config::{Cli, Config};
use console::Console;
use logger::Logger;
use models::Menu;
use runner::SystemRunner;
use std::process::ExitCode;
use std::sync::Arc;
use tasks::Toolkit;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the diagnostics filter, e.g. `debug`.
const LOG_ENV: &str = "ADMIN_TOOLKIT_LOG";

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(Config::from(&cli)) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(config: Config) -> anyhow::Result<ExitCode> {
    let logger = Logger::init(&config).with_context(|| {
        format!(
            "preparing {} and {}",
            config.backup_dir.display(),
            config.log_file.display()
        )
    })?;
    let logger = Arc::new(logger);
    let menu = Menu::new(ui::get_menu_items())?;
    let console = Console::stdio().context("setting up the console")?;
    let keep_going = config.keep_going;

    let mut toolkit = Toolkit::new(config, Arc::clone(&logger), SystemRunner);
    let end = ui::run_session(&menu, &console, &logger, &mut toolkit, keep_going);
    if let ui::SessionEnd::Fatal(e) = &end {
        tracing::debug!(error = %format!("{:#}", e), "session ended by a fatal action failure");
    } else {
        tracing::debug!(?end, "session finished");
    }
    Ok(end.exit_code())
}
