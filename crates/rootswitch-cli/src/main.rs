//! # rootswitch — root filesystem transition CLI
//!
//! Moves the calling process into a new root filesystem inside its own
//! mount namespace, then optionally hands off to the container command.

mod commands;
mod output;

use std::process::ExitCode;

use clap::Parser;

use crate::commands::{Cli, LogFormat};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);
    output::exit_code(commands::execute(cli))
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}
