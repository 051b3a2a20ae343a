//! CLI command definitions and dispatch.

pub mod check;
pub mod enter;
pub mod remount_proc;

use clap::{Parser, Subcommand, ValueEnum};

/// Rootswitch — move a process into an isolated root filesystem.
#[derive(Parser, Debug)]
#[command(name = "rootswitch", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log line encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a rootfs without changing anything.
    Check(check::CheckArgs),
    /// Pivot into a rootfs and mount its pseudo-filesystems.
    Enter(enter::EnterArgs),
    /// Make `/` private and mount a fresh `/proc` in place.
    RemountProc(remount_proc::RemountProcArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Check(args) => check::execute(&args),
        Command::Enter(args) => enter::execute(args),
        Command::RemountProc(args) => remount_proc::execute(&args),
    }
}
