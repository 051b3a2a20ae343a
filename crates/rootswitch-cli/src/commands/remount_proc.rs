//! `rootswitch remount-proc` — Fresh `/proc` without changing the root.

use clap::Args;
use rootswitch_common::config::BootstrapConfig;
use rootswitch_common::types::TransitionMode;
use rootswitch_core::HostMounts;

/// Arguments for the `remount-proc` command.
#[derive(Args, Debug)]
pub struct RemountProcArgs {}

/// Executes the `remount-proc` command.
///
/// Intended for a process that was just placed in a new PID namespace and
/// still sees its parent's `/proc`.
///
/// # Errors
///
/// Returns an error if `/` cannot be made private or `/proc` cannot be mounted.
pub fn execute(_args: &RemountProcArgs) -> anyhow::Result<()> {
    let config = BootstrapConfig {
        mode: TransitionMode::ProcRemount,
        ..BootstrapConfig::default()
    };
    rootswitch_core::enter(&HostMounts, &config)?;
    Ok(())
}
