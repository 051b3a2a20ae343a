//! `rootswitch enter` — Pivot into a rootfs and hand off to a command.

use std::os::unix::process::CommandExt;
use std::path::PathBuf;

use clap::Args;
use rootswitch_common::config::BootstrapConfig;
use rootswitch_common::types::SysPolicy;
use rootswitch_core::HostMounts;

/// Arguments for the `enter` command.
#[derive(Args, Debug)]
pub struct EnterArgs {
    /// Directory that becomes `/`. Overrides the config file.
    pub rootfs: Option<PathBuf>,

    /// JSON bootstrap configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Do not mount `/proc`, `/sys`, `/dev`, `/run`, `/tmp` after the pivot.
    #[arg(long)]
    pub no_pseudo_fs: bool,

    /// Leave `/sys` read-write instead of sealing it read-only.
    #[arg(long)]
    pub writable_sys: bool,

    /// Directory to create under `/sys/fs/cgroup` (repeatable).
    #[arg(long = "cgroup-dir", value_name = "NAME")]
    pub cgroup_dirs: Vec<String>,

    /// Skip the final scan for leftover old-root mounts.
    #[arg(long)]
    pub no_leak_check: bool,

    /// Command that replaces this process once the transition succeeds.
    #[arg(last = true)]
    pub command: Vec<String>,
}

impl EnterArgs {
    /// Builds the bootstrap configuration: file (or defaults), then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be loaded or the result
    /// does not validate.
    pub fn bootstrap_config(&self) -> anyhow::Result<BootstrapConfig> {
        let mut config = match &self.config {
            Some(path) => BootstrapConfig::load(path)?,
            None => BootstrapConfig::default(),
        };
        if let Some(rootfs) = &self.rootfs {
            config.rootfs.clone_from(rootfs);
        }
        if self.no_pseudo_fs {
            config.pseudo_filesystems = false;
        }
        if self.writable_sys {
            config.sys_policy = SysPolicy::ReadWrite;
        }
        config.cgroup_dirs.extend(self.cgroup_dirs.iter().cloned());
        if self.no_leak_check {
            config.verify_no_leak = false;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Executes the `enter` command.
///
/// Never returns on a successful hand-off: the process image is replaced.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, any transition step
/// fails, or the hand-off command cannot be executed.
pub fn execute(args: EnterArgs) -> anyhow::Result<()> {
    let config = args.bootstrap_config()?;

    rootswitch_core::enter(&HostMounts, &config)?;

    let Some((program, rest)) = args.command.split_first() else {
        return Ok(());
    };
    tracing::info!(%program, "handing off to container command");
    let err = std::process::Command::new(program).args(rest).exec();
    Err(anyhow::anyhow!("failed to execute {program}: {err}"))
}
