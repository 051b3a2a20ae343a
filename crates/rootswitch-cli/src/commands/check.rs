//! `rootswitch check` — Validate a rootfs without changing anything.

use std::path::{Path, PathBuf};

use clap::Args;
use rootswitch_common::config::BootstrapConfig;
use rootswitch_common::constants::{DEV_PATH, PROC_PATH, RUN_PATH, SYS_PATH, TMP_PATH};
use rootswitch_core::{HostMounts, MountOps, RootfsHandle};

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Directory that would become `/`.
    pub rootfs: Option<PathBuf>,

    /// JSON bootstrap configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Executes the `check` command.
///
/// Prints the resolved rootfs, whether it is already a mount point, and
/// which pseudo-filesystem mount points the transition will create.
///
/// # Errors
///
/// Returns an error if the rootfs does not satisfy the transition's
/// preconditions.
#[allow(clippy::print_stdout)]
pub fn execute(args: &CheckArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => BootstrapConfig::load(path)?,
        None => BootstrapConfig::default(),
    };
    let rootfs_path = args.rootfs.as_ref().unwrap_or(&config.rootfs);

    let rootfs = RootfsHandle::resolve(rootfs_path)?;

    let mounted = match HostMounts.is_mount_point(rootfs.path()) {
        Ok(true) => "yes",
        Ok(false) => "no (will be bind-mounted)",
        Err(e) => {
            tracing::warn!(error = %e, "cannot read mount table");
            "unknown (will be bind-mounted)"
        }
    };

    println!("{:<14} {}", "ROOTFS", rootfs.path().display());
    println!("{:<14} {mounted}", "MOUNT POINT");
    for dir in missing_mount_dirs(rootfs.path()) {
        println!("{:<14} {dir} (will be created)", "MISSING");
    }
    Ok(())
}

/// Pseudo-filesystem mount points absent from `rootfs`.
fn missing_mount_dirs(rootfs: &Path) -> Vec<&'static str> {
    [PROC_PATH, SYS_PATH, DEV_PATH, RUN_PATH, TMP_PATH]
        .into_iter()
        .filter(|dir| !rootfs.join(dir.trim_start_matches('/')).is_dir())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_mount_dirs_lists_absent_targets() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(dir.path().join("proc")).expect("mkdir");
        std::fs::create_dir(dir.path().join("tmp")).expect("mkdir");
        assert_eq!(
            missing_mount_dirs(dir.path()),
            vec!["/sys", "/dev", "/run"]
        );
    }

    #[test]
    fn check_rejects_missing_rootfs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let args = CheckArgs {
            rootfs: Some(dir.path().join("absent")),
            config: None,
        };
        assert!(execute(&args).is_err());
    }
}
