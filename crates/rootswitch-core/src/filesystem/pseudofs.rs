//! Kernel pseudo-filesystems inside the new root.
//!
//! Runs after the root transition, so every path here is relative to the
//! container's `/`. The sequence is fixed: `/proc` first, then `/sys` and the
//! cgroup tmpfs (sealed read-only once its directories exist), then `/dev`,
//! `/run` and `/tmp`. Any failure aborts the whole sequence.

use std::path::{Path, PathBuf};

use nix::mount::MsFlags;
use rootswitch_common::constants::{
    CGROUP_V2_PATH, DEV_PATH, PROC_PATH, RUN_PATH, SYS_PATH, TMP_PATH,
};
use rootswitch_common::error::{Result, RootswitchError};
use rootswitch_common::types::SysPolicy;

use crate::filesystem::mount::MountTarget;
use crate::filesystem::propagation;
use crate::sys::MountOps;

const KERNEL_FLAGS: MsFlags = MsFlags::MS_NOSUID
    .union(MsFlags::MS_NODEV)
    .union(MsFlags::MS_NOEXEC);

const TMPFS_FLAGS: MsFlags = MsFlags::MS_NOSUID.union(MsFlags::MS_NODEV);

/// Mounts `/proc`, `/sys`, the cgroup tmpfs, `/dev`, `/run` and `/tmp`.
///
/// `cgroup_dirs` are created under `/sys/fs/cgroup` before `/sys` is
/// remounted read-only (with [`SysPolicy::ReadOnly`]).
///
/// # Errors
///
/// Returns [`RootswitchError::MountFailed`] naming the first target that
/// could not be created or mounted.
pub fn populate_virtual_filesystems<O: MountOps + ?Sized>(
    ops: &O,
    sys_policy: SysPolicy,
    cgroup_dirs: &[String],
) -> Result<()> {
    mount_fresh(ops, &MountTarget::pseudo("proc", PROC_PATH, KERNEL_FLAGS, None))?;
    mount_fresh(ops, &MountTarget::pseudo("sysfs", SYS_PATH, KERNEL_FLAGS, None))?;
    mount_fresh(
        ops,
        &MountTarget::pseudo("tmpfs", CGROUP_V2_PATH, KERNEL_FLAGS, Some("mode=0755")),
    )?;

    for dir in cgroup_dirs {
        let path = Path::new(CGROUP_V2_PATH).join(dir);
        ops.create_dir_all(&path)
            .map_err(|e| mount_failed(path.clone(), e))?;
        tracing::debug!(path = %path.display(), "cgroup directory created");
    }

    if sys_policy == SysPolicy::ReadOnly {
        let remount = MountTarget::remount(SYS_PATH, KERNEL_FLAGS | MsFlags::MS_RDONLY);
        ops.mount(&remount)
            .map_err(|e| mount_failed(PathBuf::from(SYS_PATH), e))?;
        tracing::debug!("/sys remounted read-only");
    }

    mount_fresh(
        ops,
        &MountTarget::pseudo("devtmpfs", DEV_PATH, MsFlags::MS_NOSUID, Some("mode=0755")),
    )?;
    mount_fresh(
        ops,
        &MountTarget::pseudo("tmpfs", RUN_PATH, TMPFS_FLAGS, Some("mode=0755")),
    )?;
    mount_fresh(
        ops,
        &MountTarget::pseudo("tmpfs", TMP_PATH, TMPFS_FLAGS, Some("mode=1777")),
    )?;

    tracing::info!(sys = %sys_policy, "virtual filesystems mounted");
    Ok(())
}

/// Mounts a fresh `/proc` without changing the root.
///
/// Makes `/` private, detaches whatever `/proc` was inherited (it may not be
/// mounted at all), and mounts a new `proc` instance so the process table
/// reflects the current PID namespace.
///
/// # Errors
///
/// Returns an error if `/` cannot be made private or `proc` cannot be mounted.
pub fn remount_proc<O: MountOps + ?Sized>(ops: &O) -> Result<()> {
    propagation::make_private(ops, Path::new("/"))?;

    if let Err(e) = ops.unmount_detached(Path::new(PROC_PATH)) {
        tracing::debug!(error = %e, "no inherited /proc to detach");
    }

    mount_fresh(ops, &MountTarget::pseudo("proc", PROC_PATH, KERNEL_FLAGS, None))?;
    tracing::info!("/proc remounted");
    Ok(())
}

fn mount_fresh<O: MountOps + ?Sized>(ops: &O, target: &MountTarget) -> Result<()> {
    let path = target.target();
    ops.create_dir_all(path)
        .map_err(|e| mount_failed(path.to_path_buf(), e))?;
    ops.mount(target)
        .map_err(|e| mount_failed(path.to_path_buf(), e))?;
    tracing::debug!(mount = %target, "pseudo-filesystem mounted");
    Ok(())
}

fn mount_failed(target: PathBuf, source: std::io::Error) -> RootswitchError {
    RootswitchError::MountFailed { target, source }
}
