//! Entry point for the whole filesystem-isolation transition.
//!
//! Runs inside a process that an external spawner already placed in fresh
//! mount, UTS, IPC and PID namespaces. The order is fixed:
//! validate → make `/` private → pivot → pseudo-filesystems → leak check.

use std::io;
use std::path::Path;

use rootswitch_common::config::BootstrapConfig;
use rootswitch_common::error::{Result, RootswitchError};
use rootswitch_common::types::{Step, TransitionMode};

use crate::filesystem::pivot_root::{self, RootfsHandle};
use crate::filesystem::{propagation, pseudofs};
use crate::mountinfo;
use crate::sys::MountOps;

/// Performs the transition described by `config`.
///
/// On success the process root is the configured rootfs, its working
/// directory is `/`, and nothing of the previous root is mounted. On failure
/// no partially set up container is left to hand off.
///
/// # Errors
///
/// Returns the first error encountered, tagged with the failing step or
/// mount target.
pub fn enter<O: MountOps + ?Sized>(ops: &O, config: &BootstrapConfig) -> Result<()> {
    config.validate()?;

    if config.mode == TransitionMode::ProcRemount {
        return pseudofs::remount_proc(ops);
    }

    let rootfs = RootfsHandle::resolve(&config.rootfs)?;
    tracing::info!(rootfs = %rootfs.path().display(), "entering new root");

    propagation::make_private(ops, Path::new("/"))?;
    pivot_root::pivot_into(ops, &rootfs)?;

    if config.pseudo_filesystems {
        pseudofs::populate_virtual_filesystems(ops, config.sys_policy, &config.cgroup_dirs)?;
    }

    if config.verify_no_leak {
        verify_no_leak(ops)?;
    }

    tracing::info!(rootfs = %rootfs.path().display(), "root transition complete");
    Ok(())
}

/// Fails if any mount entry still lives under an old-root holder.
///
/// An unreadable mount table (for instance when `/proc` was not mounted) is
/// logged and treated as clean.
///
/// # Errors
///
/// Returns [`RootswitchError::CleanupFailed`] naming the first leftover.
pub fn verify_no_leak<O: MountOps + ?Sized>(ops: &O) -> Result<()> {
    let points = match ops.mount_points() {
        Ok(points) => points,
        Err(e) => {
            tracing::warn!(error = %e, "mount table unreadable; skipping leak check");
            return Ok(());
        }
    };

    if let Some(leftover) = mountinfo::holder_leftovers(&points).first() {
        return Err(RootswitchError::CleanupFailed {
            step: Step::LeakCheck,
            path: leftover.to_path_buf(),
            source: io::Error::other("old root is still mounted"),
        });
    }
    tracing::debug!(mounts = points.len(), "no old-root mounts left");
    Ok(())
}
