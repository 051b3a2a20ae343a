//! Secure root filesystem switching via `pivot_root(2)`.
//!
//! More secure than `chroot` because it actually changes the root mount
//! point rather than just the process's view of `/`, and the old root is
//! detached afterwards so nothing of the host tree stays reachable.

use std::path::{Path, PathBuf};

use rootswitch_common::error::{Result, RootswitchError};
use rootswitch_common::types::{PropagationScope, Step};

use crate::filesystem::guard::PivotGuard;
use crate::filesystem::mount::MountTarget;
use crate::filesystem::propagation;
use crate::sys::MountOps;

/// Canonical absolute path of a directory that can become the new root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootfsHandle {
    path: PathBuf,
}

impl RootfsHandle {
    /// Validates `path` without touching the mount table.
    ///
    /// # Errors
    ///
    /// Returns [`RootswitchError::PreconditionFailed`] if the path does not
    /// exist, cannot be resolved, is not a directory, or is already `/`.
    pub fn resolve(path: &Path) -> Result<Self> {
        let precondition = |reason: String| RootswitchError::PreconditionFailed {
            path: path.to_path_buf(),
            reason,
        };

        let canonical = path
            .canonicalize()
            .map_err(|e| precondition(format!("cannot resolve rootfs: {e}")))?;
        let meta = std::fs::metadata(&canonical)
            .map_err(|e| precondition(format!("cannot stat rootfs: {e}")))?;
        if !meta.is_dir() {
            return Err(precondition("rootfs is not a directory".into()));
        }
        if canonical == Path::new("/") {
            return Err(precondition("rootfs is already the current root".into()));
        }

        Ok(Self { path: canonical })
    }

    /// The canonical rootfs path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Switches the process root to `new_root` and detaches the old root.
///
/// The caller is expected to have made `/` private first (see
/// [`propagation::make_private`]).
///
/// # Errors
///
/// Returns [`RootswitchError::PreconditionFailed`] before any mutation if
/// `new_root` is unusable, [`RootswitchError::TransitionFailed`] or
/// [`RootswitchError::PermissionDenied`] if a step fails, and
/// [`RootswitchError::CleanupFailed`] if the old root could not be detached
/// or its holder removed.
pub fn pivot<O: MountOps + ?Sized>(ops: &O, new_root: &Path) -> Result<()> {
    let rootfs = RootfsHandle::resolve(new_root)?;
    pivot_into(ops, &rootfs)
}

/// Same as [`pivot`] for an already validated rootfs.
///
/// # Errors
///
/// See [`pivot`].
pub fn pivot_into<O: MountOps + ?Sized>(ops: &O, rootfs: &RootfsHandle) -> Result<()> {
    tracing::info!(new_root = %rootfs.path().display(), "performing pivot_root");

    let bound = ensure_mount_point(ops, rootfs.path())?;

    let mut guard = PivotGuard::create(ops, rootfs.path(), bound)?;
    let result = swap_root(&mut guard);
    guard.finish(result)?;

    tracing::info!("old root detached");
    Ok(())
}

/// Bind-mounts `root` onto itself unless it already is a mount point.
/// Returns whether a bind mount was made.
fn ensure_mount_point<O: MountOps + ?Sized>(ops: &O, root: &Path) -> Result<bool> {
    let mounted = ops.is_mount_point(root).unwrap_or_else(|e| {
        tracing::warn!(
            path = %root.display(),
            error = %e,
            "cannot determine mount status; assuming not mounted"
        );
        false
    });
    if mounted {
        tracing::debug!(path = %root.display(), "rootfs is already a mount point");
        return Ok(false);
    }

    ops.mount(&MountTarget::self_bind(root))
        .map_err(|e| RootswitchError::transition(Step::BindMount, e))?;
    tracing::debug!(path = %root.display(), "rootfs bind-mounted onto itself");
    Ok(true)
}

fn swap_root<O: MountOps + ?Sized>(guard: &mut PivotGuard<'_, O>) -> Result<()> {
    let ops = guard.ops();

    ops.pivot_root(guard.state().new_root(), guard.state().holder())
        .map_err(|e| RootswitchError::transition(Step::Pivot, e))?;
    guard.mark_pivoted();
    let holder = guard.state().holder().to_path_buf();

    ops.chdir(Path::new("/"))
        .map_err(|e| RootswitchError::transition(Step::Chdir, e))?;

    // The old root keeps whatever propagation it had on the host.
    propagation::apply(ops, &holder, PropagationScope::Private, Step::HolderPrivatize)?;

    ops.unmount_detached(&holder)
        .map_err(|e| RootswitchError::cleanup(Step::HolderUnmount, &holder, e))?;
    guard.mark_detached();

    ops.remove_dir(&holder)
        .map_err(|e| RootswitchError::cleanup(Step::HolderRemove, &holder, e))
}
