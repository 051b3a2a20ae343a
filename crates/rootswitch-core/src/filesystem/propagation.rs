//! Mount propagation control.
//!
//! Marking `/` recursively private is the first mutation of every
//! transition: only after it do the bind mount, the pivot and the old-root
//! detach stay invisible to the host mount namespace.

use std::path::Path;

use nix::mount::MsFlags;
use rootswitch_common::error::{Result, RootswitchError};
use rootswitch_common::types::{PropagationScope, Step};

use crate::filesystem::mount::MountTarget;
use crate::sys::MountOps;

/// Recursively marks the subtree at `path` private.
///
/// Equivalent to `mount --make-rprivate <path>`. Applying it to an already
/// private tree succeeds and leaves the mount table unchanged.
///
/// # Errors
///
/// Returns [`RootswitchError::PermissionDenied`] without `CAP_SYS_ADMIN`
/// in the owning user namespace, or [`RootswitchError::TransitionFailed`]
/// if `path` is not a mount point.
pub fn make_private<O: MountOps + ?Sized>(ops: &O, path: &Path) -> Result<()> {
    set_propagation(ops, path, PropagationScope::Private)
}

/// Recursively applies `scope` to the subtree at `path`.
///
/// # Errors
///
/// See [`make_private`].
pub fn set_propagation<O: MountOps + ?Sized>(
    ops: &O,
    path: &Path,
    scope: PropagationScope,
) -> Result<()> {
    apply(ops, path, scope, Step::Propagation)
}

/// Same as [`set_propagation`], attributing failures to `step`.
pub(crate) fn apply<O: MountOps + ?Sized>(
    ops: &O,
    path: &Path,
    scope: PropagationScope,
    step: Step,
) -> Result<()> {
    let flags = match scope {
        PropagationScope::Private => MsFlags::MS_PRIVATE,
        PropagationScope::Shared => MsFlags::MS_SHARED,
    } | MsFlags::MS_REC;

    ops.mount(&MountTarget::propagation(path, flags))
        .map_err(|e| RootswitchError::transition(step, e))?;
    tracing::debug!(path = %path.display(), %scope, "mount propagation set");
    Ok(())
}
