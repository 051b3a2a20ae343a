//! Scoped release of the old-root holder directory.
//!
//! [`PivotGuard`] is created together with the holder directory and owns the
//! [`PivotState`]. Its release runs exactly once: through
//! [`PivotGuard::finish`] on every returning path, or from `Drop` while
//! unwinding, where errors can only be logged.

use std::io;
use std::path::{Path, PathBuf};

use rootswitch_common::constants::PIVOT_DIR_PREFIX;
use rootswitch_common::error::{Result, RootswitchError};
use rootswitch_common::types::Step;

use crate::sys::MountOps;

/// Where the old root lives and how far the pivot got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotState {
    new_root: PathBuf,
    holder: PathBuf,
    pivoted: bool,
    holder_detached: bool,
    bound_by_us: bool,
}

impl PivotState {
    /// The directory being pivoted into, as seen before the pivot.
    #[must_use]
    pub fn new_root(&self) -> &Path {
        &self.new_root
    }

    /// Current path of the holder: under `new_root` before the pivot,
    /// `/<basename>` after it.
    #[must_use]
    pub fn holder(&self) -> &Path {
        &self.holder
    }

    /// Whether `pivot_root(2)` has succeeded.
    #[must_use]
    pub const fn pivoted(&self) -> bool {
        self.pivoted
    }

    /// Whether the old root has already been detached from the holder.
    #[must_use]
    pub const fn holder_detached(&self) -> bool {
        self.holder_detached
    }

    /// Whether `new_root` was bind-mounted onto itself for this transition.
    #[must_use]
    pub const fn bound_by_us(&self) -> bool {
        self.bound_by_us
    }
}

/// Owns the holder directory for the duration of one transition.
#[derive(Debug)]
pub struct PivotGuard<'a, O: MountOps + ?Sized> {
    ops: &'a O,
    state: PivotState,
    released: bool,
}

impl<'a, O: MountOps + ?Sized> PivotGuard<'a, O> {
    /// Creates a uniquely named holder directory inside `new_root`.
    ///
    /// The holder must live inside the new root so that it travels with the
    /// pivot and ends up at `/<basename>`. `bound_by_us` records that
    /// `new_root` was bind-mounted onto itself just before; that mount is
    /// detached again on release unless the pivot went through.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created. The bind mount,
    /// if any, is detached first.
    pub fn create(ops: &'a O, new_root: &Path, bound_by_us: bool) -> Result<Self> {
        let name = format!("{PIVOT_DIR_PREFIX}{}", uuid::Uuid::new_v4().simple());
        let holder = new_root.join(name);
        if let Err(e) = ops.create_dir(&holder) {
            if bound_by_us {
                if let Err(err) = unbind(ops, new_root) {
                    tracing::error!(
                        error = %err,
                        "rootfs bind mount left in place after holder creation failed"
                    );
                }
            }
            return Err(RootswitchError::transition(Step::CreateHolder, e));
        }
        tracing::debug!(holder = %holder.display(), "old-root holder created");
        Ok(Self {
            ops,
            state: PivotState {
                new_root: new_root.to_path_buf(),
                holder,
                pivoted: false,
                holder_detached: false,
                bound_by_us,
            },
            released: false,
        })
    }

    /// The syscall backend this guard releases through.
    #[must_use]
    pub const fn ops(&self) -> &'a O {
        self.ops
    }

    /// Current transition state.
    #[must_use]
    pub const fn state(&self) -> &PivotState {
        &self.state
    }

    /// Records a successful pivot and rebases the holder onto the new root.
    pub fn mark_pivoted(&mut self) {
        if let Some(name) = self.state.holder.file_name() {
            self.state.holder = Path::new("/").join(name);
        }
        self.state.pivoted = true;
    }

    /// Records that the old root has been detached from the holder.
    pub fn mark_detached(&mut self) {
        self.state.holder_detached = true;
    }

    /// Releases the holder and merges the outcome with `result`.
    ///
    /// The first recorded error wins: a failure of the transition body is
    /// returned as-is and release failures are only logged. After an
    /// otherwise successful body, a release failure becomes the result.
    ///
    /// # Errors
    ///
    /// Returns the body's error, or the first release error.
    pub fn finish(mut self, result: Result<()>) -> Result<()> {
        let released = self.release();
        match (result, released) {
            (Err(e), Err(cleanup)) => {
                tracing::error!(
                    error = %cleanup,
                    "holder release failed after an earlier transition error"
                );
                Err(e)
            }
            (Err(e), Ok(())) => Err(e),
            (Ok(()), released) => released,
        }
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;

        let holder = self.state.holder.clone();
        let mut first: Option<RootswitchError> = None;

        if self.state.pivoted && !self.state.holder_detached {
            match self.ops.unmount_detached(&holder) {
                Ok(()) => self.state.holder_detached = true,
                Err(e) => {
                    tracing::error!(
                        holder = %holder.display(),
                        error = %e,
                        "old root is still mounted"
                    );
                    first = Some(RootswitchError::cleanup(Step::HolderUnmount, &holder, e));
                }
            }
        }

        match self.ops.remove_dir(&holder) {
            Ok(()) => tracing::debug!(holder = %holder.display(), "holder removed"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                let err = RootswitchError::cleanup(Step::HolderRemove, &holder, e);
                if first.is_none() {
                    first = Some(err);
                } else {
                    tracing::warn!(error = %err, "holder removal failed");
                }
            }
        }

        if self.state.bound_by_us && !self.state.pivoted {
            if let Err(err) = unbind(self.ops, &self.state.new_root) {
                if first.is_none() {
                    first = Some(err);
                } else {
                    tracing::warn!(error = %err, "rootfs unbind failed");
                }
            }
        }

        first.map_or(Ok(()), Err)
    }
}

fn unbind<O: MountOps + ?Sized>(ops: &O, new_root: &Path) -> Result<()> {
    ops.unmount_detached(new_root)
        .map_err(|e| RootswitchError::cleanup(Step::Unbind, new_root, e))?;
    tracing::debug!(path = %new_root.display(), "rootfs bind mount detached");
    Ok(())
}

impl<O: MountOps + ?Sized> Drop for PivotGuard<'_, O> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        tracing::warn!(
            holder = %self.state.holder.display(),
            "releasing old-root holder during unwind"
        );
        if let Err(e) = self.release() {
            tracing::error!(error = %e, "holder release failed during unwind");
        }
    }
}
