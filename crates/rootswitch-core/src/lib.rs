//! # rootswitch-core
//!
//! The filesystem-isolation transition of a container process:
//! - **Propagation**: recursive private/shared propagation of mount subtrees.
//! - **Root transition**: bind-mount, `pivot_root(2)` and old-root detach,
//!   wrapped in a scoped guard that always releases the old-root holder.
//! - **Pseudo-filesystems**: `/proc`, `/sys`, cgroup tmpfs, `/dev`, `/run`,
//!   `/tmp` inside the new root.
//!
//! All privileged calls go through [`sys::MountOps`]; [`sys::HostMounts`]
//! performs them for real.

pub mod filesystem;
pub mod mountinfo;
pub mod sys;
pub mod transition;

#[cfg(test)]
pub(crate) mod testing;

pub use filesystem::pivot_root::{RootfsHandle, pivot};
pub use filesystem::propagation::make_private;
pub use filesystem::pseudofs::{populate_virtual_filesystems, remount_proc};
pub use sys::{HostMounts, MountOps};
pub use transition::enter;
