//! The syscall seam for every mount-table and root mutation.
//!
//! The transition code never calls `mount(2)`, `umount2(2)`, `pivot_root(2)`
//! or `chdir(2)` directly; it goes through [`MountOps`] so the ordering and
//! rollback logic can be driven by a recording implementation in tests.
//! [`HostMounts`] is the implementation that talks to the kernel.

use std::io;
use std::path::{Path, PathBuf};

use crate::filesystem::mount::MountTarget;

/// Privileged filesystem operations used by the root transition.
///
/// All methods report the raw OS error; callers attach the step that failed.
pub trait MountOps {
    /// Performs one `mount(2)` call.
    ///
    /// # Errors
    ///
    /// Returns the OS error reported by the kernel.
    fn mount(&self, target: &MountTarget) -> io::Result<()>;

    /// Lazily detaches the mount at `path` (`MNT_DETACH`).
    ///
    /// # Errors
    ///
    /// Returns the OS error reported by the kernel.
    fn unmount_detached(&self, path: &Path) -> io::Result<()>;

    /// Moves the root mount to `put_old` and makes `new_root` the new root.
    ///
    /// # Errors
    ///
    /// Returns the OS error reported by the kernel.
    fn pivot_root(&self, new_root: &Path, put_old: &Path) -> io::Result<()>;

    /// Changes the process working directory.
    ///
    /// # Errors
    ///
    /// Returns the OS error reported by the kernel.
    fn chdir(&self, path: &Path) -> io::Result<()>;

    /// Creates a single directory; fails if it already exists.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn create_dir(&self, path: &Path) -> io::Result<()>;

    /// Creates a directory and any missing parents.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Removes an empty directory.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    fn remove_dir(&self, path: &Path) -> io::Result<()>;

    /// Lists the mount points visible in the caller's mount namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the mount table cannot be read.
    fn mount_points(&self) -> io::Result<Vec<PathBuf>>;

    /// Reports whether `path` is itself a mount point.
    ///
    /// # Errors
    ///
    /// Returns an error if the mount table cannot be read.
    fn is_mount_point(&self, path: &Path) -> io::Result<bool> {
        Ok(self.mount_points()?.iter().any(|p| p == path))
    }
}

/// [`MountOps`] backed by real syscalls.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostMounts;

#[cfg(target_os = "linux")]
impl MountOps for HostMounts {
    fn mount(&self, target: &MountTarget) -> io::Result<()> {
        tracing::debug!(mount = %target, data = ?target.data(), "mount");
        nix::mount::mount(
            target.source(),
            target.target(),
            target.fstype(),
            target.flags(),
            target.data(),
        )
        .map_err(io::Error::from)
    }

    fn unmount_detached(&self, path: &Path) -> io::Result<()> {
        tracing::debug!(path = %path.display(), "detach unmount");
        nix::mount::umount2(path, nix::mount::MntFlags::MNT_DETACH).map_err(io::Error::from)
    }

    fn pivot_root(&self, new_root: &Path, put_old: &Path) -> io::Result<()> {
        tracing::debug!(
            new_root = %new_root.display(),
            put_old = %put_old.display(),
            "pivot_root"
        );
        nix::unistd::pivot_root(new_root, put_old).map_err(io::Error::from)
    }

    fn chdir(&self, path: &Path) -> io::Result<()> {
        nix::unistd::chdir(path).map_err(io::Error::from)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir(path)
    }

    fn mount_points(&self) -> io::Result<Vec<PathBuf>> {
        crate::mountinfo::read_mount_points()
    }
}

#[cfg(not(target_os = "linux"))]
impl MountOps for HostMounts {
    fn mount(&self, _target: &MountTarget) -> io::Result<()> {
        Err(unsupported())
    }

    fn unmount_detached(&self, _path: &Path) -> io::Result<()> {
        Err(unsupported())
    }

    fn pivot_root(&self, _new_root: &Path, _put_old: &Path) -> io::Result<()> {
        Err(unsupported())
    }

    fn chdir(&self, path: &Path) -> io::Result<()> {
        std::env::set_current_dir(path)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir(path)
    }

    fn mount_points(&self) -> io::Result<Vec<PathBuf>> {
        Err(unsupported())
    }
}

#[cfg(not(target_os = "linux"))]
fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "Linux required for mount namespace operations",
    )
}
