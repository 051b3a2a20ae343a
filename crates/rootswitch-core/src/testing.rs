//! Recording [`MountOps`] for unit tests.
//!
//! Keeps a toy mount table and enforces the kernel rules the transition
//! depends on: propagation changes and pivots need a mount point, a
//! mounted directory cannot be removed, and after a pivot absolute paths
//! resolve under the new root. Directory operations hit the real
//! filesystem (always a tempdir), so tests can check what is left on disk.

use std::cell::{Cell, RefCell};
use std::io;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::mount::MsFlags;
use rootswitch_common::constants::PIVOT_DIR_PREFIX;

use crate::filesystem::mount::MountTarget;
use crate::sys::MountOps;

/// One recorded call, in the caller's view of the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Mount {
        target: PathBuf,
        fstype: Option<&'static str>,
        flags: MsFlags,
    },
    Unmount(PathBuf),
    PivotRoot {
        new_root: PathBuf,
        put_old: PathBuf,
    },
    Chdir(PathBuf),
    CreateDir(PathBuf),
    CreateDirAll(PathBuf),
    RemoveDir(PathBuf),
    ReadMounts,
}

impl Call {
    pub(crate) const fn label(&self) -> &'static str {
        match self {
            Self::Mount { .. } => "mount",
            Self::Unmount(_) => "umount",
            Self::PivotRoot { .. } => "pivot_root",
            Self::Chdir(_) => "chdir",
            Self::CreateDir(_) => "mkdir",
            Self::CreateDirAll(_) => "mkdir -p",
            Self::RemoveDir(_) => "rmdir",
            Self::ReadMounts => "read-mounts",
        }
    }
}

struct Fault {
    when: Box<dyn Fn(&Call) -> bool>,
    errno: Errno,
    once: bool,
    panics: bool,
    fired: Cell<bool>,
}

pub(crate) struct FakeMounts {
    calls: RefCell<Vec<Call>>,
    table: RefCell<Vec<PathBuf>>,
    root: RefCell<Option<PathBuf>>,
    faults: Vec<Fault>,
    skip_bind: bool,
}

impl std::fmt::Debug for FakeMounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeMounts")
            .field("calls", &self.calls)
            .field("table", &self.table)
            .field("root", &self.root)
            .field("faults", &self.faults.len())
            .field("skip_bind", &self.skip_bind)
            .finish()
    }
}

impl FakeMounts {
    pub(crate) fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            table: RefCell::new(vec![PathBuf::from("/")]),
            root: RefCell::new(None),
            faults: Vec::new(),
            skip_bind: false,
        }
    }

    /// Marks a host path as already mounted.
    pub(crate) fn with_mount_point(self, path: &Path) -> Self {
        self.table.borrow_mut().push(path.to_path_buf());
        self
    }

    /// Starts the fake as if a pivot into `root` already happened.
    pub(crate) fn pivoted_into(self, root: &Path) -> Self {
        let _ = self.root.replace(Some(root.to_path_buf()));
        self
    }

    /// Records bind mounts without adding them to the table.
    pub(crate) fn skip_bind_mounts(mut self) -> Self {
        self.skip_bind = true;
        self
    }

    pub(crate) fn fail_once<F>(self, when: F, errno: Errno) -> Self
    where
        F: Fn(&Call) -> bool + 'static,
    {
        self.with_fault(when, errno, true)
    }

    pub(crate) fn fail_always<F>(self, when: F, errno: Errno) -> Self
    where
        F: Fn(&Call) -> bool + 'static,
    {
        self.with_fault(when, errno, false)
    }

    /// Panics (once) on the first matching call, after recording it.
    pub(crate) fn panic_on<F>(mut self, when: F) -> Self
    where
        F: Fn(&Call) -> bool + 'static,
    {
        self.faults.push(Fault {
            when: Box::new(when),
            errno: Errno::UnknownErrno,
            once: true,
            panics: true,
            fired: Cell::new(false),
        });
        self
    }

    fn with_fault<F>(mut self, when: F, errno: Errno, once: bool) -> Self
    where
        F: Fn(&Call) -> bool + 'static,
    {
        self.faults.push(Fault {
            when: Box::new(when),
            errno,
            once,
            panics: false,
            fired: Cell::new(false),
        });
        self
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Host-side mount table, sorted.
    pub(crate) fn mount_table(&self) -> Vec<PathBuf> {
        let mut table = self.table.borrow().clone();
        table.sort();
        table
    }

    pub(crate) fn current_root(&self) -> Option<PathBuf> {
        self.root.borrow().clone()
    }

    fn record(&self, call: Call) -> io::Result<()> {
        let failure = self.faults.iter().find_map(|fault| {
            let armed = !(fault.once && fault.fired.get());
            if armed && (fault.when)(&call) {
                fault.fired.set(true);
                Some((fault.errno, fault.panics))
            } else {
                None
            }
        });
        self.calls.borrow_mut().push(call);
        match failure {
            None => Ok(()),
            Some((_, true)) => panic!("injected panic"),
            Some((errno, false)) => Err(errno.into()),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match (&*self.root.borrow(), path.strip_prefix("/")) {
            (Some(root), Ok(rest)) if rest.as_os_str().is_empty() => root.clone(),
            (Some(root), Ok(rest)) => root.join(rest),
            _ => path.to_path_buf(),
        }
    }

    fn view(&self, host: &Path) -> Option<PathBuf> {
        match &*self.root.borrow() {
            Some(root) => host
                .strip_prefix(root)
                .ok()
                .map(|rest| Path::new("/").join(rest)),
            None => Some(host.to_path_buf()),
        }
    }

    fn is_mounted(&self, host: &Path) -> bool {
        self.table.borrow().iter().any(|p| p == host)
    }
}

impl MountOps for FakeMounts {
    fn mount(&self, target: &MountTarget) -> io::Result<()> {
        self.record(Call::Mount {
            target: target.target().to_path_buf(),
            fstype: target.fstype(),
            flags: target.flags(),
        })?;
        let host = self.resolve(target.target());
        if target.creates_mount() {
            if !(self.skip_bind && target.flags().contains(MsFlags::MS_BIND)) {
                self.table.borrow_mut().push(host);
            }
            Ok(())
        } else if self.is_mounted(&host) {
            Ok(())
        } else {
            Err(Errno::EINVAL.into())
        }
    }

    fn unmount_detached(&self, path: &Path) -> io::Result<()> {
        self.record(Call::Unmount(path.to_path_buf()))?;
        let host = self.resolve(path);
        if !self.is_mounted(&host) {
            return Err(Errno::EINVAL.into());
        }
        self.table.borrow_mut().retain(|p| !p.starts_with(&host));
        Ok(())
    }

    fn pivot_root(&self, new_root: &Path, put_old: &Path) -> io::Result<()> {
        self.record(Call::PivotRoot {
            new_root: new_root.to_path_buf(),
            put_old: put_old.to_path_buf(),
        })?;
        let new_host = self.resolve(new_root);
        let old_host = self.resolve(put_old);
        if !self.is_mounted(&new_host) {
            return Err(Errno::EINVAL.into());
        }
        if !old_host.is_dir() {
            return Err(Errno::ENOENT.into());
        }
        let current = self.resolve(Path::new("/"));
        {
            let mut table = self.table.borrow_mut();
            table.retain(|p| p != &current);
            table.push(old_host);
        }
        let _ = self.root.replace(Some(new_host));
        Ok(())
    }

    fn chdir(&self, path: &Path) -> io::Result<()> {
        self.record(Call::Chdir(path.to_path_buf()))
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        self.record(Call::CreateDir(path.to_path_buf()))?;
        std::fs::create_dir(self.resolve(path))
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.record(Call::CreateDirAll(path.to_path_buf()))?;
        std::fs::create_dir_all(self.resolve(path))
    }

    fn remove_dir(&self, path: &Path) -> io::Result<()> {
        self.record(Call::RemoveDir(path.to_path_buf()))?;
        let host = self.resolve(path);
        if self.is_mounted(&host) {
            return Err(Errno::EBUSY.into());
        }
        std::fs::remove_dir(host)
    }

    fn mount_points(&self) -> io::Result<Vec<PathBuf>> {
        self.record(Call::ReadMounts)?;
        Ok(self
            .table
            .borrow()
            .iter()
            .filter_map(|p| self.view(p))
            .collect())
    }
}

/// Holder directories left directly under `dir`.
pub(crate) fn holders_in(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_name().to_string_lossy().starts_with(PIVOT_DIR_PREFIX))
                .map(|e| e.path())
                .collect()
        })
        .unwrap_or_default()
}
