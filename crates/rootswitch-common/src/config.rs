//! Bootstrap configuration for a single root transition.
//!
//! Built once at process start (from defaults, an optional JSON file, and
//! command-line overrides) and passed by reference into the transition entry
//! point. Nothing here is stored in process-global state.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, RootswitchError};
use crate::types::{SysPolicy, TransitionMode};

/// Everything the transition needs to know, fixed before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapConfig {
    /// Directory tree that becomes `/`.
    pub rootfs: PathBuf,
    /// Whether to pivot or only remount `/proc`.
    pub mode: TransitionMode,
    /// Mount `/proc`, `/sys`, `/dev`, `/run`, `/tmp` after the pivot.
    pub pseudo_filesystems: bool,
    /// Final state of `/sys`.
    pub sys_policy: SysPolicy,
    /// Directories created inside the cgroup tmpfs before `/sys` is sealed.
    pub cgroup_dirs: Vec<String>,
    /// Scan the mount table for old-root leftovers once the transition is done.
    pub verify_no_leak: bool,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            rootfs: PathBuf::from(crate::constants::DEFAULT_ROOTFS),
            mode: TransitionMode::default(),
            pseudo_filesystems: true,
            sys_policy: SysPolicy::default(),
            cgroup_dirs: Vec::new(),
            verify_no_leak: true,
        }
    }
}

impl BootstrapConfig {
    /// Creates a configuration for `rootfs` with every other field defaulted.
    #[must_use]
    pub fn new(rootfs: impl Into<PathBuf>) -> Self {
        Self {
            rootfs: rootfs.into(),
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file.
    ///
    /// Missing fields take their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails [`BootstrapConfig::validate`].
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| RootswitchError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "bootstrap config loaded");
        Ok(config)
    }

    /// Checks the values that can be checked without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns [`RootswitchError::Config`] if the rootfs path is empty or a
    /// cgroup directory name is not a single plain path component.
    pub fn validate(&self) -> Result<()> {
        if self.mode == TransitionMode::Pivot && self.rootfs.as_os_str().is_empty() {
            return Err(RootswitchError::Config {
                message: "rootfs path must not be empty".into(),
            });
        }
        for dir in &self.cgroup_dirs {
            let mut components = Path::new(dir).components();
            let plain = matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            );
            if !plain {
                return Err(RootswitchError::Config {
                    message: format!("cgroup directory must be a plain name: {dir:?}"),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_pivots_into_default_rootfs() {
        let config = BootstrapConfig::default();
        assert_eq!(config.rootfs, Path::new(crate::constants::DEFAULT_ROOTFS));
        assert_eq!(config.mode, TransitionMode::Pivot);
        assert!(config.pseudo_filesystems);
        assert!(config.verify_no_leak);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_fills_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bootstrap.json");
        std::fs::write(
            &path,
            r#"{ "rootfs": "/srv/root", "sys_policy": "read-write", "cgroup_dirs": ["app"] }"#,
        )
        .expect("write");

        let config = BootstrapConfig::load(&path).expect("load");
        assert_eq!(config.rootfs, Path::new("/srv/root"));
        assert_eq!(config.sys_policy, SysPolicy::ReadWrite);
        assert_eq!(config.cgroup_dirs, vec!["app".to_string()]);
        assert!(config.pseudo_filesystems);
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bootstrap.json");
        std::fs::write(&path, r#"{ "rootfs": "/srv/root", "network": true }"#).expect("write");

        let err = BootstrapConfig::load(&path).expect_err("unknown field");
        assert!(matches!(err, RootswitchError::Serialization { .. }));
    }

    #[test]
    fn load_missing_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let err = BootstrapConfig::load(&path).expect_err("missing file");
        assert!(matches!(err, RootswitchError::Io { path: p, .. } if p == path));
    }

    #[test]
    fn validate_rejects_nested_cgroup_dir() {
        let mut config = BootstrapConfig::new("/srv/root");
        config.cgroup_dirs = vec!["../escape".into()];
        assert!(config.validate().is_err());
        config.cgroup_dirs = vec!["a/b".into()];
        assert!(config.validate().is_err());
        config.cgroup_dirs = vec!["app".into()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_rootfs_for_pivot_only() {
        let mut config = BootstrapConfig::new("");
        assert!(config.validate().is_err());
        config.mode = TransitionMode::ProcRemount;
        assert!(config.validate().is_ok());
    }
}
