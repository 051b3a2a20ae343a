//! System-wide constants and default paths.

/// Default rootfs used when neither the command line nor a config file names one.
pub const DEFAULT_ROOTFS: &str = "/system_red";

/// Basename prefix of the temporary directory that holds the old root.
pub const PIVOT_DIR_PREFIX: &str = ".pivot_root";

/// Process-information filesystem mount point.
pub const PROC_PATH: &str = "/proc";

/// Kernel-object filesystem mount point.
pub const SYS_PATH: &str = "/sys";

/// Cgroups v2 unified hierarchy mount point.
pub const CGROUP_V2_PATH: &str = "/sys/fs/cgroup";

/// Device-node filesystem mount point.
pub const DEV_PATH: &str = "/dev";

/// Runtime state tmpfs mount point.
pub const RUN_PATH: &str = "/run";

/// Scratch tmpfs mount point.
pub const TMP_PATH: &str = "/tmp";

/// Application name used in CLI output.
pub const APP_NAME: &str = "rootswitch";

/// Environment variable that enables tests which mutate a real mount namespace.
pub const PRIVILEGED_TESTS_ENV: &str = "ROOTSWITCH_PRIVILEGED_TESTS";
