//! Failure reporting for CLI commands.
//!
//! Logs the failing step and OS error, and adds an operator hint where one
//! exists.

use std::io;
use std::path::Path;
use std::process::ExitCode;

use rootswitch_common::error::RootswitchError;

/// Turns a command result into the process exit status.
///
/// Domain errors are reported here, once, and yield a failure exit code.
/// Anything else is handed back for `main` to print.
///
/// # Errors
///
/// Returns `result`'s error unchanged when it is not a [`RootswitchError`].
pub fn exit_code(result: anyhow::Result<()>) -> anyhow::Result<ExitCode> {
    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => match e.downcast_ref::<RootswitchError>() {
            Some(err) => {
                report_failure(err);
                Ok(ExitCode::FAILURE)
            }
            None => Err(e),
        },
    }
}

/// Logs `err` with its step and prints a hint to stderr when useful.
pub fn report_failure(err: &RootswitchError) {
    match err.step() {
        Some(step) => tracing::error!(step = %step, error = %err, "root transition failed"),
        None => tracing::error!(error = %err, "rootswitch failed"),
    }
    if let Some(hint) = hint_for(err) {
        #[allow(clippy::print_stderr)]
        {
            eprintln!("{hint}");
        }
    }
}

/// Operator guidance for errors that have an obvious fix.
#[must_use]
pub fn hint_for(err: &RootswitchError) -> Option<String> {
    match err {
        RootswitchError::PreconditionFailed { path, .. } if !path.exists() => {
            Some(missing_rootfs_hint(path))
        }
        RootswitchError::MountFailed { source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            Some(permission_hint())
        }
        RootswitchError::PermissionDenied { .. } => Some(permission_hint()),
        _ => None,
    }
}

fn permission_hint() -> String {
    "Mount and pivot operations need CAP_SYS_ADMIN in the owning user namespace.\n\
     Run as root, or from a process started in new user and mount namespaces."
        .to_string()
}

fn missing_rootfs_hint(path: &Path) -> String {
    let p = path.display();
    format!(
        "\"{p}\" does not exist.\n\
         Please create this directory and unpack a suitable root filesystem inside it.\n\
         An example rootfs, BusyBox, can be downloaded from:\n\
         https://raw.githubusercontent.com/teddyking/ns-process/4.0/assets/busybox.tar\n\
         And unpacked by:\n\
         mkdir -p {p}\n\
         tar -C {p} -xf busybox.tar"
    )
}
