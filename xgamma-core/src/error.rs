//! Error types for gamma control and autostart persistence.

use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

/// The gamma tool could not be found at startup.
///
/// Nothing else in the crate is usable without it, so callers should stop
/// and show [`DependencyMissing::install_hints`] instead of building a
/// controller.
#[derive(Debug, thiserror::Error)]
#[error("`{tool}` is not installed or not found in PATH")]
pub struct DependencyMissing {
    /// Name of the executable that was searched for.
    pub tool: String,
    /// The lookup failure reported by the resolver.
    #[source]
    pub source: which::Error,
}

impl DependencyMissing {
    /// Distribution packages that ship the tool, as `(distribution, command)` pairs.
    pub fn install_hints(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("Ubuntu/Debian", "sudo apt-get install x11-xserver-utils"),
            ("Fedora", "sudo dnf install xorg-x11-server-utils"),
            ("Arch Linux", "sudo pacman -S xorg-xgamma"),
        ]
    }
}

/// Errors from running the gamma tool.
#[derive(Debug, thiserror::Error)]
pub enum InvocationError {
    /// The process could not be started or waited on.
    #[error("failed to run {program}: {source}")]
    Spawn {
        /// The program that was executed.
        program: PathBuf,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The process ran but reported failure.
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        /// The program that was executed.
        program: PathBuf,
        /// Exit status of the process.
        status: ExitStatus,
        /// Captured standard error, trimmed.
        stderr: String,
    },

    /// The process did not exit within the allowed time and was killed.
    #[error("{program} did not finish within {timeout:?}")]
    TimedOut {
        /// The program that was executed.
        program: PathBuf,
        /// The time limit that expired.
        timeout: Duration,
    },
}

/// Errors from reading or writing the autostart directory.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// The autostart directory could not be created.
    #[error("failed to create autostart directory {path}: {source}")]
    CreateDir {
        /// Directory that was being created.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The autostart directory could not be listed.
    #[error("failed to read autostart directory {path}: {source}")]
    ReadDir {
        /// Directory that was being listed.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// The autostart entry could not be written.
    #[error("failed to write autostart entry {path}: {source}")]
    Write {
        /// Destination file.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A managed autostart entry could not be deleted.
    #[error("failed to remove autostart entry {path}: {source}")]
    Remove {
        /// File that was being removed.
        path: PathBuf,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by [`GammaController`](crate::GammaController) operations.
#[derive(Debug, thiserror::Error)]
pub enum GammaError {
    /// Applying gamma through the external tool failed.
    #[error(transparent)]
    Invocation(#[from] InvocationError),

    /// Writing or removing the autostart entry failed.
    #[error(transparent)]
    Persist(#[from] PersistError),
}
