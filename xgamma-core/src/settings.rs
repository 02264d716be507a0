//! Runtime settings.

use crate::error::DependencyMissing;
use crate::tool::{DEFAULT_TIMEOUT, TOOL_NAME, XGamma};

use std::path::PathBuf;
use std::time::Duration;

/// Where to find the tool and where to persist the autostart entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Executable name looked up on `PATH`.
    pub tool_name: String,
    /// Directory holding login autostart entries.
    pub autostart_dir: PathBuf,
    /// Time limit for one tool invocation.
    pub timeout: Duration,
}

impl Settings {
    /// Defaults for the current user.
    ///
    /// The autostart directory is `$XDG_CONFIG_HOME/autostart`, falling back
    /// to `$HOME/.config/autostart`.
    pub fn detect() -> Self {
        Self {
            tool_name: TOOL_NAME.to_string(),
            autostart_dir: default_autostart_dir(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Resolve the configured tool on `PATH`.
    pub fn locate_tool(&self) -> Result<XGamma, DependencyMissing> {
        XGamma::locate_named(&self.tool_name).map(|tool| tool.timeout(self.timeout))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::detect()
    }
}

fn default_autostart_dir() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("autostart")
}
