//! Adjust X11 display gamma with `xgamma` and re-apply it at every login.
//!
//! This crate holds the gamma value model, runs the `xgamma` executable and
//! manages a freedesktop autostart entry that replays the chosen values
//! when the user logs in.
//!
//! # Requirements
//!
//! - An X11 session
//! - `xgamma` on `PATH` (`x11-xserver-utils` on Debian/Ubuntu,
//!   `xorg-x11-server-utils` on Fedora, `xorg-xgamma` on Arch)
//!
//! # Example
//!
//! ```no_run
//! use xgamma_core::{Channel, GammaController, Settings};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::detect();
//!
//!     // Halt here if xgamma is missing
//!     let tool = settings.locate_tool()?;
//!     let mut controller = GammaController::with_settings(tool, &settings);
//!
//!     // Start from what the display currently uses
//!     controller.load_current()?;
//!
//!     // Warm the picture up a little
//!     controller.set_channel(Channel::Red, 1.1)?;
//!     controller.set_channel(Channel::Blue, 0.9)?;
//!
//!     // Re-apply at every login
//!     controller.save()?;
//!
//!     // Back to identity gamma, autostart entry removed
//!     controller.reset()?;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! Use [`MockTool`] to test code without an X server:
//!
//! ```
//! use xgamma_core::{GammaController, MockTool};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let mut controller = GammaController::new(MockTool::new(), dir.path());
//! controller.set_all(1.5).unwrap();
//! assert_eq!(controller.tool().last_call().unwrap(), ["-gamma", "1.50"]);
//! ```

#![warn(missing_docs)]

mod autostart;
mod controller;
mod desktop;
mod detect;
mod error;
mod mock;
mod preview;
mod settings;
mod state;
mod tool;

// Re-export public API
pub use autostart::{AutostartStore, ENTRY_FILE_NAME, MARKER_KEY, MARKER_VALUE};
pub use controller::GammaController;
pub use desktop::{DesktopEntry, join_exec, split_exec};
pub use detect::{LimitedSupport, SessionInfo, classify, detect_limited_gamma_support};
pub use error::{DependencyMissing, GammaError, InvocationError, PersistError};
pub use mock::MockTool;
pub use preview::{Bitmap, ReferencePattern};
pub use settings::Settings;
pub use state::{
    Channel, DEFAULT_GAMMA, GAMMA_STEP, GammaSnapshot, GammaState, GammaValue, MAX_GAMMA,
    MIN_GAMMA,
};
pub use tool::{DEFAULT_TIMEOUT, GammaTool, TOOL_NAME, XGamma, check_available, parse_report};
