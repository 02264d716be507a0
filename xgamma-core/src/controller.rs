//! Gamma controller tying state, tool and autostart together.

use crate::autostart::AutostartStore;
use crate::error::{GammaError, InvocationError, PersistError};
use crate::settings::Settings;
use crate::state::{Channel, GammaSnapshot, GammaState, GammaValue};
use crate::tool::GammaTool;

use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Owns the gamma state and drives the tool and the autostart store.
///
/// Every mutating call updates the in-memory state first and then applies
/// it. When the tool fails the new values are kept; only the live display
/// may lag behind.
///
/// # Example
///
/// ```
/// use xgamma_core::{Channel, GammaController, MockTool};
///
/// let dir = tempfile::tempdir()?;
/// let mut controller = GammaController::new(MockTool::new(), dir.path());
///
/// controller.set_channel(Channel::Red, 7.0)?;
/// assert_eq!(controller.state().channel(Channel::Red).to_string(), "5.00");
///
/// controller.save()?;
/// assert_eq!(controller.reset()?, 1);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct GammaController<T: GammaTool> {
    state: GammaState,
    tool: T,
    store: AutostartStore,
}

impl<T: GammaTool> GammaController<T> {
    /// Create a controller with identity gamma, persisting into `autostart_dir`.
    pub fn new(tool: T, autostart_dir: impl Into<PathBuf>) -> Self {
        let store = AutostartStore::new(autostart_dir, tool.program());
        Self {
            state: GammaState::new(),
            tool,
            store,
        }
    }

    /// Create a controller using the directories from `settings`.
    pub fn with_settings(tool: T, settings: &Settings) -> Self {
        Self::new(tool, settings.autostart_dir.clone())
    }

    /// Current gamma values.
    pub fn state(&self) -> &GammaState {
        &self.state
    }

    /// The tool used to apply gamma.
    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// The autostart store.
    pub fn store(&self) -> &AutostartStore {
        &self.store
    }

    /// The executable embedded in autostart entries.
    pub fn program(&self) -> &Path {
        self.tool.program()
    }

    /// Load the gamma currently in effect on the display, without re-applying it.
    pub fn load_current(&mut self) -> Result<GammaSnapshot, InvocationError> {
        let current = self.tool.query()?;
        debug!(
            "current gamma: red={}, green={}, blue={}",
            current.red, current.green, current.blue
        );
        self.state.load(current);
        Ok(current)
    }

    /// Set one channel and apply all three.
    ///
    /// Returns the stored value. On error the value stays stored.
    pub fn set_channel(
        &mut self,
        channel: Channel,
        value: f64,
    ) -> Result<GammaValue, InvocationError> {
        let stored = self.state.set_channel(channel, value);
        self.apply()?;
        Ok(stored)
    }

    /// Set one channel from typed text and apply. Unparseable text keeps
    /// the current value and skips the tool.
    pub fn set_channel_text(
        &mut self,
        channel: Channel,
        text: &str,
    ) -> Result<GammaValue, InvocationError> {
        if GammaValue::parse(text).is_none() {
            debug!("ignoring non-numeric {} gamma {:?}", channel.label(), text);
            return Ok(self.state.channel(channel));
        }
        let stored = self.state.set_channel_text(channel, text);
        self.apply()?;
        Ok(stored)
    }

    /// Set every channel and apply with the overall flag.
    pub fn set_all(&mut self, value: f64) -> Result<GammaValue, InvocationError> {
        let stored = self.state.set_all(value);
        self.apply_overall()?;
        Ok(stored)
    }

    /// Set every channel from typed text. Returns `None` for unparseable text,
    /// in which case nothing changes.
    pub fn set_all_text(&mut self, text: &str) -> Result<Option<GammaValue>, InvocationError> {
        match self.state.set_all_text(text) {
            Some(stored) => {
                self.apply_overall()?;
                Ok(Some(stored))
            }
            None => Ok(None),
        }
    }

    /// Apply the current per-channel values.
    pub fn apply(&self) -> Result<(), InvocationError> {
        self.tool.apply(&self.state.to_command_arguments())
    }

    fn apply_overall(&self) -> Result<(), InvocationError> {
        match self.state.overall_arguments() {
            Some(args) => self.tool.apply(&args),
            None => self.apply(),
        }
    }

    /// Persist the current values as the login autostart entry.
    pub fn save(&self) -> Result<PathBuf, PersistError> {
        self.store.save(&self.state.to_command_arguments())
    }

    /// Restore identity gamma and delete every managed autostart entry.
    ///
    /// Returns the number of entries removed. The autostart purge runs even
    /// when applying identity gamma fails; that failure is then returned.
    pub fn reset(&mut self) -> Result<usize, GammaError> {
        self.state.reset();
        let applied = self.apply_overall();
        if let Err(e) = &applied {
            warn!("failed to apply default gamma: {}", e);
        }

        let removed = self.store.remove_all()?;
        applied?;
        info!("reset gamma to defaults, removed {} autostart entries", removed);
        Ok(removed)
    }

    /// Whether a managed autostart entry exists.
    pub fn is_saved(&self) -> Result<bool, PersistError> {
        self.store.is_installed()
    }
}
