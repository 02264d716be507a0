//! Mock gamma tool for testing.

use crate::error::InvocationError;
use crate::state::{GammaSnapshot, GammaValue};
use crate::tool::GammaTool;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A mock gamma tool for testing.
///
/// This allows testing code that depends on [`GammaTool`] without an X
/// server or the `xgamma` binary. Every `apply` call is recorded, and the
/// mock tracks the gamma it would have set so [`GammaTool::query`] reflects
/// earlier calls.
///
/// # Example
///
/// ```
/// use xgamma_core::{GammaTool, MockTool};
///
/// let mock = MockTool::new();
/// mock.apply(&["-gamma".to_string(), "1.50".to_string()]).unwrap();
/// assert_eq!(mock.query().unwrap().red.to_string(), "1.50");
/// ```
pub struct MockTool {
    program: PathBuf,
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    calls: Vec<Vec<String>>,
    current: GammaSnapshot,
    failing: bool,
}

impl MockTool {
    /// Create a mock at `/usr/bin/xgamma` reporting identity gamma.
    pub fn new() -> Self {
        Self::with_program("/usr/bin/xgamma")
    }

    /// Create a mock reporting `program` as its executable path.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Create a mock whose display currently has `current` gamma.
    pub fn with_current(current: GammaSnapshot) -> Self {
        let mock = Self::new();
        mock.lock().current = current;
        mock
    }

    /// Make every following invocation fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.lock().failing = failing;
    }

    /// Arguments of every successful or failed `apply` call, oldest first.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.lock().calls.clone()
    }

    /// Arguments of the most recent `apply` call.
    pub fn last_call(&self) -> Option<Vec<String>> {
        self.lock().calls.last().cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn failure(&self) -> InvocationError {
        InvocationError::Spawn {
            program: self.program.clone(),
            source: io::Error::other("mock failure"),
        }
    }
}

impl Default for MockTool {
    fn default() -> Self {
        Self::new()
    }
}

impl GammaTool for MockTool {
    fn program(&self) -> &Path {
        &self.program
    }

    fn apply(&self, args: &[String]) -> Result<(), InvocationError> {
        let mut inner = self.lock();
        inner.calls.push(args.to_vec());
        if inner.failing {
            drop(inner);
            return Err(self.failure());
        }

        let mut current = inner.current;
        for pair in args.chunks(2) {
            let [flag, value] = pair else { continue };
            let Some(value) = GammaValue::parse(value) else {
                continue;
            };
            match flag.as_str() {
                "-gamma" => current = GammaSnapshot::uniform(value),
                "-rgamma" => current.red = value,
                "-ggamma" => current.green = value,
                "-bgamma" => current.blue = value,
                _ => {}
            }
        }
        inner.current = current;
        Ok(())
    }

    fn query(&self) -> Result<GammaSnapshot, InvocationError> {
        let inner = self.lock();
        if inner.failing {
            drop(inner);
            return Err(self.failure());
        }
        Ok(inner.current)
    }
}
