//! Running the external gamma tool.

use crate::error::{DependencyMissing, InvocationError};
use crate::state::{Channel, GammaSnapshot, GammaValue};

use log::{debug, warn};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::{Duration, Instant};

/// Executable name searched for on `PATH`.
pub const TOOL_NAME: &str = "xgamma";

/// Default time a single invocation may take before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

// =============================================================================
// Gamma Tool Trait
// =============================================================================

/// Trait for gamma tool implementations.
///
/// This allows for mock implementations in tests.
pub trait GammaTool {
    /// Path of the executable, as embedded in autostart entries.
    fn program(&self) -> &Path;

    /// Run the tool with `args` and wait for it to exit.
    fn apply(&self, args: &[String]) -> Result<(), InvocationError>;

    /// Read the gamma currently in effect.
    fn query(&self) -> Result<GammaSnapshot, InvocationError>;
}

/// Whether `name` resolves to an executable on `PATH`.
pub fn check_available(name: &str) -> bool {
    which::which(name).is_ok()
}

// =============================================================================
// XGamma
// =============================================================================

/// The `xgamma` executable.
#[derive(Debug, Clone)]
pub struct XGamma {
    program: PathBuf,
    timeout: Duration,
}

impl XGamma {
    /// Resolve `xgamma` on `PATH`.
    ///
    /// # Errors
    ///
    /// [`DependencyMissing`] if the executable cannot be found.
    pub fn locate() -> Result<Self, DependencyMissing> {
        Self::locate_named(TOOL_NAME)
    }

    /// Resolve an executable by name on `PATH`.
    pub fn locate_named(name: &str) -> Result<Self, DependencyMissing> {
        match which::which(name) {
            Ok(program) => {
                debug!("found {} at {}", name, program.display());
                Ok(Self::with_program(program))
            }
            Err(source) => Err(DependencyMissing {
                tool: name.to_string(),
                source,
            }),
        }
    }

    /// Use an explicit executable path without searching `PATH`.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Change the per-invocation time limit.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(&self, args: &[String]) -> Result<Output, InvocationError> {
        debug!("running {} {}", self.program.display(), args.join(" "));

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| self.spawn_error(source))?;

        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(_)) => break,
                Ok(None) if Instant::now() >= deadline => {
                    warn!("{} timed out, killing it", self.program.display());
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(InvocationError::TimedOut {
                        program: self.program.clone(),
                        timeout: self.timeout,
                    });
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(source) => return Err(self.spawn_error(source)),
            }
        }

        // The tool prints one short line, so the pipes cannot fill up
        // before it exits.
        let output = child
            .wait_with_output()
            .map_err(|source| self.spawn_error(source))?;

        if output.status.success() {
            Ok(output)
        } else {
            Err(InvocationError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    fn spawn_error(&self, source: std::io::Error) -> InvocationError {
        InvocationError::Spawn {
            program: self.program.clone(),
            source,
        }
    }
}

impl GammaTool for XGamma {
    fn program(&self) -> &Path {
        &self.program
    }

    fn apply(&self, args: &[String]) -> Result<(), InvocationError> {
        self.run(args).map(|_| ())
    }

    fn query(&self) -> Result<GammaSnapshot, InvocationError> {
        let output = self.run(&[])?;
        // xgamma reports on stderr; accept either stream.
        let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stdout));
        Ok(parse_report(&text))
    }
}

/// Parse `-> Red  1.000, Green  1.000, Blue  1.000`.
///
/// Missing or unparseable fields fall back to identity gamma.
pub fn parse_report(text: &str) -> GammaSnapshot {
    let field = |channel: Channel| {
        let label = channel.label();
        text.find(label)
            .map(|start| &text[start + label.len()..])
            .and_then(|rest| {
                let rest = rest.trim_start();
                let end = rest
                    .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                    .unwrap_or(rest.len());
                rest[..end].parse::<f64>().ok()
            })
            .map(GammaValue::new)
            .unwrap_or_default()
    };

    GammaSnapshot {
        red: field(Channel::Red),
        green: field(Channel::Green),
        blue: field(Channel::Blue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_report() {
        let snapshot = parse_report("-> Red  1.000, Green  0.500, Blue  2.345\n");
        assert_eq!(snapshot.red.to_string(), "1.00");
        assert_eq!(snapshot.green.to_string(), "0.50");
        assert_eq!(snapshot.blue.to_string(), "2.35");
    }

    #[test]
    fn test_parse_report_clamps_and_defaults() {
        let snapshot = parse_report("-> Red  9.000, Blue  0.000");
        assert_eq!(snapshot.red, GammaValue::MAX);
        assert_eq!(snapshot.green, GammaValue::DEFAULT);
        assert_eq!(snapshot.blue, GammaValue::MIN);

        assert_eq!(parse_report("garbage"), GammaSnapshot::default());
    }

    #[test]
    fn test_locate_missing_tool() {
        let err = XGamma::locate_named("xgamma-definitely-not-installed").unwrap_err();
        assert_eq!(err.tool, "xgamma-definitely-not-installed");
        assert_eq!(err.install_hints().len(), 3);
        assert!(!check_available("xgamma-definitely-not-installed"));
    }

    #[test]
    fn test_spawn_failure() {
        let tool = XGamma::with_program("/nonexistent/xgamma");
        let err = tool.apply(&["-gamma".to_string(), "1.00".to_string()]).unwrap_err();
        assert!(matches!(err, InvocationError::Spawn { .. }));
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use std::sync::{Mutex, MutexGuard};
        use tempfile::TempDir;

        // Writing a script while another test forks can make exec fail
        // with ETXTBSY, so process tests run one at a time.
        static SPAWN_LOCK: Mutex<()> = Mutex::new(());

        fn serial() -> MutexGuard<'static, ()> {
            SPAWN_LOCK.lock().unwrap_or_else(|e| e.into_inner())
        }

        fn script(dir: &TempDir, body: &str) -> PathBuf {
            let path = dir.path().join("fake-xgamma");
            fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        #[test]
        fn test_apply_passes_arguments() {
            let _guard = serial();
            let dir = TempDir::new().unwrap();
            let log = dir.path().join("args.txt");
            let program = script(&dir, &format!("echo \"$@\" > '{}'", log.display()));

            let args: Vec<String> = ["-rgamma", "2.00", "-ggamma", "0.50", "-bgamma", "5.00"]
                .iter()
                .map(|s| s.to_string())
                .collect();
            XGamma::with_program(program).apply(&args).unwrap();

            assert_eq!(
                fs::read_to_string(log).unwrap(),
                "-rgamma 2.00 -ggamma 0.50 -bgamma 5.00\n"
            );
        }

        #[test]
        fn test_non_zero_exit() {
            let _guard = serial();
            let dir = TempDir::new().unwrap();
            let program = script(&dir, "echo 'unable to open display' >&2\nexit 1");

            let err = XGamma::with_program(program).apply(&[]).unwrap_err();
            match err {
                InvocationError::Failed { status, stderr, .. } => {
                    assert_eq!(status.code(), Some(1));
                    assert_eq!(stderr, "unable to open display");
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }

        #[test]
        fn test_timeout_kills_process() {
            let _guard = serial();
            let dir = TempDir::new().unwrap();
            let program = script(&dir, "sleep 5");

            let tool = XGamma::with_program(program).timeout(Duration::from_millis(100));
            let started = Instant::now();
            let err = tool.apply(&[]).unwrap_err();

            assert!(matches!(err, InvocationError::TimedOut { .. }));
            assert!(started.elapsed() < Duration::from_secs(4));
        }

        #[test]
        fn test_query_reads_stderr() {
            let _guard = serial();
            let dir = TempDir::new().unwrap();
            let program = script(&dir, "echo '-> Red  0.800, Green  1.000, Blue  1.200' >&2");

            let snapshot = XGamma::with_program(program).query().unwrap();
            assert_eq!(snapshot.red.to_string(), "0.80");
            assert_eq!(snapshot.green.to_string(), "1.00");
            assert_eq!(snapshot.blue.to_string(), "1.20");
        }
    }
}
