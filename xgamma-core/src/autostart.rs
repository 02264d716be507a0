//! Login autostart entry management.
//!
//! The store owns one file, [`ENTRY_FILE_NAME`], in the freedesktop
//! autostart directory. Removal recognises managed entries by the
//! [`MARKER_KEY`] they carry, so a renamed copy is still cleaned up and a
//! user's own `xgamma` entry is never touched.

use crate::desktop::{self, DesktopEntry};
use crate::error::PersistError;

use log::{debug, info, warn};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File name of the managed entry.
pub const ENTRY_FILE_NAME: &str = "xgamma_gui_tool.desktop";

/// Custom key marking entries written by this application.
pub const MARKER_KEY: &str = "X-XGamma-GUI-Tool";

/// Value of [`MARKER_KEY`] in managed entries.
pub const MARKER_VALUE: &str = "managed";

const ENTRY_NAME: &str = "xgamma Gamma Adjustment";
const ENTRY_COMMENT: &str = "Applied by xgamma GUI Tool";

/// Manages the autostart entry that re-applies gamma at login.
#[derive(Debug, Clone)]
pub struct AutostartStore {
    dir: PathBuf,
    program: PathBuf,
}

impl AutostartStore {
    /// Create a store for `dir` that launches `program` at login.
    pub fn new(dir: impl Into<PathBuf>, program: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            program: program.into(),
        }
    }

    /// The autostart directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where [`AutostartStore::save`] writes the entry.
    pub fn entry_path(&self) -> PathBuf {
        self.dir.join(ENTRY_FILE_NAME)
    }

    /// Build the entry that would be written for `args`.
    pub fn entry(&self, args: &[String]) -> DesktopEntry {
        let program = self.program.to_string_lossy();
        let exec = desktop::join_exec(
            std::iter::once(program.as_ref()).chain(args.iter().map(String::as_str)),
        );

        let mut entry = DesktopEntry::new();
        entry
            .set("Type", "Application")
            .set("Name", ENTRY_NAME)
            .set("Comment", ENTRY_COMMENT)
            .set("Exec", exec)
            .set("Hidden", "false")
            .set("NoDisplay", "false")
            .set("X-GNOME-Autostart-enabled", "true")
            .set(MARKER_KEY, MARKER_VALUE);
        entry
    }

    /// Write the entry, replacing any previous one.
    ///
    /// The content goes to a temporary file in the same directory which is
    /// then renamed over the entry, so readers never see a partial file.
    /// Managed entries under other names are deleted afterwards, leaving
    /// exactly one.
    ///
    /// # Errors
    ///
    /// [`PersistError`] if the directory cannot be created or the file
    /// cannot be written, in which case the previous entry is left in place.
    /// Also when a stale managed entry cannot be deleted; the new entry has
    /// been written by then.
    pub fn save(&self, args: &[String]) -> Result<PathBuf, PersistError> {
        fs::create_dir_all(&self.dir).map_err(|source| PersistError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.entry_path();
        let content = self.entry(args).render();
        self.write_atomic(&path, content.as_bytes())
            .map_err(|source| PersistError::Write {
                path: path.clone(),
                source,
            })?;
        info!("saved autostart entry {}", path.display());

        let stale: Vec<PathBuf> = self
            .managed_entries()?
            .into_iter()
            .filter(|entry| *entry != path)
            .collect();
        let removed = remove_entries(stale)?;
        if removed > 0 {
            info!("removed {} stale autostart entries", removed);
        }
        Ok(path)
    }

    fn write_atomic(&self, path: &Path, content: &[u8]) -> io::Result<()> {
        let mut tmp = tempfile::Builder::new()
            .prefix(".xgamma_gui_tool")
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        tmp.write_all(content)?;
        tmp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o755))?;
        }

        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Delete every managed entry in the directory.
    ///
    /// Returns the number of files removed. A missing directory counts as
    /// zero. Unreadable files are skipped.
    ///
    /// # Errors
    ///
    /// [`PersistError`] if the directory cannot be listed or a managed
    /// entry cannot be deleted. Deletion is attempted for every entry and
    /// the first failure is returned; entries already deleted stay deleted.
    pub fn remove_all(&self) -> Result<usize, PersistError> {
        let removed = remove_entries(self.managed_entries()?)?;
        if removed > 0 {
            info!("removed {} autostart entr{}", removed, if removed == 1 { "y" } else { "ies" });
        }
        Ok(removed)
    }

    /// Whether at least one managed entry exists.
    pub fn is_installed(&self) -> Result<bool, PersistError> {
        Ok(!self.managed_entries()?.is_empty())
    }

    fn managed_entries(&self) -> Result<Vec<PathBuf>, PersistError> {
        let read_dir = match fs::read_dir(&self.dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(PersistError::ReadDir {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut managed = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry.map_err(|source| PersistError::ReadDir {
                path: self.dir.clone(),
                source,
            })?;
            let path = dir_entry.path();
            if path.extension().is_none_or(|ext| ext != "desktop") || !path.is_file() {
                continue;
            }

            match fs::read_to_string(&path) {
                Ok(content) if self.is_managed(&content) => managed.push(path),
                Ok(_) => {}
                Err(e) => warn!("skipping unreadable autostart file {}: {}", path.display(), e),
            }
        }
        managed.sort();
        Ok(managed)
    }

    /// An entry is ours if it carries the marker and its command runs the
    /// gamma tool.
    pub fn is_managed(&self, content: &str) -> bool {
        let Some(entry) = DesktopEntry::parse(content) else {
            return false;
        };
        if entry.get(MARKER_KEY) != Some(MARKER_VALUE) {
            return false;
        }

        let tool_name = self.program.file_name();
        entry
            .exec_args()
            .and_then(|args| args.into_iter().next())
            .is_some_and(|program| Path::new(&program).file_name() == tool_name)
    }
}

/// Delete `paths`, counting the files actually removed. Files that are
/// already gone are not an error.
fn remove_entries(paths: Vec<PathBuf>) -> Result<usize, PersistError> {
    let mut removed = 0;
    let mut first_error = None;
    for path in paths {
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("removed autostart entry {}", path.display());
                removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(source) => {
                warn!("could not remove autostart entry {}: {}", path.display(), source);
                if first_error.is_none() {
                    first_error = Some(PersistError::Remove { path, source });
                }
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(removed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Channel, GammaState};
    use tempfile::TempDir;

    const PROGRAM: &str = "/usr/bin/xgamma";

    fn args(state: &GammaState) -> Vec<String> {
        state.to_command_arguments()
    }

    fn store(dir: &TempDir) -> AutostartStore {
        AutostartStore::new(dir.path().join("autostart"), PROGRAM)
    }

    #[test]
    fn test_entry_content() {
        let dir = TempDir::new().unwrap();
        let mut state = GammaState::new();
        state.set_channel(Channel::Red, 2.0);
        state.set_channel(Channel::Green, 0.5);
        state.set_channel(Channel::Blue, 5.5);

        let path = store(&dir).save(&args(&state)).unwrap();
        assert_eq!(path, dir.path().join("autostart").join(ENTRY_FILE_NAME));
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "[Desktop Entry]\n\
             Type=Application\n\
             Name=xgamma Gamma Adjustment\n\
             Comment=Applied by xgamma GUI Tool\n\
             Exec=/usr/bin/xgamma -rgamma 2.00 -ggamma 0.50 -bgamma 5.00\n\
             Hidden=false\n\
             NoDisplay=false\n\
             X-GNOME-Autostart-enabled=true\n\
             X-XGamma-GUI-Tool=managed\n"
        );
    }

    #[test]
    fn test_save_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let args = args(&GammaState::new());

        let path = store.save(&args).unwrap();
        let first = fs::read(&path).unwrap();
        store.save(&args).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_overwrites_previous_values() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut state = GammaState::new();

        store.save(&args(&state)).unwrap();
        state.set_all(1.5);
        let path = store.save(&args(&state)).unwrap();

        let entry = DesktopEntry::parse(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(
            entry.get("Exec"),
            Some("/usr/bin/xgamma -rgamma 1.50 -ggamma 1.50 -bgamma 1.50")
        );
        assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 1);
    }

    #[test]
    fn test_exec_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = AutostartStore::new(dir.path(), "/opt/x tools/xgamma");
        let mut state = GammaState::new();
        state.set_channel(Channel::Green, 0.01);
        let args = args(&state);

        let path = store.save(&args).unwrap();
        let entry = DesktopEntry::parse(&fs::read_to_string(path).unwrap()).unwrap();
        let exec = entry.exec_args().unwrap();

        assert_eq!(exec[0], "/opt/x tools/xgamma");
        assert_eq!(exec[1..], args[..]);
    }

    #[test]
    fn test_remove_all_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);

        assert_eq!(store.remove_all().unwrap(), 0);
        assert!(!store.is_installed().unwrap());
        assert!(!store.dir().exists());
    }

    #[test]
    fn test_remove_all_empty_directory() {
        let dir = TempDir::new().unwrap();
        let store = AutostartStore::new(dir.path(), PROGRAM);
        assert_eq!(store.remove_all().unwrap(), 0);
    }

    #[test]
    fn test_remove_all_keeps_unrelated_entries() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.save(&args(&GammaState::new())).unwrap();

        let own_xgamma = "[Desktop Entry]\nType=Application\nName=My gamma\n\
                          Exec=xgamma -gamma 0.8\nComment=Applied by xgamma GUI Tool\n";
        let other_app = "[Desktop Entry]\nType=Application\nExec=redshift\n";
        let wrong_marker = "[Desktop Entry]\nExec=/usr/bin/xgamma -gamma 2.00\n\
                            X-XGamma-GUI-Tool=user\n";
        let not_desktop = "[Desktop Entry]\nExec=/usr/bin/xgamma\nX-XGamma-GUI-Tool=managed\n";
        let unrelated = [
            ("user-gamma.desktop", own_xgamma),
            ("redshift.desktop", other_app),
            ("wrong-marker.desktop", wrong_marker),
            ("notes.txt", not_desktop),
        ];
        for (name, content) in unrelated {
            fs::write(store.dir().join(name), content).unwrap();
        }

        assert_eq!(store.remove_all().unwrap(), 1);
        assert!(!store.entry_path().exists());
        for (name, content) in unrelated {
            assert_eq!(fs::read_to_string(store.dir().join(name)).unwrap(), content);
        }
    }

    #[test]
    fn test_remove_all_finds_renamed_entries() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let path = store.save(&args(&GammaState::new())).unwrap();
        fs::copy(&path, store.dir().join("renamed.desktop")).unwrap();

        let hand_edited = "# edited by hand\n[Desktop Entry]\n\
                           Exec=/usr/local/bin/xgamma -rgamma 1.10 -ggamma 1.00 -bgamma 1.00\n\
                           X-XGamma-GUI-Tool=managed\n";
        fs::write(store.dir().join("edited.desktop"), hand_edited).unwrap();

        assert!(store.is_installed().unwrap());
        assert_eq!(store.remove_all().unwrap(), 3);
        assert!(!store.is_installed().unwrap());
        assert_eq!(store.remove_all().unwrap(), 0);
    }

    #[test]
    fn test_save_replaces_renamed_entry() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        let mut state = GammaState::new();

        state.set_all(0.5);
        let path = store.save(&args(&state)).unwrap();
        fs::rename(&path, store.dir().join("renamed.desktop")).unwrap();

        state.set_all(2.0);
        store.save(&args(&state)).unwrap();

        assert_eq!(store.managed_entries().unwrap(), vec![store.entry_path()]);
        let entry = DesktopEntry::parse(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            entry.get("Exec"),
            Some("/usr/bin/xgamma -rgamma 2.00 -ggamma 2.00 -bgamma 2.00")
        );
    }

    #[test]
    fn test_save_keeps_unrelated_entries() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        fs::create_dir_all(store.dir()).unwrap();
        let user_entry = "[Desktop Entry]\nExec=xgamma -gamma 0.8\n";
        fs::write(store.dir().join("user-gamma.desktop"), user_entry).unwrap();

        store.save(&args(&GammaState::new())).unwrap();

        assert_eq!(fs::read_dir(store.dir()).unwrap().count(), 2);
        assert_eq!(
            fs::read_to_string(store.dir().join("user-gamma.desktop")).unwrap(),
            user_entry
        );
    }

    #[test]
    fn test_marker_requires_tool_command() {
        let store = AutostartStore::new("/unused", PROGRAM);
        let marked_other = "[Desktop Entry]\nExec=/usr/bin/redshift\nX-XGamma-GUI-Tool=managed\n";
        assert!(!store.is_managed(marked_other));

        let marked_tool = "[Desktop Entry]\nExec=xgamma -gamma 1.00\nX-XGamma-GUI-Tool=managed\n";
        assert!(store.is_managed(marked_tool));
        assert!(!store.is_managed("not a desktop file"));
    }

    #[cfg(unix)]
    #[test]
    fn test_save_into_read_only_directory_fails() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = AutostartStore::new(dir.path(), PROGRAM);
        let path = store.save(&args(&GammaState::new())).unwrap();
        let before = fs::read(&path).unwrap();

        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o555)).unwrap();
        let mut state = GammaState::new();
        state.set_all(3.0);
        let result = store.save(&args(&state));
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();

        // Root ignores directory permissions.
        if let Err(err) = result {
            assert!(matches!(err, PersistError::Write { .. }));
            assert_eq!(fs::read(&path).unwrap(), before);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_remove_from_read_only_directory_fails() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = AutostartStore::new(dir.path(), PROGRAM);
        let path = store.save(&args(&GammaState::new())).unwrap();
        fs::copy(&path, dir.path().join("renamed.desktop")).unwrap();

        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o555)).unwrap();
        let result = store.remove_all();
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();

        // Root ignores directory permissions.
        if let Err(err) = result {
            assert!(matches!(err, PersistError::Remove { .. }));
            assert!(path.exists());
            assert_eq!(store.managed_entries().unwrap().len(), 2);
            assert_eq!(store.remove_all().unwrap(), 2);
        }
    }
}
