use std::collections::VecDeque;
use std::fs;
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing::warn;

use crate::fs_utils::remove_path_if_exists;

/// Pause before naming a temp directory so back-to-back names differ.
const TEMP_DIR_NAME_PAUSE: Duration = Duration::from_millis(20);

#[derive(Debug, Default)]
struct TrackedFiles {
    paths: VecDeque<PathBuf>,
    warn_about_cleanup: bool,
}

impl TrackedFiles {
    fn track(&mut self, path: PathBuf) {
        self.paths.push_back(path);
        self.warn_about_cleanup = true;
    }
}

/// Hands out temp files and directories for a test and deletes them again.
///
/// `label` identifies the owner in diagnostics. Dropping a manager that still
/// tracks paths logs a warning naming it; use [`TestFileManager::into_scope`]
/// or [`with_test_files`] to have cleanup run on every exit path.
#[derive(Debug)]
pub struct TestFileManager {
    label: String,
    base_filename: String,
    file_suffix: String,
    temp_root: PathBuf,
    state: Mutex<TrackedFiles>,
}

impl TestFileManager {
    pub fn new(
        label: impl Into<String>,
        base_filename: impl Into<String>,
        file_suffix: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            base_filename: base_filename.into(),
            file_suffix: file_suffix.into(),
            temp_root: std::env::temp_dir(),
            state: Mutex::new(TrackedFiles::default()),
        }
    }

    /// Creates temp files and directories under `temp_root` instead of the system temp dir.
    pub fn with_temp_root(mut self, temp_root: impl Into<PathBuf>) -> Self {
        self.temp_root = temp_root.into();
        self
    }

    pub fn into_scope(self) -> ScopedTestFiles {
        ScopedTestFiles {
            manager: self,
            finished: false,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    fn lock(&self) -> MutexGuard<'_, TrackedFiles> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mark_for_deletion(&self, path: impl Into<PathBuf>) {
        self.lock().track(path.into());
    }

    pub fn tracked_paths(&self) -> Vec<PathBuf> {
        self.lock().paths.iter().cloned().collect()
    }

    /// Whether paths were tracked since the last [`TestFileManager::clean_up`].
    pub fn needs_cleanup(&self) -> bool {
        self.lock().warn_about_cleanup
    }

    /// Creates `<temp_root>/<base_filename><millis>` and tracks it.
    pub fn create_temp_dir(&self) -> Result<PathBuf> {
        let mut state = self.lock();

        fs::create_dir_all(&self.temp_root).with_context(|| {
            format!("failed to create temp root {}", self.temp_root.display())
        })?;

        let dir = loop {
            thread::sleep(TEMP_DIR_NAME_PAUSE);
            let millis = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_millis();
            let candidate = self
                .temp_root
                .join(format!("{}{millis}", self.base_filename));
            match fs::create_dir(&candidate) {
                Ok(()) => break candidate,
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!("failed to create temp directory {}", candidate.display())
                    })
                }
            }
        };

        state.track(dir.clone());
        Ok(dir)
    }

    /// Creates an empty, uniquely named `<base_filename>…<file_suffix>` file and tracks it.
    pub fn create_temp_file(&self) -> Result<PathBuf> {
        let mut state = self.lock();

        fs::create_dir_all(&self.temp_root).with_context(|| {
            format!("failed to create temp root {}", self.temp_root.display())
        })?;
        let path = tempfile::Builder::new()
            .prefix(&self.base_filename)
            .suffix(&self.file_suffix)
            .tempfile_in(&self.temp_root)
            .with_context(|| format!("failed to create temp file in {}", self.temp_root.display()))?
            .into_temp_path()
            .keep()
            .context("failed to keep temp file")?;

        state.track(path.clone());
        Ok(path)
    }

    /// Deletes every tracked path in the order it was tracked.
    ///
    /// Directories are removed recursively; paths that no longer exist are
    /// skipped. On failure the failing path and everything after it stay
    /// tracked.
    pub fn clean_up(&self) -> Result<()> {
        let mut state = self.lock();
        while let Some(path) = state.paths.front().cloned() {
            remove_path_if_exists(&path)
                .with_context(|| format!("failed to delete {}", path.display()))?;
            state.paths.pop_front();
        }
        state.warn_about_cleanup = false;
        Ok(())
    }

    /// Writes `contents` to `dir/filename`, creating parent directories, and tracks the file.
    pub fn create_file(&self, dir: &Path, filename: &str, contents: &str) -> Result<PathBuf> {
        let file = dir.join(filename);
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&file, contents.as_bytes())
            .with_context(|| format!("failed to write {}", file.display()))?;

        self.mark_for_deletion(file.clone());
        Ok(file)
    }

    /// [`TestFileManager::create_file`] inside a fresh temp directory.
    pub fn create_file_in_temp_dir(&self, filename: &str, contents: &str) -> Result<PathBuf> {
        let dir = self.create_temp_dir()?;
        self.create_file(&dir, filename, contents)
    }

    pub fn file_contents(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }

    /// Panics unless `dir/filename` exists exactly when `should_exist` says so.
    pub fn assert_file_existence(&self, dir: &Path, filename: &str, should_exist: bool) {
        let file = dir.join(filename);
        if should_exist {
            assert!(file.exists(), "expected {} to exist", file.display());
        } else {
            assert!(!file.exists(), "expected {} not to exist", file.display());
        }
    }

    /// Panics unless `dir/filename` exists and holds exactly `expected`.
    pub fn assert_file_contents(&self, dir: &Path, filename: &str, expected: &str) -> Result<()> {
        self.assert_file_existence(dir, filename, true);
        let actual = self.file_contents(&dir.join(filename))?;
        assert_eq!(expected, actual);
        Ok(())
    }

    fn maybe_warn_about_clean_up(&mut self) {
        let state = self.state.get_mut().unwrap_or_else(PoisonError::into_inner);
        if state.warn_about_cleanup {
            warn!(
                tracked = state.paths.len(),
                "TestFileManager from: {} not cleaned up!", self.label
            );
        }
    }
}

impl Drop for TestFileManager {
    fn drop(&mut self) {
        self.maybe_warn_about_clean_up();
    }
}

/// A [`TestFileManager`] that cleans up when it goes out of scope.
#[derive(Debug)]
pub struct ScopedTestFiles {
    manager: TestFileManager,
    finished: bool,
}

impl ScopedTestFiles {
    /// Cleans up now and reports failures instead of logging them.
    ///
    /// Dropping the scope afterwards does not try again.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        self.manager.clean_up()
    }
}

impl Deref for ScopedTestFiles {
    type Target = TestFileManager;

    fn deref(&self) -> &TestFileManager {
        &self.manager
    }
}

impl Drop for ScopedTestFiles {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.manager.clean_up() {
            warn!(
                label = %self.manager.label,
                "failed to clean up test files: {err:#}"
            );
        }
    }
}

/// Runs `test` with a scoped [`TestFileManager`], cleaning up however it exits.
///
/// The error from `test` wins over a cleanup error.
pub fn with_test_files<T>(
    label: &str,
    base_filename: &str,
    file_suffix: &str,
    test: impl FnOnce(&TestFileManager) -> Result<T>,
) -> Result<T> {
    let scope = TestFileManager::new(label, base_filename, file_suffix).into_scope();
    let outcome = test(&scope);
    let cleanup = scope.finish();

    match (outcome, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(cleanup_err)) => {
            warn!(label, "failed to clean up test files: {cleanup_err:#}");
            Err(err)
        }
    }
}
