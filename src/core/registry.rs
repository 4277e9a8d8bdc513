//! Watched paths and the actions they trigger.

use crate::core::debounce::{DEBOUNCE, DebounceTimer};
use crate::core::restart::Restarter;
use crate::error::{ConfigurationError, Result};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Callback run when an additional directory changes.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// An additional directory to watch, non-recursively.
///
/// The callback runs whenever a file directly inside the directory is
/// written or created. The process is not restarted; call
/// [`Restarter::restart`] from the callback if that is what you want.
///
/// # Examples
///
/// ```rust
/// use hotswap_exec::Dir;
///
/// let templates = Dir::new("tpl", || println!("templates changed"));
/// assert_eq!(templates.path(), std::path::Path::new("tpl"));
/// ```
#[derive(Clone)]
pub struct Dir {
    path: PathBuf,
    callback: Callback,
}

impl Dir {
    /// Watch `path` and run `callback` when it changes.
    pub fn new<F>(path: impl Into<PathBuf>, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            callback: Arc::new(callback),
        }
    }

    /// The path as given.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Debug for Dir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dir").field("path", &self.path).finish()
    }
}

/// What happens when a watched path settles after a change.
#[derive(Clone)]
pub enum Action {
    /// Replace the process with a fresh copy of its binary.
    Restart,
    /// Run a caller-supplied function.
    Callback(Callback),
}

impl Action {
    fn fire(&self, restarter: &Restarter) {
        match self {
            Self::Restart => restarter.restart(),
            Self::Callback(cb) => cb(),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Restart => f.write_str("Restart"),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// A path under observation together with its debounce timer.
pub struct WatchedPath {
    path: PathBuf,
    watch_dir: PathBuf,
    action: Action,
    timer: DebounceTimer,
}

impl WatchedPath {
    fn new(path: PathBuf, watch_dir: PathBuf, action: Action, restarter: &Arc<Restarter>) -> Self {
        let fired = action.clone();
        let restarter = Arc::clone(restarter);
        let timer = DebounceTimer::new(DEBOUNCE, move || fired.fire(&restarter));

        Self {
            path,
            watch_dir,
            action,
            timer,
        }
    }

    /// Identity of the entry: the executable for the self entry, the
    /// absolute directory otherwise.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory subscribed to for this entry.
    pub fn watch_dir(&self) -> &Path {
        &self.watch_dir
    }

    /// The action fired by this entry's timer.
    pub fn action(&self) -> &Action {
        &self.action
    }

    /// Re-arm the debounce timer.
    pub fn arm(&self) {
        self.timer.reset();
    }
}

impl fmt::Debug for WatchedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchedPath")
            .field("path", &self.path)
            .field("watch_dir", &self.watch_dir)
            .field("action", &self.action)
            .finish()
    }
}

/// Every watched path, fixed after setup.
///
/// Timers are created once here and only ever reset afterwards, so the
/// registry can be read from the event loop while timers fire.
#[derive(Debug)]
pub struct WatchRegistry {
    self_entry: WatchedPath,
    additional: Vec<WatchedPath>,
}

impl WatchRegistry {
    /// Validate the additional directories and build one timer per entry.
    ///
    /// The executable's own directory is watched (not the file itself):
    /// a rebuild replaces the binary rather than rewriting it, so the
    /// interesting event is a create in the directory.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if an additional path cannot be made
    /// absolute, does not exist, is not a directory, or is listed twice.
    /// Nothing is started in that case.
    pub fn setup(self_exe: &Path, additional: Vec<Dir>, restarter: &Arc<Restarter>) -> Result<Self> {
        let mut seen = HashSet::new();
        let mut resolved = Vec::with_capacity(additional.len());

        for dir in additional {
            let path = validate_dir(&dir.path)?;
            if !seen.insert(path.clone()) {
                return Err(ConfigurationError::Duplicate { path }.into());
            }
            resolved.push((path, dir.callback));
        }

        let self_dir = self_exe
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("/"));
        let self_entry = WatchedPath::new(
            self_exe.to_path_buf(),
            self_dir,
            Action::Restart,
            restarter,
        );

        let additional = resolved
            .into_iter()
            .map(|(path, cb)| WatchedPath::new(path.clone(), path, Action::Callback(cb), restarter))
            .collect();

        Ok(Self {
            self_entry,
            additional,
        })
    }

    /// Find the entry an event path belongs to.
    ///
    /// The executable matches exactly and always wins; additional directories
    /// match as a prefix, first registered first.
    pub fn lookup(&self, event_path: &Path) -> Option<&WatchedPath> {
        if event_path == self.self_entry.path {
            return Some(&self.self_entry);
        }

        self.additional
            .iter()
            .find(|entry| event_path.starts_with(&entry.path))
    }

    /// The executable's entry.
    pub fn self_entry(&self) -> &WatchedPath {
        &self.self_entry
    }

    /// Entries for the additional directories, in registration order.
    pub fn additional(&self) -> &[WatchedPath] {
        &self.additional
    }

    /// Directories to subscribe to: the executable's directory first, then
    /// each additional directory, without repeats.
    pub fn watch_dirs(&self) -> Vec<&Path> {
        let mut dirs: Vec<&Path> = Vec::with_capacity(self.additional.len() + 1);
        for entry in std::iter::once(&self.self_entry).chain(&self.additional) {
            if !dirs.contains(&entry.watch_dir.as_path()) {
                dirs.push(&entry.watch_dir);
            }
        }
        dirs
    }
}

fn validate_dir(path: &Path) -> std::result::Result<PathBuf, ConfigurationError> {
    let abs = std::path::absolute(path).map_err(|source| ConfigurationError::Resolve {
        path: path.to_path_buf(),
        source,
    })?;

    let meta = std::fs::metadata(&abs).map_err(|source| ConfigurationError::Stat {
        path: abs.clone(),
        source,
    })?;

    if !meta.is_dir() {
        return Err(ConfigurationError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    Ok(abs)
}
