//! Event source contract.

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Kind of a filesystem change, reduced to what the reloader cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// File contents were written.
    Write,
    /// A directory entry was created.
    Create,
    /// A directory entry was removed.
    Remove,
    /// A directory entry was renamed.
    Rename,
    /// Permissions or other metadata changed.
    Chmod,
    /// Anything else (access, unknown backend events).
    Other,
}

impl ChangeKind {
    /// Whether this kind of change should arm a debounce timer.
    ///
    /// A rebuild usually renames the old binary away and creates a new one,
    /// so `Create` matters as much as `Write`.
    pub const fn is_trigger(self) -> bool {
        matches!(self, Self::Write | Self::Create)
    }
}

/// A single change reported for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    /// Path of the entry that changed.
    pub path: PathBuf,
    /// What happened to it.
    pub kind: ChangeKind,
}

impl FsEvent {
    /// Create an event.
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// One item of the event stream.
///
/// The end of the stream is signalled by the channel closing, which happens
/// when every sender (normally owned by the source) is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// A filesystem change.
    Change(FsEvent),
    /// An asynchronous error from the backend. Not fatal.
    Error(String),
}

/// A filesystem notification backend.
///
/// Implementations deliver events through the
/// `tokio::sync::mpsc::UnboundedReceiver<SourceEvent>` handed to the
/// reloader alongside the source.
pub trait EventSource: Send + 'static {
    /// Register a non-recursive watch on `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ReloadError::Subscription`] if the directory cannot
    /// be watched.
    fn watch(&mut self, dir: &Path) -> Result<()>;

    /// Release every registration. Called at most once, right before the
    /// process image is replaced.
    ///
    /// # Errors
    ///
    /// Errors are reported but ignored by the caller.
    fn close(&mut self) -> Result<()>;
}
