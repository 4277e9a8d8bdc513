//! `notify` backed event source.

use crate::error::{ReloadError, Result};
use crate::watch::source::{ChangeKind, EventSource, FsEvent, SourceEvent};
use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::Path;
use tokio::sync::mpsc;

/// Event source using the platform's recommended `notify` backend
/// (inotify, kqueue, FSEvents or ReadDirectoryChangesW).
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_exec::watch::{EventSource, NotifySource};
///
/// # async fn example() -> hotswap_exec::Result<()> {
/// let (mut source, mut events) = NotifySource::new()?;
/// source.watch(std::path::Path::new("/srv/app"))?;
///
/// while let Some(event) = events.recv().await {
///     println!("{event:?}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct NotifySource {
    watcher: Option<RecommendedWatcher>,
}

impl NotifySource {
    /// Create the backend and the channel it reports into.
    ///
    /// The receiver yields `None` once the source is closed and the backend
    /// thread has shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying watcher cannot be created
    /// (for example when the inotify instance limit is reached).
    pub fn new() -> Result<(Self, mpsc::UnboundedReceiver<SourceEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in translate(event) {
                    let _ = tx.send(SourceEvent::Change(change));
                }
            }
            Err(e) => {
                let _ = tx.send(SourceEvent::Error(e.to_string()));
            }
        })
        .map_err(|e| ReloadError::WatcherInit(e.to_string()))?;

        Ok((
            Self {
                watcher: Some(watcher),
            },
            rx,
        ))
    }
}

impl EventSource for NotifySource {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        let watcher = self
            .watcher
            .as_mut()
            .ok_or_else(|| ReloadError::subscription(dir, "watcher is closed"))?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| ReloadError::subscription(dir, e))
    }

    fn close(&mut self) -> Result<()> {
        // Dropping the watcher stops the backend thread, which drops the
        // sender and ends the stream.
        drop(self.watcher.take());
        Ok(())
    }
}

/// Split a `notify` event into one [`FsEvent`] per path.
///
/// A rename into the directory is reported as a create, since that is how a
/// freshly linked binary usually shows up.
fn translate(event: Event) -> Vec<FsEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Create,
        EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => ChangeKind::Write,
        EventKind::Modify(ModifyKind::Metadata(_)) => ChangeKind::Chmod,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => ChangeKind::Create,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.into_iter();
            return paths
                .next()
                .map(|from| FsEvent::new(from, ChangeKind::Rename))
                .into_iter()
                .chain(paths.map(|to| FsEvent::new(to, ChangeKind::Create)))
                .collect();
        }
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Rename,
        EventKind::Remove(_) => ChangeKind::Remove,
        _ => ChangeKind::Other,
    };

    event
        .paths
        .into_iter()
        .map(|path| FsEvent::new(path, kind))
        .collect()
}
