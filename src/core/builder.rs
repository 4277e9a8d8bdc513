//! Builder and handle for the self-reloader.

use crate::core::event_loop::EventLoop;
use crate::core::registry::{Dir, WatchRegistry};
use crate::core::restart::Restarter;
use crate::error::Result;
use crate::log::Logger;
use crate::process::{OsProcess, ProcessImage};
use crate::watch::{EventSource, SourceEvent};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type PendingSource = (Box<dyn EventSource>, mpsc::UnboundedReceiver<SourceEvent>);

/// Entry point for configuring a self-reloading process.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_exec::Reloader;
///
/// # async fn example() -> hotswap_exec::Result<()> {
/// let handle = Reloader::builder()
///     .log(|args| eprintln!("{args}"))
///     .dir("templates", || println!("templates changed"))
///     .pre_exec(|| eprintln!("restarting"))
///     .spawn()?;
///
/// // ... run the application ...
///
/// handle.join().await;
/// # Ok(())
/// # }
/// ```
pub struct Reloader;

impl Reloader {
    /// Create a new builder.
    pub fn builder() -> ReloaderBuilder {
        ReloaderBuilder::new()
    }
}

/// Builder for a [`ReloadHandle`].
pub struct ReloaderBuilder {
    log: Logger,
    dirs: Vec<Dir>,
    pre_exec: Option<Box<dyn Fn() + Send + Sync>>,
    source: Option<PendingSource>,
    process: Arc<dyn ProcessImage>,
}

impl ReloaderBuilder {
    /// Create a builder logging through `tracing`, with no additional
    /// directories, the `notify` event source and the real process.
    pub fn new() -> Self {
        Self {
            log: Logger::default(),
            dirs: Vec::new(),
            pre_exec: None,
            source: None,
            process: Arc::new(OsProcess),
        }
    }

    /// Send the startup message and runtime errors to `sink`.
    pub fn log<F>(mut self, sink: F) -> Self
    where
        F: Fn(fmt::Arguments<'_>) + Send + Sync + 'static,
    {
        self.log = Logger::new(sink);
        self
    }

    /// Use an existing [`Logger`].
    pub fn logger(mut self, log: Logger) -> Self {
        self.log = log;
        self
    }

    /// Also watch `path` and run `callback` when something in it changes.
    pub fn dir<F>(mut self, path: impl Into<std::path::PathBuf>, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.dirs.push(Dir::new(path, callback));
        self
    }

    /// Add several prepared [`Dir`]s.
    pub fn dirs(mut self, dirs: impl IntoIterator<Item = Dir>) -> Self {
        self.dirs.extend(dirs);
        self
    }

    /// Run `hook` right before the process is replaced.
    pub fn pre_exec<F>(mut self, hook: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.pre_exec = Some(Box::new(hook));
        self
    }

    /// Use a custom event source instead of `notify`.
    pub fn with_source<S>(mut self, source: S, events: mpsc::UnboundedReceiver<SourceEvent>) -> Self
    where
        S: EventSource,
    {
        let source: Box<dyn EventSource> = Box::new(source);
        self.source = Some((source, events));
        self
    }

    /// Use custom process primitives instead of the real process.
    pub fn with_process<P>(mut self, process: P) -> Self
    where
        P: ProcessImage,
    {
        self.process = Arc::new(process);
        self
    }

    /// Set everything up and start the event loop on a tokio task.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable cannot be located, an additional
    /// directory is invalid, or a directory cannot be watched. No task is
    /// left running in that case.
    pub fn spawn(self) -> Result<ReloadHandle> {
        let restarter = Arc::new(Restarter::new(self.process, self.log.clone()));
        if let Some(hook) = self.pre_exec {
            restarter.set_pre_exec_hook(hook);
        }

        let self_exe = restarter.resolve_self_exe()?.to_path_buf();
        let registry = WatchRegistry::setup(&self_exe, self.dirs, &restarter)?;

        let (mut source, events) = match self.source {
            Some(pending) => pending,
            None => default_source()?,
        };

        for dir in registry.watch_dirs() {
            source.watch(dir)?;
        }

        log_startup(&self.log, &registry);
        restarter.attach_source(source);

        let task = tokio::spawn(EventLoop::new(registry, events, self.log).run());
        restarter.activate();

        Ok(ReloadHandle { restarter, task })
    }

    /// Set up, then run until the event stream ends.
    ///
    /// With the default source the stream only ends when the process is
    /// replaced, so on success this never returns.
    ///
    /// # Errors
    ///
    /// Returns initialization errors only; see [`spawn`](Self::spawn).
    pub async fn start(self) -> Result<()> {
        self.spawn()?.join().await;
        Ok(())
    }
}

impl Default for ReloaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "file-watch")]
fn default_source() -> Result<PendingSource> {
    let (source, events) = crate::watch::NotifySource::new()?;
    let source: Box<dyn EventSource> = Box::new(source);
    Ok((source, events))
}

#[cfg(not(feature = "file-watch"))]
fn default_source() -> Result<PendingSource> {
    Err(crate::error::ReloadError::WatcherInit(
        "no event source configured and the `file-watch` feature is disabled".to_string(),
    ))
}

fn log_startup(log: &Logger, registry: &WatchRegistry) {
    let cwd = std::env::current_dir().ok();
    let show = |p: &Path| relpath(p, cwd.as_deref());

    let extra = if registry.additional().is_empty() {
        String::new()
    } else {
        let dirs: Vec<String> = registry.additional().iter().map(|e| show(e.path())).collect();
        format!(" (additional dirs: {})", dirs.join(", "))
    };

    log.log(format_args!(
        "restarting {:?} when it changes{}",
        show(registry.self_entry().path()),
        extra
    ));
}

/// Render `path` relative to `cwd` as `./rest` when it lives below it.
fn relpath(path: &Path, cwd: Option<&Path>) -> String {
    match cwd.and_then(|cwd| path.strip_prefix(cwd).ok()) {
        Some(rest) => format!("./{}", rest.display()),
        None => path.display().to_string(),
    }
}

/// Handle to a running reloader.
pub struct ReloadHandle {
    restarter: Arc<Restarter>,
    task: JoinHandle<()>,
}

impl ReloadHandle {
    /// The restarter shared with the timers. Use it to set the pre-exec hook
    /// or to restart manually from elsewhere.
    pub fn restarter(&self) -> Arc<Restarter> {
        Arc::clone(&self.restarter)
    }

    /// Restart now, without waiting for a change.
    pub fn restart(&self) -> ! {
        self.restarter.restart()
    }

    /// Wait for the event loop to finish, which happens when the event
    /// stream closes.
    ///
    /// A restart closes the stream on its way to `execve`. In that case this
    /// never completes: the process is replaced or aborted instead.
    pub async fn join(self) {
        if let Err(e) = self.task.await
            && e.is_panic()
        {
            std::panic::resume_unwind(e.into_panic());
        }

        if self.restarter.is_restarting() {
            std::future::pending::<()>().await;
        }
    }
}

impl fmt::Debug for ReloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadHandle")
            .field("restarter", &self.restarter)
            .finish_non_exhaustive()
    }
}
