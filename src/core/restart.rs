//! Replacing the running process with a fresh copy of its binary.

use crate::error::RestartError;
use crate::log::Logger;
use crate::process::{self, ExecRequest, ProcessImage};
use crate::watch::EventSource;
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::convert::Infallible;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Function run right before the process image is replaced.
pub type PreExecHook = Box<dyn Fn() + Send + Sync>;

/// Restarter of the most recently spawned reloader.
static ACTIVE: ArcSwapOption<Restarter> = ArcSwapOption::const_empty();

/// Performs the restart protocol.
///
/// A restart is a strict pipeline:
///
/// 1. capture arguments and environment, find the executable
/// 2. close the watch subscription (errors ignored)
/// 3. run the pre-exec hook, if any
/// 4. `execve` the executable with `argv[0]` set to its path
///
/// `execve` skips destructors, `Drop` impls and signal handlers of the old
/// image. Anything that must happen on restart belongs in the pre-exec hook.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_exec::{Logger, Restarter};
/// use hotswap_exec::process::OsProcess;
/// use std::sync::Arc;
///
/// let restarter = Restarter::new(Arc::new(OsProcess), Logger::default());
/// restarter.set_pre_exec_hook(|| eprintln!("flushing state before restart"));
/// restarter.restart();
/// ```
pub struct Restarter {
    process: Arc<dyn ProcessImage>,
    log: Logger,
    self_exe: OnceLock<PathBuf>,
    hook: ArcSwapOption<PreExecHook>,
    source: Mutex<Option<Box<dyn EventSource>>>,
    restarting: AtomicBool,
}

impl Restarter {
    /// Create a restarter with no cached executable path and no hook.
    pub fn new(process: Arc<dyn ProcessImage>, log: Logger) -> Self {
        Self {
            process,
            log,
            self_exe: OnceLock::new(),
            hook: ArcSwapOption::empty(),
            source: Mutex::new(None),
            restarting: AtomicBool::new(false),
        }
    }

    /// The restarter of the running reloader, if one was spawned.
    pub fn active() -> Option<Arc<Restarter>> {
        ACTIVE.load_full()
    }

    /// Make this the restarter returned by [`Restarter::active`].
    pub(crate) fn activate(self: &Arc<Self>) {
        ACTIVE.store(Some(Arc::clone(self)));
    }

    /// Whether a restart has begun tearing the process down.
    ///
    /// Once set it stays set: the process is either replaced or aborted.
    pub fn is_restarting(&self) -> bool {
        self.restarting.load(Ordering::SeqCst)
    }

    /// Resolve the executable path now and keep it for later restarts.
    ///
    /// # Errors
    ///
    /// Returns [`RestartError::SelfPath`] if the path cannot be determined.
    pub fn resolve_self_exe(&self) -> Result<&Path, RestartError> {
        if let Some(path) = self.self_exe.get() {
            return Ok(path.as_path());
        }
        let path = process::resolve_self_exe(self.process.as_ref())?;
        Ok(self.self_exe.get_or_init(|| path).as_path())
    }

    /// The cached executable path, if it was resolved.
    pub fn self_exe(&self) -> Option<&Path> {
        self.self_exe.get().map(PathBuf::as_path)
    }

    /// Run `hook` before every restart, replacing any previous hook.
    pub fn set_pre_exec_hook<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.hook.store(Some(Arc::new(Box::new(hook))));
    }

    /// Remove the pre-exec hook.
    pub fn clear_pre_exec_hook(&self) {
        self.hook.store(None);
    }

    /// Hand over the subscription to close on restart.
    pub(crate) fn attach_source(&self, source: Box<dyn EventSource>) {
        *self.source.lock() = Some(source);
    }

    /// Close the subscription if it is still open. Later calls do nothing.
    pub fn close_source(&self) {
        let source = self.source.lock().take();
        if let Some(mut source) = source
            && let Err(e) = source.close()
        {
            tracing::debug!(error = %e, "closing watcher failed");
        }
    }

    /// Run the restart protocol. Returns only if it failed.
    ///
    /// # Errors
    ///
    /// Returns [`RestartError::SelfPath`] if the executable cannot be found,
    /// in which case nothing was torn down, or [`RestartError::Exec`] if
    /// `execve` failed after teardown.
    pub fn try_restart(&self) -> Result<Infallible, RestartError> {
        let args = self.process.args();
        let env = self.process.env();
        let program = self.resolve_self_exe()?.to_path_buf();

        let mut argv = Vec::with_capacity(args.len().max(1));
        argv.push(program.clone().into_os_string());
        argv.extend(args.into_iter().skip(1));
        let request = ExecRequest {
            program,
            args: argv,
            env,
        };

        self.restarting.store(true, Ordering::SeqCst);
        self.close_source();

        if let Some(hook) = self.hook.load_full() {
            hook();
        }

        tracing::debug!(program = %request.program.display(), "replacing process image");
        let source = self.process.exec(&request);
        Err(RestartError::Exec {
            path: request.program,
            source,
        })
    }

    /// Replace the process with a fresh copy of itself.
    ///
    /// Never returns. If the restart fails the error is logged and the
    /// process is aborted: carrying on would leave stale code running.
    pub fn restart(&self) -> ! {
        let Err(error) = self.try_restart();
        self.log.log(format_args!("cannot restart: {error}"));
        self.process.abort(&error)
    }
}

impl fmt::Debug for Restarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Restarter")
            .field("self_exe", &self.self_exe.get())
            .field("has_hook", &self.hook.load().is_some())
            .field("restarting", &self.is_restarting())
            .finish_non_exhaustive()
    }
}
