//! Operating-system process primitives used by the restart protocol.

use crate::error::RestartError;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// Everything the replacement image needs, captured before teardown starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRequest {
    /// Binary to execute.
    pub program: PathBuf,
    /// Full argument vector, `argv[0]` included.
    pub args: Vec<OsString>,
    /// Full environment, in the order it was read.
    pub env: Vec<(OsString, OsString)>,
}

/// Access to the current process and to `execve`.
///
/// [`OsProcess`] is the real implementation; tests substitute fakes that
/// record the request instead of replacing the test binary.
pub trait ProcessImage: Send + Sync + 'static {
    /// Command-line arguments of the running process, `argv[0]` included.
    fn args(&self) -> Vec<OsString>;

    /// Environment of the running process.
    fn env(&self) -> Vec<(OsString, OsString)>;

    /// Ask the OS where the running binary lives.
    fn current_exe(&self) -> io::Result<PathBuf>;

    /// Replace the process image. Only returns on failure.
    fn exec(&self, request: &ExecRequest) -> io::Error;

    /// Terminate after a failed restart. The process must not carry on
    /// running stale code.
    fn abort(&self, error: &RestartError) -> !;
}

/// The running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsProcess;

impl ProcessImage for OsProcess {
    fn args(&self) -> Vec<OsString> {
        std::env::args_os().collect()
    }

    fn env(&self) -> Vec<(OsString, OsString)> {
        std::env::vars_os().collect()
    }

    fn current_exe(&self) -> io::Result<PathBuf> {
        std::env::current_exe()
    }

    #[cfg(unix)]
    fn exec(&self, request: &ExecRequest) -> io::Error {
        use std::os::unix::process::CommandExt;

        let mut cmd = std::process::Command::new(&request.program);
        if let Some(argv0) = request.args.first() {
            cmd.arg0(argv0);
        }
        cmd.args(request.args.iter().skip(1))
            .env_clear()
            .envs(request.env.iter().map(|(k, v)| (k, v)));

        // exec() only returns on error
        cmd.exec()
    }

    #[cfg(not(unix))]
    fn exec(&self, _request: &ExecRequest) -> io::Error {
        io::Error::new(
            io::ErrorKind::Unsupported,
            "process image replacement is only supported on unix",
        )
    }

    fn abort(&self, error: &RestartError) -> ! {
        tracing::error!(%error, "cannot restart");
        eprintln!("cannot restart: {error}");
        std::process::abort()
    }
}

/// Work out which binary to re-exec.
///
/// An absolute `argv[0]` is trusted as is, so a binary launched through a
/// symlink restarts through the same symlink. Otherwise the OS is asked.
pub fn resolve_self_exe(process: &dyn ProcessImage) -> Result<PathBuf, RestartError> {
    let argv0 = process.args().into_iter().next().unwrap_or_default();
    if Path::new(&argv0).is_absolute() {
        return Ok(PathBuf::from(argv0));
    }

    process
        .current_exe()
        .map_err(|source| RestartError::SelfPath { argv0, source })
}
