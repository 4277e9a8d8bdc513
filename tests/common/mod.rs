//! Test doubles for the event source and the process primitives.

#![allow(dead_code)]

use hotswap_exec::error::{ReloadError, RestartError, Result};
use hotswap_exec::process::{ExecRequest, ProcessImage};
use hotswap_exec::watch::{ChangeKind, EventSource, FsEvent, SourceEvent};
use hotswap_exec::Logger;
use parking_lot::Mutex;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tokio::time::Instant;

pub const EXE: &str = "/srv/bin/app";

/// Event source that records registrations and never produces events on
/// its own; tests push events through the returned sender.
#[derive(Clone, Default)]
pub struct FakeSource {
    pub watched: Arc<Mutex<Vec<PathBuf>>>,
    pub closed: Arc<AtomicUsize>,
    pub fail_on: Option<PathBuf>,
}

impl FakeSource {
    pub fn new() -> (Self, mpsc::UnboundedSender<SourceEvent>, mpsc::UnboundedReceiver<SourceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::default(), tx, rx)
    }

    pub fn failing_on(mut self, dir: impl Into<PathBuf>) -> Self {
        self.fail_on = Some(dir.into());
        self
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.watched.lock().clone()
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl EventSource for FakeSource {
    fn watch(&mut self, dir: &Path) -> Result<()> {
        if self.fail_on.as_deref() == Some(dir) {
            return Err(ReloadError::subscription(dir, "no space left on device"));
        }
        self.watched.lock().push(dir.to_path_buf());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Err(ReloadError::stream("already closed"))
    }
}

/// Process whose `exec` records the request and fails, and whose `abort`
/// panics instead of killing the test binary.
#[derive(Clone)]
pub struct FakeProcess {
    pub args: Vec<OsString>,
    pub env: Vec<(OsString, OsString)>,
    pub exe: Option<PathBuf>,
    pub execs: Arc<Mutex<Vec<(Instant, ExecRequest)>>>,
}

impl FakeProcess {
    pub fn new() -> Self {
        Self {
            args: vec![EXE.into(), "--port".into(), "8080".into()],
            env: vec![
                ("HOME".into(), "/home/dev".into()),
                ("RUST_LOG".into(), "debug".into()),
            ],
            exe: Some(PathBuf::from(EXE)),
            execs: Arc::default(),
        }
    }

    pub fn exec_count(&self) -> usize {
        self.execs.lock().len()
    }

    pub fn execs(&self) -> Vec<(Instant, ExecRequest)> {
        self.execs.lock().clone()
    }
}

impl ProcessImage for FakeProcess {
    fn args(&self) -> Vec<OsString> {
        self.args.clone()
    }

    fn env(&self) -> Vec<(OsString, OsString)> {
        self.env.clone()
    }

    fn current_exe(&self) -> io::Result<PathBuf> {
        self.exe
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no /proc/self/exe"))
    }

    fn exec(&self, request: &ExecRequest) -> io::Error {
        self.execs.lock().push((Instant::now(), request.clone()));
        io::Error::new(io::ErrorKind::PermissionDenied, "simulated exec failure")
    }

    fn abort(&self, error: &RestartError) -> ! {
        panic!("cannot restart: {error}")
    }
}

/// Logger collecting every line.
pub fn capture_log() -> (Logger, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let lines_clone = Arc::clone(&lines);
    let logger = Logger::new(move |args| lines_clone.lock().push(args.to_string()));
    (logger, lines)
}

pub fn change(path: impl Into<PathBuf>, kind: ChangeKind) -> SourceEvent {
    SourceEvent::Change(FsEvent::new(path, kind))
}
