//! # hotswap-exec
//!
//! Restart a long-running process automatically when its binary is rebuilt.
//!
//! ## Overview
//!
//! `hotswap-exec` watches the directory containing the running executable.
//! When the executable is written or re-created, it waits for a 100ms quiet
//! period and then replaces the process image with a fresh copy of itself
//! (`execve`), keeping the original arguments and environment. Additional
//! directories can be watched with a callback instead, for example to reload
//! templates without restarting.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # async fn example() -> hotswap_exec::Result<()> {
//! tokio::spawn(async {
//!     if let Err(e) = hotswap_exec::start(|args| eprintln!("{args}"), []).await {
//!         panic!("{e}");
//!     }
//! });
//! # Ok(())
//! # }
//! ```
//!
//! With additional directories and a pre-exec hook:
//!
//! ```rust,no_run
//! use hotswap_exec::Reloader;
//!
//! # async fn example() -> hotswap_exec::Result<()> {
//! let handle = Reloader::builder()
//!     .dir("tpl", || println!("reloading templates"))
//!     .pre_exec(|| println!("closing database"))
//!     .spawn()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Caveats
//!
//! Because the process image is replaced, `Drop` impls, deferred cleanup and
//! signal handlers do not run on restart. Register cleanup with
//! [`Restarter::set_pre_exec_hook`] or [`ReloaderBuilder::pre_exec`].
//!
//! The executable should be launched through an absolute path; otherwise the
//! OS is asked where it lives, which can fail on some platforms.
//!
//! ## Feature Flags
//!
//! - `file-watch` (default): the `notify` backed [`watch::NotifySource`].

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod log;
pub mod process;
pub mod watch;

pub use crate::core::{Dir, ReloadHandle, Reloader, ReloaderBuilder, Restarter};
pub use crate::error::{ConfigurationError, ReloadError, RestartError, Result};
pub use crate::log::Logger;

use std::fmt;
use std::sync::Arc;

/// Restart the process whenever its binary changes, and run the callbacks
/// of `additional` when their directories change.
///
/// `log` receives the startup message and runtime errors. Only
/// initialization errors are returned; on success this runs until the
/// process is replaced.
///
/// # Errors
///
/// Returns an error if the executable cannot be located, an additional
/// directory is invalid, or a directory cannot be watched.
pub async fn start<F>(log: F, additional: impl IntoIterator<Item = Dir>) -> Result<()>
where
    F: Fn(fmt::Arguments<'_>) + Send + Sync + 'static,
{
    Reloader::builder().log(log).dirs(additional).start().await
}

/// Replace the process with a fresh copy of itself right now.
///
/// Uses the running reloader when one was spawned, so its pre-exec hook
/// runs, its watcher is closed and the executable path found at setup is
/// reused. Without prior setup the path is resolved on the spot. Aborts the
/// process if the restart fails.
pub fn restart() -> ! {
    match Restarter::active() {
        Some(restarter) => restarter.restart(),
        None => Restarter::new(Arc::new(process::OsProcess), Logger::default()).restart(),
    }
}

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{Dir, ReloadHandle, Reloader, Restarter};
    pub use crate::error::{ReloadError, Result};
    pub use crate::log::Logger;
}
