//! Watch registry, debounce timers, event loop and restart protocol.

mod builder;
mod debounce;
mod event_loop;
mod registry;
mod restart;

pub use builder::{ReloadHandle, Reloader, ReloaderBuilder};
pub use debounce::{DEBOUNCE, DebounceTimer};
pub use event_loop::EventLoop;
pub use registry::{Action, Callback, Dir, WatchRegistry, WatchedPath};
pub use restart::{PreExecHook, Restarter};
