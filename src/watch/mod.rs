//! Filesystem notification sources.
//!
//! The reloader consumes a stream of [`SourceEvent`]s and registers
//! directories through an [`EventSource`]. [`NotifySource`] is the default
//! implementation, built on the `notify` crate.

pub mod source;

#[cfg(feature = "file-watch")]
pub mod notify_source;

pub use source::{ChangeKind, EventSource, FsEvent, SourceEvent};

#[cfg(feature = "file-watch")]
pub use notify_source::NotifySource;
