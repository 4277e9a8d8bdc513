//! Error types for hotswap-exec.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

/// Result type alias for hotswap-exec operations.
pub type Result<T> = std::result::Result<T, ReloadError>;

/// Errors that can occur while setting up or running the reloader.
#[derive(Debug, thiserror::Error)]
pub enum ReloadError {
    /// An additional directory was rejected during setup.
    #[error("reload setup: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The notification backend could not be created.
    #[error("reload setup: cannot setup watcher: {0}")]
    WatcherInit(String),

    /// A directory could not be registered with the event source.
    #[error("reload setup: cannot add {path:?} to watcher: {message}")]
    Subscription {
        /// Directory that could not be watched
        path: PathBuf,
        /// Message from the event source
        message: String,
    },

    /// Asynchronous error reported by the event source while running.
    #[error("reload error: {message}")]
    Stream {
        /// Message from the event source
        message: String,
    },

    /// The process cannot be restarted.
    #[error(transparent)]
    Restart(#[from] RestartError),
}

impl ReloadError {
    /// Create a subscription error for `path`.
    pub fn subscription(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Subscription {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create a stream error.
    pub fn stream(message: impl ToString) -> Self {
        Self::Stream {
            message: message.to_string(),
        }
    }
}

/// An additional directory passed to setup is unusable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The path could not be made absolute.
    #[error("cannot get absolute path to {path:?}: {source}")]
    Resolve {
        /// Path as given by the caller
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The path could not be stat'ed (usually: it does not exist).
    #[error("cannot stat {path:?}: {source}")]
    Stat {
        /// Absolute path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// The path exists but is not a directory.
    #[error("not a directory: {path:?}; can only watch directories")]
    NotADirectory {
        /// Path as given by the caller
        path: PathBuf,
    },

    /// The same directory was registered more than once.
    #[error("directory {path:?} is already watched")]
    Duplicate {
        /// Absolute path
        path: PathBuf,
    },
}

/// The running binary cannot be replaced with a fresh copy.
#[derive(Debug, thiserror::Error)]
pub enum RestartError {
    /// Neither `argv[0]` nor the OS could tell where the binary lives.
    #[error("cannot get path to binary {argv0:?} (launch with absolute path): {source}")]
    SelfPath {
        /// `argv[0]` of the running process
        argv0: OsString,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// `execve` returned.
    #[error("cannot exec {path:?}: {source}")]
    Exec {
        /// Program that was being executed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_display() {
        let err = ConfigurationError::NotADirectory {
            path: PathBuf::from("tpl/index.html"),
        };
        assert!(err.to_string().contains("not a directory"));
        assert!(err.to_string().contains("tpl/index.html"));

        let err: ReloadError = err.into();
        assert!(matches!(err, ReloadError::Configuration(_)));
    }

    #[test]
    fn test_subscription_error_names_path() {
        let err = ReloadError::subscription("/srv/app", "permission denied");
        let msg = err.to_string();
        assert!(msg.contains("/srv/app"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn test_self_path_error_suggests_absolute_launch() {
        let err = RestartError::SelfPath {
            argv0: OsString::from("app"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("launch with absolute path"));
    }
}
