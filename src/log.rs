//! Formatted-message log sink.
//!
//! The reloader reports its startup line and runtime errors through a
//! [`Logger`]. Any `Fn(fmt::Arguments)` works, so plugging in `println!`,
//! `eprintln!` or a `tracing` macro is a one-liner.

use std::fmt;
use std::sync::Arc;

type Sink = Arc<dyn Fn(fmt::Arguments<'_>) + Send + Sync>;

/// Cheaply cloneable handle to a log sink.
#[derive(Clone)]
pub struct Logger {
    sink: Sink,
}

impl Logger {
    /// Wrap a sink function.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hotswap_exec::Logger;
    ///
    /// let logger = Logger::new(|args| eprintln!("{args}"));
    /// logger.log(format_args!("watching {}", "/srv/app"));
    /// ```
    pub fn new<F>(sink: F) -> Self
    where
        F: Fn(fmt::Arguments<'_>) + Send + Sync + 'static,
    {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Sink that forwards every message to `tracing` at `info` level.
    pub fn tracing() -> Self {
        Self::new(|args| tracing::info!(target: "hotswap_exec", "{}", args))
    }

    /// Emit one message.
    pub fn log(&self, args: fmt::Arguments<'_>) {
        (self.sink)(args);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::tracing()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_logger_formats_arguments() {
        let lines = Arc::new(Mutex::new(Vec::new()));
        let lines_clone = Arc::clone(&lines);
        let logger = Logger::new(move |args| lines_clone.lock().push(args.to_string()));

        logger.log(format_args!("reload error: {}", 42));
        logger.clone().log(format_args!("second"));

        assert_eq!(*lines.lock(), vec!["reload error: 42", "second"]);
    }
}
