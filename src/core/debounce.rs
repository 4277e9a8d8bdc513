//! Resettable one-shot timers.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};

/// Quiet period after the last qualifying event before an action fires.
pub const DEBOUNCE: Duration = Duration::from_millis(100);

/// A timer that fires its action once the deadline passes, where every
/// [`reset`](Self::reset) pushes the deadline out again.
///
/// The timer is a single tokio task created in the stopped state and reused
/// for its whole lifetime. At most one fire is ever pending: re-arming a
/// pending timer replaces its deadline in place. Dropping the timer cancels
/// the task.
///
/// Must be created from within a tokio runtime.
pub struct DebounceTimer {
    delay: Duration,
    arm_tx: mpsc::UnboundedSender<Instant>,
    task: JoinHandle<()>,
}

impl DebounceTimer {
    /// Create a stopped timer that runs `fire` `delay` after the last reset.
    pub fn new<F>(delay: Duration, fire: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (arm_tx, arm_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_timer(arm_rx, fire));

        Self {
            delay,
            arm_tx,
            task,
        }
    }

    /// (Re)arm the timer with a deadline of now + delay.
    pub fn reset(&self) {
        let _ = self.arm_tx.send(Instant::now() + self.delay);
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_timer<F>(mut arm_rx: mpsc::UnboundedReceiver<Instant>, fire: F)
where
    F: Fn() + Send + Sync + 'static,
{
    // Stopped until the first reset.
    while let Some(deadline) = arm_rx.recv().await {
        let sleep = sleep_until(deadline);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                () = &mut sleep => break,
                next = arm_rx.recv() => match next {
                    Some(deadline) => sleep.as_mut().reset(deadline),
                    None => return,
                },
            }
        }

        tracing::trace!("debounce timer fired");
        fire();
    }
}
