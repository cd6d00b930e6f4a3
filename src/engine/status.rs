//! Completion signal of a result table.

use parking_lot::{Condvar, Mutex};
use std::time::Duration;

/// Monitor over a single "finished" flag.
///
/// `mark_finished`, `is_finished` and the waits all consult the same guarded
/// boolean, and waiters re-check it under the lock after every wakeup, so a
/// caller that checks and then waits can never miss the notification.
#[derive(Debug, Default)]
pub struct CompletionStatus {
    finished: Mutex<bool>,
    cv: Condvar,
}

impl CompletionStatus {
    /// Creates a status that is still in progress.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state(finished: bool) -> Self {
        Self {
            finished: Mutex::new(finished),
            cv: Condvar::new(),
        }
    }

    /// Marks the status as finished and wakes every waiting thread.
    pub fn mark_finished(&self) {
        let mut finished = self.finished.lock();
        *finished = true;
        self.cv.notify_all();
    }

    pub fn is_finished(&self) -> bool {
        *self.finished.lock()
    }

    /// Blocks until the status is finished. Returns immediately if it already is.
    pub fn await_finished(&self) {
        let mut finished = self.finished.lock();
        while !*finished {
            self.cv.wait(&mut finished);
        }
    }

    /// Like `await_finished`, but gives up after `timeout`. Returns whether the
    /// status is finished.
    pub fn await_finished_for(&self, timeout: Duration) -> bool {
        let mut finished = self.finished.lock();
        if !*finished {
            self.cv
                .wait_while_for(&mut finished, |finished| !*finished, timeout);
        }
        *finished
    }

    /// Resets to "in progress". Requires exclusive access, so nobody can be waiting.
    pub fn reset(&mut self) {
        *self.finished.get_mut() = false;
    }
}

impl Clone for CompletionStatus {
    fn clone(&self) -> Self {
        Self::with_state(self.is_finished())
    }
}
