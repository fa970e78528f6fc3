//! Bounded single-consumer queue of deferred actions.
//!
//! Detection runs on a latency-sensitive task that must never execute user
//! callbacks itself. It posts boxed closures here and one event task runs them
//! in the order they were accepted.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_QUEUE_CAPACITY: usize = 10;
pub const DEFAULT_WAIT: Duration = Duration::from_millis(1000);

/// One queued unit of work. Runs exactly once on the event task.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Default)]
struct Counters {
    executed: AtomicUsize,
    dropped: AtomicUsize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventLoopStats {
    pub executed: usize,
    pub dropped: usize,
}

/// Consumer side of the queue. Owned by the event task.
pub struct EventLoop {
    sender: Sender<Action>,
    receiver: Receiver<Action>,
    wait: Duration,
    counters: Arc<Counters>,
}

impl EventLoop {
    pub fn new(capacity: usize) -> Self {
        Self::with_wait(capacity, DEFAULT_WAIT)
    }

    /// `wait` bounds how long the consumer blocks before re-checking for work.
    pub fn with_wait(capacity: usize, wait: Duration) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            wait,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Producer handle; clone it freely across tasks.
    pub fn poster(&self) -> EventPoster {
        EventPoster {
            sender: self.sender.clone(),
            counters: self.counters.clone(),
        }
    }

    pub fn stats(&self) -> EventLoopStats {
        EventLoopStats {
            executed: self.counters.executed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }

    /// Run queued actions forever.
    pub fn run(&self) {
        let never = AtomicBool::new(false);
        self.run_until(&never);
    }

    /// Run queued actions until `stop` is observed at a wake-up.
    ///
    /// The flag is checked between actions and after every idle wait, so
    /// shutdown latency is bounded by the configured wait.
    pub fn run_until(&self, stop: &AtomicBool) {
        tracing::debug!(wait_ms = self.wait.as_millis() as u64, "event loop started");
        while !stop.load(Ordering::Acquire) {
            match self.receiver.recv_timeout(self.wait) {
                Ok(action) => self.execute(action),
                Err(RecvTimeoutError::Timeout) => continue,
                // Unreachable while `self` holds a sender.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        tracing::debug!(
            executed = self.counters.executed.load(Ordering::Relaxed),
            dropped = self.counters.dropped.load(Ordering::Relaxed),
            "event loop stopped"
        );
    }

    /// Run whatever is queued right now without waiting; returns the count run.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(action) = self.receiver.try_recv() {
            self.execute(action);
            ran += 1;
        }
        ran
    }

    fn execute(&self, action: Action) {
        action();
        self.counters.executed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Producer side of the queue.
#[derive(Clone)]
pub struct EventPoster {
    sender: Sender<Action>,
    counters: Arc<Counters>,
}

impl EventPoster {
    /// Enqueue `action`, blocking while the queue is full.
    pub fn post<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut action: Action = Box::new(action);
        loop {
            match self.sender.send_timeout(action, DEFAULT_WAIT) {
                Ok(()) => return,
                Err(SendTimeoutError::Timeout(back)) => {
                    tracing::debug!(pending = self.sender.len(), "event queue full; still waiting");
                    action = back;
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    tracing::warn!("event loop is gone; dropping posted action");
                    return;
                }
            }
        }
    }

    /// Enqueue `action` from a context that must not block.
    ///
    /// Returns `false` when the queue is full; the action is dropped and
    /// counted. Nothing is logged on this path.
    pub fn post_from_isr<F>(&self, action: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match self.sender.try_send(Box::new(action)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Entries accepted but not yet run.
    pub fn pending(&self) -> usize {
        self.sender.len()
    }
}
