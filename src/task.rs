//! Named long-lived tasks.
//!
//! Each of the satellite's loops gets its own OS thread with an explicit name
//! and stack budget, mirroring how the firmware sizes its tasks.
//!
//! A panic on a task is fatal for the whole process. The tasks depend on each
//! other (a dead detect task leaves the feed task blocked on a full front end),
//! so one of them dying must not leave the rest running.

use anyhow::{Context, Result};
use std::panic::{self, AssertUnwindSafe};
use std::process;
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    pub name: &'static str,
    pub stack_size: usize,
}

impl TaskSpec {
    pub const FEED: TaskSpec = TaskSpec {
        name: "feed",
        stack_size: 256 * 1024,
    };
    pub const DETECT: TaskSpec = TaskSpec {
        name: "detect",
        stack_size: 512 * 1024,
    };
    pub const EVENTS: TaskSpec = TaskSpec {
        name: "events",
        stack_size: 256 * 1024,
    };
}

/// Spawn `body` on its own named thread.
///
/// If `body` panics the process aborts once the panic message is printed.
pub fn spawn_task<F>(spec: TaskSpec, body: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    let handle = thread::Builder::new()
        .name(spec.name.to_string())
        .stack_size(spec.stack_size)
        .spawn(move || {
            tracing::debug!(task = spec.name, "task started");
            if panic::catch_unwind(AssertUnwindSafe(body)).is_err() {
                tracing::error!(task = spec.name, "task panicked; aborting");
                process::abort();
            }
            tracing::debug!(task = spec.name, "task exited");
        })
        .with_context(|| format!("failed to spawn {} task", spec.name))?;
    Ok(handle)
}
