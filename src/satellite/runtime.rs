use crate::audio::AudioCapture;
use crate::event_loop::{EventLoop, EventLoopStats, EventPoster};
use crate::recognition::{run_feed_task, AudioFeeder, CommandDetector, RecognitionEngine};
use crate::task::{spawn_task, TaskSpec};
use anyhow::Result;
use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

struct TaskSlot {
    name: &'static str,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TaskSlot {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            stop: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.join();
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(task = self.name, "task panicked");
            }
        }
    }
}

/// The three long-lived tasks of a running satellite.
pub struct Satellite {
    events: Arc<EventLoop>,
    poster: EventPoster,
    feed: TaskSlot,
    detect: TaskSlot,
    event_task: TaskSlot,
}

impl Satellite {
    /// Start the event, detect and feed tasks, in that order.
    ///
    /// The engine must have finished command registration.
    pub fn start(
        engine: RecognitionEngine,
        event_loop: EventLoop,
        capture: Box<dyn AudioCapture>,
    ) -> Result<Self> {
        let feeder = engine.feeder();
        let detector = engine.into_detector()?;
        let events = Arc::new(event_loop);
        let mut satellite = Self {
            poster: events.poster(),
            events,
            feed: TaskSlot::new(TaskSpec::FEED.name),
            detect: TaskSlot::new(TaskSpec::DETECT.name),
            event_task: TaskSlot::new(TaskSpec::EVENTS.name),
        };
        if let Err(err) = satellite.spawn_tasks(feeder, detector, capture) {
            satellite.shutdown();
            return Err(err);
        }
        tracing::info!("satellite ready");
        Ok(satellite)
    }

    fn spawn_tasks(
        &mut self,
        feeder: AudioFeeder,
        mut detector: CommandDetector,
        mut capture: Box<dyn AudioCapture>,
    ) -> Result<()> {
        let events = self.events.clone();
        let stop = self.event_task.stop.clone();
        self.event_task.handle = Some(spawn_task(TaskSpec::EVENTS, move || {
            events.run_until(&stop)
        })?);

        let stop = self.detect.stop.clone();
        self.detect.handle = Some(spawn_task(TaskSpec::DETECT, move || {
            detector.run(Some(&stop))
        })?);

        let stop = self.feed.stop.clone();
        self.feed.handle = Some(spawn_task(TaskSpec::FEED, move || {
            if let Err(err) = run_feed_task(&feeder, capture.as_mut(), Some(&stop)) {
                tracing::error!(error = %format!("{err:#}"), "feed task failed");
            }
        })?);
        Ok(())
    }

    pub fn stats(&self) -> EventLoopStats {
        self.events.stats()
    }

    /// Block on the tasks. They never exit on their own; a panic on any of
    /// them aborts the process.
    pub fn wait(mut self) {
        self.event_task.join();
        self.detect.join();
        self.feed.join();
    }

    /// Stop the tasks in pipeline order.
    ///
    /// Feed goes first so nothing blocks on a full front end, then detect.
    /// A barrier entry is posted after detect exits, so every callback it
    /// posted has run before the event task is stopped.
    pub fn shutdown(&mut self) {
        self.feed.stop_and_join();
        self.detect.stop_and_join();
        let events_alive = self
            .event_task
            .handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        if events_alive {
            let (done_tx, done_rx) = bounded::<()>(1);
            self.poster.post(move || {
                let _ = done_tx.send(());
            });
            if done_rx.recv_timeout(DRAIN_TIMEOUT).is_err() {
                tracing::warn!("event queue did not drain before shutdown");
            }
        }
        self.event_task.stop_and_join();
        let stats = self.events.stats();
        tracing::info!(
            executed = stats.executed,
            dropped = stats.dropped,
            "satellite stopped"
        );
    }
}

impl Drop for Satellite {
    fn drop(&mut self) {
        if self.feed.handle.is_some()
            || self.detect.handle.is_some()
            || self.event_task.handle.is_some()
        {
            self.shutdown();
        }
    }
}
