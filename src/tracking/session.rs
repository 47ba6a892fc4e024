//! Runs a `TrackingController` on the walker's device.
//!
//! One tokio task owns the controller. It feeds every `LocationSampler`
//! reading into the controller, applies UI events, and checks the flush
//! cadence on its own interval while walking. Client calls block, so the
//! controller is moved onto the blocking pool for each call and handed back.
//!
//! Stopping (or dropping) the handle ends the task, which drops both the
//! flush interval and the sampler.

use std::time::{Duration, Instant};

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::{FLUSH_INTERVAL_SECS, SAMPLE_INTERVAL_SECS};

use super::client::TrackingClient;
use super::controller::{ControllerError, TrackingController, TrackingEvent, TrackingState};
use super::sampler::{LocationSample, LocationSampler};

/// Sampling and flush cadence for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub sample_every: Duration,
    pub flush_every: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            sample_every: Duration::from_secs(SAMPLE_INTERVAL_SECS),
            flush_every: Duration::from_secs(FLUSH_INTERVAL_SECS),
        }
    }
}

/// Snapshot of the controller, refreshed after every step of the task.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub state: TrackingState,
    pub last_error: Option<String>,
    pub buffered: usize,
}

impl SessionStatus {
    fn of<C: TrackingClient>(controller: &TrackingController<C>) -> Self {
        Self {
            state: controller.state(),
            last_error: controller.last_error().map(str::to_string),
            buffered: controller.buffered(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Controller(#[from] ControllerError),
    #[error("Tracking session has stopped")]
    Stopped,
}

type EventReply = oneshot::Sender<Result<TrackingState, ControllerError>>;

/// Handle to a running session. Dropping it stops the session.
pub struct SessionHandle {
    events_tx: mpsc::Sender<(TrackingEvent, EventReply)>,
    status_rx: watch::Receiver<SessionStatus>,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl SessionHandle {
    /// Apply one UI event and wait for the controller's answer.
    pub async fn send(&self, event: TrackingEvent) -> Result<TrackingState, SessionError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.events_tx
            .send((event, reply_tx))
            .await
            .map_err(|_| SessionError::Stopped)?;
        let result = reply_rx.await.map_err(|_| SessionError::Stopped)?;
        Ok(result?)
    }

    pub fn status(&self) -> SessionStatus {
        self.status_rx.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Ask the session to stop. Safe to call more than once.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Wait until the session task has exited.
    pub async fn stopped(&mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start a session at the standard device cadence.
pub fn run_session<C>(controller: TrackingController<C>) -> SessionHandle
where
    C: TrackingClient + Send + 'static,
{
    run_session_with(controller, SessionTiming::default())
}

/// Start a session with explicit timing. Must be called inside a tokio runtime.
pub fn run_session_with<C>(controller: TrackingController<C>, timing: SessionTiming) -> SessionHandle
where
    C: TrackingClient + Send + 'static,
{
    let controller = controller.with_flush_interval(timing.flush_every);
    let (events_tx, events_rx) = mpsc::channel(8);
    let (status_tx, status_rx) = watch::channel(SessionStatus::of(&controller));
    let (stop_tx, stop_rx) = oneshot::channel();

    let task = tokio::spawn(drive(controller, timing, events_rx, status_tx, stop_rx));

    SessionHandle {
        events_tx,
        status_rx,
        stop_tx: Some(stop_tx),
        task: Some(task),
    }
}

async fn drive<C>(
    mut controller: TrackingController<C>,
    timing: SessionTiming,
    mut events_rx: mpsc::Receiver<(TrackingEvent, EventReply)>,
    status_tx: watch::Sender<SessionStatus>,
    mut stop_rx: oneshot::Receiver<()>,
) where
    C: TrackingClient + Send + 'static,
{
    let walk_id = controller.walk_id().to_string();

    let (sample_tx, mut sample_rx) = mpsc::unbounded_channel::<LocationSample>();
    let sampler = LocationSampler::start(controller.provider(), timing.sample_every, move |sample| {
        let _ = sample_tx.send(sample);
    });

    let mut flush = tokio::time::interval(timing.flush_every);
    flush.set_missed_tick_behavior(MissedTickBehavior::Delay);
    flush.tick().await; // Consume initial immediate tick

    tracing::info!(walk_id = %walk_id, "Tracking session started");

    loop {
        tokio::select! {
            biased;

            _ = &mut stop_rx => break,
            command = events_rx.recv() => {
                let Some((event, reply)) = command else { break };
                let Some((returned, result)) =
                    on_blocking_pool(controller, move |c| c.transition(event)).await
                else {
                    return;
                };
                controller = returned;

                if matches!(result, Ok(TrackingState::Walking)) {
                    // Flush cadence starts when the walk does.
                    flush.reset();
                }
                let finished = matches!(result, Ok(TrackingState::Complete));
                status_tx.send_replace(SessionStatus::of(&controller));
                let _ = reply.send(result);
                if finished {
                    break;
                }
            }
            Some(sample) = sample_rx.recv() => controller.record_sample(sample),
            _ = flush.tick() => {
                if controller.state() != TrackingState::Walking {
                    continue;
                }
                let Some((returned, _flushed)) =
                    on_blocking_pool(controller, |c| c.flush_if_due(Instant::now())).await
                else {
                    return;
                };
                controller = returned;
            }
        }
        status_tx.send_replace(SessionStatus::of(&controller));
    }

    drop(sampler);
    // Blocking clients must not be dropped on a runtime thread.
    let _ = tokio::task::spawn_blocking(move || drop(controller)).await;
    tracing::info!(walk_id = %walk_id, "Tracking session stopped");
}

/// Run `f` against the controller on the blocking pool and hand it back.
async fn on_blocking_pool<C, T, F>(
    mut controller: TrackingController<C>,
    f: F,
) -> Option<(TrackingController<C>, T)>
where
    C: TrackingClient + Send + 'static,
    T: Send + 'static,
    F: FnOnce(&mut TrackingController<C>) -> T + Send + 'static,
{
    let joined = tokio::task::spawn_blocking(move || {
        let out = f(&mut controller);
        (controller, out)
    })
    .await;

    match joined {
        Ok(pair) => Some(pair),
        Err(e) => {
            tracing::error!(error = %e, "Tracking session call panicked, session ended");
            None
        }
    }
}
