//! Device-side tracking session for one walk.
//!
//! A linear state machine: `Idle → Pickup → Walking → Dropoff → Complete`.
//! Every transition needs a current location sample (taken on demand when
//! none is held) and a successful call to the tracking endpoint; if either
//! fails the state stays put and the error text is kept for display, so
//! pressing the button again is a safe retry.
//!
//! While walking, samples are buffered (latest `FLUSH_BATCH_SIZE` only) and
//! pushed with an `update` action every `FLUSH_INTERVAL_SECS`. The controller
//! itself never sleeps; `tracking::session` supplies samples and flush ticks.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{FLUSH_BATCH_SIZE, FLUSH_INTERVAL_SECS};
use crate::models::{TrackPoint, WalkTrackingView};

use super::client::{ClientError, TrackingClient};
use super::request::{TrackingAction, TrackingRequest};
use super::sampler::{sample_now, DeviceError, GeolocationProvider, LocationSample};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Idle,
    Pickup,
    Walking,
    Dropoff,
    Complete,
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Pickup => "pickup",
            Self::Walking => "walking",
            Self::Dropoff => "dropoff",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingEvent {
    RecordPickup,
    StartWalk,
    EndWalk,
    RecordDropoff,
}

impl fmt::Display for TrackingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::RecordPickup => "record pickup",
            Self::StartWalk => "start walk",
            Self::EndWalk => "end walk",
            Self::RecordDropoff => "record dropoff",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ControllerError {
    #[error("Cannot {event} while {from}")]
    InvalidTransition {
        from: TrackingState,
        event: TrackingEvent,
    },
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Owns the tracking state of one walk on the walker's device.
pub struct TrackingController<C> {
    walk_id: String,
    state: TrackingState,
    client: C,
    provider: Arc<dyn GeolocationProvider>,
    current: Option<LocationSample>,
    buffer: VecDeque<LocationSample>,
    last_flush: Option<Instant>,
    flush_every: Duration,
    last_error: Option<String>,
    last_view: Option<WalkTrackingView>,
}

impl<C: TrackingClient> TrackingController<C> {
    pub fn new(walk_id: impl Into<String>, client: C, provider: Arc<dyn GeolocationProvider>) -> Self {
        Self {
            walk_id: walk_id.into(),
            state: TrackingState::Idle,
            client,
            provider,
            current: None,
            buffer: VecDeque::with_capacity(FLUSH_BATCH_SIZE),
            last_flush: None,
            flush_every: Duration::from_secs(FLUSH_INTERVAL_SECS),
            last_error: None,
            last_view: None,
        }
    }

    /// Override the flush cadence.
    pub fn with_flush_interval(mut self, every: Duration) -> Self {
        self.flush_every = every;
        self
    }

    pub fn provider(&self) -> Arc<dyn GeolocationProvider> {
        Arc::clone(&self.provider)
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn walk_id(&self) -> &str {
        &self.walk_id
    }

    /// Inline error text from the last failed action, cleared on success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Server's view of the walk after the last successful call.
    pub fn last_view(&self) -> Option<&WalkTrackingView> {
        self.last_view.as_ref()
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Feed a sample from the sampler.
    pub fn record_sample(&mut self, sample: LocationSample) {
        if self.state == TrackingState::Walking {
            if self.buffer.len() == FLUSH_BATCH_SIZE {
                self.buffer.pop_front();
            }
            self.buffer.push_back(sample.clone());
        }
        self.current = Some(sample);
    }

    /// Advance the session. On any error the state is unchanged.
    pub fn transition(&mut self, event: TrackingEvent) -> Result<TrackingState, ControllerError> {
        let result = self.try_transition(event);
        match &result {
            Ok(state) => {
                self.last_error = None;
                tracing::info!(walk_id = %self.walk_id, state = %state, "Tracking session advanced");
            }
            Err(err) => {
                self.last_error = Some(err.to_string());
                tracing::warn!(walk_id = %self.walk_id, error = %err, "Tracking transition failed");
            }
        }
        result
    }

    fn try_transition(&mut self, event: TrackingEvent) -> Result<TrackingState, ControllerError> {
        let next = match (self.state, event) {
            (TrackingState::Idle, TrackingEvent::RecordPickup) => TrackingState::Pickup,
            (TrackingState::Pickup, TrackingEvent::StartWalk) => TrackingState::Walking,
            (TrackingState::Walking, TrackingEvent::EndWalk) => TrackingState::Dropoff,
            (TrackingState::Dropoff, TrackingEvent::RecordDropoff) => TrackingState::Complete,
            (from, event) => return Err(ControllerError::InvalidTransition { from, event }),
        };

        let point = TrackPoint::from(&self.ensure_sample()?);
        let request = match event {
            TrackingEvent::RecordPickup => TrackingRequest {
                pickup_location: Some(point),
                ..TrackingRequest::new(&self.walk_id, TrackingAction::Pickup)
            },
            TrackingEvent::StartWalk => TrackingRequest {
                walk_start_location: Some(point.clone()),
                route_coordinates: Some(vec![point]),
                is_tracking_active: Some(true),
                ..TrackingRequest::new(&self.walk_id, TrackingAction::Start)
            },
            TrackingEvent::EndWalk => TrackingRequest {
                walk_end_location: Some(point),
                route_coordinates: Some(self.buffer.iter().map(TrackPoint::from).collect()),
                is_tracking_active: Some(false),
                ..TrackingRequest::new(&self.walk_id, TrackingAction::End)
            },
            TrackingEvent::RecordDropoff => TrackingRequest {
                dropoff_location: Some(point),
                is_tracking_active: Some(false),
                ..TrackingRequest::new(&self.walk_id, TrackingAction::Dropoff)
            },
        };

        let view = self.client.send(&request)?;

        self.last_view = Some(view);
        match next {
            TrackingState::Walking => {
                self.buffer.clear();
                self.last_flush = Some(Instant::now());
            }
            TrackingState::Dropoff => {
                self.buffer.clear();
                self.last_flush = None;
            }
            _ => {}
        }
        self.state = next;
        Ok(next)
    }

    fn ensure_sample(&mut self) -> Result<LocationSample, ControllerError> {
        if let Some(sample) = &self.current {
            return Ok(sample.clone());
        }
        let sample = sample_now(self.provider.as_ref())?;
        self.current = Some(sample.clone());
        Ok(sample)
    }

    /// Flush buffered samples if walking and the cadence has elapsed.
    /// Returns whether an `update` was sent.
    pub fn flush_if_due(&mut self, now: Instant) -> Result<bool, ControllerError> {
        if self.state != TrackingState::Walking {
            return Ok(false);
        }
        let due = self
            .last_flush
            .map_or(true, |last| now.saturating_duration_since(last) >= self.flush_every);
        if !due {
            return Ok(false);
        }

        // The cadence restarts whether or not the push succeeds.
        self.last_flush = Some(now);
        if self.buffer.is_empty() {
            return Ok(false);
        }

        let request = TrackingRequest {
            route_coordinates: Some(self.buffer.iter().map(TrackPoint::from).collect()),
            ..TrackingRequest::new(&self.walk_id, TrackingAction::Update)
        };
        match self.client.send(&request) {
            Ok(view) => {
                self.buffer.clear();
                self.last_view = Some(view);
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(walk_id = %self.walk_id, error = %err, "Route flush failed");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    use chrono::Utc;

    use crate::tracking::sampler::tests::ScriptedProvider;
    use crate::tracking::sampler::Coordinates;

    /// Records every request; fails while `fail_next` is set.
    #[derive(Default)]
    struct RecordingClient {
        sent: RefCell<Vec<TrackingRequest>>,
        fail_next: RefCell<bool>,
    }

    impl TrackingClient for &RecordingClient {
        fn send(&self, request: &TrackingRequest) -> Result<WalkTrackingView, ClientError> {
            if self.fail_next.replace(false) {
                return Err(ClientError::Connection("offline".into()));
            }
            self.sent.borrow_mut().push(request.clone());
            Ok(WalkTrackingView {
                id: request.walk_id.clone().unwrap_or_default(),
                pickup_location: None,
                dropoff_location: None,
                walk_start_location: None,
                walk_end_location: None,
                route_coordinates: Vec::new(),
                is_tracking_active: false,
                dog_id: "D1".into(),
                dog: None,
            })
        }
    }

    fn provider() -> Arc<dyn GeolocationProvider> {
        Arc::new(ScriptedProvider::fixed(51.5, -0.1))
    }

    fn sample(lat: f64) -> LocationSample {
        LocationSample::new(Coordinates { latitude: lat, longitude: 0.0 }, Utc::now())
    }

    fn actions(client: &RecordingClient) -> Vec<String> {
        client
            .sent
            .borrow()
            .iter()
            .map(|r| r.action.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn full_session_walks_every_state() {
        let client = RecordingClient::default();
        let mut controller = TrackingController::new("W1", &client, provider());

        assert_eq!(controller.transition(TrackingEvent::RecordPickup).unwrap(), TrackingState::Pickup);
        assert_eq!(controller.transition(TrackingEvent::StartWalk).unwrap(), TrackingState::Walking);
        assert_eq!(controller.transition(TrackingEvent::EndWalk).unwrap(), TrackingState::Dropoff);
        assert_eq!(controller.transition(TrackingEvent::RecordDropoff).unwrap(), TrackingState::Complete);

        assert_eq!(actions(&client), vec!["pickup", "start", "end", "dropoff"]);
        assert!(controller.last_view().is_some());
    }

    #[test]
    fn pickup_fetches_sample_on_demand() {
        let client = RecordingClient::default();
        let mut controller = TrackingController::new("W1", &client, provider());
        controller.transition(TrackingEvent::RecordPickup).unwrap();

        let sent = client.sent.borrow();
        let pickup = sent[0].pickup_location.as_ref().unwrap();
        assert_eq!((pickup.lat, pickup.lng), (51.5, -0.1));
    }

    #[test]
    fn start_walk_seeds_route_with_current_sample() {
        let client = RecordingClient::default();
        let mut controller = TrackingController::new("W1", &client, provider());
        controller.record_sample(sample(10.0));
        controller.transition(TrackingEvent::RecordPickup).unwrap();
        controller.transition(TrackingEvent::StartWalk).unwrap();

        let sent = client.sent.borrow();
        let start = &sent[1];
        assert_eq!(start.walk_start_location.as_ref().unwrap().lat, 10.0);
        assert_eq!(start.route_coordinates.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn out_of_order_event_is_rejected_without_calling_server() {
        let client = RecordingClient::default();
        let mut controller = TrackingController::new("W1", &client, provider());

        let err = controller.transition(TrackingEvent::StartWalk).unwrap_err();
        assert_eq!(
            err,
            ControllerError::InvalidTransition {
                from: TrackingState::Idle,
                event: TrackingEvent::StartWalk
            }
        );
        assert_eq!(controller.state(), TrackingState::Idle);
        assert!(client.sent.borrow().is_empty());
        assert_eq!(controller.last_error(), Some("Cannot start walk while idle"));
    }

    #[test]
    fn server_failure_keeps_state_and_retry_succeeds() {
        let client = RecordingClient::default();
        let mut controller = TrackingController::new("W1", &client, provider());

        *client.fail_next.borrow_mut() = true;
        let err = controller.transition(TrackingEvent::RecordPickup).unwrap_err();
        assert!(matches!(err, ControllerError::Client(_)));
        assert_eq!(controller.state(), TrackingState::Idle);
        assert!(controller.last_error().is_some());

        controller.transition(TrackingEvent::RecordPickup).unwrap();
        assert_eq!(controller.state(), TrackingState::Pickup);
        assert!(controller.last_error().is_none());
    }

    #[test]
    fn device_failure_keeps_state() {
        let client = RecordingClient::default();
        let failing: Arc<dyn GeolocationProvider> =
            Arc::new(ScriptedProvider::new(vec![Err(DeviceError::PermissionDenied)]));
        let mut controller = TrackingController::new("W1", &client, failing);

        let err = controller.transition(TrackingEvent::RecordPickup).unwrap_err();
        assert_eq!(err, ControllerError::Device(DeviceError::PermissionDenied));
        assert_eq!(controller.state(), TrackingState::Idle);
        assert!(client.sent.borrow().is_empty());
    }

    #[test]
    fn flush_sends_latest_five_after_interval() {
        let client = RecordingClient::default();
        let mut controller = TrackingController::new("W1", &client, provider());
        controller.transition(TrackingEvent::RecordPickup).unwrap();
        controller.transition(TrackingEvent::StartWalk).unwrap();

        for i in 0..7 {
            controller.record_sample(sample(i as f64));
        }
        assert_eq!(controller.buffered(), FLUSH_BATCH_SIZE);

        let start = Instant::now();
        assert!(!controller.flush_if_due(start).unwrap());
        let later = start + Duration::from_secs(FLUSH_INTERVAL_SECS + 1);
        assert!(controller.flush_if_due(later).unwrap());

        let sent = client.sent.borrow();
        let update = sent.last().unwrap();
        assert_eq!(update.action.as_deref(), Some("update"));
        let lats: Vec<f64> = update
            .route_coordinates
            .as_ref()
            .unwrap()
            .iter()
            .map(|p| p.lat)
            .collect();
        assert_eq!(lats, vec![2.0, 3.0, 4.0, 5.0, 6.0]);
        drop(sent);
        assert_eq!(controller.buffered(), 0);
    }

    #[test]
    fn flush_is_noop_outside_walking() {
        let client = RecordingClient::default();
        let mut controller = TrackingController::new("W1", &client, provider());
        controller.record_sample(sample(1.0));
        let later = Instant::now() + Duration::from_secs(FLUSH_INTERVAL_SECS * 2);
        assert!(!controller.flush_if_due(later).unwrap());
        assert_eq!(controller.buffered(), 0);
    }

    #[test]
    fn failed_flush_keeps_buffer_for_next_cadence() {
        let client = RecordingClient::default();
        let mut controller = TrackingController::new("W1", &client, provider());
        controller.transition(TrackingEvent::RecordPickup).unwrap();
        controller.transition(TrackingEvent::StartWalk).unwrap();
        controller.record_sample(sample(1.0));

        *client.fail_next.borrow_mut() = true;
        let later = Instant::now() + Duration::from_secs(FLUSH_INTERVAL_SECS + 1);
        assert!(controller.flush_if_due(later).is_err());
        assert_eq!(controller.buffered(), 1);
        assert_eq!(controller.state(), TrackingState::Walking);
    }

    #[test]
    fn end_walk_sends_buffered_final_batch() {
        let client = RecordingClient::default();
        let mut controller = TrackingController::new("W1", &client, provider());
        controller.transition(TrackingEvent::RecordPickup).unwrap();
        controller.transition(TrackingEvent::StartWalk).unwrap();
        controller.record_sample(sample(7.0));
        controller.record_sample(sample(8.0));
        controller.transition(TrackingEvent::EndWalk).unwrap();

        let sent = client.sent.borrow();
        let end = sent.last().unwrap();
        assert_eq!(end.route_coordinates.as_ref().unwrap().len(), 2);
        assert_eq!(end.walk_end_location.as_ref().unwrap().lat, 8.0);
        drop(sent);
        assert_eq!(controller.buffered(), 0);
    }
}
