//! Walk tracking: the server-side action handler plus the pieces a
//! walker's device runs (location sampler, session controller, HTTP client).
//!
//! Flow: UI event → `TrackingController` takes a sample from the
//! `LocationSampler`/`GeolocationProvider` → `TrackingClient` posts the action →
//! `service::apply_tracking_action` merges it into the stored walk.
//! `session::run_session` ties the sampler, flush cadence and controller
//! together on the device.

pub mod client;
pub mod controller;
pub mod request;
pub mod sampler;
pub mod service;
pub mod session;

pub use client::{ClientError, HttpTrackingClient, TrackingClient, TrackingResponse};
pub use controller::{ControllerError, TrackingController, TrackingEvent, TrackingState};
pub use request::{TrackingAction, TrackingError, TrackingRequest};
pub use sampler::{
    sample_now, Coordinates, DeviceError, GeolocationProvider, LocationSample, LocationSampler,
    SamplerHandle,
};
pub use service::{apply_tracking_action, fetch_tracking};
pub use session::{
    run_session, run_session_with, SessionError, SessionHandle, SessionStatus, SessionTiming,
};
