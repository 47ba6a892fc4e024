//! Periodic device location sampling.
//!
//! The device's geolocation capability sits behind `GeolocationProvider`.
//! `LocationSampler` polls it on a fixed interval from a background tokio
//! task; a failed read is recorded and the tick is skipped. The next tick is
//! the only retry.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;

use crate::config::SAMPLE_INTERVAL_SECS;
use crate::models::TrackPoint;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One timestamped position reading.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSample {
    pub lat: f64,
    pub lng: f64,
    pub taken_at: DateTime<Utc>,
}

impl LocationSample {
    pub fn new(coordinates: Coordinates, taken_at: DateTime<Utc>) -> Self {
        Self {
            lat: coordinates.latitude,
            lng: coordinates.longitude,
            taken_at,
        }
    }
}

impl From<&LocationSample> for TrackPoint {
    fn from(sample: &LocationSample) -> Self {
        TrackPoint::new(sample.lat, sample.lng, sample.taken_at.to_rfc3339())
    }
}

/// Failures reading the device position. Never sent to the server.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeviceError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

/// Device geolocation capability.
pub trait GeolocationProvider: Send + Sync {
    fn current_position(&self) -> Result<Coordinates, DeviceError>;
}

/// Take one sample right now.
pub fn sample_now(provider: &dyn GeolocationProvider) -> Result<LocationSample, DeviceError> {
    let coordinates = provider.current_position()?;
    Ok(LocationSample::new(coordinates, Utc::now()))
}

// ═══════════════════════════════════════════════════════════
// Background sampler
// ═══════════════════════════════════════════════════════════

pub struct LocationSampler;

impl LocationSampler {
    /// Start sampling at the standard device cadence.
    pub fn start_default<F>(provider: Arc<dyn GeolocationProvider>, on_sample: F) -> SamplerHandle
    where
        F: FnMut(LocationSample) + Send + 'static,
    {
        Self::start(provider, Duration::from_secs(SAMPLE_INTERVAL_SECS), on_sample)
    }

    /// Start sampling every `interval`, handing each sample to `on_sample`.
    ///
    /// Must be called from within a tokio runtime. The provider is invoked on
    /// the blocking pool since device reads may block.
    pub fn start<F>(
        provider: Arc<dyn GeolocationProvider>,
        interval: Duration,
        mut on_sample: F,
    ) -> SamplerHandle
    where
        F: FnMut(LocationSample) + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let last_error: Arc<Mutex<Option<String>>> = Arc::new(Mutex::new(None));
        let error_slot = Arc::clone(&last_error);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {}
                }

                let provider = Arc::clone(&provider);
                let result = tokio::task::spawn_blocking(move || sample_now(provider.as_ref()))
                    .await
                    .unwrap_or_else(|e| Err(DeviceError::Unavailable(e.to_string())));

                match result {
                    Ok(sample) => {
                        if let Ok(mut slot) = error_slot.lock() {
                            *slot = None;
                        }
                        on_sample(sample);
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, "Location sample skipped");
                        if let Ok(mut slot) = error_slot.lock() {
                            *slot = Some(err.to_string());
                        }
                    }
                }
            }

            tracing::debug!("Location sampler stopped");
        });

        SamplerHandle {
            stop_tx: Some(stop_tx),
            last_error,
        }
    }
}

/// Running sampler. Dropping the handle stops the timer.
pub struct SamplerHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    last_error: Arc<Mutex<Option<String>>>,
}

impl SamplerHandle {
    /// Error text from the most recent tick, cleared by the next success.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn is_running(&self) -> bool {
        self.stop_tx.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for SamplerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
