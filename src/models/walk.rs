use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::dog::DogSummary;
use super::enums::{TimeSlot, WalkStatus};

/// One coordinate sample as exchanged with walker devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub lat: f64,
    pub lng: f64,
    pub timestamp: String,
}

impl TrackPoint {
    pub fn new(lat: f64, lng: f64, timestamp: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            timestamp: timestamp.into(),
        }
    }

    /// Returns a reason when the point cannot be stored.
    pub fn validate(&self) -> Result<(), String> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(format!("latitude {} out of range", self.lat));
        }
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(format!("longitude {} out of range", self.lng));
        }
        if self.timestamp.trim().is_empty() {
            return Err("timestamp is required".into());
        }
        Ok(())
    }
}

/// A scheduled or completed outing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Walk {
    pub id: String,
    pub dog_id: String,
    pub walker_id: String,
    pub date: NaiveDate,
    /// `HH:MM`, 24-hour clock.
    pub start_time: String,
    pub time_slot: TimeSlot,
    pub duration_minutes: u32,
    pub status: WalkStatus,
    pub is_tracking_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Tracking columns of a walk plus its ordered route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkTracking {
    pub walk_id: String,
    pub dog_id: String,
    pub pickup_location: Option<TrackPoint>,
    pub dropoff_location: Option<TrackPoint>,
    pub walk_start_location: Option<TrackPoint>,
    pub walk_end_location: Option<TrackPoint>,
    pub route_coordinates: Vec<TrackPoint>,
    pub is_tracking_active: bool,
}

impl WalkTracking {
    /// Tracking is over once a drop-off has been recorded.
    pub fn is_terminal(&self) -> bool {
        self.dropoff_location.is_some()
    }
}

/// Wire shape of a walk's tracking state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalkTrackingView {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<TrackPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropoff_location: Option<TrackPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk_start_location: Option<TrackPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk_end_location: Option<TrackPoint>,
    #[serde(default)]
    pub route_coordinates: Vec<TrackPoint>,
    pub is_tracking_active: bool,
    pub dog_id: String,
    #[serde(default)]
    pub dog: Option<DogSummary>,
}

impl WalkTrackingView {
    pub fn new(tracking: WalkTracking, dog: Option<DogSummary>) -> Self {
        Self {
            id: tracking.walk_id,
            pickup_location: tracking.pickup_location,
            dropoff_location: tracking.dropoff_location,
            walk_start_location: tracking.walk_start_location,
            walk_end_location: tracking.walk_end_location,
            route_coordinates: tracking.route_coordinates,
            is_tracking_active: tracking.is_tracking_active,
            dog_id: tracking.dog_id,
            dog,
        }
    }
}
