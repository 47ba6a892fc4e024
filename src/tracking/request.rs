//! Wire types for `POST /api/walks/tracking` and the errors the action
//! handler can raise.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;
use crate::models::TrackPoint;

/// What a tracking request does to the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingAction {
    Start,
    Update,
    End,
    Pickup,
    Dropoff,
}

impl TrackingAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Update => "update",
            Self::End => "end",
            Self::Pickup => "pickup",
            Self::Dropoff => "dropoff",
        }
    }
}

impl FromStr for TrackingAction {
    type Err = TrackingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "update" => Ok(Self::Update),
            "end" => Ok(Self::End),
            "pickup" => Ok(Self::Pickup),
            "dropoff" => Ok(Self::Dropoff),
            other => Err(TrackingError::UnknownAction(other.to_string())),
        }
    }
}

impl fmt::Display for TrackingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body. Everything is optional on the wire so that missing fields
/// surface as `TrackingError`s instead of extractor rejections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<TrackPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropoff_location: Option<TrackPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk_start_location: Option<TrackPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub walk_end_location: Option<TrackPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route_coordinates: Option<Vec<TrackPoint>>,
    /// Accepted for compatibility; the action alone decides the stored flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_tracking_active: Option<bool>,
}

impl TrackingRequest {
    pub fn new(walk_id: impl Into<String>, action: TrackingAction) -> Self {
        Self {
            walk_id: Some(walk_id.into()),
            action: Some(action.as_str().to_string()),
            ..Default::default()
        }
    }

    /// Non-blank walk id.
    pub fn walk_id(&self) -> Result<&str, TrackingError> {
        self.walk_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(TrackingError::MissingWalkId)
    }

    pub fn parsed_action(&self) -> Result<TrackingAction, TrackingError> {
        match self.action.as_deref() {
            Some(raw) => raw.parse(),
            None => Err(TrackingError::UnknownAction(String::new())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TrackingError {
    #[error("walkId is required")]
    MissingWalkId,
    #[error("Unknown tracking action: '{0}'")]
    UnknownAction(String),
    #[error("{field} is required for the '{action}' action")]
    MissingField {
        action: TrackingAction,
        field: &'static str,
    },
    #[error("Invalid {field}: {reason}")]
    InvalidPoint { field: &'static str, reason: String },
    #[error("Walk not found: {0}")]
    WalkNotFound(String),
    #[error("Tracking for walk {0} already ended with a drop-off")]
    TrackingComplete(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<rusqlite::Error> for TrackingError {
    fn from(err: rusqlite::Error) -> Self {
        TrackingError::Database(DatabaseError::Sqlite(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_known_action() {
        for action in [
            TrackingAction::Start,
            TrackingAction::Update,
            TrackingAction::End,
            TrackingAction::Pickup,
            TrackingAction::Dropoff,
        ] {
            assert_eq!(action.as_str().parse::<TrackingAction>().unwrap(), action);
        }
    }

    #[test]
    fn unknown_action_keeps_raw_value() {
        let err = "teleport".parse::<TrackingAction>().unwrap_err();
        assert!(matches!(err, TrackingError::UnknownAction(ref a) if a == "teleport"));
    }

    #[test]
    fn deserializes_camel_case_body() {
        let body = r#"{
            "walkId": "W1",
            "action": "pickup",
            "pickupLocation": {"lat": 51.5, "lng": -0.1, "timestamp": "T0"},
            "isTrackingActive": true
        }"#;
        let req: TrackingRequest = serde_json::from_str(body).unwrap();
        assert_eq!(req.walk_id().unwrap(), "W1");
        assert_eq!(req.parsed_action().unwrap(), TrackingAction::Pickup);
        assert_eq!(req.pickup_location, Some(TrackPoint::new(51.5, -0.1, "T0")));
        assert_eq!(req.is_tracking_active, Some(true));
        assert!(req.route_coordinates.is_none());
    }

    #[test]
    fn blank_walk_id_is_missing() {
        let req = TrackingRequest {
            walk_id: Some("   ".into()),
            ..Default::default()
        };
        assert!(matches!(req.walk_id(), Err(TrackingError::MissingWalkId)));
        assert!(matches!(
            TrackingRequest::default().parsed_action(),
            Err(TrackingError::UnknownAction(_))
        ));
    }

    #[test]
    fn serializes_only_present_fields() {
        let req = TrackingRequest::new("W1", TrackingAction::Update);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"walkId": "W1", "action": "update"}));
    }
}
