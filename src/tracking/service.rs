//! Applies tracking actions to a stored walk.
//!
//! Checks run in a fixed order so a rejected request never writes:
//! walk id → action → walk exists → not terminal → payload. The write
//! itself happens in one `IMMEDIATE` transaction; route points are row
//! inserts, so concurrent `update`s append instead of overwriting each other.

use rusqlite::{Connection, TransactionBehavior};

use crate::db;
use crate::models::{TrackPoint, WalkTracking};

use super::request::{TrackingAction, TrackingError, TrackingRequest};

/// Current tracking state of a walk.
pub fn fetch_tracking(conn: &Connection, walk_id: &str) -> Result<WalkTracking, TrackingError> {
    db::get_walk_tracking(conn, walk_id)?
        .ok_or_else(|| TrackingError::WalkNotFound(walk_id.to_string()))
}

/// Merge one tracking action into the walk and return the updated state.
pub fn apply_tracking_action(
    conn: &mut Connection,
    request: &TrackingRequest,
) -> Result<WalkTracking, TrackingError> {
    let walk_id = request.walk_id()?.to_string();
    let action = request.parsed_action()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let mut tracking = fetch_tracking(&tx, &walk_id)?;
    if tracking.is_terminal() && action != TrackingAction::Dropoff {
        return Err(TrackingError::TrackingComplete(walk_id));
    }

    match action {
        TrackingAction::Start => {
            let start = optional_point("walkStartLocation", &request.walk_start_location)?;
            let seed = optional_points(&request.route_coordinates)?;
            if start.is_some() {
                tracking.walk_start_location = start;
            }
            tracking.is_tracking_active = true;
            db::update_tracking_columns(&tx, &tracking)?;
            db::replace_route_points(&tx, &walk_id, seed)?;
        }
        TrackingAction::Update => {
            let batch = request.route_coordinates.as_deref().ok_or(TrackingError::MissingField {
                action,
                field: "routeCoordinates",
            })?;
            validate_points(batch)?;
            db::append_route_points(&tx, &walk_id, batch)?;
        }
        TrackingAction::End => {
            let end = optional_point("walkEndLocation", &request.walk_end_location)?;
            let final_batch = optional_points(&request.route_coordinates)?;
            if end.is_some() {
                tracking.walk_end_location = end;
            }
            tracking.is_tracking_active = false;
            db::update_tracking_columns(&tx, &tracking)?;
            db::append_route_points(&tx, &walk_id, final_batch)?;
        }
        TrackingAction::Pickup => {
            let pickup = required_point(action, "pickupLocation", &request.pickup_location)?;
            tracking.pickup_location = Some(pickup);
            db::update_tracking_columns(&tx, &tracking)?;
        }
        TrackingAction::Dropoff => {
            let dropoff = required_point(action, "dropoffLocation", &request.dropoff_location)?;
            tracking.dropoff_location = Some(dropoff);
            tracking.is_tracking_active = false;
            db::update_tracking_columns(&tx, &tracking)?;
        }
    }

    let updated = fetch_tracking(&tx, &walk_id)?;
    tx.commit()?;

    tracing::info!(
        walk_id = %walk_id,
        action = %action,
        route_len = updated.route_coordinates.len(),
        tracking_active = updated.is_tracking_active,
        "Walk tracking updated"
    );

    Ok(updated)
}

fn required_point(
    action: TrackingAction,
    field: &'static str,
    point: &Option<TrackPoint>,
) -> Result<TrackPoint, TrackingError> {
    let point = point
        .clone()
        .ok_or(TrackingError::MissingField { action, field })?;
    point
        .validate()
        .map_err(|reason| TrackingError::InvalidPoint { field, reason })?;
    Ok(point)
}

fn optional_point(
    field: &'static str,
    point: &Option<TrackPoint>,
) -> Result<Option<TrackPoint>, TrackingError> {
    if let Some(point) = point {
        point
            .validate()
            .map_err(|reason| TrackingError::InvalidPoint { field, reason })?;
    }
    Ok(point.clone())
}

fn optional_points(points: &Option<Vec<TrackPoint>>) -> Result<&[TrackPoint], TrackingError> {
    let points = points.as_deref().unwrap_or(&[]);
    validate_points(points)?;
    Ok(points)
}

fn validate_points(points: &[TrackPoint]) -> Result<(), TrackingError> {
    for point in points {
        point.validate().map_err(|reason| TrackingError::InvalidPoint {
            field: "routeCoordinates",
            reason,
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::db::test_fixtures::*;

    fn setup() -> Connection {
        let conn = open_memory_database().unwrap();
        seed_people_and_dog(&conn, "D1", "WK1");
        db::insert_walk(&conn, &sample_walk("W1", "D1", "WK1", "2024-01-01", "09:00")).unwrap();
        conn
    }

    fn point(lat: f64, ts: &str) -> TrackPoint {
        TrackPoint::new(lat, -0.1, ts)
    }

    fn start_request(seed: Vec<TrackPoint>) -> TrackingRequest {
        TrackingRequest {
            walk_start_location: Some(point(51.0, "S")),
            route_coordinates: Some(seed),
            ..TrackingRequest::new("W1", TrackingAction::Start)
        }
    }

    fn update_request(batch: Vec<TrackPoint>) -> TrackingRequest {
        TrackingRequest {
            route_coordinates: Some(batch),
            ..TrackingRequest::new("W1", TrackingAction::Update)
        }
    }

    fn dropoff_request() -> TrackingRequest {
        TrackingRequest {
            dropoff_location: Some(point(52.0, "D")),
            ..TrackingRequest::new("W1", TrackingAction::Dropoff)
        }
    }

    #[test]
    fn start_activates_tracking_with_seed_route() {
        let mut conn = setup();
        let seed = vec![point(51.0, "T0")];
        apply_tracking_action(&mut conn, &start_request(seed.clone())).unwrap();

        let tracking = fetch_tracking(&conn, "W1").unwrap();
        assert!(tracking.is_tracking_active);
        assert_eq!(tracking.route_coordinates, seed);
        assert_eq!(tracking.walk_start_location, Some(point(51.0, "S")));
    }

    #[test]
    fn start_without_location_still_activates_with_seed() {
        let mut conn = setup();
        let req = TrackingRequest {
            route_coordinates: Some(vec![TrackPoint::new(51.5, -0.1, "T0")]),
            ..TrackingRequest::new("W1", TrackingAction::Start)
        };
        let tracking = apply_tracking_action(&mut conn, &req).unwrap();

        assert!(tracking.is_tracking_active);
        assert_eq!(tracking.route_coordinates, vec![TrackPoint::new(51.5, -0.1, "T0")]);
        assert!(tracking.walk_start_location.is_none());
    }

    #[test]
    fn end_without_location_still_stops_tracking() {
        let mut conn = setup();
        apply_tracking_action(&mut conn, &start_request(vec![point(1.0, "T0")])).unwrap();
        let end = TrackingRequest {
            route_coordinates: Some(vec![point(2.0, "T1")]),
            ..TrackingRequest::new("W1", TrackingAction::End)
        };
        let tracking = apply_tracking_action(&mut conn, &end).unwrap();

        assert!(!tracking.is_tracking_active);
        assert!(tracking.walk_end_location.is_none());
        assert_eq!(tracking.route_coordinates.len(), 2);
    }

    #[test]
    fn invalid_optional_start_location_is_rejected() {
        let mut conn = setup();
        let req = TrackingRequest {
            walk_start_location: Some(TrackPoint::new(123.0, 0.0, "S")),
            ..TrackingRequest::new("W1", TrackingAction::Start)
        };
        let err = apply_tracking_action(&mut conn, &req).unwrap_err();
        assert!(matches!(
            err,
            TrackingError::InvalidPoint { field: "walkStartLocation", .. }
        ));
        assert!(!fetch_tracking(&conn, "W1").unwrap().is_tracking_active);
    }

    #[test]
    fn start_resets_previous_route() {
        let mut conn = setup();
        apply_tracking_action(&mut conn, &start_request(vec![point(1.0, "A")])).unwrap();
        apply_tracking_action(&mut conn, &update_request(vec![point(2.0, "B")])).unwrap();
        apply_tracking_action(&mut conn, &start_request(vec![point(3.0, "C")])).unwrap();

        let tracking = fetch_tracking(&conn, "W1").unwrap();
        assert_eq!(tracking.route_coordinates, vec![point(3.0, "C")]);
    }

    #[test]
    fn updates_append_in_order() {
        let mut conn = setup();
        let seed = point(1.0, "T0");
        let batch_a = vec![point(2.0, "A1"), point(3.0, "A2")];
        let batch_b = vec![point(4.0, "B1")];

        apply_tracking_action(&mut conn, &start_request(vec![seed.clone()])).unwrap();
        apply_tracking_action(&mut conn, &update_request(batch_a.clone())).unwrap();
        let updated = apply_tracking_action(&mut conn, &update_request(batch_b.clone())).unwrap();

        let mut expected = vec![seed];
        expected.extend(batch_a);
        expected.extend(batch_b);
        assert_eq!(updated.route_coordinates, expected);
    }

    #[test]
    fn update_requires_coordinates() {
        let mut conn = setup();
        let err = apply_tracking_action(
            &mut conn,
            &TrackingRequest::new("W1", TrackingAction::Update),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TrackingError::MissingField { field: "routeCoordinates", .. }
        ));
    }

    #[test]
    fn end_stops_tracking_and_appends_final_batch() {
        let mut conn = setup();
        apply_tracking_action(&mut conn, &start_request(vec![point(1.0, "T0")])).unwrap();

        let end = TrackingRequest {
            walk_end_location: Some(point(5.0, "E")),
            route_coordinates: Some(vec![point(4.0, "T9")]),
            ..TrackingRequest::new("W1", TrackingAction::End)
        };
        let tracking = apply_tracking_action(&mut conn, &end).unwrap();

        assert!(!tracking.is_tracking_active);
        assert_eq!(tracking.walk_end_location, Some(point(5.0, "E")));
        assert_eq!(tracking.route_coordinates.len(), 2);
    }

    #[test]
    fn pickup_sets_only_pickup() {
        let mut conn = setup();
        let req = TrackingRequest {
            pickup_location: Some(TrackPoint::new(51.5, -0.1, "T0")),
            ..TrackingRequest::new("W1", TrackingAction::Pickup)
        };
        let tracking = apply_tracking_action(&mut conn, &req).unwrap();

        assert_eq!(tracking.pickup_location, Some(TrackPoint::new(51.5, -0.1, "T0")));
        assert!(tracking.walk_start_location.is_none());
        assert!(!tracking.is_tracking_active);
    }

    #[test]
    fn dropoff_always_clears_active_flag() {
        let mut conn = setup();
        apply_tracking_action(&mut conn, &start_request(vec![])).unwrap();
        let tracking = apply_tracking_action(&mut conn, &dropoff_request()).unwrap();
        assert!(!tracking.is_tracking_active);

        // Repeating the drop-off is allowed and keeps the flag cleared.
        let again = apply_tracking_action(&mut conn, &dropoff_request()).unwrap();
        assert!(!again.is_tracking_active);
    }

    #[test]
    fn actions_after_dropoff_are_rejected() {
        let mut conn = setup();
        apply_tracking_action(&mut conn, &dropoff_request()).unwrap();

        let err = apply_tracking_action(&mut conn, &update_request(vec![point(1.0, "X")]))
            .unwrap_err();
        assert!(matches!(err, TrackingError::TrackingComplete(_)));
        assert!(fetch_tracking(&conn, "W1").unwrap().route_coordinates.is_empty());
    }

    #[test]
    fn unknown_walk_is_not_found_and_creates_nothing() {
        let mut conn = setup();
        let req = TrackingRequest {
            walk_id: Some("ghost".into()),
            ..start_request(vec![point(1.0, "T0")])
        };
        let err = apply_tracking_action(&mut conn, &req).unwrap_err();
        assert!(matches!(err, TrackingError::WalkNotFound(ref id) if id == "ghost"));

        let walks: i64 = conn
            .query_row("SELECT COUNT(*) FROM walks", [], |row| row.get(0))
            .unwrap();
        let points: i64 = conn
            .query_row("SELECT COUNT(*) FROM walk_route_points", [], |row| row.get(0))
            .unwrap();
        assert_eq!((walks, points), (1, 0));
    }

    #[test]
    fn unknown_action_leaves_walk_unchanged() {
        let mut conn = setup();
        let before = fetch_tracking(&conn, "W1").unwrap();
        let req = TrackingRequest {
            walk_id: Some("W1".into()),
            action: Some("teleport".into()),
            walk_start_location: Some(point(1.0, "S")),
            ..Default::default()
        };
        let err = apply_tracking_action(&mut conn, &req).unwrap_err();
        assert!(matches!(err, TrackingError::UnknownAction(_)));
        assert_eq!(fetch_tracking(&conn, "W1").unwrap(), before);
    }

    #[test]
    fn invalid_seed_point_is_rejected_without_writing() {
        let mut conn = setup();
        let err = apply_tracking_action(&mut conn, &start_request(vec![point(123.0, "T0")]))
            .unwrap_err();
        assert!(matches!(err, TrackingError::InvalidPoint { field: "routeCoordinates", .. }));
        assert!(!fetch_tracking(&conn, "W1").unwrap().is_tracking_active);
    }

    #[test]
    fn missing_walk_id_is_reported_first() {
        let mut conn = setup();
        let req = TrackingRequest {
            action: Some("teleport".into()),
            ..Default::default()
        };
        assert!(matches!(
            apply_tracking_action(&mut conn, &req),
            Err(TrackingError::MissingWalkId)
        ));
    }
}
