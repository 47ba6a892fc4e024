use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::enums::*;
use crate::models::*;

const WALK_COLUMNS: &str = "id, dog_id, walker_id, date, start_time, time_slot,
     duration_minutes, status, is_tracking_active, created_at";

pub fn insert_walk(conn: &Connection, walk: &Walk) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO walks (id, dog_id, walker_id, date, start_time, time_slot,
         duration_minutes, status, is_tracking_active, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            walk.id,
            walk.dog_id,
            walk.walker_id,
            walk.date.to_string(),
            walk.start_time,
            walk.time_slot.as_str(),
            walk.duration_minutes,
            walk.status.as_str(),
            walk.is_tracking_active as i32,
            walk.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_walk(conn: &Connection, id: &str) -> Result<Option<Walk>, DatabaseError> {
    let row = conn
        .query_row(
            &format!("SELECT {WALK_COLUMNS} FROM walks WHERE id = ?1"),
            params![id],
            read_walk_row,
        )
        .optional()?;
    row.map(walk_from_row).transpose()
}

/// Walks assigned to a walker, optionally limited to one date, in schedule order.
pub fn list_walks_for_walker(
    conn: &Connection,
    walker_id: &str,
    date: Option<NaiveDate>,
) -> Result<Vec<Walk>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WALK_COLUMNS} FROM walks
         WHERE walker_id = ?1 AND (?2 IS NULL OR date = ?2)
         ORDER BY date, start_time, created_at"
    ))?;
    let rows = stmt.query_map(
        params![walker_id, date.map(|d| d.to_string())],
        read_walk_row,
    )?;

    let mut walks = Vec::new();
    for row in rows {
        walks.push(walk_from_row(row?)?);
    }
    Ok(walks)
}

type WalkRow = (
    String, String, String, String, String, String,
    u32, String, i32, String,
);

fn read_walk_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<WalkRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn walk_from_row(row: WalkRow) -> Result<Walk, DatabaseError> {
    let (
        id, dog_id, walker_id, date, start_time, time_slot,
        duration_minutes, status, is_tracking_active, created_at,
    ) = row;
    Ok(Walk {
        date: NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(format!("walk {id} date: {e}")))?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| DatabaseError::ConstraintViolation(format!("walk {id} created_at: {e}")))?,
        time_slot: TimeSlot::from_str(&time_slot)?,
        status: WalkStatus::from_str(&status)?,
        is_tracking_active: is_tracking_active != 0,
        id,
        dog_id,
        walker_id,
        start_time,
        duration_minutes,
    })
}

// ═══════════════════════════════════════════
// Tracking columns and route points
// ═══════════════════════════════════════════

fn encode_point(point: Option<&TrackPoint>) -> Result<Option<String>, DatabaseError> {
    point
        .map(|p| serde_json::to_string(p).map_err(DatabaseError::from))
        .transpose()
}

fn decode_point(raw: Option<String>) -> Result<Option<TrackPoint>, DatabaseError> {
    raw.map(|s| serde_json::from_str(&s).map_err(DatabaseError::from))
        .transpose()
}

/// Load the tracking state of a walk, route included.
pub fn get_walk_tracking(
    conn: &Connection,
    walk_id: &str,
) -> Result<Option<WalkTracking>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT dog_id, pickup_location, dropoff_location, walk_start_location,
             walk_end_location, is_tracking_active
             FROM walks WHERE id = ?1",
            params![walk_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, i32>(5)?,
                ))
            },
        )
        .optional()?;

    let Some((dog_id, pickup, dropoff, start, end, active)) = row else {
        return Ok(None);
    };

    Ok(Some(WalkTracking {
        walk_id: walk_id.to_string(),
        dog_id,
        pickup_location: decode_point(pickup)?,
        dropoff_location: decode_point(dropoff)?,
        walk_start_location: decode_point(start)?,
        walk_end_location: decode_point(end)?,
        route_coordinates: list_route_points(conn, walk_id)?,
        is_tracking_active: active != 0,
    }))
}

/// Write the single-point tracking columns and the active flag.
/// The route is stored separately; see `replace_route_points` / `append_route_points`.
pub fn update_tracking_columns(
    conn: &Connection,
    tracking: &WalkTracking,
) -> Result<(), DatabaseError> {
    let updated = conn.execute(
        "UPDATE walks SET pickup_location = ?1, dropoff_location = ?2,
         walk_start_location = ?3, walk_end_location = ?4, is_tracking_active = ?5
         WHERE id = ?6",
        params![
            encode_point(tracking.pickup_location.as_ref())?,
            encode_point(tracking.dropoff_location.as_ref())?,
            encode_point(tracking.walk_start_location.as_ref())?,
            encode_point(tracking.walk_end_location.as_ref())?,
            tracking.is_tracking_active as i32,
            tracking.walk_id,
        ],
    )?;
    if updated == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Walk".into(),
            id: tracking.walk_id.clone(),
        });
    }
    Ok(())
}

pub fn list_route_points(
    conn: &Connection,
    walk_id: &str,
) -> Result<Vec<TrackPoint>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT lat, lng, recorded_at FROM walk_route_points
         WHERE walk_id = ?1 ORDER BY seq",
    )?;
    let rows = stmt.query_map(params![walk_id], |row| {
        Ok(TrackPoint {
            lat: row.get(0)?,
            lng: row.get(1)?,
            timestamp: row.get(2)?,
        })
    })?;

    let mut points = Vec::new();
    for row in rows {
        points.push(row?);
    }
    Ok(points)
}

/// Append points after the walk's existing route. Returns the new route length.
pub fn append_route_points(
    conn: &Connection,
    walk_id: &str,
    points: &[TrackPoint],
) -> Result<i64, DatabaseError> {
    let mut next_seq: i64 = conn.query_row(
        "SELECT COALESCE(MAX(seq) + 1, 0) FROM walk_route_points WHERE walk_id = ?1",
        params![walk_id],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(
        "INSERT INTO walk_route_points (walk_id, seq, lat, lng, recorded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for point in points {
        stmt.execute(params![walk_id, next_seq, point.lat, point.lng, point.timestamp])?;
        next_seq += 1;
    }
    Ok(next_seq)
}

/// Drop the walk's route and start over from `points`.
pub fn replace_route_points(
    conn: &Connection,
    walk_id: &str,
    points: &[TrackPoint],
) -> Result<i64, DatabaseError> {
    conn.execute(
        "DELETE FROM walk_route_points WHERE walk_id = ?1",
        params![walk_id],
    )?;
    append_route_points(conn, walk_id, points)
}
