//! Walk booking.
//!
//! A walk may only be booked for an existing dog and walker, and only once
//! the dog has passed an intake assessment. The time slot is derived from
//! the start time, never taken from the caller.

use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::enums::{TimeSlot, WalkStatus};
use crate::models::Walk;

/// Booking request as sent by clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewWalk {
    pub dog_id: String,
    pub walker_id: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`, 24-hour clock.
    pub start_time: String,
    pub duration_minutes: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),
    #[error("Dog not found: {0}")]
    DogNotFound(String),
    #[error("Walker not found: {0}")]
    WalkerNotFound(String),
    #[error("Dog {0} has no completed assessment")]
    AssessmentRequired(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Validated fields of a booking request.
struct ParsedBooking {
    date: NaiveDate,
    start: NaiveTime,
}

fn parse_booking(request: &NewWalk) -> Result<ParsedBooking, BookingError> {
    if request.dog_id.trim().is_empty() {
        return Err(BookingError::Validation("dogId is required".into()));
    }
    if request.walker_id.trim().is_empty() {
        return Err(BookingError::Validation("walkerId is required".into()));
    }
    let date = NaiveDate::parse_from_str(request.date.trim(), "%Y-%m-%d").map_err(|_| {
        BookingError::Validation(format!("date must be YYYY-MM-DD, got '{}'", request.date))
    })?;
    let start = NaiveTime::parse_from_str(request.start_time.trim(), "%H:%M").map_err(|_| {
        BookingError::Validation(format!(
            "startTime must be HH:MM, got '{}'",
            request.start_time
        ))
    })?;
    if request.duration_minutes == 0 {
        return Err(BookingError::Validation(
            "durationMinutes must be greater than zero".into(),
        ));
    }
    Ok(ParsedBooking { date, start })
}

/// Validate and store a new scheduled walk.
pub fn create_walk(conn: &Connection, request: &NewWalk) -> Result<Walk, BookingError> {
    let parsed = parse_booking(request)?;

    let dog_id = request.dog_id.trim();
    let walker_id = request.walker_id.trim();

    if db::get_dog(conn, dog_id)?.is_none() {
        return Err(BookingError::DogNotFound(dog_id.to_string()));
    }
    if db::get_walker(conn, walker_id)?.is_none() {
        return Err(BookingError::WalkerNotFound(walker_id.to_string()));
    }
    if !db::has_completed_assessment(conn, dog_id)? {
        return Err(BookingError::AssessmentRequired(dog_id.to_string()));
    }

    let walk = Walk {
        id: Uuid::new_v4().to_string(),
        dog_id: dog_id.to_string(),
        walker_id: walker_id.to_string(),
        date: parsed.date,
        start_time: parsed.start.format("%H:%M").to_string(),
        time_slot: TimeSlot::from_start_time(parsed.start),
        duration_minutes: request.duration_minutes,
        status: WalkStatus::Scheduled,
        is_tracking_active: false,
        created_at: Utc::now(),
    };
    db::insert_walk(conn, &walk)?;

    tracing::info!(
        walk_id = %walk.id,
        dog_id = %walk.dog_id,
        walker_id = %walk.walker_id,
        date = %walk.date,
        "Walk booked"
    );
    Ok(walk)
}
