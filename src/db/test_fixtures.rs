//! Shared row builders for repository and handler tests.

use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::{params, Connection};

use crate::models::enums::*;
use crate::models::*;

pub fn sample_walker(id: &str) -> Walker {
    Walker {
        id: id.to_string(),
        name: format!("Walker {id}"),
        email: None,
        phone: None,
    }
}

/// Insert owner `O1`, walker `walker_id` and dog `dog_id`, skipping rows that already exist.
pub fn seed_people_and_dog(conn: &Connection, dog_id: &str, walker_id: &str) {
    conn.execute(
        "INSERT OR IGNORE INTO owners (id, name) VALUES ('O1', 'Owner One')",
        [],
    )
    .unwrap();
    conn.execute(
        "INSERT OR IGNORE INTO walkers (id, name) VALUES (?1, ?2)",
        params![walker_id, format!("Walker {walker_id}")],
    )
    .unwrap();
    conn.execute(
        "INSERT OR IGNORE INTO dogs (id, owner_id, name, size, image_url)
         VALUES (?1, 'O1', ?2, 'medium', ?3)",
        params![
            dog_id,
            format!("Dog {dog_id}"),
            format!("https://img.example/{dog_id}.jpg")
        ],
    )
    .unwrap();
}

pub fn sample_walk(id: &str, dog_id: &str, walker_id: &str, date: &str, start_time: &str) -> Walk {
    let time = NaiveTime::parse_from_str(start_time, "%H:%M").unwrap();
    Walk {
        id: id.to_string(),
        dog_id: dog_id.to_string(),
        walker_id: walker_id.to_string(),
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        start_time: start_time.to_string(),
        time_slot: TimeSlot::from_start_time(time),
        duration_minutes: 30,
        status: WalkStatus::Scheduled,
        is_tracking_active: false,
        created_at: Utc::now(),
    }
}

pub fn sample_assessment(id: &str, dog_id: &str, status: AssessmentStatus) -> Assessment {
    Assessment {
        id: id.to_string(),
        dog_id: dog_id.to_string(),
        status,
        scheduled_date: NaiveDate::from_ymd_opt(2023, 12, 1),
        notes: None,
    }
}
