use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::{params, Connection};

use crate::db::DatabaseError;
use crate::models::enums::AssessmentStatus;
use crate::models::*;

pub fn insert_assessment(conn: &Connection, assessment: &Assessment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO assessments (id, dog_id, status, scheduled_date, notes)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            assessment.id,
            assessment.dog_id,
            assessment.status.as_str(),
            assessment.scheduled_date.map(|d| d.to_string()),
            assessment.notes,
        ],
    )?;
    Ok(())
}

pub fn list_assessments_for_dog(
    conn: &Connection,
    dog_id: &str,
) -> Result<Vec<Assessment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, dog_id, status, scheduled_date, notes
         FROM assessments WHERE dog_id = ?1 ORDER BY scheduled_date",
    )?;
    let rows = stmt.query_map(params![dog_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
        ))
    })?;

    let mut assessments = Vec::new();
    for row in rows {
        let (id, dog_id, status, scheduled_date, notes) = row?;
        assessments.push(Assessment {
            id,
            dog_id,
            status: AssessmentStatus::from_str(&status)?,
            scheduled_date: scheduled_date
                .and_then(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d").ok()),
            notes,
        });
    }
    Ok(assessments)
}

/// Whether the dog has passed at least one assessment.
pub fn has_completed_assessment(conn: &Connection, dog_id: &str) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM assessments WHERE dog_id = ?1 AND status = ?2",
        params![dog_id, AssessmentStatus::Completed.as_str()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}
