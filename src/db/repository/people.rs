use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_owner(conn: &Connection, owner: &Owner) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO owners (id, name, email, phone) VALUES (?1, ?2, ?3, ?4)",
        params![owner.id, owner.name, owner.email, owner.phone],
    )?;
    Ok(())
}

pub fn insert_walker(conn: &Connection, walker: &Walker) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO walkers (id, name, email, phone) VALUES (?1, ?2, ?3, ?4)",
        params![walker.id, walker.name, walker.email, walker.phone],
    )?;
    Ok(())
}

pub fn get_walker(conn: &Connection, id: &str) -> Result<Option<Walker>, DatabaseError> {
    let walker = conn
        .query_row(
            "SELECT id, name, email, phone FROM walkers WHERE id = ?1",
            params![id],
            |row| {
                Ok(Walker {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                    phone: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(walker)
}
