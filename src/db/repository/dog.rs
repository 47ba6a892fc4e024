use std::str::FromStr;

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::enums::DogSize;
use crate::models::*;

pub fn insert_dog(conn: &Connection, dog: &Dog) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO dogs (id, owner_id, name, breed, size, temperament, image_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            dog.id,
            dog.owner_id,
            dog.name,
            dog.breed,
            dog.size.as_str(),
            dog.temperament,
            dog.image_url,
        ],
    )?;
    Ok(())
}

pub fn get_dog(conn: &Connection, id: &str) -> Result<Option<Dog>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, owner_id, name, breed, size, temperament, image_url
             FROM dogs WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, owner_id, name, breed, size, temperament, image_url)| {
        Ok(Dog {
            id,
            owner_id,
            name,
            breed,
            size: DogSize::from_str(&size)?,
            temperament,
            image_url,
        })
    })
    .transpose()
}

/// Name and image only; what tracking screens display.
pub fn get_dog_summary(conn: &Connection, id: &str) -> Result<Option<DogSummary>, DatabaseError> {
    let summary = conn
        .query_row(
            "SELECT name, image_url FROM dogs WHERE id = ?1",
            params![id],
            |row| {
                Ok(DogSummary {
                    name: row.get(0)?,
                    image_url: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(summary)
}
