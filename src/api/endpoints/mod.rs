//! API endpoint handlers.
//!
//! Handlers lock the database, call into the domain modules and release
//! the lock before building the response.

pub mod health;
pub mod tracking;
pub mod walks;
