//! Repository layer: entity-scoped database operations.
//!
//! Free functions taking `&Connection`, so they work equally on a plain
//! connection and inside a `Transaction`.

mod assessment;
mod dog;
mod people;
mod walk;

pub use assessment::*;
pub use dog::*;
pub use people::*;
pub use walk::*;
