pub mod assessment;
pub mod dog;
pub mod enums;
pub mod people;
pub mod walk;

pub use assessment::*;
pub use dog::*;
pub use people::*;
pub use walk::*;
