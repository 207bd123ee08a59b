// Connection provider for the demo: opens and migrates the SQLite file.
pub mod sqlite;

pub use sqlite::{SqliteDb, INSERT_SQL};
