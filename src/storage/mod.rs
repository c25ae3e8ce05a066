pub mod db;
mod images;
mod lenient;
pub mod models;
mod state;
mod tables;

pub use db::{Database, DatabaseError, PurgeStats, DATABASE_FILE};
pub use state::MAIN_STATE_KEY;
pub use tables::*;
