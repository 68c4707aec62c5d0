pub mod checklist_io;
pub mod config_io;
pub mod database;
pub mod preferences;
pub mod recovery;
