pub mod checklist;
pub mod config;
pub mod item;

pub use checklist::*;
pub use config::*;
pub use item::*;
