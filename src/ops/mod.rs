pub mod autosave;
pub mod session;
pub mod view;
