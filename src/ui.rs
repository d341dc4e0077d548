pub mod dashboard;
pub mod debug;
pub mod lists;
pub mod state;
pub mod theme;
