pub mod dashboard;
pub mod input;
pub mod stat_line;
pub mod state;
pub mod theme;
