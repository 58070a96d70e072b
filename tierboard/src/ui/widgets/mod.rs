//! TUI widgets for the tier board

pub mod board;
pub mod status_bar;
pub mod tier_row;

pub use board::BoardWidget;
pub use status_bar::{HotkeyBarWidget, StatusBarWidget};
