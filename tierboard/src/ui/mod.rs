//! UI module for the tier board TUI

pub mod layout;
pub mod render;
pub mod theme;
pub mod widgets;
