//! Screen layout for the tier board TUI

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Areas of the main screen, top to bottom
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    pub title_area: Rect,
    pub board_area: Rect,
    pub status_bar: Rect,
    pub hotkey_bar: Rect,
}

impl AppLayout {
    pub fn calculate(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(area);

        Self {
            title_area: chunks[0],
            board_area: chunks[1],
            status_bar: chunks[2],
            hotkey_bar: chunks[3],
        }
    }
}

/// A `width` x `height` rect centered in `area`, shrunk to fit.
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_stacks_fixed_bars_around_board() {
        let layout = AppLayout::calculate(Rect::new(0, 0, 100, 40));
        assert_eq!(layout.title_area.height, 1);
        assert_eq!(layout.status_bar.height, 3);
        assert_eq!(layout.hotkey_bar.height, 1);
        assert_eq!(layout.board_area.height, 35);
        assert_eq!(layout.hotkey_bar.y, 39);
    }

    #[test]
    fn test_centered_rect_fits_small_areas() {
        let area = Rect::new(10, 5, 20, 6);
        let rect = centered_rect_fixed(50, 4, area);
        assert_eq!(rect, Rect::new(10, 6, 20, 4));
    }
}
