//! One labeled tier row

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use tierboard_core::TierRow;

use crate::ui::theme::BoardTheme;

/// Terminal rows taken by one tier row.
pub const ROW_HEIGHT: u16 = 4;

const LABEL_WIDTH: u16 = 6;

/// Widget for a tier label followed by its cards
pub struct TierRowWidget<'a> {
    row: &'a TierRow,
    columns: usize,
    theme: &'a BoardTheme,
}

impl<'a> TierRowWidget<'a> {
    pub fn new(row: &'a TierRow, theme: &'a BoardTheme) -> Self {
        Self {
            row,
            columns: row.cards.len().max(1),
            theme,
        }
    }

    /// Number of card slots to divide the row into.
    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns.max(1);
        self
    }
}

impl Widget for TierRowWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        // Label cell
        let label_area = Rect {
            width: LABEL_WIDTH.min(area.width),
            ..area
        };
        let label_style = self.theme.label_style(self.row.tier);
        buf.set_style(label_area, label_style);
        let label_line = Rect {
            y: label_area.y + label_area.height / 2,
            height: 1,
            ..label_area
        };
        Paragraph::new(Line::from(Span::styled(self.row.label.as_str(), label_style)))
            .alignment(Alignment::Center)
            .render(label_line, buf);

        // Card cells
        let cards_x = area.x + label_area.width + 1;
        let cards_width = (area.x + area.width).saturating_sub(cards_x);
        let cell_width = cards_width / self.columns as u16;
        if cell_width < 3 {
            return;
        }

        for (i, card) in self.row.cards.iter().take(self.columns).enumerate() {
            let cell = Rect {
                x: cards_x + i as u16 * cell_width,
                y: area.y,
                width: cell_width,
                height: area.height,
            };

            let block = Block::default()
                .borders(Borders::ALL)
                .border_style(self.theme.card_border_style(self.row.tier));
            let inner = block.inner(cell);
            block.render(cell, buf);

            let lines = vec![
                Line::from(Span::styled(card.name.as_str(), self.theme.card_name_style())),
                Line::from(Span::styled(
                    format!("BST {}", card.score),
                    self.theme.card_score_style(),
                )),
            ];
            Paragraph::new(lines)
                .alignment(Alignment::Center)
                .render(inner, buf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tierboard_core::{Card, Tier};

    fn row_text(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width).map(|x| buf[(x, y)].symbol()).collect()
    }

    #[test]
    fn test_renders_label_and_cards() {
        let row = TierRow {
            tier: Tier::Five,
            label: "$5".to_string(),
            cards: vec![
                Card {
                    name: "mewtwo".to_string(),
                    sprite: None,
                    score: 680,
                },
                Card {
                    name: "lugia".to_string(),
                    sprite: None,
                    score: 680,
                },
            ],
        };
        let theme = BoardTheme::default();
        let area = Rect::new(0, 0, 67, ROW_HEIGHT);
        let mut buf = Buffer::empty(area);

        TierRowWidget::new(&row, &theme).columns(5).render(area, &mut buf);

        let all: String = (0..ROW_HEIGHT).map(|y| row_text(&buf, y)).collect();
        assert!(all.contains("$5"));
        assert!(all.contains("mewtwo"));
        assert!(all.contains("lugia"));
        assert!(all.contains("BST 680"));
        assert_eq!(buf[(0, 0)].bg, theme.tier_color(Tier::Five));
    }

    #[test]
    fn test_empty_row_still_shows_label() {
        let row = TierRow {
            tier: Tier::Two,
            label: "$2".to_string(),
            cards: Vec::new(),
        };
        let theme = BoardTheme::default();
        let area = Rect::new(0, 0, 40, ROW_HEIGHT);
        let mut buf = Buffer::empty(area);

        TierRowWidget::new(&row, &theme).columns(5).render(area, &mut buf);

        let all: String = (0..ROW_HEIGHT).map(|y| row_text(&buf, y)).collect();
        assert!(all.contains("$2"));
        assert!(!all.contains("BST"));
    }
}
