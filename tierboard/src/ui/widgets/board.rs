//! Board panel: empty hint, generation progress, or the tier rows

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph, Widget},
};

use tierboard_core::{BoardState, BoardView};

use crate::ui::layout::centered_rect_fixed;
use crate::ui::theme::BoardTheme;
use crate::ui::widgets::tier_row::{TierRowWidget, ROW_HEIGHT};

/// Widget for the board panel
pub struct BoardWidget<'a> {
    state: &'a BoardState,
    view: &'a BoardView,
    scroll: usize,
    theme: &'a BoardTheme,
}

impl<'a> BoardWidget<'a> {
    pub fn new(state: &'a BoardState, view: &'a BoardView, theme: &'a BoardTheme) -> Self {
        Self {
            state,
            view,
            scroll: 0,
            theme,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    fn render_hint(&self, text: &str, area: Rect, buf: &mut Buffer) {
        let line_area = Rect {
            y: area.y + area.height / 2,
            height: area.height.min(1),
            ..area
        };
        Paragraph::new(Line::from(text.to_string()))
            .style(self.theme.system_style())
            .alignment(Alignment::Center)
            .render(line_area, buf);
    }

    fn render_progress(&self, attempts: u32, budget: u32, area: Rect, buf: &mut Buffer) {
        let gauge_area = centered_rect_fixed(50, 3, area);
        let ratio = if budget == 0 {
            0.0
        } else {
            (attempts as f64 / budget as f64).min(1.0)
        };

        Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" Generating "))
            .gauge_style(Style::default().fg(self.theme.progress))
            .ratio(ratio)
            .label(format!("{attempts}/{budget} attempts"))
            .render(gauge_area, buf);
    }

    fn render_rows(&self, area: Rect, buf: &mut Buffer) {
        let visible = (area.height / ROW_HEIGHT) as usize;
        let scroll = self.scroll.min(self.view.rows.len().saturating_sub(1));

        for (i, row) in self.view.rows.iter().skip(scroll).take(visible).enumerate() {
            let row_area = Rect {
                y: area.y + i as u16 * ROW_HEIGHT,
                height: ROW_HEIGHT,
                ..area
            };
            TierRowWidget::new(row, self.theme)
                .columns(self.view.columns)
                .render(row_area, buf);
        }

        let hidden_below = self.view.rows.len().saturating_sub(scroll + visible);
        if hidden_below > 0 && area.height > 0 {
            let hint = format!(" ↓{hidden_below} more ");
            let hint_style = self.theme.system_style().add_modifier(Modifier::DIM);
            buf.set_string(area.x, area.y + area.height - 1, hint, hint_style);
        }
    }
}

impl Widget for BoardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = match self.state {
            BoardState::Ready(_) => " Board [j/k scroll] ",
            _ => " Board ",
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.state.is_loading()));

        let inner = block.inner(area);
        block.render(area, buf);

        match self.state {
            BoardState::Empty => {
                self.render_hint("No board yet. Press 'g' to generate one.", inner, buf)
            }
            BoardState::Loading { attempts, budget } => {
                self.render_progress(*attempts, *budget, inner, buf)
            }
            BoardState::Ready(_) => self.render_rows(inner, buf),
        }
    }
}
