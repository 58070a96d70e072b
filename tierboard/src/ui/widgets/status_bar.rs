//! Status and hotkey bars

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use tierboard_core::BoardState;

use crate::ui::theme::BoardTheme;

/// Board state badge plus the latest status message
pub struct StatusBarWidget<'a> {
    state: &'a BoardState,
    message: Option<&'a str>,
    exporting: bool,
    theme: &'a BoardTheme,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(state: &'a BoardState, theme: &'a BoardTheme) -> Self {
        Self {
            state,
            message: None,
            exporting: false,
            theme,
        }
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }

    pub fn exporting(mut self, exporting: bool) -> Self {
        self.exporting = exporting;
        self
    }

    fn badge(&self) -> Span<'static> {
        let (text, color) = match self.state {
            _ if self.exporting => (" EXPORT ", self.theme.border_focused),
            BoardState::Empty => (" EMPTY ", self.theme.border),
            BoardState::Loading { .. } => (" LOADING ", self.theme.progress),
            BoardState::Ready(_) => (" READY ", self.theme.confirmation),
        };
        Span::styled(
            text,
            Style::default()
                .fg(self.theme.label_text)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        )
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = vec![self.badge(), Span::raw(" ")];
        if let Some(report) = self.state.report() {
            spans.push(Span::styled(
                format!("{} placed | {} attempts", report.accepted(), report.attempts),
                Style::default().fg(self.theme.foreground),
            ));
            spans.push(Span::raw(" | "));
        }
        if let Some(message) = self.message {
            spans.push(Span::styled(message.to_string(), self.theme.system_style()));
        }

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));

        Paragraph::new(Line::from(spans))
            .block(block)
            .render(area, buf);
    }
}

/// One-line key reference
pub struct HotkeyBarWidget<'a> {
    theme: &'a BoardTheme,
}

impl<'a> HotkeyBarWidget<'a> {
    pub fn new(theme: &'a BoardTheme) -> Self {
        Self { theme }
    }
}

impl Widget for HotkeyBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let keys = [
            ("g", "generate"),
            ("c", "copy/export"),
            ("j/k", "scroll"),
            ("?", "help"),
            ("q", "quit"),
        ];

        let mut spans = Vec::new();
        for (key, action) in keys {
            spans.push(Span::styled(
                format!(" {key} "),
                Style::default()
                    .fg(self.theme.border_focused)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(format!("{action} "), self.theme.system_style()));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}
