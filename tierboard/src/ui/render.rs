//! Render orchestration for the tier board TUI

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::layout::{centered_rect_fixed, AppLayout};
use crate::ui::widgets::{BoardWidget, HotkeyBarWidget, StatusBarWidget};

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let layout = AppLayout::calculate(area);

    render_title_bar(frame, app, layout.title_area);

    let board = BoardWidget::new(&app.state, &app.view, &app.theme).scroll(app.board_scroll);
    frame.render_widget(board, layout.board_area);

    let status = StatusBarWidget::new(&app.state, &app.theme)
        .message(app.status_message())
        .exporting(app.is_exporting());
    frame.render_widget(status, layout.status_bar);

    frame.render_widget(HotkeyBarWidget::new(&app.theme), layout.hotkey_bar);

    if let Some(confirmation) = app.confirmation() {
        render_confirmation(frame, app, &confirmation.message, layout.board_area);
    }

    if app.help_visible() {
        render_help_overlay(frame, app, area);
    }
}

/// Render the title bar
fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let config = app.sampler().config();
    let title = format!(
        " Pokémon Tier Board | {} ladder | budget {} | output {} ",
        config.ladder.kind(),
        config.attempt_budget,
        app.output_dir.display()
    );

    let line = Line::from(Span::styled(title, app.theme.title_style()));
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the transient "Copied!" toast
fn render_confirmation(frame: &mut Frame, app: &App, message: &str, area: Rect) {
    let width = message.chars().count() as u16 + 6;
    let popup_area = centered_rect_fixed(width, 3, area);

    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(app.theme.confirmation_style());
    let paragraph = Paragraph::new(Line::from(Span::styled(
        message.to_string(),
        app.theme.confirmation_style(),
    )))
    .alignment(ratatui::layout::Alignment::Center)
    .block(block);

    frame.render_widget(paragraph, popup_area);
}

/// Render help overlay
fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(52, 20, area);

    // Clear the background
    frame.render_widget(Clear, popup_area);

    let ladder = app.sampler().config().ladder;
    let floors = format!(
        "  $5 ≥ {}   $4 ≥ {}   $3 ≥ {}   $2 ≥ {}",
        ladder.floor(tierboard_core::Tier::Five),
        ladder.floor(tierboard_core::Tier::Four),
        ladder.floor(tierboard_core::Tier::Three),
        ladder.floor(tierboard_core::Tier::Two),
    );

    let help_text = vec![
        Line::from(Span::styled(
            " Pokémon Tier Board - Help ",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Board:",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )),
        Line::from("  g           Generate a new board"),
        Line::from("  c / y       Copy the board as a PNG"),
        Line::from("              (falls back to share, then a file)"),
        Line::from(""),
        Line::from(Span::styled(
            "Navigation:",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )),
        Line::from("  j/k or ↓/↑  Scroll tiers"),
        Line::from("  Mouse wheel Scroll tiers"),
        Line::from(""),
        Line::from(Span::styled(
            "Tiers (base stat total):",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )),
        Line::from(floors),
        Line::from(""),
        Line::from("  ?           Toggle this help"),
        Line::from("  q, Ctrl+C   Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or q to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, popup_area);
}
