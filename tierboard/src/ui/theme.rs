//! Color theme and styling for the tier board TUI

use ratatui::style::{Color, Modifier, Style};
use tierboard_core::Tier;

/// Board UI color theme
#[derive(Debug, Clone)]
pub struct BoardTheme {
    // Base colors
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,

    /// Label fill per tier, tier one first. Matches the exported PNG.
    pub tiers: [Color; 5],
    pub label_text: Color,

    // Card colors
    pub card_name: Color,
    pub card_score: Color,

    // Status colors
    pub system_text: Color,
    pub confirmation: Color,
    pub progress: Color,
}

impl Default for BoardTheme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Cyan,

            tiers: [
                Color::Rgb(127, 191, 255),
                Color::Rgb(191, 255, 127),
                Color::Rgb(255, 223, 127),
                Color::Rgb(255, 191, 127),
                Color::Rgb(255, 127, 127),
            ],
            label_text: Color::Rgb(20, 20, 20),

            card_name: Color::White,
            card_score: Color::Gray,

            system_text: Color::DarkGray,
            confirmation: Color::LightGreen,
            progress: Color::Yellow,
        }
    }
}

impl BoardTheme {
    pub fn tier_color(&self, tier: Tier) -> Color {
        self.tiers[tier.value() as usize - 1]
    }

    /// Style for a tier's label cell
    pub fn label_style(&self, tier: Tier) -> Style {
        Style::default()
            .fg(self.label_text)
            .bg(self.tier_color(tier))
            .add_modifier(Modifier::BOLD)
    }

    /// Border of a card, tinted by its tier
    pub fn card_border_style(&self, tier: Tier) -> Style {
        Style::default().fg(self.tier_color(tier))
    }

    pub fn card_name_style(&self) -> Style {
        Style::default()
            .fg(self.card_name)
            .add_modifier(Modifier::BOLD)
    }

    pub fn card_score_style(&self) -> Style {
        Style::default().fg(self.card_score)
    }

    /// Get style for system messages
    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.system_text)
            .add_modifier(Modifier::DIM)
    }

    pub fn confirmation_style(&self) -> Style {
        Style::default()
            .fg(self.confirmation)
            .add_modifier(Modifier::BOLD)
    }

    /// Get border style
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.foreground)
            .add_modifier(Modifier::BOLD)
    }
}
