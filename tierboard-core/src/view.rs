//! Board layout: the visual tree both front ends draw from.
//!
//! [`BoardView`] is a pure function of a [`Board`]. It always has one row per
//! tier, strongest first; a tier with no entries yields a row with no cards,
//! never a missing row. Short rows are not padded.

use serde::Serialize;

use crate::board::{Board, TIER_CAPACITY};
use crate::tier::Tier;

/// One entity on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub name: String,
    pub sprite: Option<String>,
    pub score: u32,
}

/// A labeled row of cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierRow {
    pub tier: Tier,
    pub label: String,
    pub cards: Vec<Card>,
}

/// The rendered board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoardView {
    pub rows: Vec<TierRow>,
    /// Widest a row may get; fixes the canvas width when rasterizing.
    pub columns: usize,
}

impl BoardView {
    /// Lay out `board`.
    pub fn render(board: &Board) -> Self {
        let mut view = BoardView::default();
        Self::render_into(board, &mut view);
        view
    }

    /// Clear `surface`, then lay out `board` into it.
    pub fn render_into(board: &Board, surface: &mut BoardView) {
        surface.clear();
        surface.columns = board
            .buckets()
            .map(|bucket| bucket.capacity())
            .max()
            .unwrap_or(TIER_CAPACITY);

        for bucket in board.buckets() {
            surface.rows.push(TierRow {
                tier: bucket.tier(),
                label: bucket.tier().label(),
                cards: bucket
                    .entries()
                    .iter()
                    .map(|entry| Card {
                        name: entry.name.clone(),
                        sprite: entry.sprite.clone(),
                        score: entry.score,
                    })
                    .collect(),
            });
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.columns = 0;
    }

    /// A cleared view has no rows at all; a rendered one always has five.
    pub fn is_blank(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, tier: Tier) -> Option<&TierRow> {
        self.rows.iter().find(|row| row.tier == tier)
    }

    pub fn card_count(&self) -> usize {
        self.rows.iter().map(|row| row.cards.len()).sum()
    }

    /// Sprite references in board order, skipping cards without one.
    pub fn sprite_urls(&self) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .flat_map(|row| row.cards.iter())
            .filter_map(|card| card.sprite.as_deref())
    }
}

/// A pixel rectangle on the rasterized board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Pixel layout for rasterizing a [`BoardView`].
///
/// ```text
/// +-------+------+------+-----+
/// | $5    | card | card | ... |
/// +-------+------+------+-----+
/// | $4    | card | ...        |
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardGeometry {
    pub card_size: u32,
    pub gap: u32,
    pub label_width: u32,
}

impl Default for BoardGeometry {
    fn default() -> Self {
        Self {
            card_size: 120,
            gap: 8,
            label_width: 96,
        }
    }
}

impl BoardGeometry {
    fn row_height(&self) -> u32 {
        self.card_size + self.gap
    }

    /// Canvas size in pixels for `view`.
    pub fn canvas_size(&self, view: &BoardView) -> (u32, u32) {
        let columns = view.columns.max(1) as u32;
        let width = 2 * self.gap + self.label_width + columns * (self.card_size + self.gap);
        let height = self.gap + view.rows.len() as u32 * self.row_height();
        (width, height)
    }

    /// The label cell of row `row`.
    pub fn label_rect(&self, row: usize) -> PixelRect {
        PixelRect {
            x: self.gap,
            y: self.gap + row as u32 * self.row_height(),
            width: self.label_width,
            height: self.card_size,
        }
    }

    /// The card cell at (`row`, `column`).
    pub fn card_rect(&self, row: usize, column: usize) -> PixelRect {
        PixelRect {
            x: self.gap + self.label_width + self.gap + column as u32 * (self.card_size + self.gap),
            y: self.gap + row as u32 * self.row_height(),
            width: self.card_size,
            height: self.card_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardEntry;

    fn board_with(entries: &[(Tier, &str, u32)]) -> Board {
        let mut board = Board::default();
        for (i, (tier, name, score)) in entries.iter().enumerate() {
            board.place(
                *tier,
                BoardEntry {
                    id: i as u32 + 1,
                    name: name.to_string(),
                    sprite: Some(format!("https://img.example/{name}.png")),
                    score: *score,
                },
            );
        }
        board
    }

    #[test]
    fn test_rows_are_strongest_first_and_labeled() {
        let view = BoardView::render(&Board::default());
        let labels: Vec<&str> = view.rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["$5", "$4", "$3", "$2", "$1"]);
        assert_eq!(view.columns, 5);
    }

    #[test]
    fn test_empty_tier_still_gets_a_row() {
        let board = board_with(&[(Tier::Five, "rayquaza", 680), (Tier::One, "sunkern", 180)]);
        let view = BoardView::render(&board);

        assert_eq!(view.rows.len(), 5);
        let four = view.row(Tier::Four).unwrap();
        assert!(four.cards.is_empty());
        assert_eq!(view.row(Tier::Five).unwrap().cards.len(), 1);
        assert_eq!(view.card_count(), 2);
    }

    #[test]
    fn test_short_rows_are_not_padded() {
        let board = board_with(&[
            (Tier::Three, "arbok", 448),
            (Tier::Three, "raichu", 485),
        ]);
        let view = BoardView::render(&board);
        let three = view.row(Tier::Three).unwrap();
        assert_eq!(three.cards.len(), 2);
        assert_eq!(three.cards[0].name, "arbok");
        assert_eq!(three.cards[1].score, 485);
    }

    #[test]
    fn test_render_into_clears_previous_surface() {
        let first = board_with(&[(Tier::Two, "pidgeotto", 349)]);
        let second = board_with(&[(Tier::Four, "arcanine", 555)]);

        let mut surface = BoardView::render(&first);
        BoardView::render_into(&second, &mut surface);

        assert_eq!(surface.rows.len(), 5);
        assert_eq!(surface.card_count(), 1);
        assert!(surface.row(Tier::Two).unwrap().cards.is_empty());
        assert_eq!(surface.row(Tier::Four).unwrap().cards[0].name, "arcanine");
    }

    #[test]
    fn test_render_is_pure() {
        let board = board_with(&[(Tier::Five, "dragonite", 600)]);
        assert_eq!(BoardView::render(&board), BoardView::render(&board));
    }

    #[test]
    fn test_sprite_urls_follow_board_order() {
        let board = board_with(&[(Tier::One, "zubat", 245), (Tier::Five, "lugia", 680)]);
        let view = BoardView::render(&board);
        let urls: Vec<&str> = view.sprite_urls().collect();
        assert_eq!(
            urls,
            vec!["https://img.example/lugia.png", "https://img.example/zubat.png"]
        );
    }

    #[test]
    fn test_geometry() {
        let geometry = BoardGeometry {
            card_size: 100,
            gap: 10,
            label_width: 80,
        };
        let view = BoardView::render(&Board::default());

        // 10 + 80 + 5 * 110 + 10 = 650 wide, 10 + 5 * 110 = 560 tall
        assert_eq!(geometry.canvas_size(&view), (650, 560));
        assert_eq!(
            geometry.label_rect(1),
            PixelRect {
                x: 10,
                y: 120,
                width: 80,
                height: 100
            }
        );
        let last = geometry.card_rect(4, 4);
        assert_eq!(last.x + last.width + geometry.gap, 650);
        assert_eq!(last.y + last.height + geometry.gap, 560);
    }
}
