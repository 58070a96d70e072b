//! Rasterizing a [`BoardView`] into a PNG.

use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgba, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use thiserror::Error;

use crate::source::EntitySource;
use crate::tier::Tier;
use crate::view::{BoardGeometry, BoardView, PixelRect};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
}

/// An encoded PNG plus its pixel dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PngImage {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl PngImage {
    pub fn encode(image: &RgbaImage) -> Result<Self, RasterError> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(Self {
            bytes,
            width: image.width(),
            height: image.height(),
        })
    }

    #[cfg(test)]
    pub(crate) fn from_raw(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes,
            width,
            height,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Decoded sprite artwork keyed by URL.
#[derive(Debug, Clone, Default)]
pub struct SpriteSheet {
    images: HashMap<String, RgbaImage>,
}

impl SpriteSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Download and decode every sprite `view` references.
    ///
    /// A sprite that cannot be fetched or decoded is left out and its card
    /// falls back to a placeholder.
    pub async fn fetch<S>(view: &BoardView, source: &S) -> Self
    where
        S: EntitySource + ?Sized,
    {
        let mut sheet = SpriteSheet::new();
        for url in view.sprite_urls() {
            if sheet.images.contains_key(url) {
                continue;
            }
            match source.fetch_sprite(url).await {
                Ok(bytes) => {
                    if let Err(e) = sheet.insert_bytes(url, &bytes) {
                        log::warn!("could not decode sprite {url}: {e}");
                    }
                }
                Err(e) => log::warn!("could not download sprite {url}: {e}"),
            }
        }
        log::debug!("loaded {} sprites", sheet.len());
        sheet
    }

    pub fn insert(&mut self, url: impl Into<String>, image: RgbaImage) {
        self.images.insert(url.into(), image);
    }

    pub fn insert_bytes(
        &mut self,
        url: impl Into<String>,
        bytes: &[u8],
    ) -> Result<(), image::ImageError> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        self.insert(url, image);
        Ok(())
    }

    pub fn get(&self, url: &str) -> Option<&RgbaImage> {
        self.images.get(url)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Board colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: Rgba<u8>,
    pub card: Rgba<u8>,
    pub placeholder: Rgba<u8>,
    pub label_text: Rgba<u8>,
    /// Label fill per tier, tier one first.
    pub tiers: [Rgba<u8>; 5],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            background: Rgba([26, 26, 26, 255]),
            card: Rgba([51, 51, 51, 255]),
            placeholder: Rgba([85, 85, 85, 255]),
            label_text: Rgba([20, 20, 20, 255]),
            tiers: [
                Rgba([127, 191, 255, 255]),
                Rgba([191, 255, 127, 255]),
                Rgba([255, 223, 127, 255]),
                Rgba([255, 191, 127, 255]),
                Rgba([255, 127, 127, 255]),
            ],
        }
    }
}

impl Palette {
    pub fn tier(&self, tier: Tier) -> Rgba<u8> {
        self.tiers[tier.index()]
    }
}

/// Draws board views onto an RGBA canvas.
#[derive(Debug, Clone, Default)]
pub struct Rasterizer {
    geometry: BoardGeometry,
    palette: Palette,
}

impl Rasterizer {
    pub fn new(geometry: BoardGeometry) -> Self {
        Self {
            geometry,
            palette: Palette::default(),
        }
    }

    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    pub fn geometry(&self) -> &BoardGeometry {
        &self.geometry
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn draw(&self, view: &BoardView, sprites: &SpriteSheet) -> RgbaImage {
        let (width, height) = self.geometry.canvas_size(view);
        let mut canvas = RgbaImage::from_pixel(width, height, self.palette.background);
        let columns = view.columns.max(1);

        for (row_index, row) in view.rows.iter().enumerate() {
            let label = self.geometry.label_rect(row_index);
            fill_rect(&mut canvas, label, self.palette.tier(row.tier));
            draw_text(&mut canvas, &row.label, label, self.palette.label_text);

            for (column, card) in row.cards.iter().take(columns).enumerate() {
                let cell = self.geometry.card_rect(row_index, column);
                fill_rect(&mut canvas, cell, self.palette.card);

                match card.sprite.as_deref().and_then(|url| sprites.get(url)) {
                    Some(sprite) => draw_sprite(&mut canvas, sprite, cell),
                    None => {
                        let placeholder = inset(cell, cell.width / 4);
                        fill_rect(&mut canvas, placeholder, self.palette.placeholder)
                    }
                }
            }
        }

        canvas
    }

    pub fn rasterize(
        &self,
        view: &BoardView,
        sprites: &SpriteSheet,
    ) -> Result<PngImage, RasterError> {
        PngImage::encode(&self.draw(view, sprites))
    }
}

fn inset(rect: PixelRect, by: u32) -> PixelRect {
    let by = by.min(rect.width / 2).min(rect.height / 2);
    PixelRect {
        x: rect.x + by,
        y: rect.y + by,
        width: rect.width - 2 * by,
        height: rect.height - 2 * by,
    }
}

fn fill_rect(image: &mut RgbaImage, rect: PixelRect, color: Rgba<u8>) {
    let x_end = (rect.x + rect.width).min(image.width());
    let y_end = (rect.y + rect.height).min(image.height());

    for y in rect.y..y_end {
        for x in rect.x..x_end {
            image.put_pixel(x, y, color);
        }
    }
}

/// One glyph bit, drawn as a `size` x `size` square.
fn fill_block(image: &mut RgbaImage, x: u32, y: u32, size: u32, color: Rgba<u8>) {
    let block = PixelRect {
        x,
        y,
        width: size,
        height: size,
    };
    fill_rect(image, block, color);
}

/// Scale `sprite` to fit inside `cell`, keeping its aspect ratio, and
/// blend it centered.
fn draw_sprite(canvas: &mut RgbaImage, sprite: &RgbaImage, cell: PixelRect) {
    let area = inset(cell, (cell.width / 20).max(1));
    let (sprite_w, sprite_h) = sprite.dimensions();
    if sprite_w == 0 || sprite_h == 0 || area.width == 0 || area.height == 0 {
        return;
    }

    let scale = f64::min(
        area.width as f64 / sprite_w as f64,
        area.height as f64 / sprite_h as f64,
    );
    let target_w = ((sprite_w as f64 * scale).round() as u32).clamp(1, area.width);
    let target_h = ((sprite_h as f64 * scale).round() as u32).clamp(1, area.height);

    let scaled = imageops::resize(sprite, target_w, target_h, FilterType::Triangle);
    let x = area.x + (area.width - target_w) / 2;
    let y = area.y + (area.height - target_h) / 2;
    imageops::overlay(canvas, &scaled, x as i64, y as i64);
}

/// Draw `text` centered in `rect` with the built-in block glyphs, at the
/// largest integer scale that fits.
fn draw_text(canvas: &mut RgbaImage, text: &str, rect: PixelRect, color: Rgba<u8>) {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return;
    }

    // Each glyph is followed by one column of spacing, except the last.
    let units_wide = chars.len() as u32 * (GLYPH_WIDTH + 1) - 1;
    let scale = (rect.width * 3 / 4 / units_wide)
        .min(rect.height / 2 / GLYPH_HEIGHT)
        .max(1);

    let text_w = units_wide * scale;
    let text_h = GLYPH_HEIGHT * scale;
    let origin_x = rect.x + rect.width.saturating_sub(text_w) / 2;
    let origin_y = rect.y + rect.height.saturating_sub(text_h) / 2;

    for (i, ch) in chars.iter().enumerate() {
        let Some(rows) = glyph(*ch) else {
            continue;
        };
        let glyph_x = origin_x + i as u32 * (GLYPH_WIDTH + 1) * scale;

        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) == 0 {
                    continue;
                }
                let x = glyph_x + col * scale;
                let y = origin_y + row as u32 * scale;
                fill_block(canvas, x, y, scale, color);
            }
        }
    }
}

/// 5x7 bitmaps, one byte per row, most significant of the low five bits on
/// the left.
fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        '$' => [0b00100, 0b01111, 0b10100, 0b01110, 0b00101, 0b11110, 0b00100],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        _ => return None,
    };
    Some(rows)
}
