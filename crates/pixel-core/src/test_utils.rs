//! Shared fixtures for unit tests.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::cell::{CellCoord, Color, OwnedPixel};
use crate::renderer::{ScreenRect, Surface};

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(ScreenRect),
    Fill(ScreenRect, Color),
    Stroke(ScreenRect, Color, f64),
    Image(u32, ScreenRect),
}

/// Surface that records every call instead of painting.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub width: f64,
    pub height: f64,
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }
}

impl Surface for RecordingSurface {
    type Image = u32;

    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear_rect(&mut self, rect: ScreenRect) {
        self.commands.push(DrawCommand::Clear(rect));
    }

    fn fill_rect(&mut self, rect: ScreenRect, color: Color) {
        self.commands.push(DrawCommand::Fill(rect, color));
    }

    fn stroke_rect(&mut self, rect: ScreenRect, color: Color, line_width: f64) {
        self.commands.push(DrawCommand::Stroke(rect, color, line_width));
    }

    fn draw_image(&mut self, image: &u32, rect: ScreenRect) {
        self.commands.push(DrawCommand::Image(*image, rect));
    }
}

/// Deterministic scatter of owned pixels inside `[0, span)²`.
///
/// Coordinates may repeat; callers that need distinct cells should dedupe.
pub fn placeholder_pixels(seed: u64, count: usize, span: i64) -> Vec<OwnedPixel> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let cell = CellCoord::new(rng.random_range(0..span), rng.random_range(0..span));
            let color = Color::rgb(rng.random(), rng.random(), rng.random());
            let owner = format!("owner-{}", rng.random_range(0..8u8));
            OwnedPixel::new(cell, color.to_hex(), Some(owner))
        })
        .collect()
}
