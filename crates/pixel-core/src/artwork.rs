//! Fitting uploaded artwork onto a purchased block.
//!
//! The saved image is one image pixel per cell: a canvas the size of the
//! block, filled with [`ARTWORK_BACKGROUND`], with the upload scaled to fit
//! and centred.

use crate::cell::{Color, Dimensions};

pub const ARTWORK_BACKGROUND: Color = Color::rgb(0xFF, 0xFF, 0xFF);

/// Longest canvas side; larger blocks are rendered at a reduced resolution.
pub const MAX_ARTWORK_SIDE: u32 = 2048;

/// Where to draw an image on the artwork canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArtworkLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Scales an `image_width` × `image_height` image to fit inside `block`
/// keeping its aspect ratio. `None` for empty blocks or images.
pub fn fit_artwork(
    image_width: f64,
    image_height: f64,
    block: Dimensions,
) -> Option<ArtworkLayout> {
    if block.width == 0 || block.height == 0 || image_width <= 0.0 || image_height <= 0.0 {
        return None;
    }

    let (block_w, block_h) = (block.width as f64, block.height as f64);
    let shrink = (f64::from(MAX_ARTWORK_SIDE) / block_w.max(block_h)).min(1.0);
    let canvas_width = (block_w * shrink).round().max(1.0);
    let canvas_height = (block_h * shrink).round().max(1.0);

    let scale = (canvas_width / image_width).min(canvas_height / image_height);
    let (width, height) = (image_width * scale, image_height * scale);

    Some(ArtworkLayout {
        canvas_width: canvas_width as u32,
        canvas_height: canvas_height as u32,
        x: (canvas_width - width) / 2.0,
        y: (canvas_height - height) / 2.0,
        width,
        height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(width: u64, height: u64) -> Dimensions {
        Dimensions { width, height }
    }

    fn assert_rect(layout: &ArtworkLayout, expected: (f64, f64, f64, f64)) {
        let actual = (layout.x, layout.y, layout.width, layout.height);
        for (a, e) in [
            (actual.0, expected.0),
            (actual.1, expected.1),
            (actual.2, expected.2),
            (actual.3, expected.3),
        ] {
            assert!((a - e).abs() < 1e-9, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_wide_image_letterboxed() {
        let layout = fit_artwork(400.0, 100.0, dims(20, 10)).unwrap();
        assert_eq!((layout.canvas_width, layout.canvas_height), (20, 10));
        assert_rect(&layout, (0.0, 2.5, 20.0, 5.0));
    }

    #[test]
    fn test_tall_image_pillarboxed() {
        let layout = fit_artwork(50.0, 100.0, dims(10, 10)).unwrap();
        assert_rect(&layout, (2.5, 0.0, 5.0, 10.0));
    }

    #[test]
    fn test_small_image_scaled_up() {
        let layout = fit_artwork(2.0, 2.0, dims(8, 8)).unwrap();
        assert_rect(&layout, (0.0, 0.0, 8.0, 8.0));
    }

    #[test]
    fn test_huge_block_capped() {
        let layout = fit_artwork(100.0, 100.0, dims(10_000, 5_000)).unwrap();
        assert_eq!(layout.canvas_width, MAX_ARTWORK_SIDE);
        assert_eq!(layout.canvas_height, MAX_ARTWORK_SIDE / 2);
        assert_rect(&layout, (512.0, 0.0, 1024.0, 1024.0));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(fit_artwork(10.0, 10.0, dims(0, 4)).is_none());
        assert!(fit_artwork(0.0, 10.0, dims(4, 4)).is_none());
    }
}
