//! Screen ↔ grid coordinate mapping under pan/zoom.
//!
//! Grid space maps to screen space through
//! `screen = grid * cell_px * scale + translate`. Every function here is pure.

use serde::{Deserialize, Serialize};

use crate::cell::CellCoord;
use crate::config::{CELL_PX, INITIAL_SCALE};

/// Absorbs floating-point rounding when a screen position lands exactly on a
/// cell edge, so that `screen_to_grid(grid_to_screen(c)) == c`.
const EDGE_EPSILON: f64 = 1e-7;

/// Pan/zoom state of the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub scale: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: INITIAL_SCALE,
            translate_x: 0.0,
            translate_y: 0.0,
        }
    }
}

impl ViewTransform {
    pub fn new(scale: f64, translate_x: f64, translate_y: f64) -> Self {
        Self {
            scale,
            translate_x,
            translate_y,
        }
    }

    /// On-screen side length of one cell.
    pub fn cell_size(&self, cell_px: f64) -> f64 {
        cell_px * self.scale
    }

    pub fn grid_to_screen(&self, x: i64, y: i64, cell_px: f64) -> (f64, f64) {
        let size = self.cell_size(cell_px);
        (
            x as f64 * size + self.translate_x,
            y as f64 * size + self.translate_y,
        )
    }

    pub fn screen_to_grid(&self, screen_x: f64, screen_y: f64, cell_px: f64) -> CellCoord {
        let size = self.cell_size(cell_px);
        let gx = (screen_x - self.translate_x) / size;
        let gy = (screen_y - self.translate_y) / size;
        CellCoord::new(
            (gx + EDGE_EPSILON).floor() as i64,
            (gy + EDGE_EPSILON).floor() as i64,
        )
    }

    /// Cells intersecting a `width` × `height` viewport, clamped to the grid.
    pub fn visible_window(
        &self,
        width: f64,
        height: f64,
        cell_px: f64,
        grid_dim: i64,
    ) -> GridWindow {
        let size = self.cell_size(cell_px);
        let clamp = |v: f64| (v as i64).clamp(0, grid_dim);
        GridWindow {
            min_x: clamp((-self.translate_x / size).floor()),
            min_y: clamp((-self.translate_y / size).floor()),
            max_x: clamp(((width - self.translate_x) / size).ceil()),
            max_y: clamp(((height - self.translate_y) / size).ceil()),
        }
    }

    /// Rescales to `new_scale` keeping the grid point under `anchor` fixed on screen.
    pub fn zoom_about(&self, new_scale: f64, anchor: (f64, f64)) -> Self {
        let ratio = new_scale / self.scale;
        Self {
            scale: new_scale,
            translate_x: anchor.0 - (anchor.0 - self.translate_x) * ratio,
            translate_y: anchor.1 - (anchor.1 - self.translate_y) * ratio,
        }
    }
}

/// [`ViewTransform::screen_to_grid`] at the default cell size.
pub fn screen_to_grid(screen_x: f64, screen_y: f64, transform: &ViewTransform) -> CellCoord {
    transform.screen_to_grid(screen_x, screen_y, CELL_PX)
}

/// [`ViewTransform::grid_to_screen`] at the default cell size.
pub fn grid_to_screen(x: i64, y: i64, transform: &ViewTransform) -> (f64, f64) {
    transform.grid_to_screen(x, y, CELL_PX)
}

/// Half-open cell range `[min, max)` on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridWindow {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl GridWindow {
    pub fn contains(&self, coord: CellCoord) -> bool {
        (self.min_x..self.max_x).contains(&coord.x) && (self.min_y..self.max_y).contains(&coord.y)
    }

    pub fn is_empty(&self) -> bool {
        self.min_x >= self.max_x || self.min_y >= self.max_y
    }

    pub fn width(&self) -> i64 {
        (self.max_x - self.min_x).max(0)
    }

    pub fn height(&self) -> i64 {
        (self.max_y - self.min_y).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transforms() -> Vec<ViewTransform> {
        vec![
            ViewTransform::default(),
            ViewTransform::new(0.5, 0.0, 0.0),
            ViewTransform::new(10.0, -1234.5, 77.25),
            ViewTransform::new(1.2, 0.1, -0.3),
            ViewTransform::new(1.0 / 1.2, 333.3, -999.9),
            ViewTransform::new(1.2_f64.powi(12).min(10.0), -19_999.0, -5.5),
        ]
    }

    #[test]
    fn test_screen_grid_roundtrip() {
        let cells = [(0, 0), (1, 1), (3, 4), (9_999, 0), (4_321, 9_999), (9_999, 9_999)];
        for t in transforms() {
            for &(x, y) in &cells {
                let (sx, sy) = grid_to_screen(x, y, &t);
                assert_eq!(screen_to_grid(sx, sy, &t), CellCoord::new(x, y), "transform {t:?}");
            }
        }
    }

    #[test]
    fn test_screen_to_grid_floors_inside_cell() {
        let t = ViewTransform::new(2.0, 10.0, 20.0);
        // cell size = 4px; cell (1, 2) spans x∈[14,18), y∈[28,32)
        assert_eq!(screen_to_grid(14.0, 28.0, &t), CellCoord::new(1, 2));
        assert_eq!(screen_to_grid(17.9, 31.9, &t), CellCoord::new(1, 2));
        assert_eq!(screen_to_grid(9.0, 19.0, &t), CellCoord::new(-1, -1));
    }

    #[test]
    fn test_visible_window_clamped() {
        let t = ViewTransform::default();
        let window = t.visible_window(800.0, 600.0, CELL_PX, 10_000);
        assert_eq!(window, GridWindow { min_x: 0, min_y: 0, max_x: 400, max_y: 300 });

        let panned = ViewTransform::new(1.0, -19_900.0, 100.0);
        let window = panned.visible_window(800.0, 600.0, CELL_PX, 10_000);
        assert_eq!(window.min_x, 9_950);
        assert_eq!(window.max_x, 10_000);
        assert_eq!(window.min_y, 0);
        assert_eq!(window.max_y, 250);
    }

    #[test]
    fn test_visible_window_empty_off_grid() {
        let t = ViewTransform::new(1.0, 50_000.0, 0.0);
        assert!(t.visible_window(800.0, 600.0, CELL_PX, 10_000).is_empty());
    }

    #[test]
    fn test_zoom_about_keeps_anchor_fixed() {
        let t = ViewTransform::new(1.0, 40.0, -20.0);
        let anchor = (300.0, 200.0);
        let before = screen_to_grid(anchor.0, anchor.1, &t);
        let zoomed = t.zoom_about(1.2, anchor);
        assert_eq!(screen_to_grid(anchor.0, anchor.1, &zoomed), before);
        assert!((zoomed.scale - 1.2).abs() < f64::EPSILON);
    }
}
