//! Frame painting for the grid.
//!
//! [`Renderer::render`] reads a [`GridStore`] and paints it onto any
//! [`Surface`]. It never mutates the store; the only state it owns is the
//! decoded-image cache, which may be evicted at any time at the cost of a
//! flat-color frame until the image is decoded again.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use tracing::trace;

use crate::cell::{CellCoord, Color};
use crate::store::GridStore;
use crate::transform::GridWindow;

/// Screen-space rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ScreenRect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Minimal 2D raster target.
pub trait Surface {
    /// Decoded image handle accepted by [`Surface::draw_image`].
    type Image;

    /// Current size in screen pixels.
    fn size(&self) -> (f64, f64);

    fn clear_rect(&mut self, rect: ScreenRect);

    fn fill_rect(&mut self, rect: ScreenRect, color: Color);

    fn stroke_rect(&mut self, rect: ScreenRect, color: Color, line_width: f64);

    /// Draws `image` scaled to fill `rect`.
    fn draw_image(&mut self, image: &Self::Image, rect: ScreenRect);
}

/// Line width of the drag-rectangle outline.
const SELECTION_STROKE_WIDTH: f64 = 1.0;

/// Thickness of grid lines.
const GRID_LINE_WIDTH: f64 = 0.5;

// ============================================================================
// Image cache
// ============================================================================

/// Content hash, so a cached image is only reused for the content it was
/// decoded from.
pub fn content_fingerprint(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug)]
enum CacheState<I> {
    Pending,
    Ready(I),
    Failed,
}

#[derive(Debug)]
struct CacheEntry<I> {
    fingerprint: u64,
    state: CacheState<I>,
}

/// Request for the host to decode `content` and hand the image back through
/// [`ImageCache::insert_decoded`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeRequest {
    pub cell: CellCoord,
    pub fingerprint: u64,
    pub content: String,
}

/// Result of looking up a cell's image.
#[derive(Debug)]
pub enum CacheLookup<'a, I> {
    Ready(&'a I),
    /// Decode requested or failed; draw the flat color.
    Unavailable,
    Miss,
}

/// Decoded images keyed by cell coordinate.
#[derive(Debug)]
pub struct ImageCache<I> {
    entries: HashMap<CellCoord, CacheEntry<I>>,
    requests: Vec<DecodeRequest>,
}

impl<I> Default for ImageCache<I> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            requests: Vec::new(),
        }
    }
}

impl<I> ImageCache<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, cell: CellCoord, fingerprint: u64) -> CacheLookup<'_, I> {
        match self.entries.get(&cell) {
            Some(entry) if entry.fingerprint == fingerprint => match &entry.state {
                CacheState::Ready(image) => CacheLookup::Ready(image),
                CacheState::Pending | CacheState::Failed => CacheLookup::Unavailable,
            },
            _ => CacheLookup::Miss,
        }
    }

    /// Marks the cell pending and queues a decode request.
    pub fn request(&mut self, cell: CellCoord, content: &str, fingerprint: u64) {
        self.entries.insert(
            cell,
            CacheEntry {
                fingerprint,
                state: CacheState::Pending,
            },
        );
        self.requests.push(DecodeRequest {
            cell,
            fingerprint,
            content: content.to_string(),
        });
    }

    pub fn take_decode_requests(&mut self) -> Vec<DecodeRequest> {
        std::mem::take(&mut self.requests)
    }

    /// Stores a decoded image. Returns `false` when the cell's content
    /// changed since the request, in which case the image is dropped.
    pub fn insert_decoded(&mut self, cell: CellCoord, fingerprint: u64, image: I) -> bool {
        match self.entries.get(&cell) {
            Some(entry) if entry.fingerprint != fingerprint => false,
            _ => {
                self.entries.insert(
                    cell,
                    CacheEntry {
                        fingerprint,
                        state: CacheState::Ready(image),
                    },
                );
                true
            }
        }
    }

    /// Records a failed decode; the cell keeps its flat color and is not retried.
    pub fn mark_failed(&mut self, cell: CellCoord, fingerprint: u64) {
        if let Some(entry) = self.entries.get_mut(&cell) {
            if entry.fingerprint == fingerprint {
                entry.state = CacheState::Failed;
            }
        }
    }

    pub fn evict(&mut self, cell: CellCoord) {
        self.entries.remove(&cell);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.requests.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Counters describing one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub owned_drawn: usize,
    pub images_drawn: usize,
    pub color_fallbacks: usize,
    pub selected_drawn: usize,
    pub grid_lines: usize,
    pub decode_requests: usize,
}

#[derive(Debug)]
pub struct Renderer<I> {
    images: ImageCache<I>,
}

impl<I> Default for Renderer<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> Renderer<I> {
    pub fn new() -> Self {
        Self {
            images: ImageCache::new(),
        }
    }

    pub fn images(&self) -> &ImageCache<I> {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ImageCache<I> {
        &mut self.images
    }

    pub fn take_decode_requests(&mut self) -> Vec<DecodeRequest> {
        self.images.take_decode_requests()
    }

    /// Paints the store onto `surface`, back to front: background, owned
    /// cells, selected cells, drag rectangle, grid lines.
    pub fn render<S>(&mut self, store: &GridStore, surface: &mut S) -> FrameStats
    where
        S: Surface<Image = I>,
    {
        let mut stats = FrameStats::default();
        let (width, height) = surface.size();
        surface.clear_rect(ScreenRect::new(0.0, 0.0, width, height));

        let config = store.config();
        let view = store.view();
        let size = view.cell_size(config.cell_px);
        let window = view.visible_window(width, height, config.cell_px, config.grid_dim);
        if window.is_empty() {
            return stats;
        }

        let cell_rect = |x: i64, y: i64| {
            let (sx, sy) = view.grid_to_screen(x, y, config.cell_px);
            ScreenRect::new(sx, sy, size, size)
        };

        // 1. background
        let (wx, wy) = view.grid_to_screen(window.min_x, window.min_y, config.cell_px);
        surface.fill_rect(
            ScreenRect::new(
                wx,
                wy,
                window.width() as f64 * size,
                window.height() as f64 * size,
            ),
            config.background_color,
        );

        // 2. owned cells
        for pixel in store.pixels() {
            let cell = pixel.coord();
            if !window.contains(cell) {
                continue;
            }
            let rect = cell_rect(cell.x, cell.y);
            let color = Color::from_hex(&pixel.color).unwrap_or(config.default_color);
            stats.owned_drawn += 1;

            let Some(content) = store.pixel_content(cell) else {
                surface.fill_rect(rect, color);
                continue;
            };
            let fingerprint = content_fingerprint(content);
            match self.images.lookup(cell, fingerprint) {
                CacheLookup::Ready(image) => {
                    surface.draw_image(image, rect);
                    stats.images_drawn += 1;
                }
                CacheLookup::Unavailable => {
                    surface.fill_rect(rect, color);
                    stats.color_fallbacks += 1;
                }
                CacheLookup::Miss => {
                    surface.fill_rect(rect, color);
                    self.images.request(cell, content, fingerprint);
                    stats.color_fallbacks += 1;
                    stats.decode_requests += 1;
                }
            }
        }

        // 3. selected cells
        let tint = store.selected_color();
        let selected_fill = tint.with_alpha(config.selected_alpha);
        for cell in store.selected().iter() {
            if window.contains(cell) {
                surface.fill_rect(cell_rect(cell.x, cell.y), selected_fill);
                stats.selected_drawn += 1;
            }
        }

        // 4. active drag rectangle
        if let Some(rect) = store.selection() {
            let (min, max) = rect.normalized();
            let (sx, sy) = view.grid_to_screen(min.x, min.y, config.cell_px);
            let bounds = ScreenRect::new(
                sx,
                sy,
                (max.x - min.x + 1) as f64 * size,
                (max.y - min.y + 1) as f64 * size,
            );
            surface.fill_rect(bounds, tint.with_alpha(config.selection_fill_alpha));
            surface.stroke_rect(bounds, tint, SELECTION_STROKE_WIDTH);
        }

        // 5. grid lines
        if view.scale > config.grid_line_min_scale {
            let line_color = Color::BLACK.with_alpha(config.grid_line_alpha);
            stats.grid_lines = draw_grid_lines(
                surface,
                &window,
                |x, y| view.grid_to_screen(x, y, config.cell_px),
                line_color,
            );
        }

        trace!(?stats, "frame rendered");
        stats
    }
}

fn draw_grid_lines<S: Surface>(
    surface: &mut S,
    window: &GridWindow,
    to_screen: impl Fn(i64, i64) -> (f64, f64),
    color: Color,
) -> usize {
    let (left, top) = to_screen(window.min_x, window.min_y);
    let (right, bottom) = to_screen(window.max_x, window.max_y);
    let half = GRID_LINE_WIDTH / 2.0;
    let mut lines = 0;

    for x in window.min_x..=window.max_x {
        let (sx, _) = to_screen(x, window.min_y);
        surface.fill_rect(ScreenRect::new(sx - half, top, GRID_LINE_WIDTH, bottom - top), color);
        lines += 1;
    }
    for y in window.min_y..=window.max_y {
        let (_, sy) = to_screen(window.min_x, y);
        surface.fill_rect(ScreenRect::new(left, sy - half, right - left, GRID_LINE_WIDTH), color);
        lines += 1;
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::OwnedPixel;
    use crate::store::GridMode;
    use crate::test_utils::{DrawCommand, RecordingSurface};

    fn c(x: i64, y: i64) -> CellCoord {
        CellCoord::new(x, y)
    }

    fn store() -> GridStore {
        let mut store = GridStore::default();
        store.replace_pixels(vec![
            OwnedPixel::new(c(1, 1), "#FF0000", None),
            OwnedPixel::new(c(5_000, 5_000), "#00FF00", None),
        ]);
        store
    }

    #[test]
    fn test_layers_in_order() {
        let mut store = store();
        store.set_mode(GridMode::Select);
        store.add_selected_pixel(c(2, 2));
        store.start_selection(c(3, 3));
        store.update_selection(c(4, 4));

        let mut surface = RecordingSurface::new(100.0, 100.0);
        let mut renderer = Renderer::new();
        let stats = renderer.render(&store, &mut surface);

        assert_eq!(stats.owned_drawn, 1, "off-screen pixel skipped");
        assert_eq!(stats.selected_drawn, 1);
        assert_eq!(stats.grid_lines, 0);

        let cmds = &surface.commands;
        assert!(matches!(cmds[0], DrawCommand::Clear(_)));
        assert_eq!(
            cmds[1],
            DrawCommand::Fill(ScreenRect::new(0.0, 0.0, 100.0, 100.0), Color::BACKGROUND)
        );
        assert_eq!(
            cmds[2],
            DrawCommand::Fill(ScreenRect::new(2.0, 2.0, 2.0, 2.0), Color::rgb(255, 0, 0))
        );
        assert_eq!(
            cmds[3],
            DrawCommand::Fill(ScreenRect::new(4.0, 4.0, 2.0, 2.0), Color::BITCOIN.with_alpha(0.5))
        );
        assert_eq!(
            cmds[4],
            DrawCommand::Fill(ScreenRect::new(6.0, 6.0, 4.0, 4.0), Color::BITCOIN.with_alpha(0.3))
        );
        assert_eq!(
            cmds[5],
            DrawCommand::Stroke(ScreenRect::new(6.0, 6.0, 4.0, 4.0), Color::BITCOIN, 1.0)
        );
        assert_eq!(cmds.len(), 6);
    }

    #[test]
    fn test_render_is_idempotent() {
        let mut store = store();
        store.save_pixel_content(&["pixel-1-1".to_string()], "img-a");
        store.zoom_in();

        let mut renderer = Renderer::new();
        let mut first = RecordingSurface::new(64.0, 48.0);
        let mut second = RecordingSurface::new(64.0, 48.0);
        renderer.render(&store, &mut first);
        renderer.render(&store, &mut second);
        assert_eq!(first.commands, second.commands);
    }

    #[test]
    fn test_content_falls_back_until_decoded() {
        let mut store = store();
        store.save_pixel_content(&["pixel-1-1".to_string()], "img-a");

        let mut renderer = Renderer::new();
        let mut surface = RecordingSurface::new(20.0, 20.0);
        let stats = renderer.render(&store, &mut surface);
        assert_eq!(stats.color_fallbacks, 1);
        assert_eq!(stats.decode_requests, 1);

        // no duplicate request while pending
        let stats = renderer.render(&store, &mut surface);
        assert_eq!(stats.decode_requests, 0);

        let requests = renderer.take_decode_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].content, "img-a");
        assert!(renderer.images_mut().insert_decoded(
            requests[0].cell,
            requests[0].fingerprint,
            7u32
        ));

        surface.commands.clear();
        let stats = renderer.render(&store, &mut surface);
        assert_eq!(stats.images_drawn, 1);
        let expected = DrawCommand::Image(7, ScreenRect::new(2.0, 2.0, 2.0, 2.0));
        assert!(surface.commands.contains(&expected));
    }

    #[test]
    fn test_changed_content_is_a_cache_miss() {
        let mut store = store();
        store.save_pixel_content(&["pixel-1-1".to_string()], "img-a");
        let mut renderer = Renderer::new();
        let mut surface = RecordingSurface::new(20.0, 20.0);
        renderer.render(&store, &mut surface);
        let old = renderer.take_decode_requests().remove(0);

        store.save_pixel_content(&["pixel-1-1".to_string()], "img-b");
        let stats = renderer.render(&store, &mut surface);
        assert_eq!(stats.decode_requests, 1);

        // late decode of the old content is dropped
        assert!(!renderer.images_mut().insert_decoded(old.cell, old.fingerprint, 1u32));
    }

    #[test]
    fn test_failed_decode_is_not_retried() {
        let mut store = store();
        store.save_pixel_content(&["pixel-1-1".to_string()], "broken");
        let mut renderer: Renderer<u32> = Renderer::new();
        let mut surface = RecordingSurface::new(20.0, 20.0);
        renderer.render(&store, &mut surface);
        let req = renderer.take_decode_requests().remove(0);
        renderer.images_mut().mark_failed(req.cell, req.fingerprint);

        let stats = renderer.render(&store, &mut surface);
        assert_eq!(stats.decode_requests, 0);
        assert_eq!(stats.color_fallbacks, 1);
    }

    #[test]
    fn test_eviction_only_costs_a_redecode() {
        let mut store = store();
        store.save_pixel_content(&["pixel-1-1".to_string()], "img-a");
        let mut renderer = Renderer::new();
        let mut surface = RecordingSurface::new(20.0, 20.0);
        renderer.render(&store, &mut surface);
        let req = renderer.take_decode_requests().remove(0);
        renderer.images_mut().insert_decoded(req.cell, req.fingerprint, 3u32);

        renderer.images_mut().clear();
        let stats = renderer.render(&store, &mut surface);
        assert_eq!(stats.images_drawn, 0);
        assert_eq!(stats.decode_requests, 1);
    }

    #[test]
    fn test_grid_lines_above_unit_scale() {
        let mut store = GridStore::default();
        let mut renderer: Renderer<u32> = Renderer::new();
        let mut surface = RecordingSurface::new(24.0, 12.0);

        assert_eq!(renderer.render(&store, &mut surface).grid_lines, 0);

        store.zoom_in();
        let window = store.view().visible_window(24.0, 12.0, 2.0, 10_000);
        let stats = renderer.render(&store, &mut surface);
        // one line per cell edge on each axis
        let expected = (window.width() + 1) + (window.height() + 1);
        assert_eq!(stats.grid_lines, expected as usize);
        assert!(stats.grid_lines >= 17);
    }

    #[test]
    fn test_unparseable_color_uses_default() {
        let mut store = GridStore::default();
        store.replace_pixels(vec![OwnedPixel::new(c(0, 0), "not-a-color", None)]);
        let mut renderer: Renderer<u32> = Renderer::new();
        let mut surface = RecordingSurface::new(10.0, 10.0);
        renderer.render(&store, &mut surface);
        assert!(surface
            .commands
            .contains(&DrawCommand::Fill(ScreenRect::new(0.0, 0.0, 2.0, 2.0), Color::BITCOIN)));
    }

    #[test]
    fn test_off_grid_view_draws_nothing_but_clear() {
        let mut store = store();
        store.pan_grid(1.0e6, 0.0);
        let mut renderer: Renderer<u32> = Renderer::new();
        let mut surface = RecordingSurface::new(50.0, 50.0);
        renderer.render(&store, &mut surface);
        assert_eq!(surface.commands.len(), 1);
    }
}
