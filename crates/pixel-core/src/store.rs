//! Canonical grid state and the only place it is mutated.
//!
//! The store is constructed once at startup and shared as a
//! [`SharedGridStore`]. Every mutation that changes state bumps
//! [`GridStore::version`] and notifies subscribers with the kind of change;
//! calls that are invalid for the current mode or lock state are silent
//! no-ops and notify nobody.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cell::{CellCoord, CellId, Color, Dimensions, OwnedPixel, SelectionRect};
use crate::config::GridConfig;
use crate::service::{PixelService, ServiceError};
use crate::transform::{GridWindow, ViewTransform};

pub type SharedGridStore = Rc<RefCell<GridStore>>;

/// Interaction mode of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridMode {
    /// Pan the view; clicking an owned cell opens its details.
    #[default]
    View,
    /// Drag out rectangles of cells to buy.
    Select,
}

/// What a notification is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GridChange {
    Pixels,
    Selection,
    SelectedCells,
    View,
    Viewport,
    Mode,
    Lock,
    Content,
    Color,
    Load,
}

/// Progress of the last owned-pixel fetch.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(GridChange)>;

/// Ordered cell list with constant-time membership.
#[derive(Debug, Clone, Default)]
pub struct SelectedCells {
    order: Vec<CellCoord>,
    members: HashSet<CellCoord>,
}

impl SelectedCells {
    fn replace(&mut self, cells: Vec<CellCoord>) {
        self.members = cells.iter().copied().collect();
        self.order = cells;
    }

    fn push(&mut self, cell: CellCoord) -> bool {
        if self.members.insert(cell) {
            self.order.push(cell);
            true
        } else {
            false
        }
    }

    fn remove(&mut self, cell: CellCoord) -> bool {
        if self.members.remove(&cell) {
            self.order.retain(|c| *c != cell);
            true
        } else {
            false
        }
    }

    fn retain(&mut self, mut keep: impl FnMut(CellCoord) -> bool) -> bool {
        let before = self.order.len();
        self.order.retain(|c| keep(*c));
        if self.order.len() == before {
            return false;
        }
        self.members = self.order.iter().copied().collect();
        true
    }

    fn translate(&mut self, dx: i64, dy: i64) {
        let moved = self.order.iter().map(|c| c.offset(dx, dy)).collect();
        self.replace(moved);
    }

    fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    pub fn contains(&self, cell: CellCoord) -> bool {
        self.members.contains(&cell)
    }

    pub fn iter(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.order.iter().copied()
    }

    pub fn as_slice(&self) -> &[CellCoord] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Inclusive `(min, max)` corners of the bounding box.
    pub fn bounds(&self) -> Option<(CellCoord, CellCoord)> {
        let first = *self.order.first()?;
        Some(self.order.iter().fold((first, first), |(min, max), c| {
            (
                CellCoord::new(min.x.min(c.x), min.y.min(c.y)),
                CellCoord::new(max.x.max(c.x), max.y.max(c.y)),
            )
        }))
    }
}

pub struct GridStore {
    config: GridConfig,
    pixels: HashMap<CellCoord, OwnedPixel>,
    /// Locally saved content; survives a refresh that has not caught up yet.
    content: HashMap<CellCoord, String>,
    selected: SelectedCells,
    selection: Option<SelectionRect>,
    mode: GridMode,
    view: ViewTransform,
    viewport: (f64, f64),
    locked: bool,
    drag_offset: Option<(i64, i64)>,
    selected_color: Color,
    load_state: LoadState,
    version: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for GridStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridStore")
            .field("pixels", &self.pixels.len())
            .field("selected", &self.selected.len())
            .field("selection", &self.selection)
            .field("mode", &self.mode)
            .field("view", &self.view)
            .field("locked", &self.locked)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl Default for GridStore {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl GridStore {
    pub fn new(config: GridConfig) -> Self {
        let view = ViewTransform::new(config.initial_scale, 0.0, 0.0);
        let selected_color = config.default_color;
        Self {
            config,
            pixels: HashMap::new(),
            content: HashMap::new(),
            selected: SelectedCells::default(),
            selection: None,
            mode: GridMode::View,
            view,
            viewport: (800.0, 600.0),
            locked: false,
            drag_offset: None,
            selected_color,
            load_state: LoadState::Idle,
            version: 0,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    pub fn into_shared(self) -> SharedGridStore {
        Rc::new(RefCell::new(self))
    }

    // ------------------------------------------------------------------
    // Notification
    // ------------------------------------------------------------------

    /// Registers a change listener.
    ///
    /// Listeners run synchronously inside the mutating call and must not
    /// borrow the store again; schedule a redraw instead.
    pub fn subscribe(&mut self, listener: impl FnMut(GridChange) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    /// Monotonic counter bumped on every state change.
    pub fn version(&self) -> u64 {
        self.version
    }

    fn emit(&mut self, change: GridChange) {
        self.version += 1;
        for (_, listener) in &mut self.listeners {
            listener(change);
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn mode(&self) -> GridMode {
        self.mode
    }

    pub fn view(&self) -> ViewTransform {
        self.view
    }

    pub fn viewport(&self) -> (f64, f64) {
        self.viewport
    }

    pub fn selection(&self) -> Option<SelectionRect> {
        self.selection
    }

    pub fn selected(&self) -> &SelectedCells {
        &self.selected
    }

    pub fn is_selection_locked(&self) -> bool {
        self.locked
    }

    pub fn drag_offset(&self) -> Option<(i64, i64)> {
        self.drag_offset
    }

    pub fn selected_color(&self) -> Color {
        self.selected_color
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn is_loading(&self) -> bool {
        self.load_state == LoadState::Loading
    }

    pub fn pixels(&self) -> impl Iterator<Item = &OwnedPixel> {
        self.pixels.values()
    }

    pub fn purchased_count(&self) -> usize {
        self.pixels.len()
    }

    pub fn total_cells(&self) -> u64 {
        let dim = self.config.grid_dim.unsigned_abs();
        dim * dim
    }

    /// One sat per selected cell.
    pub fn selection_price_sats(&self) -> u64 {
        self.selected.len() as u64
    }

    pub fn visible_window(&self) -> GridWindow {
        self.view.visible_window(
            self.viewport.0,
            self.viewport.1,
            self.config.cell_px,
            self.config.grid_dim,
        )
    }

    pub fn screen_to_grid(&self, screen_x: f64, screen_y: f64) -> CellCoord {
        self.view.screen_to_grid(screen_x, screen_y, self.config.cell_px)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn is_pixel_owned(&self, cell: CellCoord) -> bool {
        self.pixels.contains_key(&cell)
    }

    pub fn is_pixel_selected(&self, cell: CellCoord) -> bool {
        self.selected.contains(cell)
    }

    /// Hex color of an owned cell.
    pub fn pixel_color(&self, cell: CellCoord) -> Option<&str> {
        self.pixels.get(&cell).map(|p| p.color.as_str())
    }

    pub fn pixel_content(&self, cell: CellCoord) -> Option<&str> {
        self.content
            .get(&cell)
            .map(String::as_str)
            .or_else(|| self.pixels.get(&cell)?.content.as_deref())
    }

    /// Size of the active drag rectangle, or of the selected cells' bounding
    /// box when no drag is in progress.
    pub fn selection_dimensions(&self) -> Option<Dimensions> {
        if let Some(rect) = &self.selection {
            return Some(rect.dimensions());
        }
        let (min, max) = self.selected.bounds()?;
        Some(Dimensions {
            width: (max.x - min.x).unsigned_abs() + 1,
            height: (max.y - min.y).unsigned_abs() + 1,
        })
    }

    // ------------------------------------------------------------------
    // Mode and color
    // ------------------------------------------------------------------

    /// Switches mode; the existing selection is kept.
    pub fn set_mode(&mut self, mode: GridMode) {
        if self.mode != mode {
            self.mode = mode;
            self.emit(GridChange::Mode);
        }
    }

    pub fn set_selected_color(&mut self, color: Color) {
        if self.selected_color != color {
            self.selected_color = color;
            self.emit(GridChange::Color);
        }
    }

    // ------------------------------------------------------------------
    // Drag selection
    // ------------------------------------------------------------------

    fn can_edit_selection(&self) -> bool {
        self.mode == GridMode::Select && !self.locked
    }

    pub fn start_selection(&mut self, cell: CellCoord) -> bool {
        if !self.can_edit_selection() {
            debug!(?cell, mode = ?self.mode, locked = self.locked, "start_selection ignored");
            return false;
        }
        self.selection = Some(SelectionRect::at(cell));
        self.emit(GridChange::Selection);
        true
    }

    pub fn update_selection(&mut self, cell: CellCoord) -> bool {
        if !self.can_edit_selection() {
            return false;
        }
        let Some(rect) = self.selection.as_mut() else {
            return false;
        };
        if rect.end_x == cell.x && rect.end_y == cell.y {
            return false;
        }
        rect.end_x = cell.x;
        rect.end_y = cell.y;
        self.emit(GridChange::Selection);
        true
    }

    /// Commits the drag rectangle into the selected cells, skipping owned
    /// and off-grid cells.
    pub fn complete_selection(&mut self) -> bool {
        if !self.can_edit_selection() {
            return false;
        }
        let Some(rect) = self.selection.take() else {
            return false;
        };

        let (min, max) = rect.normalized();
        let dim = self.config.grid_dim;
        let (x0, x1) = (min.x.max(0), max.x.min(dim - 1));
        let (y0, y1) = (min.y.max(0), max.y.min(dim - 1));

        let mut cells = Vec::new();
        for x in x0..=x1 {
            for y in y0..=y1 {
                let cell = CellCoord::new(x, y);
                if !self.pixels.contains_key(&cell) {
                    cells.push(cell);
                }
            }
        }
        debug!(count = cells.len(), "selection committed");

        self.selected.replace(cells);
        self.emit(GridChange::Selection);
        self.emit(GridChange::SelectedCells);
        true
    }

    /// Drops the selection, the drag rectangle and the lock. Always succeeds.
    pub fn clear_selection(&mut self) {
        if self.selection.take().is_some() {
            self.emit(GridChange::Selection);
        }
        if !self.selected.is_empty() {
            self.selected.clear();
            self.emit(GridChange::SelectedCells);
        }
        if self.locked || self.drag_offset.is_some() {
            self.locked = false;
            self.drag_offset = None;
            self.emit(GridChange::Lock);
        }
    }

    pub fn add_selected_pixel(&mut self, cell: CellCoord) -> bool {
        if self.locked || self.is_pixel_owned(cell) || !cell.in_grid(self.config.grid_dim) {
            return false;
        }
        if self.selected.push(cell) {
            self.emit(GridChange::SelectedCells);
            true
        } else {
            false
        }
    }

    pub fn remove_selected_pixel(&mut self, cell: CellCoord) -> bool {
        if self.locked {
            return false;
        }
        if self.selected.remove(cell) {
            self.emit(GridChange::SelectedCells);
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------
    // Locked selection
    // ------------------------------------------------------------------

    /// Flips the lock; needs at least one selected cell. Locking discards
    /// an unfinished drag rectangle.
    pub fn toggle_selection_lock(&mut self) -> bool {
        if self.selected.is_empty() {
            return false;
        }
        self.locked = !self.locked;
        if self.locked {
            if self.selection.take().is_some() {
                self.emit(GridChange::Selection);
            }
        } else {
            self.drag_offset = None;
        }
        self.emit(GridChange::Lock);
        true
    }

    pub fn start_moving_selection(&mut self, cell: CellCoord) -> bool {
        if !self.locked {
            return false;
        }
        let Some((min, _)) = self.selected.bounds() else {
            return false;
        };
        self.drag_offset = Some((cell.x - min.x, cell.y - min.y));
        self.emit(GridChange::Lock);
        true
    }

    /// Translates the locked selection so its bounding-box minimum lands at
    /// `cell - drag_offset`.
    ///
    /// The move is all-or-nothing: if any cell of the shifted bounding box is
    /// owned, or would leave the grid, nothing changes.
    pub fn move_selection(&mut self, cell: CellCoord) -> bool {
        if !self.locked {
            return false;
        }
        let Some((off_x, off_y)) = self.drag_offset else {
            return false;
        };
        let Some((min, max)) = self.selected.bounds() else {
            return false;
        };

        let new_min = CellCoord::new(cell.x - off_x, cell.y - off_y);
        let (shift_x, shift_y) = (new_min.x - min.x, new_min.y - min.y);
        if shift_x == 0 && shift_y == 0 {
            return false;
        }
        let new_max = max.offset(shift_x, shift_y);

        let dim = self.config.grid_dim;
        if !new_min.in_grid(dim) || !new_max.in_grid(dim) {
            debug!(?new_min, ?new_max, "selection move leaves the grid");
            return false;
        }
        if self.block_collides(new_min, new_max) {
            debug!(?new_min, ?new_max, "selection move collides with owned cells");
            return false;
        }

        self.selected.translate(shift_x, shift_y);
        self.emit(GridChange::SelectedCells);
        true
    }

    /// Whether any owned cell falls in the inclusive box `[min, max]`.
    fn block_collides(&self, min: CellCoord, max: CellCoord) -> bool {
        let width = (max.x - min.x + 1).unsigned_abs();
        let height = (max.y - min.y + 1).unsigned_abs();
        let area = width.saturating_mul(height);

        // Scan whichever side is smaller.
        if area > self.pixels.len() as u64 {
            self.pixels
                .keys()
                .any(|c| (min.x..=max.x).contains(&c.x) && (min.y..=max.y).contains(&c.y))
        } else {
            (min.x..=max.x)
                .any(|x| (min.y..=max.y).any(|y| self.pixels.contains_key(&CellCoord::new(x, y))))
        }
    }

    pub fn finalize_selection_move(&mut self) -> bool {
        if self.drag_offset.take().is_some() {
            self.emit(GridChange::Lock);
            true
        } else {
            false
        }
    }

    // ------------------------------------------------------------------
    // View
    // ------------------------------------------------------------------

    fn set_view(&mut self, view: ViewTransform) -> bool {
        if self.view == view {
            return false;
        }
        self.view = view;
        self.emit(GridChange::View);
        true
    }

    pub fn zoom_in(&mut self) -> bool {
        let scale = self.config.clamp_scale(self.view.scale * self.config.scale_factor);
        self.set_view(ViewTransform { scale, ..self.view })
    }

    pub fn zoom_out(&mut self) -> bool {
        let scale = self.config.clamp_scale(self.view.scale / self.config.scale_factor);
        self.set_view(ViewTransform { scale, ..self.view })
    }

    /// Zooms one step while keeping the cell under `anchor` in place.
    pub fn zoom_at(&mut self, anchor: (f64, f64), zoom_in: bool) -> bool {
        let target = if zoom_in {
            self.view.scale * self.config.scale_factor
        } else {
            self.view.scale / self.config.scale_factor
        };
        let scale = self.config.clamp_scale(target);
        let view = self.view.zoom_about(scale, anchor);
        self.set_view(view)
    }

    pub fn reset_view(&mut self) -> bool {
        self.set_view(ViewTransform::new(self.config.initial_scale, 0.0, 0.0))
    }

    pub fn pan_grid(&mut self, dx: f64, dy: f64) -> bool {
        self.set_view(ViewTransform {
            translate_x: self.view.translate_x + dx,
            translate_y: self.view.translate_y + dy,
            ..self.view
        })
    }

    /// Resize notification from the drawing surface.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        if self.viewport != (width, height) {
            self.viewport = (width, height);
            self.emit(GridChange::Viewport);
        }
    }

    // ------------------------------------------------------------------
    // Owned pixels and content
    // ------------------------------------------------------------------

    /// Replaces every owned pixel. Duplicate coordinates keep the last entry;
    /// newly owned cells leave the selection.
    pub fn replace_pixels(&mut self, pixels: Vec<OwnedPixel>) {
        self.pixels = pixels.into_iter().map(|p| (p.coord(), p)).collect();
        self.emit(GridChange::Pixels);
        self.prune_owned_from_selection();
    }

    /// Drops owned cells from the selection. A lock with nothing left to
    /// hold is released.
    fn prune_owned_from_selection(&mut self) {
        let owned = &self.pixels;
        if !self.selected.retain(|c| !owned.contains_key(&c)) {
            return;
        }
        self.emit(GridChange::SelectedCells);
        if self.selected.is_empty() && (self.locked || self.drag_offset.is_some()) {
            debug!("selection emptied by ownership change, releasing lock");
            self.locked = false;
            self.drag_offset = None;
            self.emit(GridChange::Lock);
        }
    }

    pub fn begin_refresh(&mut self) {
        self.load_state = LoadState::Loading;
        self.emit(GridChange::Load);
    }

    /// Applies a fetch result. On failure the current pixels stay as they are.
    pub fn apply_refresh(&mut self, result: Result<Vec<OwnedPixel>, ServiceError>) {
        match result {
            Ok(pixels) => {
                info!(count = pixels.len(), "owned pixels refreshed");
                self.replace_pixels(pixels);
                self.load_state = LoadState::Loaded;
            }
            Err(e) => {
                warn!("Failed to fetch pixels: {e}");
                self.load_state = LoadState::Failed(e.to_string());
            }
        }
        self.emit(GridChange::Load);
    }

    /// Associates `content` with each cell id, creating owned entries for
    /// cells not yet known. Malformed ids are skipped.
    pub fn save_pixel_content(&mut self, cell_ids: &[String], content: &str) -> usize {
        let mut saved = 0;
        let color = self.selected_color.to_hex();
        for raw in cell_ids {
            let cell = match raw.parse::<CellId>() {
                Ok(id) => id.coord(),
                Err(e) => {
                    warn!("Skipping content for malformed cell id: {e}");
                    continue;
                }
            };

            self.content.insert(cell, content.to_string());
            let pixel = self
                .pixels
                .entry(cell)
                .or_insert_with(|| OwnedPixel::new(cell, color.clone(), None));
            pixel.content = Some(content.to_string());
            pixel.updated_at = chrono::Utc::now();
            saved += 1;
        }
        if saved == 0 {
            return 0;
        }

        self.emit(GridChange::Content);
        self.emit(GridChange::Pixels);
        self.prune_owned_from_selection();
        saved
    }
}

/// Fetches owned pixels and applies them to the store.
///
/// The store is borrowed only before and after the await, so other events
/// can mutate it meanwhile. A late response still overwrites the pixels.
pub async fn refresh_pixels<S: PixelService>(
    store: &SharedGridStore,
    service: &S,
) -> Result<usize, ServiceError> {
    store.borrow_mut().begin_refresh();
    let result = service.fetch_owned_pixels().await;
    let outcome = result.as_ref().map(Vec::len).map_err(Clone::clone);
    store.borrow_mut().apply_refresh(result);
    outcome
}
