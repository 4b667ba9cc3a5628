//! Pointer handling for the grid canvas.
//!
//! Pointer events arrive in canvas-relative screen coordinates, are mapped to
//! cells through the store's view transform and turned into store operations
//! depending on the grid mode and the current drag.

use tracing::debug;

use crate::cell::CellCoord;
use crate::store::{GridMode, GridStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other(i16),
}

impl PointerButton {
    /// Maps a DOM `MouseEvent.button` value.
    pub fn from_dom(button: i16) -> Self {
        match button {
            0 => Self::Primary,
            2 => Self::Secondary,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub button: PointerButton,
}

impl PointerEvent {
    pub fn primary(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            button: PointerButton::Primary,
        }
    }
}

/// What the pointer is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerState {
    #[default]
    Idle,
    Panning,
    DraggingSelection,
    DraggingLockedSelection,
}

/// What the host should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    Unchanged,
    Redraw,
    /// Show details for an owned cell.
    OpenPixelDetails(CellCoord),
}

impl InteractionOutcome {
    fn redraw_if(changed: bool) -> Self {
        if changed { Self::Redraw } else { Self::Unchanged }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InteractionController {
    state: PointerState,
    last_screen: Option<(f64, f64)>,
    hover: Option<CellCoord>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    /// CSS cursor for the current state; an idle pointer over an owned
    /// cell shows it is clickable.
    pub fn cursor(&self, store: &GridStore) -> &'static str {
        let over_owned = self.hover.is_some_and(|cell| store.is_pixel_owned(cell));
        match (self.state, store.mode()) {
            (PointerState::Panning, _) => "grabbing",
            (PointerState::DraggingLockedSelection, _) => "move",
            (PointerState::Idle, _) if over_owned => "pointer",
            (_, GridMode::View) => "grab",
            (_, GridMode::Select) => "crosshair",
        }
    }

    pub fn pointer_down(
        &mut self,
        store: &mut GridStore,
        event: PointerEvent,
    ) -> InteractionOutcome {
        if event.button != PointerButton::Primary || self.state != PointerState::Idle {
            return InteractionOutcome::Unchanged;
        }
        let cell = store.screen_to_grid(event.x, event.y);

        match store.mode() {
            GridMode::View => {
                if store.is_pixel_owned(cell) {
                    return InteractionOutcome::OpenPixelDetails(cell);
                }
                self.state = PointerState::Panning;
                self.last_screen = Some((event.x, event.y));
                InteractionOutcome::Unchanged
            }
            GridMode::Select if store.is_selection_locked() => {
                let inside = store.selected().bounds().is_some_and(|(min, max)| {
                    (min.x..=max.x).contains(&cell.x) && (min.y..=max.y).contains(&cell.y)
                });
                if inside && store.start_moving_selection(cell) {
                    self.state = PointerState::DraggingLockedSelection;
                    InteractionOutcome::Unchanged
                } else if store.is_pixel_owned(cell) {
                    InteractionOutcome::OpenPixelDetails(cell)
                } else {
                    debug!(?cell, "pointer down outside locked selection");
                    InteractionOutcome::Unchanged
                }
            }
            GridMode::Select => {
                if store.is_pixel_owned(cell) {
                    return InteractionOutcome::OpenPixelDetails(cell);
                }
                if store.start_selection(cell) {
                    self.state = PointerState::DraggingSelection;
                    InteractionOutcome::Redraw
                } else {
                    InteractionOutcome::Unchanged
                }
            }
        }
    }

    pub fn pointer_move(&mut self, store: &mut GridStore, x: f64, y: f64) -> InteractionOutcome {
        match self.state {
            PointerState::Idle => {
                self.hover = Some(store.screen_to_grid(x, y));
                InteractionOutcome::Unchanged
            }
            PointerState::Panning => {
                let (last_x, last_y) = self.last_screen.unwrap_or((x, y));
                self.last_screen = Some((x, y));
                InteractionOutcome::redraw_if(store.pan_grid(x - last_x, y - last_y))
            }
            PointerState::DraggingSelection => {
                let cell = store.screen_to_grid(x, y);
                InteractionOutcome::redraw_if(store.update_selection(cell))
            }
            PointerState::DraggingLockedSelection => {
                let cell = store.screen_to_grid(x, y);
                InteractionOutcome::redraw_if(store.move_selection(cell))
            }
        }
    }

    pub fn pointer_up(&mut self, store: &mut GridStore) -> InteractionOutcome {
        let state = std::mem::take(&mut self.state);
        self.last_screen = None;
        match state {
            PointerState::Idle | PointerState::Panning => InteractionOutcome::Unchanged,
            PointerState::DraggingSelection => {
                InteractionOutcome::redraw_if(store.complete_selection())
            }
            PointerState::DraggingLockedSelection => {
                store.finalize_selection_move();
                InteractionOutcome::Unchanged
            }
        }
    }

    /// Leaving the canvas ends any drag, like releasing the button.
    pub fn pointer_leave(&mut self, store: &mut GridStore) -> InteractionOutcome {
        self.hover = None;
        self.pointer_up(store)
    }

    /// Wheel zoom anchored at the pointer; negative `delta_y` zooms in.
    pub fn wheel(
        &mut self,
        store: &mut GridStore,
        delta_y: f64,
        x: f64,
        y: f64,
    ) -> InteractionOutcome {
        if delta_y == 0.0 {
            return InteractionOutcome::Unchanged;
        }
        InteractionOutcome::redraw_if(store.zoom_at((x, y), delta_y < 0.0))
    }

    /// Abandons the current drag and clears the selection.
    pub fn cancel(&mut self, store: &mut GridStore) -> InteractionOutcome {
        self.state = PointerState::Idle;
        self.last_screen = None;
        let had_selection = !store.selected().is_empty() || store.selection().is_some();
        store.clear_selection();
        InteractionOutcome::redraw_if(had_selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::OwnedPixel;
    use crate::transform::ViewTransform;

    fn c(x: i64, y: i64) -> CellCoord {
        CellCoord::new(x, y)
    }

    /// Screen position of the centre of a cell at the default transform.
    fn at(x: i64, y: i64) -> (f64, f64) {
        (x as f64 * 2.0 + 1.0, y as f64 * 2.0 + 1.0)
    }

    fn store_with_owned(owned: &[(i64, i64)]) -> GridStore {
        let mut store = GridStore::default();
        store.replace_pixels(
            owned
                .iter()
                .map(|&(x, y)| OwnedPixel::new(c(x, y), "#123456", None))
                .collect(),
        );
        store
    }

    fn down(
        ctl: &mut InteractionController,
        store: &mut GridStore,
        cell: (i64, i64),
    ) -> InteractionOutcome {
        let (x, y) = at(cell.0, cell.1);
        ctl.pointer_down(store, PointerEvent::primary(x, y))
    }

    fn drag_to(
        ctl: &mut InteractionController,
        store: &mut GridStore,
        cell: (i64, i64),
    ) -> InteractionOutcome {
        let (x, y) = at(cell.0, cell.1);
        ctl.pointer_move(store, x, y)
    }

    #[test]
    fn test_view_mode_pans() {
        let mut store = store_with_owned(&[]);
        let mut ctl = InteractionController::new();
        ctl.pointer_down(&mut store, PointerEvent::primary(10.0, 10.0));
        assert_eq!(ctl.state(), PointerState::Panning);
        assert_eq!(ctl.pointer_move(&mut store, 15.0, 7.0), InteractionOutcome::Redraw);
        assert_eq!(ctl.pointer_move(&mut store, 20.0, 7.0), InteractionOutcome::Redraw);
        assert_eq!(store.view(), ViewTransform::new(1.0, 10.0, -3.0));
        ctl.pointer_up(&mut store);
        assert_eq!(ctl.state(), PointerState::Idle);
    }

    #[test]
    fn test_view_mode_click_on_owned_opens_details() {
        let mut store = store_with_owned(&[(4, 4)]);
        let mut ctl = InteractionController::new();
        assert_eq!(
            down(&mut ctl, &mut store, (4, 4)),
            InteractionOutcome::OpenPixelDetails(c(4, 4))
        );
        assert_eq!(ctl.state(), PointerState::Idle);
    }

    #[test]
    fn test_select_mode_drag_commits_selection() {
        let mut store = store_with_owned(&[(2, 2)]);
        store.set_mode(GridMode::Select);
        let mut ctl = InteractionController::new();

        assert_eq!(down(&mut ctl, &mut store, (1, 1)), InteractionOutcome::Redraw);
        assert_eq!(ctl.state(), PointerState::DraggingSelection);
        assert_eq!(drag_to(&mut ctl, &mut store, (3, 3)), InteractionOutcome::Redraw);
        assert_eq!(drag_to(&mut ctl, &mut store, (3, 3)), InteractionOutcome::Unchanged);
        assert_eq!(ctl.pointer_up(&mut store), InteractionOutcome::Redraw);

        assert_eq!(store.selected().len(), 8);
        assert!(store.selection().is_none());
    }

    #[test]
    fn test_select_mode_click_on_owned_opens_details() {
        let mut store = store_with_owned(&[(2, 2)]);
        store.set_mode(GridMode::Select);
        let mut ctl = InteractionController::new();
        assert_eq!(
            down(&mut ctl, &mut store, (2, 2)),
            InteractionOutcome::OpenPixelDetails(c(2, 2))
        );
        assert!(store.selection().is_none());
    }

    #[test]
    fn test_locked_drag_moves_block() {
        let mut store = store_with_owned(&[(10, 10)]);
        store.set_mode(GridMode::Select);
        let mut ctl = InteractionController::new();
        down(&mut ctl, &mut store, (5, 5));
        drag_to(&mut ctl, &mut store, (6, 6));
        ctl.pointer_up(&mut store);
        store.toggle_selection_lock();

        down(&mut ctl, &mut store, (5, 5));
        assert_eq!(ctl.state(), PointerState::DraggingLockedSelection);
        assert_eq!(drag_to(&mut ctl, &mut store, (9, 9)), InteractionOutcome::Unchanged);
        assert_eq!(drag_to(&mut ctl, &mut store, (20, 20)), InteractionOutcome::Redraw);
        ctl.pointer_up(&mut store);

        assert_eq!(store.selected().bounds(), Some((c(20, 20), c(21, 21))));
        assert_eq!(store.drag_offset(), None);
    }

    #[test]
    fn test_locked_click_outside_box_is_ignored() {
        let mut store = store_with_owned(&[]);
        store.set_mode(GridMode::Select);
        store.add_selected_pixel(c(1, 1));
        store.toggle_selection_lock();
        let mut ctl = InteractionController::new();
        assert_eq!(down(&mut ctl, &mut store, (30, 30)), InteractionOutcome::Unchanged);
        assert_eq!(ctl.state(), PointerState::Idle);
        assert!(store.selection().is_none());
    }

    #[test]
    fn test_secondary_button_ignored() {
        let mut store = store_with_owned(&[]);
        store.set_mode(GridMode::Select);
        let mut ctl = InteractionController::new();
        let event = PointerEvent {
            x: 3.0,
            y: 3.0,
            button: PointerButton::from_dom(2),
        };
        assert_eq!(ctl.pointer_down(&mut store, event), InteractionOutcome::Unchanged);
        assert_eq!(ctl.state(), PointerState::Idle);
        assert!(store.selection().is_none());
    }

    #[test]
    fn test_pointer_leave_completes_drag() {
        let mut store = store_with_owned(&[]);
        store.set_mode(GridMode::Select);
        let mut ctl = InteractionController::new();
        down(&mut ctl, &mut store, (0, 0));
        drag_to(&mut ctl, &mut store, (1, 0));
        ctl.pointer_leave(&mut store);
        assert_eq!(store.selected().len(), 2);
        assert_eq!(ctl.state(), PointerState::Idle);
    }

    #[test]
    fn test_wheel_zooms_about_pointer() {
        let mut store = store_with_owned(&[]);
        let mut ctl = InteractionController::new();
        let before = store.screen_to_grid(101.0, 51.0);
        assert_eq!(ctl.wheel(&mut store, -1.0, 101.0, 51.0), InteractionOutcome::Redraw);
        assert!(store.view().scale > 1.0);
        assert_eq!(store.screen_to_grid(101.0, 51.0), before);
        assert_eq!(ctl.wheel(&mut store, 0.0, 0.0, 0.0), InteractionOutcome::Unchanged);
    }

    #[test]
    fn test_cancel_clears_selection() {
        let mut store = store_with_owned(&[]);
        store.set_mode(GridMode::Select);
        let mut ctl = InteractionController::new();
        down(&mut ctl, &mut store, (0, 0));
        assert_eq!(ctl.cancel(&mut store), InteractionOutcome::Redraw);
        assert_eq!(ctl.state(), PointerState::Idle);
        assert!(store.selection().is_none());
    }

    #[test]
    fn test_cursor_follows_state() {
        let mut store = store_with_owned(&[]);
        let mut ctl = InteractionController::new();
        assert_eq!(ctl.cursor(&store), "grab");
        ctl.pointer_down(&mut store, PointerEvent::primary(1.0, 1.0));
        assert_eq!(ctl.cursor(&store), "grabbing");

        store.set_mode(GridMode::Select);
        assert_eq!(InteractionController::new().cursor(&store), "crosshair");
    }

    #[test]
    fn test_cursor_marks_hovered_owned_cell() {
        let mut store = store_with_owned(&[(3, 3)]);
        let mut ctl = InteractionController::new();
        drag_to(&mut ctl, &mut store, (3, 3));
        assert_eq!(ctl.cursor(&store), "pointer");

        drag_to(&mut ctl, &mut store, (4, 3));
        assert_eq!(ctl.cursor(&store), "grab");

        drag_to(&mut ctl, &mut store, (3, 3));
        ctl.pointer_leave(&mut store);
        assert_eq!(ctl.cursor(&store), "grab");
    }
}
