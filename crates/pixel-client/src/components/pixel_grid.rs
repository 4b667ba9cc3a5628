//! Canvas hosting the pixel grid.
//!
//! Pointer input goes through an [`InteractionController`]; painting happens
//! in an effect keyed on the store version, so every store change notification
//! produces exactly one repaint.

use std::cell::RefCell;
use std::rc::Rc;

use gloo::events::EventListener;
use pixel_core::{
    CellCoord, InteractionController, InteractionOutcome, PointerButton, PointerEvent, Renderer,
    SharedGridStore,
};
use tracing::{debug, trace, warn};
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, HtmlImageElement};
use yew::prelude::*;

use crate::canvas_surface::{CanvasSurface, decode_image};

type SharedRenderer = Rc<RefCell<Renderer<HtmlImageElement>>>;
type SharedController = Rc<RefCell<InteractionController>>;

#[derive(Properties)]
pub struct PixelGridProps {
    pub store: SharedGridStore,
    /// Store version, so a change re-renders this component.
    pub version: u64,
    pub on_open_details: Callback<CellCoord>,
}

impl PartialEq for PixelGridProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.store, &other.store)
            && self.version == other.version
            && self.on_open_details == other.on_open_details
    }
}

/// Renders one frame and starts decoding any images the frame asked for.
fn paint(canvas_ref: &NodeRef, store: &SharedGridStore, renderer: &SharedRenderer) {
    let Some(canvas) = canvas_ref.cast::<HtmlCanvasElement>() else {
        return;
    };
    let mut surface = match CanvasSurface::new(&canvas) {
        Ok(surface) => surface,
        Err(e) => {
            warn!("Canvas unavailable: {e:?}");
            return;
        }
    };
    let Ok(store_ref) = store.try_borrow() else {
        return;
    };

    let requests = {
        let mut renderer = renderer.borrow_mut();
        let stats = renderer.render(&store_ref, &mut surface);
        trace!(?stats, "frame");
        renderer.take_decode_requests()
    };
    drop(store_ref);

    for request in requests {
        let canvas_ref = canvas_ref.clone();
        let store = store.clone();
        let renderer = renderer.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match decode_image(&request).await {
                Ok(image) => {
                    let stored = renderer.borrow_mut().images_mut().insert_decoded(
                        request.cell,
                        request.fingerprint,
                        image,
                    );
                    if stored {
                        paint(&canvas_ref, &store, &renderer);
                    }
                }
                Err(e) => {
                    debug!(cell = ?request.cell, "image decode failed: {e:?}");
                    renderer
                        .borrow_mut()
                        .images_mut()
                        .mark_failed(request.cell, request.fingerprint);
                }
            }
        });
    }
}

/// Pointer position relative to the canvas' top-left corner.
fn local_position(canvas_ref: &NodeRef, e: &MouseEvent) -> Option<(f64, f64)> {
    let canvas = canvas_ref.cast::<HtmlCanvasElement>()?;
    let rect = canvas.get_bounding_client_rect();
    Some((
        f64::from(e.client_x()) - rect.left(),
        f64::from(e.client_y()) - rect.top(),
    ))
}

fn update_cursor(canvas_ref: &NodeRef, store: &SharedGridStore, controller: &SharedController) {
    let Some(canvas) = canvas_ref.cast::<HtmlCanvasElement>() else {
        return;
    };
    let cursor = controller.borrow().cursor(&store.borrow());
    let _ = canvas.style().set_property("cursor", cursor);
}

fn dispatch(outcome: InteractionOutcome, on_open_details: &Callback<CellCoord>) {
    if let InteractionOutcome::OpenPixelDetails(cell) = outcome {
        on_open_details.emit(cell);
    }
}

#[function_component(PixelGrid)]
pub fn pixel_grid(props: &PixelGridProps) -> Html {
    let canvas_ref = use_node_ref();
    let renderer: SharedRenderer = use_mut_ref(Renderer::new);
    let controller: SharedController = use_mut_ref(InteractionController::new);

    // Repaint on every store change.
    {
        let canvas_ref = canvas_ref.clone();
        let store = props.store.clone();
        let renderer = renderer.clone();
        use_effect_with(props.version, move |_| {
            paint(&canvas_ref, &store, &renderer);
        });
    }

    // Fit the canvas to its container, now and on window resize.
    {
        let canvas_ref = canvas_ref.clone();
        let store = props.store.clone();
        let renderer = renderer.clone();
        use_effect_with((), move |_| {
            let resize = move || {
                let Some(canvas) = canvas_ref.cast::<HtmlCanvasElement>() else {
                    return;
                };
                let (w, h) = canvas
                    .parent_element()
                    .map_or((800, 600), |p| (p.client_width(), p.client_height()));
                let w = u32::try_from(w.max(1)).unwrap_or(1);
                let h = u32::try_from(h.max(1)).unwrap_or(1);
                canvas.set_width(w);
                canvas.set_height(h);
                store
                    .borrow_mut()
                    .set_viewport_size(f64::from(w), f64::from(h));
                // Resizing clears the bitmap even when the size is unchanged.
                paint(&canvas_ref, &store, &renderer);
            };
            resize();

            let listener = web_sys::window()
                .map(|window| EventListener::new(&window, "resize", move |_| resize()));
            move || drop(listener)
        });
    }

    // Escape abandons the current drag and clears the selection.
    {
        let store = props.store.clone();
        let controller = controller.clone();
        use_effect_with((), move |_| {
            let listener = web_sys::window().and_then(|w| w.document()).map(|document| {
                EventListener::new(&document, "keydown", move |event| {
                    let Some(event) = event.dyn_ref::<web_sys::KeyboardEvent>() else {
                        return;
                    };
                    if event.key() == "Escape" {
                        controller.borrow_mut().cancel(&mut store.borrow_mut());
                    }
                })
            });
            move || drop(listener)
        });
    }

    let on_mouse_down = {
        let canvas_ref = canvas_ref.clone();
        let store = props.store.clone();
        let controller = controller.clone();
        let on_open_details = props.on_open_details.clone();
        Callback::from(move |e: MouseEvent| {
            let Some((x, y)) = local_position(&canvas_ref, &e) else {
                return;
            };
            e.prevent_default();
            let event = PointerEvent {
                x,
                y,
                button: PointerButton::from_dom(e.button()),
            };
            let outcome = controller
                .borrow_mut()
                .pointer_down(&mut store.borrow_mut(), event);
            update_cursor(&canvas_ref, &store, &controller);
            dispatch(outcome, &on_open_details);
        })
    };

    let on_mouse_move = {
        let canvas_ref = canvas_ref.clone();
        let store = props.store.clone();
        let controller = controller.clone();
        Callback::from(move |e: MouseEvent| {
            let Some((x, y)) = local_position(&canvas_ref, &e) else {
                return;
            };
            controller
                .borrow_mut()
                .pointer_move(&mut store.borrow_mut(), x, y);
            update_cursor(&canvas_ref, &store, &controller);
        })
    };

    let on_mouse_up = {
        let canvas_ref = canvas_ref.clone();
        let store = props.store.clone();
        let controller = controller.clone();
        Callback::from(move |_: MouseEvent| {
            controller.borrow_mut().pointer_up(&mut store.borrow_mut());
            update_cursor(&canvas_ref, &store, &controller);
        })
    };

    let on_mouse_leave = {
        let canvas_ref = canvas_ref.clone();
        let store = props.store.clone();
        let controller = controller.clone();
        Callback::from(move |_: MouseEvent| {
            controller.borrow_mut().pointer_leave(&mut store.borrow_mut());
            update_cursor(&canvas_ref, &store, &controller);
        })
    };

    let on_wheel = {
        let canvas_ref = canvas_ref.clone();
        let store = props.store.clone();
        let controller = controller.clone();
        Callback::from(move |e: WheelEvent| {
            e.prevent_default();
            let Some((x, y)) = local_position(&canvas_ref, &e) else {
                return;
            };
            controller
                .borrow_mut()
                .wheel(&mut store.borrow_mut(), e.delta_y(), x, y);
        })
    };

    let on_context_menu = Callback::from(|e: MouseEvent| e.prevent_default());

    let cursor = controller.borrow().cursor(&props.store.borrow());

    html! {
        <div class="pixel-grid">
            <canvas
                ref={canvas_ref}
                class="pixel-grid-canvas"
                style={format!("display: block; cursor: {cursor};")}
                onmousedown={on_mouse_down}
                onmousemove={on_mouse_move}
                onmouseup={on_mouse_up}
                onmouseleave={on_mouse_leave}
                onwheel={on_wheel}
                oncontextmenu={on_context_menu}
            />
        </div>
    }
}
