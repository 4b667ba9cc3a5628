//! Zoom, mode and selection controls overlaid on the grid.

use std::rc::Rc;

use pixel_core::{Color, GridMode, GridStore, SharedGridStore};
use web_sys::HtmlInputElement;
use yew::prelude::*;
use yew_icons::{Icon, IconData};

#[derive(Properties)]
pub struct GridControlsProps {
    pub store: SharedGridStore,
    pub version: u64,
    /// Emits the hex color picked by the user.
    pub on_color_change: Callback<String>,
    pub on_buy: Callback<()>,
}

impl PartialEq for GridControlsProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.store, &other.store)
            && self.version == other.version
            && self.on_color_change == other.on_color_change
            && self.on_buy == other.on_buy
    }
}

fn store_action(store: &SharedGridStore, action: fn(&mut GridStore)) -> Callback<MouseEvent> {
    let store = store.clone();
    Callback::from(move |_: MouseEvent| action(&mut store.borrow_mut()))
}

#[function_component(GridControls)]
pub fn grid_controls(props: &GridControlsProps) -> Html {
    let store = props.store.borrow();
    let mode = store.mode();
    let locked = store.is_selection_locked();
    let selected = store.selected().len();
    let price = store.selection_price_sats();
    let dimensions = store.selection_dimensions();
    let zoom_percent = (store.view().scale * 100.0).round();
    let color = store.selected_color().to_hex();
    drop(store);

    let on_zoom_in = store_action(&props.store, |s| {
        s.zoom_in();
    });
    let on_zoom_out = store_action(&props.store, |s| {
        s.zoom_out();
    });
    let on_reset = store_action(&props.store, |s| {
        s.reset_view();
    });
    let on_view_mode = store_action(&props.store, |s| s.set_mode(GridMode::View));
    let on_select_mode = store_action(&props.store, |s| s.set_mode(GridMode::Select));
    let on_toggle_lock = store_action(&props.store, |s| {
        s.toggle_selection_lock();
    });
    let on_clear = store_action(&props.store, GridStore::clear_selection);

    let on_color_input = {
        let store = props.store.clone();
        let on_color_change = props.on_color_change.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let value = input.value();
            if let Ok(color) = Color::from_hex(&value) {
                store.borrow_mut().set_selected_color(color);
                on_color_change.emit(color.to_hex());
            }
        })
    };

    let on_buy = {
        let on_buy = props.on_buy.clone();
        Callback::from(move |_: MouseEvent| on_buy.emit(()))
    };

    html! {
        <>
            <div class="grid-toolbar">
                <button
                    class={classes!("tool-btn", (mode == GridMode::View).then_some("active"))}
                    onclick={on_view_mode}
                    title="Pan"
                >
                    <Icon data={IconData::LUCIDE_HAND} class="tool-icon"/>
                </button>
                <button
                    class={classes!("tool-btn", (mode == GridMode::Select).then_some("active"))}
                    onclick={on_select_mode}
                    title="Select"
                >
                    <Icon data={IconData::LUCIDE_MOUSE_POINTER} class="tool-icon"/>
                </button>
                <input
                    type="color"
                    class="color-picker"
                    value={color}
                    oninput={on_color_input}
                    title="Pixel color"
                />
            </div>

            <div class="zoom-controls">
                <button class="tool-btn" onclick={on_zoom_in} title="Zoom In">
                    <Icon data={IconData::LUCIDE_ZOOM_IN} class="tool-icon"/>
                </button>
                <button class="tool-btn" onclick={on_zoom_out} title="Zoom Out">
                    <Icon data={IconData::LUCIDE_ZOOM_OUT} class="tool-icon"/>
                </button>
                <button class="tool-btn" onclick={on_reset} title="Reset View">
                    <Icon data={IconData::LUCIDE_SQUARE} class="tool-icon"/>
                </button>
                <span class="zoom-level">{ format!("{zoom_percent}%") }</span>
            </div>

            if selected > 0 {
                <div class="selection-summary">
                    <p>
                        { format!("{selected} pixels selected") }
                        <span class="price-tag">{ format!("{price} sats") }</span>
                    </p>
                    if let Some(dim) = dimensions {
                        <p class="selection-dimensions">
                            { format!("Dimensions: {} × {} pixels", dim.width, dim.height) }
                        </p>
                    }
                    <div class="selection-actions">
                        <button
                            class={classes!("tool-btn", locked.then_some("active"))}
                            onclick={on_toggle_lock}
                            title={if locked { "Unlock selection" } else { "Lock selection to move it" }}
                        >
                            if locked {
                                <Icon data={IconData::LUCIDE_LOCK} class="tool-icon"/>
                            } else {
                                <Icon data={IconData::LUCIDE_UNLOCK} class="tool-icon"/>
                            }
                        </button>
                        <button class="tool-btn" onclick={on_clear} title="Clear selection">
                            <Icon data={IconData::LUCIDE_X} class="tool-icon"/>
                        </button>
                        <button class="buy-btn" onclick={on_buy}>{ "Buy Pixels" }</button>
                    </div>
                </div>
            }
        </>
    }
}
