//! Main application component.

use pixel_core::{CellCoord, Color, GridConfig, LoadState, refresh_pixels};
use yew::prelude::*;

use crate::components::{GridControls, Leaderboard, Navbar, PixelDetails, PixelGrid, PurchasePanel};
use crate::hooks::{use_grid_store, use_initial_refresh, use_localstorage, use_pixel_service};
use crate::util::async_callback;

const COLOR_KEY: &str = "$pixel-grid$/config/color";

#[function_component(App)]
pub fn app() -> Html {
    let service = use_pixel_service();
    let grid = use_grid_store(GridConfig::default());
    use_initial_refresh(grid.store.clone(), service.clone());

    let color = use_localstorage(COLOR_KEY, || Color::default().to_hex());
    let show_purchase = use_state(|| false);
    let show_leaderboard = use_state(|| false);
    let details_cell = use_state(|| None::<CellCoord>);

    // Apply the saved color once the store exists.
    {
        let store = grid.store.clone();
        use_effect_with((*color).clone(), move |hex| match Color::from_hex(hex) {
            Ok(c) => store.borrow_mut().set_selected_color(c),
            Err(e) => tracing::warn!("Ignoring saved color: {e}"),
        });
    }

    let on_color_change = {
        let color = color.clone();
        Callback::from(move |hex: String| color.set(hex))
    };

    let on_open_details = {
        let details_cell = details_cell.clone();
        Callback::from(move |cell: CellCoord| details_cell.set(Some(cell)))
    };
    let on_close_details = {
        let details_cell = details_cell.clone();
        Callback::from(move |()| details_cell.set(None))
    };

    let on_buy = {
        let show_purchase = show_purchase.clone();
        Callback::from(move |()| show_purchase.set(true))
    };
    let on_close_purchase = {
        let show_purchase = show_purchase.clone();
        Callback::from(move |()| show_purchase.set(false))
    };

    let on_show_leaderboard = {
        let show_leaderboard = show_leaderboard.clone();
        Callback::from(move |()| show_leaderboard.set(true))
    };
    let on_close_leaderboard = {
        let show_leaderboard = show_leaderboard.clone();
        Callback::from(move |()| show_leaderboard.set(false))
    };

    let on_reload = async_callback(
        (grid.store.clone(), service.clone()),
        |(store, service)| async move {
            // The store records the failure.
            let _ = refresh_pixels(&store, &service).await;
        },
    );

    let load_banner = match grid.store.borrow().load_state() {
        LoadState::Loading => html! {
            <div class="load-banner">{ "Loading pixels..." }</div>
        },
        LoadState::Failed(message) => html! {
            <div class="load-banner error">
                { format!("Failed to load pixels: {message}") }
                <button onclick={on_reload}>{ "Retry" }</button>
            </div>
        },
        LoadState::Idle | LoadState::Loaded => html! {},
    };

    html! {
        <div class="app">
            <Navbar
                store={grid.store.clone()}
                version={grid.version}
                on_show_leaderboard={on_show_leaderboard}
            />
            <main class="grid-container">
                { load_banner }
                <PixelGrid
                    store={grid.store.clone()}
                    version={grid.version}
                    on_open_details={on_open_details}
                />
                <GridControls
                    store={grid.store.clone()}
                    version={grid.version}
                    on_color_change={on_color_change}
                    on_buy={on_buy}
                />
            </main>
            <PurchasePanel
                store={grid.store.clone()}
                version={grid.version}
                service={service.clone()}
                open={*show_purchase}
                onclose={on_close_purchase}
            />
            <PixelDetails
                service={service.clone()}
                cell={*details_cell}
                onclose={on_close_details}
            />
            <Leaderboard
                service={service}
                open={*show_leaderboard}
                onclose={on_close_leaderboard}
            />
        </div>
    }
}
