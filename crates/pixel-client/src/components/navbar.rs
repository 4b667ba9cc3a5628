//! Top bar with sale statistics.

use std::rc::Rc;

use pixel_core::{GridMode, SharedGridStore};
use yew::prelude::*;
use yew_icons::{Icon, IconData};

#[derive(Properties)]
pub struct NavbarProps {
    pub store: SharedGridStore,
    pub version: u64,
    pub on_show_leaderboard: Callback<()>,
}

impl PartialEq for NavbarProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.store, &other.store)
            && self.version == other.version
            && self.on_show_leaderboard == other.on_show_leaderboard
    }
}

#[function_component(Navbar)]
pub fn navbar(props: &NavbarProps) -> Html {
    let (total, sold, loading) = {
        let store = props.store.borrow();
        (store.total_cells(), store.purchased_count() as u64, store.is_loading())
    };
    let available = total.saturating_sub(sold);
    let percent_sold = if total == 0 {
        0.0
    } else {
        sold as f64 / total as f64 * 100.0
    };

    let stat_label = |value: u64| {
        if loading {
            "...".to_string()
        } else {
            value.to_string()
        }
    };

    let on_leaderboard = {
        let cb = props.on_show_leaderboard.clone();
        Callback::from(move |_: MouseEvent| cb.emit(()))
    };

    let on_start_buying = {
        let store = props.store.clone();
        Callback::from(move |_: MouseEvent| {
            let mut store = store.borrow_mut();
            store.set_mode(GridMode::Select);
            store.clear_selection();
        })
    };

    html! {
        <header class="navbar">
            <div class="navbar-brand">
                <Icon data={IconData::LUCIDE_BITCOIN} class="brand-icon"/>
                <span class="brand-name">{ "PixelSats" }</span>
            </div>

            <div class={classes!("navbar-stats", loading.then_some("loading"))}>
                <div class="stat">
                    <span class="stat-label">{ "Available:" }</span>
                    <span class="stat-value">{ stat_label(available) }</span>
                </div>
                <div class="stat">
                    <span class="stat-label">{ "Sold:" }</span>
                    <span class="stat-value">{ stat_label(sold) }</span>
                </div>
                <div class="stat progress">
                    <span class="stat-label">{ format!("{percent_sold:.2}% filled") }</span>
                    <div class="progress-track">
                        <div class="progress-bar" style={format!("width: {percent_sold}%;")} />
                    </div>
                </div>
            </div>

            <div class="navbar-actions">
                <button class="nav-btn" onclick={on_leaderboard}>
                    <Icon data={IconData::LUCIDE_AWARD} class="nav-icon"/>
                    { "Leaderboard" }
                </button>
                <button class="buy-btn" onclick={on_start_buying}>{ "Buy Pixels" }</button>
            </div>
        </header>
    }
}
