//! Leaderboard dialog ranking owners by pixels held.

use pixel_core::service::PixelService;
use pixel_core::{RankedEntry, rank_entries};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::components::Modal;
use crate::network::AppService;

#[derive(Properties, PartialEq)]
pub struct LeaderboardProps {
    pub service: AppService,
    pub open: bool,
    pub onclose: Callback<()>,
}

#[derive(Debug, Clone, PartialEq)]
enum LeaderboardState {
    Loading,
    Loaded(Vec<RankedEntry>),
    Failed(String),
}

#[function_component(Leaderboard)]
pub fn leaderboard(props: &LeaderboardProps) -> Html {
    let state = use_state(|| LeaderboardState::Loading);

    // Refetch every time the dialog opens.
    {
        let state = state.clone();
        let service = props.service.clone();
        use_effect_with(props.open, move |open| {
            if *open {
                state.set(LeaderboardState::Loading);
                spawn_local(async move {
                    match service.fetch_leaderboard().await {
                        Ok(entries) => state.set(LeaderboardState::Loaded(rank_entries(entries))),
                        Err(e) => state.set(LeaderboardState::Failed(e.to_string())),
                    }
                });
            }
        });
    }

    let body = match &*state {
        LeaderboardState::Loading => html! {
            <p class="leaderboard-loading">{ "Loading leaderboard..." }</p>
        },
        LeaderboardState::Failed(e) => html! { <p class="form-error">{ e }</p> },
        LeaderboardState::Loaded(ranked) if ranked.is_empty() => html! {
            <p class="leaderboard-empty">{ "No pixels sold yet." }</p>
        },
        LeaderboardState::Loaded(ranked) => html! {
            <div class="leaderboard-list">
                { for ranked.iter().map(|RankedEntry { rank, entry }| html! {
                    <div class={classes!("leaderboard-item", (*rank == 1).then_some("leader"))}>
                        <span class="leaderboard-rank">{ *rank }</span>
                        <span class="leaderboard-name">
                            if let Some(url) = &entry.url {
                                <a href={url.clone()} target="_blank" rel="noopener noreferrer">
                                    { &entry.nickname }
                                </a>
                            } else {
                                { &entry.nickname }
                            }
                        </span>
                        <span class="leaderboard-pixels">{ format!("{} pixels", entry.total_pixels) }</span>
                        <span class="leaderboard-spent">{ format!("{} sats", entry.total_spent) }</span>
                    </div>
                })}
            </div>
        },
    };

    html! {
        <Modal open={props.open} title="Leaderboard" onclose={props.onclose.clone()}>
            { body }
        </Modal>
    }
}
