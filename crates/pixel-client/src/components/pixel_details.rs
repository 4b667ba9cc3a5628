//! Owner details for a clicked cell.

use pixel_core::CellCoord;
use pixel_core::service::{CellDetails, PixelService};
use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;
use yew_icons::{Icon, IconData};

use crate::components::Modal;
use crate::network::AppService;

#[derive(Properties, PartialEq)]
pub struct PixelDetailsProps {
    pub service: AppService,
    /// Cell to show; `None` keeps the dialog closed.
    pub cell: Option<CellCoord>,
    pub onclose: Callback<()>,
}

#[derive(Debug, Clone, PartialEq)]
enum DetailsState {
    Loading,
    Loaded(CellDetails),
    Failed(String),
}

#[function_component(PixelDetails)]
pub fn pixel_details(props: &PixelDetailsProps) -> Html {
    let details = use_state(|| DetailsState::Loading);

    {
        let details = details.clone();
        let service = props.service.clone();
        use_effect_with(props.cell, move |cell| {
            if let Some(cell) = *cell {
                details.set(DetailsState::Loading);
                spawn_local(async move {
                    match service.fetch_cell_details(cell).await {
                        Ok(d) => details.set(DetailsState::Loaded(d)),
                        Err(e) => details.set(DetailsState::Failed(e.to_string())),
                    }
                });
            }
        });
    }

    let Some(cell) = props.cell else {
        return html! {};
    };

    let body = match &*details {
        DetailsState::Loading => html! {
            <div class="details-loading">
                <Icon data={IconData::LUCIDE_REFRESH_CW} class="spin"/>
                <p>{ "Loading pixel details..." }</p>
            </div>
        },
        DetailsState::Failed(e) => html! { <p class="form-error">{ e }</p> },
        DetailsState::Loaded(CellDetails { pixel, owner: Some(owner), .. }) => {
            let color = pixel.as_ref().map_or("#F7931A", |p| p.color.as_str());
            html! {
                <div class="details-owner">
                    <div class="details-swatch" style={format!("background-color: {color};")} />
                    <div>
                        <h3>{ &owner.nickname }</h3>
                        if let Some(url) = &owner.url {
                            <a href={url.clone()} target="_blank" rel="noopener noreferrer">
                                { url }
                                <Icon data={IconData::LUCIDE_EXTERNAL_LINK} class="link-icon"/>
                            </a>
                        }
                        <p>{ format!("Owns {} pixels", owner.total_pixels) }</p>
                    </div>
                    if let Some(content) = pixel.as_ref().and_then(|p| p.content.as_ref()) {
                        <img class="details-content" src={content.clone()} alt="Pixel artwork" />
                    }
                </div>
            }
        }
        DetailsState::Loaded(CellDetails { message, .. }) => html! {
            <p class="details-empty">
                { message.clone().unwrap_or_else(|| "This pixel is available for purchase.".to_string()) }
            </p>
        },
    };

    let title = format!("Pixel Details  X: {}, Y: {}", cell.x, cell.y);
    html! {
        <Modal open=true title={title} onclose={props.onclose.clone()}>
            { body }
        </Modal>
    }
}
