//! Purchase dialog: contact info, invoice, confirmation and artwork upload.

use std::cell::RefCell;
use std::rc::Rc;

use gloo::file::callbacks::FileReader;
use pixel_core::{PurchaseStatus, PurchaseWorkflow, SharedGridStore, refresh_pixels};
use pixel_core::service::PixelService;
use tracing::warn;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlTextAreaElement};
use yew::prelude::*;

use crate::canvas_surface::render_artwork;
use crate::components::Modal;
use crate::hooks::use_localstorage;
use crate::network::AppService;

const NICKNAME_KEY: &str = "$pixel-grid$/purchase/nickname";
const URL_KEY: &str = "$pixel-grid$/purchase/url";

#[derive(Properties)]
pub struct PurchasePanelProps {
    pub store: SharedGridStore,
    pub version: u64,
    pub service: AppService,
    pub open: bool,
    pub onclose: Callback<()>,
}

impl PartialEq for PurchasePanelProps {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.store, &other.store)
            && self.version == other.version
            && self.service == other.service
            && self.open == other.open
            && self.onclose == other.onclose
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SaveState {
    Idle,
    Saving,
    Saved(usize),
    Failed(String),
}

#[function_component(PurchasePanel)]
pub fn purchase_panel(props: &PurchasePanelProps) -> Html {
    let workflow = use_mut_ref(PurchaseWorkflow::new);
    let update = use_force_update();
    let nickname = use_localstorage(NICKNAME_KEY, String::new);
    let url = use_localstorage(URL_KEY, String::new);
    let form_error = use_state(|| None::<String>);
    let content = use_state(String::new);
    let save_state = use_state(|| SaveState::Idle);
    let file_reader: Rc<RefCell<Option<FileReader>>> = use_mut_ref(|| None);

    let on_nickname = {
        let nickname = nickname.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            nickname.set(input.value());
        })
    };

    let on_url = {
        let url = url.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            url.set(input.value());
        })
    };

    let on_request_invoice = {
        let workflow = workflow.clone();
        let store = props.store.clone();
        let service = props.service.clone();
        let nickname = nickname.clone();
        let url = url.clone();
        let form_error = form_error.clone();
        let update = update.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let request = {
                let mut flow = workflow.borrow_mut();
                flow.set_nickname((*nickname).clone());
                flow.set_url((*url).clone());
                flow.begin_invoice_request(&store.borrow())
            };
            let request = match request {
                Ok(request) => request,
                Err(e) => {
                    form_error.set(Some(e.to_string()));
                    return;
                }
            };
            form_error.set(None);
            update.force_update();

            let workflow = workflow.clone();
            let service = service.clone();
            let update = update.clone();
            spawn_local(async move {
                let result = service.request_invoice(&request).await;
                // A failure is kept in the workflow status.
                let _ = workflow.borrow_mut().finish_invoice_request(result);
                update.force_update();
            });
        })
    };

    let on_confirm = {
        let workflow = workflow.clone();
        let store = props.store.clone();
        let service = props.service.clone();
        let update = update.clone();
        Callback::from(move |_: MouseEvent| {
            let invoice = match workflow.borrow_mut().begin_confirmation() {
                Ok(invoice) => invoice,
                Err(e) => {
                    warn!("Cannot confirm payment: {e}");
                    return;
                }
            };
            update.force_update();

            let workflow = workflow.clone();
            let store = store.clone();
            let service = service.clone();
            let update = update.clone();
            spawn_local(async move {
                let result = service.confirm_payment(&invoice).await;
                let confirmed = workflow
                    .borrow_mut()
                    .finish_confirmation(result, &mut store.borrow_mut())
                    .is_ok();
                update.force_update();
                if confirmed {
                    if let Err(e) = refresh_pixels(&store, &service).await {
                        warn!("Refresh after purchase failed: {e}");
                    }
                }
            });
        })
    };

    let on_retry = {
        let workflow = workflow.clone();
        let update = update.clone();
        Callback::from(move |_: MouseEvent| {
            if workflow.borrow_mut().retry().is_ok() {
                update.force_update();
            }
        })
    };

    let on_content_text = {
        let content = content.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlTextAreaElement = e.target_unchecked_into();
            content.set(input.value());
        })
    };

    let on_file = {
        let workflow = workflow.clone();
        let content = content.clone();
        let save_state = save_state.clone();
        let file_reader = file_reader.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            let Some(block) = workflow.borrow().artwork_size() else {
                return;
            };
            let file = gloo::file::File::from(file);
            let content = content.clone();
            let save_state = save_state.clone();
            let reader = gloo::file::callbacks::read_as_data_url(&file, move |result| {
                let data_url = match result {
                    Ok(data_url) => data_url,
                    Err(e) => {
                        warn!("Failed to read image: {e}");
                        return;
                    }
                };
                spawn_local(async move {
                    match render_artwork(&data_url, block).await {
                        Ok(png) => {
                            save_state.set(SaveState::Idle);
                            content.set(png);
                        }
                        Err(e) => {
                            warn!("Failed to fit image: {e:?}");
                            save_state.set(SaveState::Failed("Could not read that image".into()));
                        }
                    }
                });
            });
            *file_reader.borrow_mut() = Some(reader);
        })
    };

    let on_save_content = {
        let workflow = workflow.clone();
        let store = props.store.clone();
        let service = props.service.clone();
        let content = content.clone();
        let save_state = save_state.clone();
        Callback::from(move |_: MouseEvent| {
            if content.trim().is_empty() {
                return;
            }
            let flow = workflow.borrow().clone();
            let store = store.clone();
            let service = service.clone();
            let content = (*content).clone();
            let save_state = save_state.clone();
            save_state.set(SaveState::Saving);
            spawn_local(async move {
                match flow.save_content(&service, &store, &content).await {
                    Ok(saved) => save_state.set(SaveState::Saved(saved)),
                    Err(e) => save_state.set(SaveState::Failed(e.to_string())),
                }
            });
        })
    };

    let on_close = {
        let workflow = workflow.clone();
        let onclose = props.onclose.clone();
        let content = content.clone();
        let save_state = save_state.clone();
        Callback::from(move |()| {
            let mut flow = workflow.borrow_mut();
            if matches!(flow.status(), PurchaseStatus::Success | PurchaseStatus::Error { .. }) {
                flow.reset();
                content.set(String::new());
                save_state.set(SaveState::Idle);
            }
            onclose.emit(());
        })
    };

    let (selected, price) = {
        let store = props.store.borrow();
        (store.selected().len(), store.selection_price_sats())
    };

    let flow = workflow.borrow();
    let body = match flow.status() {
        PurchaseStatus::CollectingInfo => html! {
            <form class="purchase-form" onsubmit={on_request_invoice}>
                <p class="purchase-summary">
                    { format!("{selected} pixels for {price} sats") }
                </p>
                <label>
                    { "Nickname" }
                    <input
                        type="text"
                        value={(*nickname).clone()}
                        oninput={on_nickname}
                        placeholder="Satoshi"
                        required=true
                    />
                </label>
                <label>
                    { "Website (optional)" }
                    <input
                        type="url"
                        value={(*url).clone()}
                        oninput={on_url}
                        placeholder="https://"
                    />
                </label>
                if let Some(error) = &*form_error {
                    <p class="form-error">{ error }</p>
                }
                <button
                    type="submit"
                    class="buy-btn"
                    disabled={selected == 0 || nickname.trim().is_empty()}
                >
                    { "Generate Lightning Invoice" }
                </button>
            </form>
        },
        PurchaseStatus::RequestingInvoice => html! {
            <p class="purchase-progress">{ "Generating invoice..." }</p>
        },
        PurchaseStatus::AwaitingConfirmation => html! {
            <div class="purchase-invoice">
                <p>{ "Pay this Lightning invoice, then confirm below." }</p>
                <textarea
                    class="invoice-text"
                    readonly=true
                    value={flow.invoice().map(|i| i.as_str().to_string()).unwrap_or_default()}
                />
                <button class="buy-btn" onclick={on_confirm}>{ "I've Paid" }</button>
            </div>
        },
        PurchaseStatus::Confirming => html! {
            <p class="purchase-progress">{ "Confirming payment..." }</p>
        },
        PurchaseStatus::Success => html! {
            <div class="purchase-success">
                <p>{ format!("You now own {} pixels.", flow.purchased_cells().len()) }</p>
                if let Some(block) = flow.artwork_size() {
                    <p class="artwork-hint">
                        { format!(
                            "Uploads are fitted to your {} × {} block, keeping their aspect ratio.",
                            block.width, block.height,
                        ) }
                    </p>
                }
                if content.starts_with("data:image/") {
                    <img class="artwork-preview" src={(*content).clone()} alt="Artwork preview" />
                }
                <label>
                    { "Upload an image" }
                    <input type="file" accept="image/*" onchange={on_file} />
                </label>
                <label>
                    { "...or paste an image URL" }
                    <textarea value={(*content).clone()} oninput={on_content_text} />
                </label>
                <button
                    class="buy-btn"
                    onclick={on_save_content}
                    disabled={*save_state == SaveState::Saving || content.trim().is_empty()}
                >
                    { "Save Artwork" }
                </button>
                { match &*save_state {
                    SaveState::Idle => html! {},
                    SaveState::Saving => html! { <p class="purchase-progress">{ "Saving..." }</p> },
                    SaveState::Saved(n) => html! { <p class="form-success">{ format!("Saved to {n} pixels") }</p> },
                    SaveState::Failed(e) => html! { <p class="form-error">{ e }</p> },
                }}
            </div>
        },
        PurchaseStatus::Error { message, .. } => html! {
            <div class="purchase-error">
                <p class="form-error">{ message }</p>
                <button class="buy-btn" onclick={on_retry}>{ "Try Again" }</button>
            </div>
        },
    };

    html! {
        <Modal open={props.open} title="Purchase Pixels" onclose={on_close} class="purchase-modal">
            { body }
        </Modal>
    }
}
