//! Common modal component.

use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ModalProps {
    pub open: bool,
    pub children: Children,
    #[prop_or_default]
    pub title: Option<AttrValue>,
    pub onclose: Callback<()>,
    /// Additional CSS classes for the modal container.
    #[prop_or_default]
    pub class: Classes,
}

/// Overlay dialog; clicking the overlay or × closes it.
#[function_component(Modal)]
pub fn modal(props: &ModalProps) -> Html {
    if !props.open {
        return html! {};
    }

    let on_overlay_click = {
        let onclose = props.onclose.clone();
        Callback::from(move |_: MouseEvent| onclose.emit(()))
    };

    let on_modal_click = Callback::from(|e: MouseEvent| {
        e.stop_propagation();
    });

    let on_close_button_click = {
        let onclose = props.onclose.clone();
        Callback::from(move |_: MouseEvent| onclose.emit(()))
    };

    html! {
        <div class="modal-overlay" onclick={on_overlay_click}>
            <div class={classes!("modal", props.class.clone())} onclick={on_modal_click}>
                <div class="modal-header">
                    if let Some(title) = &props.title {
                        <h2>{ title.clone() }</h2>
                    }
                    <button class="modal-close-btn" onclick={on_close_button_click}>
                        { "×" }
                    </button>
                </div>
                <div class="modal-body">
                    { props.children.clone() }
                </div>
            </div>
        </div>
    }
}
