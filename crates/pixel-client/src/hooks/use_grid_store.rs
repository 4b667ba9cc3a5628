//! Hooks that own the grid store and the pixel service for the app.

use pixel_core::{GridConfig, GridStore, SharedGridStore, refresh_pixels};
use yew::prelude::*;

use crate::network::AppService;

/// Store handle plus the version it had when this render started.
///
/// The component re-renders whenever the store notifies a change, so passing
/// `version` down as a prop lets children re-render too.
#[derive(Clone)]
pub struct GridStoreHandle {
    pub store: SharedGridStore,
    pub version: u64,
}

#[hook]
pub fn use_grid_store(config: GridConfig) -> GridStoreHandle {
    let store = use_mut_ref(move || GridStore::new(config));
    let update = use_force_update();

    {
        let store = store.clone();
        use_effect_with((), move |_| {
            let id = store
                .borrow_mut()
                .subscribe(move |_| update.force_update());
            move || {
                store.borrow_mut().unsubscribe(id);
            }
        });
    }

    let version = store.borrow().version();
    GridStoreHandle { store, version }
}

#[hook]
pub fn use_pixel_service() -> AppService {
    let service = use_state(AppService::from_location);
    (*service).clone()
}

/// Loads owned pixels once on mount.
#[hook]
pub fn use_initial_refresh(store: SharedGridStore, service: AppService) {
    use_effect_with((), move |_| {
        wasm_bindgen_futures::spawn_local(async move {
            // Failures are recorded on the store as a load error.
            let _ = refresh_pixels(&store, &service).await;
        });
    });
}
