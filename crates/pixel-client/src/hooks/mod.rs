mod use_grid_store;
mod use_localstorage;

pub use use_grid_store::*;
pub use use_localstorage::use_localstorage;
