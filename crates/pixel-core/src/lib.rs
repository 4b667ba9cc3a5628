//! Pixel-Grid Core Library
//!
//! State, coordinate math, rendering and purchase logic for a 10,000 × 10,000
//! grid of purchasable cells. Everything here is platform independent; the
//! browser client supplies a canvas [`renderer::Surface`] and an HTTP
//! [`service::PixelService`].

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]

pub mod api;
pub mod artwork;
pub mod cell;
pub mod config;
pub mod interaction;
pub mod memory_service;
pub mod purchase;
pub mod ranking;
pub mod renderer;
pub mod service;
pub mod store;
pub mod transform;

#[cfg(test)]
mod test_utils;

pub use api::{Backend, Endpoint, Method};
pub use artwork::{ArtworkLayout, fit_artwork};
pub use cell::{CellCoord, CellId, Color, Dimensions, GRID_DIM, OwnedPixel, SelectionRect};
pub use config::{ConfigError, GridConfig};
pub use interaction::{InteractionController, InteractionOutcome, PointerButton, PointerEvent};
pub use memory_service::MemoryPixelService;
pub use purchase::{PurchaseError, PurchaseStatus, PurchaseStep, PurchaseWorkflow};
pub use ranking::{LeaderboardEntry, RankedEntry, rank_entries};
pub use renderer::{FrameStats, ImageCache, Renderer, ScreenRect, Surface};
pub use service::{CellDetails, Invoice, PixelService, PurchaseRequest, ServiceError};
pub use store::{GridChange, GridMode, GridStore, LoadState, SharedGridStore, refresh_pixels};
pub use transform::{GridWindow, ViewTransform, grid_to_screen, screen_to_grid};
