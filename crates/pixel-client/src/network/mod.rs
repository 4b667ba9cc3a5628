mod http;

use std::rc::Rc;

use pixel_core::api::{BACKEND_PARAM, Backend};
use pixel_core::service::{CellDetails, Invoice, PixelService, PurchaseRequest, ServiceError};
use pixel_core::{CellCoord, LeaderboardEntry, MemoryPixelService, OwnedPixel};
use tracing::info;

pub use http::HttpPixelService;

/// Service handle shared by components.
#[derive(Debug, Clone)]
pub enum AppService {
    Http(Rc<HttpPixelService>),
    Memory(Rc<MemoryPixelService>),
}

impl PartialEq for AppService {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Http(a), Self::Http(b)) => Rc::ptr_eq(a, b),
            (Self::Memory(a), Self::Memory(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Backend named by a `location.search` string such as `?backend=memory`.
pub fn backend_from_search(search: &str) -> Backend {
    let value = web_sys::UrlSearchParams::new_with_str(search)
        .ok()
        .and_then(|params| params.get(BACKEND_PARAM));
    Backend::from_param(value.as_deref())
}

impl AppService {
    /// HTTP against the page origin, or the in-memory service when the page
    /// was opened with `?backend=memory`.
    pub fn from_location() -> Self {
        let Some(location) = web_sys::window().map(|w| w.location()) else {
            return Self::Memory(Rc::new(MemoryPixelService::demo()));
        };

        let search = location.search().unwrap_or_default();
        match backend_from_search(&search) {
            Backend::Memory => {
                info!("Using in-memory pixel service");
                Self::Memory(Rc::new(MemoryPixelService::demo()))
            }
            Backend::Http => {
                let origin = location.origin().unwrap_or_default();
                info!("Using pixel service at {origin}");
                Self::Http(Rc::new(HttpPixelService::new(origin)))
            }
        }
    }
}

impl PixelService for AppService {
    async fn fetch_owned_pixels(&self) -> Result<Vec<OwnedPixel>, ServiceError> {
        match self {
            Self::Http(s) => s.fetch_owned_pixels().await,
            Self::Memory(s) => s.fetch_owned_pixels().await,
        }
    }

    async fn request_invoice(&self, request: &PurchaseRequest) -> Result<Invoice, ServiceError> {
        match self {
            Self::Http(s) => s.request_invoice(request).await,
            Self::Memory(s) => s.request_invoice(request).await,
        }
    }

    async fn confirm_payment(&self, invoice: &Invoice) -> Result<(), ServiceError> {
        match self {
            Self::Http(s) => s.confirm_payment(invoice).await,
            Self::Memory(s) => s.confirm_payment(invoice).await,
        }
    }

    async fn save_content(&self, cell_ids: &[String], content: &str) -> Result<(), ServiceError> {
        match self {
            Self::Http(s) => s.save_content(cell_ids, content).await,
            Self::Memory(s) => s.save_content(cell_ids, content).await,
        }
    }

    async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        match self {
            Self::Http(s) => s.fetch_leaderboard().await,
            Self::Memory(s) => s.fetch_leaderboard().await,
        }
    }

    async fn fetch_cell_details(&self, cell: CellCoord) -> Result<CellDetails, ServiceError> {
        match self {
            Self::Http(s) => s.fetch_cell_details(cell).await,
            Self::Memory(s) => s.fetch_cell_details(cell).await,
        }
    }
}
