//! In-process [`PixelService`] used for local development and tests.
//!
//! Purchases become owned pixels on confirmation and the leaderboard is
//! updated alongside. Any operation can be told to fail its next call.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::cell::{CellCoord, CellId, Color, OwnedPixel};
use crate::ranking::LeaderboardEntry;
use crate::service::{
    CellDetails, Invoice, OwnerSummary, PixelService, PurchaseRequest, ServiceError,
};

/// Price of a single cell in satoshis.
pub const SATS_PER_CELL: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceOp {
    FetchPixels,
    RequestInvoice,
    ConfirmPayment,
    SaveContent,
    FetchLeaderboard,
    FetchCellDetails,
}

#[derive(Debug, Default)]
pub struct MemoryPixelService {
    pixels: RwLock<HashMap<CellCoord, OwnedPixel>>,
    pending: RwLock<HashMap<String, PurchaseRequest>>,
    leaderboard: RwLock<Vec<LeaderboardEntry>>,
    next_invoice: RwLock<u64>,
    failures: RwLock<HashMap<ServiceOp, u32>>,
    calls: RwLock<HashMap<ServiceOp, u32>>,
}

impl MemoryPixelService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeded with a handful of leaderboard entries and no owned pixels.
    pub fn demo() -> Self {
        let service = Self::new();
        *service.leaderboard.write() = [
            ("satoshi", "Satoshi", 10_000, Some("https://bitcoin.org")),
            ("hal", "Hal", 8_500, None),
            ("adam", "Adam", 7_200, Some("https://hashcash.org")),
            ("nick", "Nick", 6_100, None),
            ("vitalik", "Vitalik", 5_000, None),
        ]
        .into_iter()
        .map(|(id, nickname, total, url)| LeaderboardEntry {
            id: id.to_string(),
            nickname: nickname.to_string(),
            total_pixels: total,
            total_spent: total * SATS_PER_CELL,
            url: url.map(str::to_string),
        })
        .collect();
        service
    }

    pub fn with_pixels(pixels: impl IntoIterator<Item = OwnedPixel>) -> Self {
        let service = Self::new();
        service.seed_pixels(pixels);
        service
    }

    pub fn seed_pixels(&self, pixels: impl IntoIterator<Item = OwnedPixel>) {
        let mut map = self.pixels.write();
        for pixel in pixels {
            map.insert(pixel.coord(), pixel);
        }
    }

    /// Makes the next call of `op` fail with a network error.
    pub fn fail_next(&self, op: ServiceOp) {
        *self.failures.write().entry(op).or_default() += 1;
    }

    pub fn call_count(&self, op: ServiceOp) -> u32 {
        self.calls.read().get(&op).copied().unwrap_or(0)
    }

    pub fn pixel_count(&self) -> usize {
        self.pixels.read().len()
    }

    fn enter(&self, op: ServiceOp) -> Result<(), ServiceError> {
        *self.calls.write().entry(op).or_default() += 1;
        let mut failures = self.failures.write();
        match failures.get_mut(&op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                debug!(?op, "injected failure");
                Err(ServiceError::Network(format!("{op:?} unavailable")))
            }
            _ => Ok(()),
        }
    }

    fn credit(&self, request: &PurchaseRequest, cells: u64) {
        let mut board = self.leaderboard.write();
        let id = request.nickname.to_lowercase();
        if let Some(entry) = board.iter_mut().find(|e| e.id == id) {
            entry.total_pixels += cells;
            entry.total_spent += cells * SATS_PER_CELL;
            if request.url.is_some() {
                entry.url.clone_from(&request.url);
            }
        } else {
            board.push(LeaderboardEntry {
                id,
                nickname: request.nickname.clone(),
                total_pixels: cells,
                total_spent: cells * SATS_PER_CELL,
                url: request.url.clone(),
            });
        }
    }
}

impl PixelService for MemoryPixelService {
    async fn fetch_owned_pixels(&self) -> Result<Vec<OwnedPixel>, ServiceError> {
        self.enter(ServiceOp::FetchPixels)?;
        Ok(self.pixels.read().values().cloned().collect())
    }

    async fn request_invoice(&self, request: &PurchaseRequest) -> Result<Invoice, ServiceError> {
        self.enter(ServiceOp::RequestInvoice)?;
        if request.pixels.is_empty() {
            return Err(ServiceError::Rejected("No pixels requested".to_string()));
        }
        Color::from_hex(&request.color).map_err(|e| ServiceError::Rejected(e.to_string()))?;
        {
            let owned = self.pixels.read();
            if let Some(taken) = request.pixels.iter().find(|&c| owned.contains_key(c)) {
                return Err(ServiceError::Rejected(format!("{} is already owned", taken.id())));
            }
        }

        let serial = {
            let mut next = self.next_invoice.write();
            *next += 1;
            *next
        };
        let sats = request.pixels.len() as u64 * SATS_PER_CELL;
        let invoice = format!("lnbc{sats}n1p{serial:08x}");
        self.pending.write().insert(invoice.clone(), request.clone());
        Ok(Invoice(invoice))
    }

    async fn confirm_payment(&self, invoice: &Invoice) -> Result<(), ServiceError> {
        self.enter(ServiceOp::ConfirmPayment)?;
        let request = self
            .pending
            .write()
            .remove(invoice.as_str())
            .ok_or_else(|| ServiceError::Rejected("Unknown invoice".to_string()))?;

        {
            let mut owned = self.pixels.write();
            if let Some(taken) = request.pixels.iter().find(|&c| owned.contains_key(c)) {
                debug!(invoice = invoice.as_str(), "confirmation lost a race for a cell");
                return Err(ServiceError::Rejected(format!("{} is already owned", taken.id())));
            }
            for &cell in &request.pixels {
                owned.insert(
                    cell,
                    OwnedPixel::new(cell, request.color.clone(), Some(request.nickname.clone())),
                );
            }
        }
        self.credit(&request, request.pixels.len() as u64);
        Ok(())
    }

    async fn save_content(&self, cell_ids: &[String], content: &str) -> Result<(), ServiceError> {
        self.enter(ServiceOp::SaveContent)?;
        let cells = cell_ids
            .iter()
            .map(|raw| raw.parse::<CellId>().map(CellId::coord))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ServiceError::Rejected(e.to_string()))?;

        let mut owned = self.pixels.write();
        for cell in cells {
            let pixel = owned.entry(cell).or_insert_with(|| {
                OwnedPixel::new(cell, Color::BITCOIN.to_hex(), Some("current-user".to_string()))
            });
            pixel.content = Some(content.to_string());
            pixel.updated_at = chrono::Utc::now();
        }
        Ok(())
    }

    async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        self.enter(ServiceOp::FetchLeaderboard)?;
        Ok(self.leaderboard.read().clone())
    }

    async fn fetch_cell_details(&self, cell: CellCoord) -> Result<CellDetails, ServiceError> {
        self.enter(ServiceOp::FetchCellDetails)?;
        let owned = self.pixels.read();
        let Some(pixel) = owned.get(&cell) else {
            return Ok(CellDetails {
                message: Some("Pixel not owned".to_string()),
                ..CellDetails::default()
            });
        };

        let owner = pixel.owner_id.as_ref().map(|owner_id| {
            let total = owned
                .values()
                .filter(|p| p.owner_id.as_ref() == Some(owner_id))
                .count() as u64;
            let url = self
                .leaderboard
                .read()
                .iter()
                .find(|e| &e.nickname == owner_id)
                .and_then(|e| e.url.clone());
            OwnerSummary {
                nickname: owner_id.clone(),
                url,
                total_pixels: total,
            }
        });
        Ok(CellDetails {
            pixel: Some(pixel.clone()),
            owner,
            message: None,
        })
    }
}
