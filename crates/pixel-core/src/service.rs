//! Boundary contract with the external pixel service.
//!
//! The service speaks `{ success, invoice?, message? }` style JSON; the wire
//! structs here convert those envelopes into `Result`s so callers only see
//! [`ServiceError`] on failure.

use serde::{Deserialize, Serialize};

use crate::cell::{CellCoord, OwnedPixel};
use crate::ranking::LeaderboardEntry;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Purchase submission for the currently selected cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub pixels: Vec<CellCoord>,
    pub color: String,
    pub nickname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Opaque Lightning invoice string returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Invoice(pub String);

impl Invoice {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub success: bool,
    #[serde(default)]
    pub invoice: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl InvoiceResponse {
    pub fn into_result(self) -> Result<Invoice, ServiceError> {
        match (self.success, self.invoice) {
            (true, Some(invoice)) => Ok(Invoice(invoice)),
            _ => Err(ServiceError::Rejected(
                self.message
                    .unwrap_or_else(|| "Failed to generate invoice".to_string()),
            )),
        }
    }
}

/// Envelope for calls that only report success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl StatusResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn into_result(self, fallback: &str) -> Result<(), ServiceError> {
        if self.success {
            Ok(())
        } else {
            Err(ServiceError::Rejected(
                self.message.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerSummary {
    pub nickname: String,
    #[serde(default)]
    pub url: Option<String>,
    pub total_pixels: u64,
}

/// Details shown when an owned cell is clicked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CellDetails {
    #[serde(default)]
    pub pixel: Option<OwnedPixel>,
    #[serde(default)]
    pub owner: Option<OwnerSummary>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Operations the grid core consumes from the backend.
///
/// All calls are single-shot: there is no cancellation, so a late response
/// is applied whenever it arrives.
#[allow(async_fn_in_trait)]
pub trait PixelService {
    async fn fetch_owned_pixels(&self) -> Result<Vec<OwnedPixel>, ServiceError>;

    async fn request_invoice(&self, request: &PurchaseRequest) -> Result<Invoice, ServiceError>;

    async fn confirm_payment(&self, invoice: &Invoice) -> Result<(), ServiceError>;

    async fn save_content(&self, cell_ids: &[String], content: &str) -> Result<(), ServiceError>;

    async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ServiceError>;

    async fn fetch_cell_details(&self, cell: CellCoord) -> Result<CellDetails, ServiceError>;
}
