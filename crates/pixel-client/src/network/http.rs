//! JSON-over-HTTP client for the pixel service.

use gloo::net::http::{Request, Response};
use pixel_core::api::{ConfirmBody, ContentBody, Endpoint, Method, check_status};
use pixel_core::service::{
    CellDetails, Invoice, InvoiceResponse, PixelService, PurchaseRequest, ServiceError,
    StatusResponse,
};
use pixel_core::{CellCoord, LeaderboardEntry, OwnedPixel};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Pixel service reached at `{base_url}/api/...`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpPixelService {
    base_url: String,
}

impl HttpPixelService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, ServiceError> {
        debug_assert_eq!(endpoint.method(), Method::Get);
        let url = endpoint.url(&self.base_url);
        debug!("GET {url}");
        let response = Request::get(&url).send().await.map_err(network_error)?;
        decode(response).await
    }

    async fn post<B, T>(&self, endpoint: Endpoint, body: &B) -> Result<T, ServiceError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        debug_assert_eq!(endpoint.method(), Method::Post);
        let url = endpoint.url(&self.base_url);
        debug!("POST {url}");
        let response = Request::post(&url)
            .json(body)
            .map_err(network_error)?
            .send()
            .await
            .map_err(network_error)?;
        decode(response).await
    }
}

#[allow(clippy::needless_pass_by_value)]
fn network_error(e: gloo::net::Error) -> ServiceError {
    ServiceError::Network(e.to_string())
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ServiceError> {
    let status = response.status();
    debug!("response status: {status}");

    if !response.ok() {
        let text = response.text().await.unwrap_or_default();
        check_status(status, &text)?;
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ServiceError::Decode(e.to_string()))
}

impl PixelService for HttpPixelService {
    async fn fetch_owned_pixels(&self) -> Result<Vec<OwnedPixel>, ServiceError> {
        self.get(Endpoint::OwnedPixels).await
    }

    async fn request_invoice(&self, request: &PurchaseRequest) -> Result<Invoice, ServiceError> {
        self.post::<_, InvoiceResponse>(Endpoint::Purchase, request)
            .await?
            .into_result()
    }

    async fn confirm_payment(&self, invoice: &Invoice) -> Result<(), ServiceError> {
        let body = ConfirmBody {
            invoice: invoice.as_str(),
        };
        self.post::<_, StatusResponse>(Endpoint::ConfirmPayment, &body)
            .await?
            .into_result("Payment not confirmed")
    }

    async fn save_content(&self, cell_ids: &[String], content: &str) -> Result<(), ServiceError> {
        let body = ContentBody {
            pixel_ids: cell_ids,
            content,
        };
        self.post::<_, StatusResponse>(Endpoint::PixelContent, &body)
            .await?
            .into_result("Failed to save pixel content")
    }

    async fn fetch_leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ServiceError> {
        self.get(Endpoint::Leaderboard).await
    }

    async fn fetch_cell_details(&self, cell: CellCoord) -> Result<CellDetails, ServiceError> {
        self.get(Endpoint::CellDetails(cell)).await
    }
}
