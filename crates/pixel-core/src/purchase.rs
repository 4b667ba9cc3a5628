//! Purchase flow: customer info → invoice → payment confirmation → content.
//!
//! Each step has a synchronous `begin_*`/`finish_*` pair so a UI event loop
//! can drive it around its own async calls, and an async method that runs
//! the whole step against a [`PixelService`].

use tracing::{info, warn};

use crate::cell::{CellCoord, Dimensions};
use crate::service::{Invoice, PixelService, PurchaseRequest, ServiceError};
use crate::store::{GridStore, SharedGridStore, refresh_pixels};

/// Step that produced an error, which decides where `retry` goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseStep {
    InvoiceRequest,
    Confirmation,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PurchaseStatus {
    #[default]
    CollectingInfo,
    RequestingInvoice,
    AwaitingConfirmation,
    Confirming,
    Success,
    Error {
        step: PurchaseStep,
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    #[error("A nickname is required")]
    MissingNickname,

    #[error("No cells are selected")]
    EmptySelection,

    #[error("Cannot {action} in state {status:?}")]
    InvalidState {
        action: &'static str,
        status: PurchaseStatus,
    },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[derive(Debug, Clone, Default)]
pub struct PurchaseWorkflow {
    status: PurchaseStatus,
    nickname: String,
    url: Option<String>,
    invoice: Option<Invoice>,
    pending_cells: Vec<CellCoord>,
    purchased_cells: Vec<CellCoord>,
}

impl PurchaseWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &PurchaseStatus {
        &self.status
    }

    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn invoice(&self) -> Option<&Invoice> {
        self.invoice.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.status {
            PurchaseStatus::Error { message, .. } => Some(message),
            _ => None,
        }
    }

    pub fn purchased_cells(&self) -> &[CellCoord] {
        &self.purchased_cells
    }

    pub fn purchased_cell_ids(&self) -> Vec<String> {
        self.purchased_cells
            .iter()
            .map(|c| c.id().to_string())
            .collect()
    }

    /// Bounding box of the purchased cells, the size artwork is fitted to.
    pub fn artwork_size(&self) -> Option<Dimensions> {
        let (first, rest) = self.purchased_cells.split_first()?;
        let (min, max) = rest.iter().fold((*first, *first), |(min, max), c| {
            (
                CellCoord::new(min.x.min(c.x), min.y.min(c.y)),
                CellCoord::new(max.x.max(c.x), max.y.max(c.y)),
            )
        });
        Some(Dimensions {
            width: (max.x - min.x).unsigned_abs() + 1,
            height: (max.y - min.y).unsigned_abs() + 1,
        })
    }

    pub fn set_nickname(&mut self, nickname: impl Into<String>) {
        self.nickname = nickname.into();
    }

    /// Empty strings clear the URL.
    pub fn set_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        self.url = if url.trim().is_empty() { None } else { Some(url) };
    }

    pub fn can_request_invoice(&self) -> bool {
        self.status == PurchaseStatus::CollectingInfo && !self.nickname.trim().is_empty()
    }

    fn expect_status(
        &self,
        expected: &PurchaseStatus,
        action: &'static str,
    ) -> Result<(), PurchaseError> {
        if &self.status == expected {
            Ok(())
        } else {
            Err(PurchaseError::InvalidState {
                action,
                status: self.status.clone(),
            })
        }
    }

    fn fail(&mut self, step: PurchaseStep, context: &str, err: ServiceError) -> PurchaseError {
        warn!("{context}: {err}");
        self.status = PurchaseStatus::Error {
            step,
            message: format!("{context}: {err}"),
        };
        PurchaseError::Service(err)
    }

    // ------------------------------------------------------------------
    // Invoice
    // ------------------------------------------------------------------

    /// Validates the form and builds the request. Nothing is sent when this fails.
    pub fn begin_invoice_request(
        &mut self,
        store: &GridStore,
    ) -> Result<PurchaseRequest, PurchaseError> {
        self.expect_status(&PurchaseStatus::CollectingInfo, "request an invoice")?;
        let nickname = self.nickname.trim();
        if nickname.is_empty() {
            return Err(PurchaseError::MissingNickname);
        }
        if store.selected().is_empty() {
            return Err(PurchaseError::EmptySelection);
        }

        let request = PurchaseRequest {
            pixels: store.selected().as_slice().to_vec(),
            color: store.selected_color().to_hex(),
            nickname: nickname.to_string(),
            url: self.url.clone(),
        };
        self.pending_cells = request.pixels.clone();
        self.status = PurchaseStatus::RequestingInvoice;
        info!(cells = request.pixels.len(), "requesting invoice");
        Ok(request)
    }

    pub fn finish_invoice_request(
        &mut self,
        result: Result<Invoice, ServiceError>,
    ) -> Result<Invoice, PurchaseError> {
        self.expect_status(&PurchaseStatus::RequestingInvoice, "accept an invoice")?;
        match result {
            Ok(invoice) => {
                self.invoice = Some(invoice.clone());
                self.status = PurchaseStatus::AwaitingConfirmation;
                Ok(invoice)
            }
            Err(e) => Err(self.fail(
                PurchaseStep::InvoiceRequest,
                "Failed to generate lightning invoice",
                e,
            )),
        }
    }

    pub async fn request_invoice<S: PixelService>(
        &mut self,
        service: &S,
        store: &SharedGridStore,
    ) -> Result<Invoice, PurchaseError> {
        let request = self.begin_invoice_request(&store.borrow())?;
        let result = service.request_invoice(&request).await;
        self.finish_invoice_request(result)
    }

    // ------------------------------------------------------------------
    // Confirmation
    // ------------------------------------------------------------------

    /// The user asserts the invoice was paid; returns the invoice to confirm.
    pub fn begin_confirmation(&mut self) -> Result<Invoice, PurchaseError> {
        self.expect_status(&PurchaseStatus::AwaitingConfirmation, "confirm payment")?;
        let invoice = self.invoice.clone().ok_or(PurchaseError::InvalidState {
            action: "confirm payment without an invoice",
            status: self.status.clone(),
        })?;
        self.status = PurchaseStatus::Confirming;
        Ok(invoice)
    }

    /// On success the purchased cells are recorded and the selection cleared.
    pub fn finish_confirmation(
        &mut self,
        result: Result<(), ServiceError>,
        store: &mut GridStore,
    ) -> Result<(), PurchaseError> {
        self.expect_status(&PurchaseStatus::Confirming, "finish confirmation")?;
        match result {
            Ok(()) => {
                self.purchased_cells = std::mem::take(&mut self.pending_cells);
                self.status = PurchaseStatus::Success;
                store.clear_selection();
                info!(cells = self.purchased_cells.len(), "purchase confirmed");
                Ok(())
            }
            Err(e) => Err(self.fail(
                PurchaseStep::Confirmation,
                "Failed to confirm payment",
                e,
            )),
        }
    }

    /// Confirms payment and, on success, refreshes the owned pixels.
    ///
    /// A failed refresh is logged and recorded on the store; the purchase
    /// itself stays successful.
    pub async fn confirm_payment<S: PixelService>(
        &mut self,
        service: &S,
        store: &SharedGridStore,
    ) -> Result<(), PurchaseError> {
        let invoice = self.begin_confirmation()?;
        let result = service.confirm_payment(&invoice).await;
        self.finish_confirmation(result, &mut store.borrow_mut())?;

        if let Err(e) = refresh_pixels(store, service).await {
            warn!("Refresh after purchase failed: {e}");
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Retry / reset / content
    // ------------------------------------------------------------------

    /// Leaves the error state: an invoice failure returns to the form, a
    /// confirmation failure returns to awaiting confirmation with the same
    /// invoice.
    pub fn retry(&mut self) -> Result<(), PurchaseError> {
        let PurchaseStatus::Error { step, .. } = &self.status else {
            return Err(PurchaseError::InvalidState {
                action: "retry",
                status: self.status.clone(),
            });
        };
        self.status = match step {
            PurchaseStep::InvoiceRequest => {
                self.pending_cells.clear();
                PurchaseStatus::CollectingInfo
            }
            PurchaseStep::Confirmation => PurchaseStatus::AwaitingConfirmation,
        };
        Ok(())
    }

    /// Starts over, keeping nickname and URL.
    pub fn reset(&mut self) {
        self.status = PurchaseStatus::CollectingInfo;
        self.invoice = None;
        self.pending_cells.clear();
        self.purchased_cells.clear();
    }

    /// Saves custom artwork onto the purchased cells.
    pub async fn save_content<S: PixelService>(
        &self,
        service: &S,
        store: &SharedGridStore,
        content: &str,
    ) -> Result<usize, PurchaseError> {
        self.expect_status(&PurchaseStatus::Success, "save content")?;
        let ids = self.purchased_cell_ids();
        service.save_content(&ids, content).await?;
        Ok(store.borrow_mut().save_pixel_content(&ids, content))
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::memory_service::{MemoryPixelService, ServiceOp};
    use crate::store::GridMode;

    fn setup() -> (SharedGridStore, MemoryPixelService) {
        let store = GridStore::default().into_shared();
        {
            let mut s = store.borrow_mut();
            s.set_mode(GridMode::Select);
            s.start_selection(CellCoord::new(1, 1));
            s.update_selection(CellCoord::new(2, 1));
            s.complete_selection();
        }
        (store, MemoryPixelService::new())
    }

    #[test]
    fn test_empty_nickname_rejected_before_service_call() {
        let (store, service) = setup();
        let mut flow = PurchaseWorkflow::new();
        flow.set_nickname("   ");

        let err = block_on(flow.request_invoice(&service, &store)).unwrap_err();
        assert!(matches!(err, PurchaseError::MissingNickname));
        assert_eq!(service.call_count(ServiceOp::RequestInvoice), 0);
        assert_eq!(flow.status(), &PurchaseStatus::CollectingInfo);
    }

    #[test]
    fn test_empty_selection_rejected() {
        let store = GridStore::default().into_shared();
        let service = MemoryPixelService::new();
        let mut flow = PurchaseWorkflow::new();
        flow.set_nickname("Satoshi");
        let err = block_on(flow.request_invoice(&service, &store)).unwrap_err();
        assert!(matches!(err, PurchaseError::EmptySelection));
        assert_eq!(service.call_count(ServiceOp::RequestInvoice), 0);
    }

    #[test]
    fn test_full_purchase_flow() {
        let (store, service) = setup();
        let mut flow = PurchaseWorkflow::new();
        flow.set_nickname("Satoshi");
        flow.set_url("https://bitcoin.org");

        let invoice = block_on(flow.request_invoice(&service, &store)).unwrap();
        assert!(invoice.as_str().starts_with("lnbc"));
        assert_eq!(flow.status(), &PurchaseStatus::AwaitingConfirmation);

        block_on(flow.confirm_payment(&service, &store)).unwrap();
        assert_eq!(flow.status(), &PurchaseStatus::Success);
        assert_eq!(flow.purchased_cell_ids(), ["pixel-1-1", "pixel-2-1"]);
        assert_eq!(flow.artwork_size(), Some(Dimensions { width: 2, height: 1 }));

        let store_ref = store.borrow();
        assert!(store_ref.selected().is_empty());
        assert!(store_ref.is_pixel_owned(CellCoord::new(1, 1)));
        assert!(store_ref.is_pixel_owned(CellCoord::new(2, 1)));
        assert_eq!(service.call_count(ServiceOp::FetchPixels), 1);
    }

    #[test]
    fn test_failed_confirmation_retries_same_invoice() {
        let (store, service) = setup();
        let mut flow = PurchaseWorkflow::new();
        flow.set_nickname("Hal");
        let invoice = block_on(flow.request_invoice(&service, &store)).unwrap();

        service.fail_next(ServiceOp::ConfirmPayment);
        let err = block_on(flow.confirm_payment(&service, &store)).unwrap_err();
        assert!(matches!(err, PurchaseError::Service(_)));
        assert!(matches!(
            flow.status(),
            PurchaseStatus::Error { step: PurchaseStep::Confirmation, .. }
        ));
        assert!(flow.error_message().is_some());
        assert_eq!(store.borrow().selected().len(), 2, "selection kept on failure");

        flow.retry().unwrap();
        assert_eq!(flow.status(), &PurchaseStatus::AwaitingConfirmation);
        assert_eq!(flow.invoice(), Some(&invoice));

        block_on(flow.confirm_payment(&service, &store)).unwrap();
        assert_eq!(flow.status(), &PurchaseStatus::Success);
        assert_eq!(service.call_count(ServiceOp::RequestInvoice), 1);
        assert_eq!(service.call_count(ServiceOp::ConfirmPayment), 2);
    }

    #[test]
    fn test_failed_invoice_returns_to_form() {
        let (store, service) = setup();
        let mut flow = PurchaseWorkflow::new();
        flow.set_nickname("Vitalik");

        service.fail_next(ServiceOp::RequestInvoice);
        assert!(block_on(flow.request_invoice(&service, &store)).is_err());
        assert!(matches!(
            flow.status(),
            PurchaseStatus::Error { step: PurchaseStep::InvoiceRequest, .. }
        ));

        flow.retry().unwrap();
        assert_eq!(flow.status(), &PurchaseStatus::CollectingInfo);
        assert!(block_on(flow.request_invoice(&service, &store)).is_ok());
    }

    #[test]
    fn test_confirm_requires_invoice() {
        let mut flow = PurchaseWorkflow::new();
        assert!(matches!(
            flow.begin_confirmation(),
            Err(PurchaseError::InvalidState { .. })
        ));
        assert!(flow.retry().is_err());
    }

    #[test]
    fn test_save_content_after_success() {
        let (store, service) = setup();
        let mut flow = PurchaseWorkflow::new();
        flow.set_nickname("Satoshi");
        block_on(flow.request_invoice(&service, &store)).unwrap();
        block_on(flow.confirm_payment(&service, &store)).unwrap();

        let saved =
            block_on(flow.save_content(&service, &store, "data:image/png;base64,AA")).unwrap();
        assert_eq!(saved, 2);
        assert_eq!(
            store.borrow().pixel_content(CellCoord::new(2, 1)),
            Some("data:image/png;base64,AA")
        );
        assert_eq!(service.call_count(ServiceOp::SaveContent), 1);
    }

    #[test]
    fn test_save_content_requires_success() {
        let (store, service) = setup();
        let flow = PurchaseWorkflow::new();
        assert!(block_on(flow.save_content(&service, &store, "x")).is_err());
        assert_eq!(service.call_count(ServiceOp::SaveContent), 0);
    }

    #[test]
    fn test_reset_keeps_contact_details() {
        let mut flow = PurchaseWorkflow::new();
        flow.set_nickname("Satoshi");
        flow.set_url("");
        assert_eq!(flow.url(), None);
        flow.reset();
        assert_eq!(flow.nickname(), "Satoshi");
        assert!(flow.can_request_invoice());
        assert_eq!(flow.artwork_size(), None);
    }
}
