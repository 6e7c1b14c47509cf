//! # Sale Repository
//!
//! ## Submission
//! ```text
//! SaleDraft ──► VentaPayload ──► POST /venta/guardar ──► SavedSale
//!                                        │
//!                                        └──► GET /venta/siguiente-id  (next provisional id)
//! ```
//!
//! ## History
//! ```text
//! GET /venta/obtener-ventas-completadas?page=N ──► Page<Sale>
//! GET /venta/{id}                              ──► SaleDetail (404 ──► NotFound)
//! POST /efactura/guardar                       ──► electronic invoice for a sale
//! GET /efactura/obtener-efacturas?page=N       ──► Page<ElectronicInvoice>
//! ```

use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Method;
use tracing::{debug, info};

use drogueria_core::{ElectronicInvoice, Money, Page, Sale, SaleDetail, SaleDraft, SavedSale};

use crate::client::{read_optional_json, ApiClient};
use crate::error::{HttpError, HttpResult};
use crate::normalize::{
    money_from_wire, EFacturaPayload, VentaPayload, WireEFactura, WirePage, WireSale,
    WireSaleDetail, WireSavedSale,
};

/// Page size the backend uses for its history listings.
pub const HISTORY_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct SaleRepository {
    api: ApiClient,
}

impl SaleRepository {
    pub fn new(api: ApiClient) -> Self {
        SaleRepository { api }
    }

    /// Posts a sale.
    ///
    /// The backend may answer with the saved sale or with an empty body;
    /// either way a 2xx means the sale was stored.
    pub async fn save(&self, draft: &SaleDraft) -> HttpResult<SavedSale> {
        let payload = VentaPayload::from(draft);
        let url = self.api.endpoint(&["venta", "guardar"])?;

        let response = self
            .api
            .send(self.api.request(Method::POST, url).json(&payload))
            .await?;

        let saved: SavedSale = read_optional_json::<WireSavedSale>(response)
            .await
            .unwrap_or_default()
            .into();

        info!(
            sale_id = ?saved.id,
            client = %draft.client_id,
            lines = draft.lines.len(),
            tendered = %draft.tendered,
            "Sale saved"
        );
        Ok(saved)
    }

    /// Id the next sale will probably get.
    pub async fn next_id(&self) -> HttpResult<i64> {
        let id = self.api.get_json(&["venta", "siguiente-id"], &[]).await?;
        debug!(id = id, "Next sale id");
        Ok(id)
    }

    /// Sum of the sales of one day.
    pub async fn total_for(&self, date: NaiveDate) -> HttpResult<Money> {
        let total: f64 = self
            .api
            .get_json(
                &["venta", "total-ventas"],
                &[("fecha", date.format("%Y-%m-%d").to_string())],
            )
            .await?;
        debug!(date = %date, total = total, "Daily sales total");
        Ok(money_from_wire(total))
    }

    /// Cancels a saved sale.
    pub async fn cancel(&self, id: i64) -> HttpResult<bool> {
        let url = self.api.endpoint(&["venta", "cancelar", &id.to_string()])?;
        let response = self.api.send(self.api.request(Method::DELETE, url)).await?;
        let cancelled = read_optional_json::<bool>(response).await.unwrap_or(true);
        info!(sale_id = id, cancelled = cancelled, "Sale cancelled");
        Ok(cancelled)
    }

    /// One page of completed sales, in the backend's order.
    pub async fn completed(&self, page: u32) -> HttpResult<Page<Sale>> {
        let wire: WirePage<WireSale> = self
            .api
            .get_json(
                &["venta", "obtener-ventas-completadas"],
                &[("page", page.to_string())],
            )
            .await?;
        let sales = wire.into_page(page, HISTORY_PAGE_SIZE);
        debug!(page = page, count = sales.content.len(), "Completed sales fetched");
        Ok(sales)
    }

    /// A saved sale with its lines.
    pub async fn detail(&self, id: i64) -> HttpResult<SaleDetail> {
        let id_segment = id.to_string();
        match self
            .api
            .get_json::<WireSaleDetail>(&["venta", &id_segment], &[])
            .await
        {
            Ok(wire) => Ok(wire.into()),
            Err(err) if err.is_not_found() => Err(HttpError::not_found("Sale", id_segment)),
            Err(err) => Err(err),
        }
    }

    /// Requests the electronic invoice of a saved sale.
    pub async fn issue_electronic_invoice(&self, sale_id: i64, at: NaiveDateTime) -> HttpResult<()> {
        let url = self.api.endpoint(&["efactura", "guardar"])?;
        self.api
            .send(
                self.api
                    .request(Method::POST, url)
                    .json(&EFacturaPayload::new(sale_id, at)),
            )
            .await?;
        info!(sale_id = sale_id, "Electronic invoice requested");
        Ok(())
    }

    /// One page of issued electronic invoices.
    pub async fn electronic_invoices(&self, page: u32) -> HttpResult<Page<ElectronicInvoice>> {
        let wire: WirePage<WireEFactura> = self
            .api
            .get_json(
                &["efactura", "obtener-efacturas"],
                &[("page", page.to_string())],
            )
            .await?;
        Ok(wire.into_page(page, HISTORY_PAGE_SIZE))
    }
}
