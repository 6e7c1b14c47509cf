//! # Sales History Commands
//!
//! Completed sales, receipts of saved sales and electronic invoices.
//!
//! ```text
//! completed_sales(page) ──► Page<Sale>          (read fails ──► empty page)
//!        │
//!        ▼ pick one
//! sale_detail(id) ──────► SaleDetail            (unknown id ──► NotFound)
//!        │
//!        ▼
//! issue_electronic_invoice(id) ──► POST /efactura/guardar
//! ```

use chrono::NaiveDateTime;
use tracing::{info, warn};

use drogueria_core::{ElectronicInvoice, Page, Sale, SaleDetail};
use drogueria_http::repository::sale::HISTORY_PAGE_SIZE;
use drogueria_http::{InvoiceBackend, SaleBackend};

use crate::error::{PosError, PosResult};
use crate::notify::{Notice, Notifier};
use crate::state::SessionContext;

/// One page of completed sales. A failed read shows a notice and yields an
/// empty page so the pager still renders.
pub async fn completed_sales<B, N>(backend: &B, notifier: &N, page: u32) -> Page<Sale>
where
    B: SaleBackend,
    N: Notifier,
{
    match backend.completed_sales(page).await {
        Ok(sales) => sales,
        Err(e) => {
            warn!(page, error = %e, "Could not load completed sales");
            notifier.notify(Notice::error(e.user_message("Could not load the sales")));
            Page::empty(page, HISTORY_PAGE_SIZE)
        }
    }
}

/// Sales of a page that match the search box.
pub fn search<'a>(page: &'a Page<Sale>, query: &str) -> Vec<&'a Sale> {
    page.content.iter().filter(|sale| sale.matches(query)).collect()
}

pub async fn sale_detail<B, N>(backend: &B, notifier: &N, id: i64) -> PosResult<SaleDetail>
where
    B: SaleBackend,
    N: Notifier,
{
    backend.sale_detail(id).await.map_err(|e| {
        let err = PosError::from_backend(e, "Could not load the sale");
        notifier.notify(Notice::error(&err.message));
        err
    })
}

/// Requests the electronic invoice of a saved sale.
pub async fn issue_electronic_invoice<B, N>(
    backend: &B,
    ctx: &SessionContext,
    notifier: &N,
    sale_id: i64,
    at: NaiveDateTime,
) -> PosResult<()>
where
    B: InvoiceBackend,
    N: Notifier,
{
    if sale_id <= 0 {
        return Err(PosError::validation("Choose a saved sale"));
    }

    match backend.issue_electronic_invoice(sale_id, at).await {
        Ok(()) => {
            info!(sale_id, "Electronic invoice requested");
            notifier.notify(Notice::success(
                format!("Electronic invoice requested for sale {}", sale_id),
                ctx.success_notice,
            ));
            Ok(())
        }
        Err(e) => {
            let err = PosError::from_backend(e, "The electronic invoice could not be created");
            notifier.notify(Notice::error(&err.message));
            Err(err)
        }
    }
}

pub async fn electronic_invoices<B, N>(
    backend: &B,
    notifier: &N,
    page: u32,
) -> Page<ElectronicInvoice>
where
    B: InvoiceBackend,
    N: Notifier,
{
    match backend.electronic_invoices(page).await {
        Ok(invoices) => invoices,
        Err(e) => {
            warn!(page, error = %e, "Could not load electronic invoices");
            notifier.notify(Notice::error(
                e.user_message("Could not load the electronic invoices"),
            ));
            Page::empty(page, HISTORY_PAGE_SIZE)
        }
    }
}
