//! # Backend Traits
//!
//! The workflows in `apps/caja` are generic over these traits so they can
//! run against [`ApiClient`] in production and in-memory fakes in tests.
//!
//! ```text
//! ┌──────────────────────┐       ┌──────────────────────┐
//! │ apps/caja workflows  │──────►│  trait XxxBackend    │
//! └──────────────────────┘       └──────────┬───────────┘
//!                                           │
//!                         ┌─────────────────┴─────────────────┐
//!                         ▼                                   ▼
//!                 ApiClient (reqwest)                 fakes (tests)
//! ```

#![allow(async_fn_in_trait)]

use chrono::{NaiveDate, NaiveDateTime};

use drogueria_core::{
    CashRegisterKind, CashRegisterStatus, Client, ClosingRecord, ElectronicInvoice, Money,
    Movement, NewMovement, Page, ProductSummary, Sale, SaleDetail, SaleDraft, SavedSale,
    UnitOfSale,
};

use crate::client::ApiClient;
use crate::error::HttpResult;

/// Product lookups.
pub trait ProductBackend {
    async fn units_of_sale(&self, code: &str) -> HttpResult<Vec<UnitOfSale>>;
    async fn is_removed(&self, code: &str) -> HttpResult<bool>;
    async fn list_products(&self) -> HttpResult<Vec<ProductSummary>>;
}

/// Client lookups.
pub trait ClientBackend {
    async fn find_client(&self, cedula: &str) -> HttpResult<Option<Client>>;
}

/// Sale submission, daily totals and the sales history.
pub trait SaleBackend {
    async fn save_sale(&self, draft: &SaleDraft) -> HttpResult<SavedSale>;
    async fn next_sale_id(&self) -> HttpResult<i64>;
    async fn total_sales_for(&self, date: NaiveDate) -> HttpResult<Money>;
    async fn cancel_sale(&self, id: i64) -> HttpResult<bool>;
    async fn completed_sales(&self, page: u32) -> HttpResult<Page<Sale>>;
    async fn sale_detail(&self, id: i64) -> HttpResult<SaleDetail>;
}

/// Electronic invoicing of saved sales.
pub trait InvoiceBackend {
    async fn issue_electronic_invoice(&self, sale_id: i64, at: NaiveDateTime) -> HttpResult<()>;
    async fn electronic_invoices(&self, page: u32) -> HttpResult<Page<ElectronicInvoice>>;
}

/// Manual cash movements.
pub trait MovementBackend {
    async fn movements_for(&self, date: NaiveDate) -> HttpResult<Vec<Movement>>;
    async fn create_movement(&self, movement: &NewMovement) -> HttpResult<()>;
    async fn delete_movement(&self, id: i64) -> HttpResult<bool>;
}

/// Caja mayor / caja menor.
pub trait CashRegisterBackend {
    async fn balance(&self, kind: CashRegisterKind) -> HttpResult<Money>;
    async fn close(&self, kind: CashRegisterKind, counted: Money) -> HttpResult<()>;
    async fn history(
        &self,
        kind: CashRegisterKind,
        page: u32,
        size: u32,
    ) -> HttpResult<Page<ClosingRecord>>;
    async fn status(&self, kind: CashRegisterKind) -> HttpResult<CashRegisterStatus>;
}

// =============================================================================
// ApiClient implementations
// =============================================================================

impl ProductBackend for ApiClient {
    async fn units_of_sale(&self, code: &str) -> HttpResult<Vec<UnitOfSale>> {
        self.products().units_of_sale(code).await
    }

    async fn is_removed(&self, code: &str) -> HttpResult<bool> {
        self.products().is_removed(code).await
    }

    async fn list_products(&self) -> HttpResult<Vec<ProductSummary>> {
        self.products().list().await
    }
}

impl ClientBackend for ApiClient {
    async fn find_client(&self, cedula: &str) -> HttpResult<Option<Client>> {
        self.clients().find(cedula).await
    }
}

impl SaleBackend for ApiClient {
    async fn save_sale(&self, draft: &SaleDraft) -> HttpResult<SavedSale> {
        self.sales().save(draft).await
    }

    async fn next_sale_id(&self) -> HttpResult<i64> {
        self.sales().next_id().await
    }

    async fn total_sales_for(&self, date: NaiveDate) -> HttpResult<Money> {
        self.sales().total_for(date).await
    }

    async fn cancel_sale(&self, id: i64) -> HttpResult<bool> {
        self.sales().cancel(id).await
    }

    async fn completed_sales(&self, page: u32) -> HttpResult<Page<Sale>> {
        self.sales().completed(page).await
    }

    async fn sale_detail(&self, id: i64) -> HttpResult<SaleDetail> {
        self.sales().detail(id).await
    }
}

impl InvoiceBackend for ApiClient {
    async fn issue_electronic_invoice(&self, sale_id: i64, at: NaiveDateTime) -> HttpResult<()> {
        self.sales().issue_electronic_invoice(sale_id, at).await
    }

    async fn electronic_invoices(&self, page: u32) -> HttpResult<Page<ElectronicInvoice>> {
        self.sales().electronic_invoices(page).await
    }
}

impl MovementBackend for ApiClient {
    async fn movements_for(&self, date: NaiveDate) -> HttpResult<Vec<Movement>> {
        self.movements().for_date(date).await
    }

    async fn create_movement(&self, movement: &NewMovement) -> HttpResult<()> {
        self.movements().create(movement).await
    }

    async fn delete_movement(&self, id: i64) -> HttpResult<bool> {
        self.movements().delete(id).await
    }
}

impl CashRegisterBackend for ApiClient {
    async fn balance(&self, kind: CashRegisterKind) -> HttpResult<Money> {
        self.cash_registers().balance(kind).await
    }

    async fn close(&self, kind: CashRegisterKind, counted: Money) -> HttpResult<()> {
        self.cash_registers().close(kind, counted).await
    }

    async fn history(
        &self,
        kind: CashRegisterKind,
        page: u32,
        size: u32,
    ) -> HttpResult<Page<ClosingRecord>> {
        self.cash_registers().history(kind, page, size).await
    }

    async fn status(&self, kind: CashRegisterKind) -> HttpResult<CashRegisterStatus> {
        self.cash_registers().status(kind).await
    }
}
