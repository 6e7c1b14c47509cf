//! Workflow scenarios against an in-memory backend.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{NaiveDate, NaiveDateTime};

use drogueria_caja::commands::cart::{add_selected, resolve_product, scan_product, select_product};
use drogueria_caja::commands::cash::CashDesk;
use drogueria_caja::commands::checkout::{
    load_client, refresh_next_sale_id, submit_sale, use_default_client,
};
use drogueria_caja::commands::{movement, sales};
use drogueria_caja::{
    CacheOptions, CartSession, ErrorCode, NoticeLevel, RecordingNotifier, SelectionOutcome,
    SessionContext,
};
use drogueria_core::cash::TRANSFER_REASON;
use drogueria_core::{
    CashRegisterKind, CashRegisterStatus, CheckoutPhase, Client, ClientField, ClosingRecord,
    ElectronicInvoice, Money, Movement, MovementKind, NewMovement, Page, ProductSummary, Quantity,
    Sale, SaleDetail, SaleDetailLine, SaleDraft, SavedSale, UnitOfSale,
};
use drogueria_http::{
    CashRegisterBackend, ClientBackend, HttpError, HttpResult, InvoiceBackend, MovementBackend,
    ProductBackend, SaleBackend,
};

// =============================================================================
// Fake backend
// =============================================================================

#[derive(Default)]
struct FakeBackend {
    calls: Mutex<Vec<String>>,
    units: HashMap<String, Vec<UnitOfSale>>,
    removed: HashSet<String>,
    clients: HashMap<String, Client>,
    balances: Mutex<HashMap<CashRegisterKind, i64>>,
    day_movements: Vec<Movement>,
    total_sales: i64,
    next_id: i64,
    saved: Mutex<Vec<SaleDraft>>,
    created: Mutex<Vec<NewMovement>>,
    invoices: Mutex<Vec<(i64, NaiveDateTime)>>,
    closes: Mutex<Vec<(CashRegisterKind, Money)>>,
    fail_save: bool,
    fail_movement: bool,
    fail_reads: bool,
}

impl FakeBackend {
    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn called(&self, name: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(name))
    }

    fn with_balance(self, kind: CashRegisterKind, pesos: i64) -> Self {
        self.balances.lock().unwrap().insert(kind, pesos);
        self
    }

    fn down() -> HttpError {
        HttpError::from_status(503, "")
    }
}

impl ProductBackend for FakeBackend {
    async fn units_of_sale(&self, code: &str) -> HttpResult<Vec<UnitOfSale>> {
        self.record(format!("units_of_sale {code}"));
        if self.fail_reads {
            return Err(Self::down());
        }
        Ok(self.units.get(code).cloned().unwrap_or_default())
    }

    async fn is_removed(&self, code: &str) -> HttpResult<bool> {
        self.record(format!("is_removed {code}"));
        Ok(self.removed.contains(code))
    }

    async fn list_products(&self) -> HttpResult<Vec<ProductSummary>> {
        self.record("list_products");
        if self.fail_reads {
            return Err(Self::down());
        }
        let mut codes: Vec<&String> = self.units.keys().collect();
        codes.sort();
        Ok(codes
            .into_iter()
            .map(|code| ProductSummary {
                code: code.clone(),
                name: format!("Producto {code}"),
                active: !self.removed.contains(code),
                created_at: None,
            })
            .collect())
    }
}

impl ClientBackend for FakeBackend {
    async fn find_client(&self, cedula: &str) -> HttpResult<Option<Client>> {
        self.record(format!("find_client {cedula}"));
        Ok(self.clients.get(cedula).cloned())
    }
}

impl SaleBackend for FakeBackend {
    async fn save_sale(&self, draft: &SaleDraft) -> HttpResult<SavedSale> {
        self.record("save_sale");
        if self.fail_save {
            return Err(HttpError::from_status(
                400,
                r#"{"mensaje":"Stock insuficiente para P1"}"#,
            ));
        }
        let mut saved = self.saved.lock().unwrap();
        saved.push(draft.clone());
        Ok(SavedSale {
            id: Some(saved.len() as i64),
            total: Some(draft.expected_total()),
        })
    }

    async fn next_sale_id(&self) -> HttpResult<i64> {
        self.record("next_sale_id");
        Ok(self.next_id)
    }

    async fn total_sales_for(&self, date: NaiveDate) -> HttpResult<Money> {
        self.record(format!("total_sales_for {date}"));
        if self.fail_reads {
            return Err(Self::down());
        }
        Ok(Money::from_pesos(self.total_sales))
    }

    async fn cancel_sale(&self, id: i64) -> HttpResult<bool> {
        self.record(format!("cancel_sale {id}"));
        Ok(true)
    }

    async fn completed_sales(&self, page: u32) -> HttpResult<Page<Sale>> {
        self.record(format!("completed_sales {page}"));
        if self.fail_reads {
            return Err(Self::down());
        }
        let content: Vec<Sale> = self
            .saved
            .lock()
            .unwrap()
            .iter()
            .enumerate()
            .map(|(i, draft)| Sale {
                id: i as i64 + 1,
                client: draft.client_id.clone(),
                total: draft.expected_total(),
                timestamp: None,
            })
            .collect();
        let total = content.len() as u64;
        Ok(Page {
            content,
            total_pages: u32::from(total > 0),
            total_elements: total,
            number: page,
            size: 10,
        })
    }

    async fn sale_detail(&self, id: i64) -> HttpResult<SaleDetail> {
        self.record(format!("sale_detail {id}"));
        let saved = self.saved.lock().unwrap();
        let draft = usize::try_from(id - 1)
            .ok()
            .and_then(|i| saved.get(i))
            .ok_or_else(|| HttpError::not_found("Sale", id.to_string()))?;
        let lines = draft
            .lines
            .iter()
            .map(|line| {
                let unit_price = self.units[&line.product_code]
                    .iter()
                    .find(|u| u.name == line.unit_name)
                    .map(|u| u.sale_price)
                    .unwrap_or_default();
                SaleDetailLine {
                    product_code: line.product_code.clone(),
                    product_name: format!("Producto {}", line.product_code),
                    unit_name: line.unit_name.clone(),
                    quantity: line.quantity,
                    unit_price,
                    subtotal: unit_price.multiply_quantity(line.quantity),
                }
            })
            .collect();
        Ok(SaleDetail {
            id,
            client: draft.client_id.clone(),
            client_name: None,
            timestamp: None,
            discount: draft.discount,
            tendered: draft.tendered,
            change: draft.change,
            total: draft.expected_total(),
            lines,
        })
    }
}

impl InvoiceBackend for FakeBackend {
    async fn issue_electronic_invoice(&self, sale_id: i64, at: NaiveDateTime) -> HttpResult<()> {
        self.record(format!("issue_electronic_invoice {sale_id}"));
        self.invoices.lock().unwrap().push((sale_id, at));
        Ok(())
    }

    async fn electronic_invoices(&self, page: u32) -> HttpResult<Page<ElectronicInvoice>> {
        self.record(format!("electronic_invoices {page}"));
        if self.fail_reads {
            return Err(Self::down());
        }
        Ok(Page::empty(page, 10))
    }
}

impl MovementBackend for FakeBackend {
    async fn movements_for(&self, date: NaiveDate) -> HttpResult<Vec<Movement>> {
        self.record(format!("movements_for {date}"));
        if self.fail_reads {
            return Err(Self::down());
        }
        Ok(self.day_movements.clone())
    }

    async fn create_movement(&self, movement: &NewMovement) -> HttpResult<()> {
        self.record("create_movement");
        if self.fail_movement {
            return Err(Self::down());
        }
        self.created.lock().unwrap().push(movement.clone());
        Ok(())
    }

    async fn delete_movement(&self, id: i64) -> HttpResult<bool> {
        self.record(format!("delete_movement {id}"));
        Ok(id == 1)
    }
}

impl CashRegisterBackend for FakeBackend {
    async fn balance(&self, kind: CashRegisterKind) -> HttpResult<Money> {
        self.record(format!("balance {}", kind.path_segment()));
        if self.fail_reads {
            return Err(Self::down());
        }
        let balances = self.balances.lock().unwrap();
        Ok(Money::from_pesos(balances.get(&kind).copied().unwrap_or(0)))
    }

    async fn close(&self, kind: CashRegisterKind, counted: Money) -> HttpResult<()> {
        self.record(format!("close {}", kind.path_segment()));
        self.closes.lock().unwrap().push((kind, counted));
        let mut balances = self.balances.lock().unwrap();
        let balance = balances.entry(kind).or_insert(0);
        *balance -= counted.pesos();
        Ok(())
    }

    async fn history(
        &self,
        kind: CashRegisterKind,
        page: u32,
        size: u32,
    ) -> HttpResult<Page<ClosingRecord>> {
        self.record(format!("history {}", kind.path_segment()));
        if self.fail_reads {
            return Err(Self::down());
        }
        Ok(Page::empty(page, size))
    }

    async fn status(&self, kind: CashRegisterKind) -> HttpResult<CashRegisterStatus> {
        self.record(format!("status {}", kind.path_segment()));
        if self.fail_reads {
            return Err(Self::down());
        }
        Ok(CashRegisterStatus {
            id: Some(1),
            balance: Money::from_pesos(0),
        })
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn unit(name: &str, price: i64, available: i64) -> UnitOfSale {
    UnitOfSale {
        name: name.into(),
        purchase_price: Money::zero(),
        sale_price: Money::from_pesos(price),
        available: Quantity::from_units(available),
        min_stock: Quantity::zero(),
        active: true,
    }
}

fn store() -> FakeBackend {
    FakeBackend {
        units: HashMap::from([
            ("P1".to_string(), vec![unit("Unidad", 5000, 100), unit("Caja", 45_000, 5)]),
            ("P9".to_string(), vec![unit("Unidad", 1000, 10)]),
        ]),
        removed: HashSet::from(["P9".to_string()]),
        next_id: 101,
        ..FakeBackend::default()
    }
}

fn open_session(ctx: &SessionContext) -> CartSession {
    CartSession::new(ctx, CacheOptions::default())
}

async fn add(
    session: &mut CartSession,
    backend: &FakeBackend,
    notifier: &RecordingNotifier,
    code: &str,
    units: i64,
) {
    let outcome = select_product(session, backend, notifier, code, "Acetaminofén 500mg")
        .await
        .unwrap();
    assert_eq!(outcome, SelectionOutcome::Applied);
    session.set_pending_quantity(Quantity::from_units(units));
    add_selected(session, backend, notifier).await.unwrap();
}

/// Cart with P1 x5 "Unidad" (subtotal 25,000) and the default client.
async fn cart_of_25000(
    ctx: &SessionContext,
    backend: &FakeBackend,
    notifier: &RecordingNotifier,
) -> CartSession {
    let mut session = open_session(ctx);
    add(&mut session, backend, notifier, "P1", 5).await;
    use_default_client(&mut session, ctx);
    session
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn at(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn test_scenario_a_add_then_increment() {
    let ctx = SessionContext::new(1);
    let backend = store();
    let notifier = RecordingNotifier::new();
    let mut session = open_session(&ctx);

    add(&mut session, &backend, &notifier, "P1", 2).await;
    assert_eq!(session.cart().subtotal(), Money::from_pesos(10_000));
    assert_eq!(session.cart().total(), Money::from_pesos(10_000));

    add(&mut session, &backend, &notifier, "P1", 3).await;
    assert_eq!(session.cart().len(), 1);
    assert_eq!(session.cart().lines()[0].quantity, Quantity::from_units(5));
    assert_eq!(session.cart().subtotal(), Money::from_pesos(25_000));
    assert!(notifier.errors().is_empty());
}

#[tokio::test]
async fn test_scenario_b_discount_round_trip() {
    let ctx = SessionContext::new(1);
    let backend = store();
    let notifier = RecordingNotifier::new();
    let mut session = cart_of_25000(&ctx, &backend, &notifier).await;

    assert_eq!(session.apply_discount_input("5,000").unwrap(), Money::from_pesos(20_000));
    assert_eq!(session.cart().total(), Money::from_pesos(20_000));

    assert_eq!(session.cancel_discount(), Money::from_pesos(25_000));
    assert_eq!(session.cart().total(), Money::from_pesos(25_000));
}

#[tokio::test]
async fn test_scenario_c_discount_above_total_is_rejected() {
    let ctx = SessionContext::new(1);
    let backend = store();
    let notifier = RecordingNotifier::new();
    let mut session = cart_of_25000(&ctx, &backend, &notifier).await;

    let err = session.apply_discount_input("30000").unwrap_err();
    assert_eq!(err.code, ErrorCode::BusinessLogic);
    assert_eq!(session.cart().total(), Money::from_pesos(25_000));
    assert!(!session.cart().discount_applied());
}

#[tokio::test]
async fn test_scenario_d_insufficient_tender_never_submits() {
    let ctx = SessionContext::new(1);
    let backend = store();
    let notifier = RecordingNotifier::new();
    let mut session = cart_of_25000(&ctx, &backend, &notifier).await;
    backend.clear_calls();

    let err = submit_sale(&mut session, &ctx, &backend, &notifier, "20000")
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::PaymentError);
    assert!(backend.calls().is_empty());
    assert!(backend.saved.lock().unwrap().is_empty());
    assert_eq!(session.cart().total(), Money::from_pesos(25_000));
    assert_eq!(session.checkout().phase(), CheckoutPhase::CollectingCart);
    assert_eq!(notifier.last().unwrap().level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_scenario_e_sale_is_submitted_and_cart_reset() {
    let ctx = SessionContext::new(7);
    let backend = store();
    let notifier = RecordingNotifier::new();
    let mut session = cart_of_25000(&ctx, &backend, &notifier).await;

    let receipt = submit_sale(&mut session, &ctx, &backend, &notifier, "30000")
        .await
        .unwrap();

    assert_eq!(receipt.change, Money::from_pesos(5_000));
    assert_eq!(receipt.total, Money::from_pesos(25_000));
    assert_eq!(receipt.sale_id, Some(1));
    assert_eq!(receipt.next_sale_id, Some(101));

    let saved = backend.saved.lock().unwrap().clone();
    assert_eq!(saved.len(), 1);
    assert_eq!(saved[0].client_id, "222222222222");
    assert_eq!(saved[0].user_id, 7);
    assert_eq!(saved[0].tendered, Money::from_pesos(30_000));
    assert_eq!(saved[0].change, Money::from_pesos(5_000));
    assert_eq!(saved[0].lines[0].unit_name, "Unidad");

    assert!(session.cart().is_empty());
    assert!(session.checkout().form().id.is_empty());
    assert_eq!(session.checkout().provisional_sale_id(), Some(101));
    assert!(backend.called("next_sale_id"));

    let notice = notifier.last().unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Cambio: $ 5,000");
    assert_eq!(notice.dismiss_after, Some(ctx.success_notice));
}

#[tokio::test]
async fn test_scenario_f_transfer_above_balance_makes_no_calls() {
    let ctx = SessionContext::new(1);
    let backend = store().with_balance(CashRegisterKind::Major, 8_000);
    let notifier = RecordingNotifier::new();
    let mut desk = CashDesk::new(&backend, &notifier, &ctx);

    desk.refresh_balance(CashRegisterKind::Major).await;
    backend.clear_calls();

    let err = desk
        .transfer_major_to_minor(Money::from_pesos(10_000))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::BusinessLogic);
    assert!(backend.calls().is_empty());
    assert_eq!(
        desk.register(CashRegisterKind::Major).balance,
        Money::from_pesos(8_000)
    );
    assert_eq!(notifier.last().unwrap().level, NoticeLevel::Error);
}

// =============================================================================
// Checkout edge cases
// =============================================================================

#[tokio::test]
async fn test_backend_rejection_keeps_cart_and_form() {
    let ctx = SessionContext::new(1);
    let backend = FakeBackend {
        fail_save: true,
        ..store()
    };
    let notifier = RecordingNotifier::new();
    let mut session = cart_of_25000(&ctx, &backend, &notifier).await;

    let err = submit_sale(&mut session, &ctx, &backend, &notifier, "30000")
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::BackendError);
    assert_eq!(err.message, "Stock insuficiente para P1");
    assert_eq!(session.cart().subtotal(), Money::from_pesos(25_000));
    assert_eq!(session.checkout().form().id, "222222222222");
    assert_eq!(session.checkout().phase(), CheckoutPhase::CollectingCart);
    assert_eq!(
        session.checkout().last_error(),
        Some("Stock insuficiente para P1")
    );
    assert!(!backend.called("next_sale_id"));
}

#[tokio::test]
async fn test_empty_cart_and_missing_client_never_submit() {
    let ctx = SessionContext::new(1);
    let backend = store();
    let notifier = RecordingNotifier::new();

    let mut empty = open_session(&ctx);
    use_default_client(&mut empty, &ctx);
    let err = submit_sale(&mut empty, &ctx, &backend, &notifier, "1000")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let mut no_client = open_session(&ctx);
    add(&mut no_client, &backend, &notifier, "P1", 1).await;
    let err = submit_sale(&mut no_client, &ctx, &backend, &notifier, "5000")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert!(no_client
        .checkout()
        .form()
        .is_touched(drogueria_core::ClientField::Name));

    assert!(!backend.called("save_sale"));
}

#[tokio::test]
async fn test_closed_session_ignores_the_backend() {
    let ctx = SessionContext::new(1);
    let backend = store();
    let notifier = RecordingNotifier::new();
    let mut session = cart_of_25000(&ctx, &backend, &notifier).await;

    session.close();
    let err = submit_sale(&mut session, &ctx, &backend, &notifier, "30000")
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(backend.saved.lock().unwrap().is_empty());
    assert_eq!(session.cart().subtotal(), Money::from_pesos(25_000));
}

#[tokio::test]
async fn test_removed_product_cannot_be_added() {
    let ctx = SessionContext::new(1);
    let backend = store();
    let notifier = RecordingNotifier::new();
    let mut session = open_session(&ctx);

    select_product(&mut session, &backend, &notifier, "P9", "Descontinuado")
        .await
        .unwrap();
    session.set_pending_quantity(Quantity::from_units(1));
    let err = add_selected(&mut session, &backend, &notifier).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::BusinessLogic);
    assert!(session.cart().is_empty());
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test]
async fn test_recheck_on_submit_catches_removed_products() {
    let mut ctx = SessionContext::new(1);
    ctx.recheck_removed_on_submit = true;
    let notifier = RecordingNotifier::new();

    let mut backend = store();
    let mut session = cart_of_25000(&ctx, &backend, &notifier).await;
    // Removed between adding and paying
    backend.removed.insert("P1".to_string());
    session.clear_caches();

    let err = submit_sale(&mut session, &ctx, &backend, &notifier, "30000")
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::BusinessLogic);
    assert!(!backend.called("save_sale"));
    assert_eq!(session.cart().len(), 1);
}

#[tokio::test]
async fn test_increment_above_stock_is_flagged() {
    let ctx = SessionContext::new(1);
    let backend = store();
    let notifier = RecordingNotifier::new();
    let mut session = open_session(&ctx);

    select_product(&mut session, &backend, &notifier, "P1", "Acetaminofén")
        .await
        .unwrap();
    session.select_unit(1).unwrap();
    session.set_pending_quantity(Quantity::from_units(4));
    add_selected(&mut session, &backend, &notifier).await.unwrap();

    session.set_pending_quantity(Quantity::from_units(4));
    let outcome = add_selected(&mut session, &backend, &notifier).await.unwrap();

    assert!(outcome.exceeds_available);
    assert_eq!(outcome.quantity, Quantity::from_units(8));
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test]
async fn test_load_client_fills_form() {
    let ctx = SessionContext::new(1);
    let client = Client {
        id: "1020304050".into(),
        name: "Ana Pérez".into(),
        address: "Calle 10 # 4-20".into(),
        phone: Some("3001234567".into()),
        email: None,
    };
    let backend = FakeBackend {
        clients: HashMap::from([(client.id.clone(), client)]),
        ..store()
    };
    let mut session = open_session(&ctx);

    let client = load_client(&mut session, &backend, "1020304050").await.unwrap();
    assert_eq!(client.name, "Ana Pérez");
    assert_eq!(session.checkout().form().name, "Ana Pérez");
    assert_eq!(session.checkout().form().error(ClientField::Id), None);
}

#[tokio::test]
async fn test_unknown_client_is_reported_on_the_form() {
    let ctx = SessionContext::new(1);
    let backend = store();
    let mut session = open_session(&ctx);

    let err = load_client(&mut session, &backend, " 999 ").await.unwrap_err();

    assert_eq!(err.code, ErrorCode::NotFound);
    let form = session.checkout().form();
    assert_eq!(form.id, "999");
    assert_eq!(form.error(ClientField::Id), Some("Client not found: 999"));
    assert!(form.is_touched(ClientField::Id));
}

#[tokio::test]
async fn test_scanned_code_resolves_and_selects() {
    let ctx = SessionContext::new(1);
    let backend = store();
    let notifier = RecordingNotifier::new();
    let mut session = open_session(&ctx);

    let outcome = scan_product(&mut session, &backend, &notifier, " P1 ").await.unwrap();
    assert_eq!(outcome, SelectionOutcome::Applied);
    let catalog = session.catalog().unwrap();
    assert_eq!(catalog.product_code(), "P1");
    assert_eq!(catalog.product_name(), "Producto P1");

    // Second scan is served from the session cache.
    backend.clear_calls();
    let product = resolve_product(&mut session, &backend, &notifier, "P1").await.unwrap();
    assert_eq!(product.name, "Producto P1");
    assert!(!backend.called("list_products"));
}

#[tokio::test]
async fn test_unknown_product_code_clears_the_selection() {
    let ctx = SessionContext::new(1);
    let backend = store();
    let notifier = RecordingNotifier::new();
    let mut session = open_session(&ctx);
    scan_product(&mut session, &backend, &notifier, "P1").await.unwrap();
    backend.clear_calls();

    // Codes match exactly, never by prefix.
    let err = scan_product(&mut session, &backend, &notifier, "P").await.unwrap_err();

    assert_eq!(err.code, ErrorCode::NotFound);
    assert!(err.message.contains("Product not found: P"));
    assert!(session.catalog().is_none());
    assert!(!session.pending().selected);
    assert!(!backend.called("units_of_sale"));
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test]
async fn test_refresh_next_sale_id() {
    let ctx = SessionContext::new(1);
    let backend = store();
    let mut session = open_session(&ctx);
    assert_eq!(refresh_next_sale_id(&mut session, &backend).await, Some(101));
}

// =============================================================================
// Cash desk
// =============================================================================

#[tokio::test]
async fn test_transfer_closes_major_then_credits_minor() {
    let ctx = SessionContext::new(1);
    let backend = store().with_balance(CashRegisterKind::Major, 50_000);
    let notifier = RecordingNotifier::new();
    let mut desk = CashDesk::new(&backend, &notifier, &ctx);

    desk.refresh_balance(CashRegisterKind::Major).await;
    desk.transfer_major_to_minor(Money::from_pesos(20_000))
        .await
        .unwrap();

    let closes = backend.closes.lock().unwrap().clone();
    assert_eq!(closes, vec![(CashRegisterKind::Major, Money::from_pesos(20_000))]);

    let created = backend.created.lock().unwrap().clone();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].kind, MovementKind::Ingreso);
    assert_eq!(created[0].reason, TRANSFER_REASON);
    assert_eq!(created[0].value, Money::from_pesos(20_000));

    assert_eq!(
        desk.register(CashRegisterKind::Major).balance,
        Money::from_pesos(30_000)
    );
    assert_eq!(notifier.last().unwrap().level, NoticeLevel::Success);
}

#[tokio::test]
async fn test_transfer_second_step_failure_is_partial() {
    let ctx = SessionContext::new(1);
    let backend = FakeBackend {
        fail_movement: true,
        ..store()
    }
    .with_balance(CashRegisterKind::Major, 50_000);
    let notifier = RecordingNotifier::new();
    let mut desk = CashDesk::new(&backend, &notifier, &ctx);

    desk.refresh_balance(CashRegisterKind::Major).await;
    let err = desk
        .transfer_major_to_minor(Money::from_pesos(20_000))
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::PartialFailure);
    assert_eq!(backend.closes.lock().unwrap().len(), 1);
    assert!(backend.created.lock().unwrap().is_empty());
    assert_eq!(notifier.last().unwrap().level, NoticeLevel::Error);
}

#[tokio::test]
async fn test_non_positive_transfer_and_close_are_rejected_locally() {
    let ctx = SessionContext::new(1);
    let backend = store().with_balance(CashRegisterKind::Major, 50_000);
    let notifier = RecordingNotifier::new();
    let mut desk = CashDesk::new(&backend, &notifier, &ctx);
    desk.refresh_balance(CashRegisterKind::Major).await;
    backend.clear_calls();

    let err = desk.transfer_major_to_minor(Money::zero()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = desk
        .close(CashRegisterKind::Minor, Money::from_pesos(-5))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn test_close_refreshes_register() {
    let ctx = SessionContext::new(1);
    let backend = store().with_balance(CashRegisterKind::Minor, 90_000);
    let notifier = RecordingNotifier::new();
    let mut desk = CashDesk::new(&backend, &notifier, &ctx);

    desk.close(CashRegisterKind::Minor, Money::from_pesos(90_000))
        .await
        .unwrap();

    let minor = desk.register(CashRegisterKind::Minor);
    assert_eq!(minor.balance, Money::zero());
    assert_eq!(minor.last_closing_value, Some(Money::from_pesos(90_000)));
    assert!(minor.status.is_some());
    assert!(backend.called("history caja-menor"));
    assert_eq!(
        notifier.last().unwrap().message,
        "Caja menor closed with $ 90,000"
    );
}

#[tokio::test]
async fn test_reads_degrade_when_backend_is_down() {
    let ctx = SessionContext::new(1);
    let backend = FakeBackend {
        fail_reads: true,
        ..store()
    };
    let notifier = RecordingNotifier::new();
    let mut desk = CashDesk::new(&backend, &notifier, &ctx);

    assert_eq!(desk.refresh_balance(CashRegisterKind::Major).await, Money::zero());
    assert_eq!(notifier.errors().len(), 1);

    let history = desk.history(CashRegisterKind::Major, 2, 5).await;
    assert!(history.content.is_empty());
    assert_eq!((history.number, history.size), (2, 5));

    assert!(desk.status(CashRegisterKind::Major).await.is_none());

    let position = desk.load_position(date("2026-03-14")).await.clone();
    assert_eq!(position.income, Money::zero());
    assert_eq!(position.total_cash, Money::zero());
}

#[tokio::test]
async fn test_daily_position() {
    let ctx = SessionContext::new(1);
    let backend = FakeBackend {
        total_sales: 200_000,
        day_movements: vec![
            Movement {
                id: Some(1),
                value: Money::from_pesos(50_000),
                kind: MovementKind::Ingreso,
                reason: TRANSFER_REASON.into(),
                timestamp: at("2026-03-14 09:00:00"),
            },
            Movement {
                id: Some(2),
                value: Money::from_pesos(12_000),
                kind: MovementKind::Egreso,
                reason: "Pago domicilio".into(),
                timestamp: at("2026-03-14 15:30:00"),
            },
            Movement {
                id: Some(3),
                value: Money::from_pesos(99_000),
                kind: MovementKind::Egreso,
                reason: "Otro día".into(),
                timestamp: at("2026-03-13 18:00:00"),
            },
        ],
        ..store()
    }
    .with_balance(CashRegisterKind::Minor, 300_000);
    let notifier = RecordingNotifier::new();
    let mut desk = CashDesk::new(&backend, &notifier, &ctx);

    let position = desk.load_position(date("2026-03-14")).await.clone();
    assert_eq!(position.income, Money::from_pesos(250_000));
    assert_eq!(position.expenses, Money::from_pesos(12_000));
    assert_eq!(position.total_cash, Money::from_pesos(100_000));
    assert_eq!(position.external_total, Money::from_pesos(38_000));

    // Same date: nothing re-fetched
    backend.clear_calls();
    desk.change_date(date("2026-03-14")).await;
    assert!(backend.calls().is_empty());

    // New date: everything re-fetched
    desk.change_date(date("2026-03-15")).await;
    assert!(backend.called("balance caja-menor"));
    assert!(backend.called("total_sales_for 2026-03-15"));
    assert!(backend.called("movements_for 2026-03-15"));
}

// =============================================================================
// Movements
// =============================================================================

#[tokio::test]
async fn test_movement_create_and_delete() {
    let ctx = SessionContext::new(1);
    let backend = store();
    let notifier = RecordingNotifier::new();

    let created = movement::create(
        &backend,
        &ctx,
        &notifier,
        Money::from_pesos(8_000),
        MovementKind::Egreso,
        "   ",
    )
    .await
    .unwrap();
    assert_eq!(created.reason, "Sin descripción");

    let err = movement::create(
        &backend,
        &ctx,
        &notifier,
        Money::zero(),
        MovementKind::Ingreso,
        "x",
    )
    .await
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert_eq!(backend.created.lock().unwrap().len(), 1);

    assert!(movement::delete(&backend, &ctx, &notifier, 1).await.unwrap());
    assert!(!movement::delete(&backend, &ctx, &notifier, 2).await.unwrap());
}

#[tokio::test]
async fn test_movement_list_degrades_to_empty() {
    let backend = FakeBackend {
        fail_reads: true,
        ..store()
    };
    let notifier = RecordingNotifier::new();

    let movements = movement::list_for_date(&backend, &notifier, date("2026-03-14")).await;
    assert!(movements.is_empty());
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test]
async fn test_submitted_sale_appears_in_history_with_its_lines() {
    let ctx = SessionContext::new(7);
    let backend = store();
    let notifier = RecordingNotifier::new();
    let mut session = cart_of_25000(&ctx, &backend, &notifier).await;
    submit_sale(&mut session, &ctx, &backend, &notifier, "30000")
        .await
        .unwrap();

    let listed = sales::completed_sales(&backend, &notifier, 0).await;
    assert_eq!(listed.total_elements, 1);
    assert_eq!(listed.content[0].client, "222222222222");
    assert_eq!(listed.content[0].total, Money::from_pesos(25_000));
    assert_eq!(sales::search(&listed, "2222").len(), 1);
    assert!(sales::search(&listed, "ana").is_empty());

    let detail = sales::sale_detail(&backend, &notifier, listed.content[0].id)
        .await
        .unwrap();
    assert_eq!(detail.lines.len(), 1);
    assert_eq!(detail.lines[0].unit_name, "Unidad");
    assert_eq!(detail.lines[0].quantity, Quantity::from_units(5));
    assert_eq!(detail.lines[0].subtotal, Money::from_pesos(25_000));
    assert_eq!(detail.change, Money::from_pesos(5_000));
}

#[tokio::test]
async fn test_unknown_sale_detail_is_not_found() {
    let backend = store();
    let notifier = RecordingNotifier::new();

    let err = sales::sale_detail(&backend, &notifier, 404).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::NotFound);
    assert_eq!(notifier.errors().len(), 1);
}

#[tokio::test]
async fn test_sales_history_degrades_to_empty_page() {
    let backend = FakeBackend {
        fail_reads: true,
        ..store()
    };
    let notifier = RecordingNotifier::new();

    let page = sales::completed_sales(&backend, &notifier, 3).await;
    assert!(page.is_empty());
    assert_eq!(page.number, 3);

    let invoices = sales::electronic_invoices(&backend, &notifier, 0).await;
    assert!(invoices.is_empty());
    assert_eq!(notifier.errors().len(), 2);
}

#[tokio::test]
async fn test_electronic_invoice_needs_a_saved_sale() {
    let ctx = SessionContext::new(1);
    let backend = store();
    let notifier = RecordingNotifier::new();
    let when = at("2026-03-14 18:05:00").unwrap();

    let err = sales::issue_electronic_invoice(&backend, &ctx, &notifier, 0, when)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
    assert!(!backend.called("issue_electronic_invoice"));

    sales::issue_electronic_invoice(&backend, &ctx, &notifier, 12, when)
        .await
        .unwrap();
    assert_eq!(backend.invoices.lock().unwrap().as_slice(), &[(12, when)]);
    assert_eq!(notifier.last().unwrap().level, NoticeLevel::Success);
}
