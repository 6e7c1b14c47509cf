//! # Cash Desk
//!
//! Caja mayor and caja menor as the operator sees them: last known balances,
//! closing history, closes, transfers and the daily position.
//!
//! ## Transfer Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │               transfer_major_to_minor(amount)                           │
//! │                                                                         │
//! │  amount ≤ 0 ──────────────────────────────► rejected, no request       │
//! │  amount > last known caja mayor balance ──► rejected, no request       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  POST /caja-mayor/cerrar?valor=amount ── error ──► rejected, unchanged │
//! │       │ ok                                                              │
//! │       ▼                                                                 │
//! │  POST /movimientos/crear (Ingreso, "Traslado desde caja mayor")        │
//! │       │ ok                        │ error                               │
//! │       ▼                           ▼                                     │
//! │  both balances refreshed    PartialFailure: caja mayor already         │
//! │                             closed, reconcile caja menor by hand       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Balances belong to the backend. The desk only keeps the last answer it
//! got and never retries or rolls back.

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use drogueria_core::cash::{
    check_close, check_transfer, transfer_movement, CashRegisterState, DailyCashPosition,
};
use drogueria_core::validation::validate_page_request;
use drogueria_core::{CashRegisterKind, CashRegisterStatus, ClosingRecord, Money, Page};
use drogueria_http::{CashRegisterBackend, MovementBackend, SaleBackend};

use crate::commands::movement;
use crate::error::{PosError, PosResult};
use crate::notify::{Notice, Notifier};
use crate::state::SessionContext;

/// Both cash registers plus the daily position of caja menor.
pub struct CashDesk<'a, B, N> {
    backend: &'a B,
    notifier: &'a N,
    ctx: &'a SessionContext,
    major: CashRegisterState,
    minor: CashRegisterState,
    position: Option<DailyCashPosition>,
}

impl<'a, B, N> CashDesk<'a, B, N>
where
    B: CashRegisterBackend + MovementBackend + SaleBackend,
    N: Notifier,
{
    pub fn new(backend: &'a B, notifier: &'a N, ctx: &'a SessionContext) -> Self {
        CashDesk {
            backend,
            notifier,
            ctx,
            major: CashRegisterState::new(CashRegisterKind::Major),
            minor: CashRegisterState::new(CashRegisterKind::Minor),
            position: None,
        }
    }

    pub fn register(&self, kind: CashRegisterKind) -> &CashRegisterState {
        match kind {
            CashRegisterKind::Major => &self.major,
            CashRegisterKind::Minor => &self.minor,
        }
    }

    fn register_mut(&mut self, kind: CashRegisterKind) -> &mut CashRegisterState {
        match kind {
            CashRegisterKind::Major => &mut self.major,
            CashRegisterKind::Minor => &mut self.minor,
        }
    }

    pub fn position(&self) -> Option<&DailyCashPosition> {
        self.position.as_ref()
    }

    // =========================================================================
    // Reads (fail-soft)
    // =========================================================================

    /// Loads the balance. On failure the balance reads as zero and an
    /// error notice is shown.
    pub async fn refresh_balance(&mut self, kind: CashRegisterKind) -> Money {
        let balance = match self.backend.balance(kind).await {
            Ok(balance) => {
                debug!(register = %kind, balance = %balance, "Balance loaded");
                balance
            }
            Err(e) => {
                warn!(register = %kind, error = %e, "Could not load balance, showing 0");
                self.notifier.notify(Notice::error(
                    e.user_message(&format!("Could not load the {} balance", kind)),
                ));
                Money::zero()
            }
        };
        self.register_mut(kind).balance = balance;
        balance
    }

    /// Loads one page of closings. On failure the page is empty.
    pub async fn history(
        &mut self,
        kind: CashRegisterKind,
        page: u32,
        size: u32,
    ) -> Page<ClosingRecord> {
        let history = match validate_page_request(page, size) {
            Err(e) => {
                warn!(register = %kind, error = %e, "Invalid history page request");
                Page::empty(page, size)
            }
            Ok((page, size)) => match self.backend.history(kind, page, size).await {
                Ok(history) => history,
                Err(e) => {
                    warn!(register = %kind, error = %e, "Could not load closing history");
                    Page::empty(page, size)
                }
            },
        };
        self.register_mut(kind).set_history(history.clone());
        history
    }

    /// Loads the register status. On failure there is none.
    pub async fn status(&mut self, kind: CashRegisterKind) -> Option<CashRegisterStatus> {
        let status = match self.backend.status(kind).await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!(register = %kind, error = %e, "Could not load register status");
                None
            }
        };
        self.register_mut(kind).status = status.clone();
        status
    }

    /// Balance, first history page and status in one go.
    pub async fn refresh(&mut self, kind: CashRegisterKind) {
        self.refresh_balance(kind).await;
        let size = self.register(kind).history.size.max(1);
        self.history(kind, 0, size).await;
        self.status(kind).await;
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Closes a register with the counted amount.
    pub async fn close(&mut self, kind: CashRegisterKind, counted: Money) -> PosResult<()> {
        let counted = match check_close(counted) {
            Ok(counted) => counted,
            Err(e) => return Err(self.reject(e.into())),
        };

        if let Err(e) = self.backend.close(kind, counted).await {
            let err = PosError::from_backend(e, &format!("The {} could not be closed", kind));
            return Err(self.reject(err));
        }

        info!(register = %kind, counted = %counted, "Register closed");
        self.register_mut(kind).record_close(counted);
        self.notifier.notify(Notice::success(
            format!("{} closed with {}", capitalize(kind.label()), counted),
            self.ctx.success_notice,
        ));
        self.refresh(kind).await;
        Ok(())
    }

    /// Moves `amount` from caja mayor to caja menor.
    ///
    /// Checked against the last loaded caja mayor balance before any request.
    /// The two backend steps are not atomic.
    pub async fn transfer_major_to_minor(&mut self, amount: Money) -> PosResult<()> {
        let amount = match check_transfer(amount, self.major.balance) {
            Ok(amount) => amount,
            Err(e) => return Err(self.reject(e.into())),
        };

        if let Err(e) = self.backend.close(CashRegisterKind::Major, amount).await {
            let err = PosError::from_backend(e, "The transfer could not be made");
            return Err(self.reject(err));
        }
        self.major.record_close(amount);

        if let Err(e) = self.backend.create_movement(&transfer_movement(amount)).await {
            error!(
                amount = %amount,
                error = %e,
                "Caja mayor closed for a transfer but caja menor income was not recorded"
            );
            let err = PosError::partial_failure(format!(
                "Caja mayor was closed for {} but the caja menor income could not be \
                 recorded. Record it manually.",
                amount
            ));
            self.notifier.notify(Notice::error(&err.message));
            self.refresh_balance(CashRegisterKind::Major).await;
            return Err(err);
        }

        info!(amount = %amount, "Transfer to caja menor completed");
        self.notifier.notify(Notice::success(
            format!("{} transferred to caja menor", amount),
            self.ctx.success_notice,
        ));
        self.refresh(CashRegisterKind::Major).await;
        self.refresh(CashRegisterKind::Minor).await;
        self.position = None;
        Ok(())
    }

    // =========================================================================
    // Daily position
    // =========================================================================

    /// Fetches everything the position of `date` needs and computes it.
    pub async fn load_position(&mut self, date: NaiveDate) -> &DailyCashPosition {
        let minor_balance = self.refresh_balance(CashRegisterKind::Minor).await;

        let total_sales = match self.backend.total_sales_for(date).await {
            Ok(total) => total,
            Err(e) => {
                warn!(%date, error = %e, "Could not load total sales, using 0");
                self.notifier.notify(Notice::error(
                    e.user_message("Could not load the day's sales"),
                ));
                Money::zero()
            }
        };

        let movements = movement::list_for_date(self.backend, self.notifier, date).await;

        let position = DailyCashPosition::compute(date, minor_balance, total_sales, &movements);
        debug!(
            %date,
            income = %position.income,
            expenses = %position.expenses,
            "Daily position computed"
        );
        self.position.insert(position)
    }

    /// Switches the business day, re-fetching only when it changed.
    pub async fn change_date(&mut self, date: NaiveDate) -> &DailyCashPosition {
        let current = self.position.as_ref().map(|p| p.date);
        if current != Some(date) {
            self.load_position(date).await;
        }
        self.position
            .get_or_insert_with(|| DailyCashPosition::compute(date, Money::zero(), Money::zero(), &[]))
    }

    /// Balance caja menor would have after closing today.
    pub fn closing_preview(&self) -> Option<Money> {
        let previous = self.minor.last_closing_value.unwrap_or(self.minor.balance);
        self.position.as_ref().map(|p| p.closing_preview(previous))
    }

    fn reject(&self, err: PosError) -> PosError {
        warn!(error = %err, "Cash operation rejected");
        self.notifier.notify(Notice::error(&err.message));
        err
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
