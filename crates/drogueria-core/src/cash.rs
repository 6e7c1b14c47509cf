//! # Cash Reconciliation
//!
//! Daily position, closing math and the client-side checks that run before
//! any close, transfer or movement reaches the backend.
//!
//! ## Daily Position
//! ```text
//! movements(date) ──┬── Σ Ingreso ──┬──► + total_sales ──► income
//!                   │               └──► − expenses ─────► external_total
//!                   └── Σ Egreso ───────────────────────► expenses
//!
//! minor_balance − total_sales ──────────────────────────► total_cash
//! ```
//!
//! ## Transfer (caja mayor → caja menor)
//! ```text
//! check_transfer(amount, major_balance)   no backend call on rejection
//!        │
//!        ▼
//! close caja mayor with `amount`  ──fail──► error, nothing changed
//!        │ ok
//!        ▼
//! Ingreso(amount, TRANSFER_REASON) ──fail──► partial failure, no rollback
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{
    CashRegisterKind, CashRegisterStatus, ClosingRecord, Movement, MovementKind, NewMovement, Page,
};
use crate::validation::{validate_positive_amount, validate_reason};

/// Reason recorded on the caja menor movement created by a transfer.
pub const TRANSFER_REASON: &str = "Traslado desde caja mayor";

/// Reason used when the operator leaves the field blank.
pub const DEFAULT_MOVEMENT_REASON: &str = "Sin descripción";

// =============================================================================
// Daily Position
// =============================================================================

/// Cash position of one business day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailyCashPosition {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub minor_balance: Money,
    pub total_sales: Money,
    /// Manual income of the day plus sales.
    pub income: Money,
    /// Manual expenses of the day.
    pub expenses: Money,
    /// Cash that is not sales money.
    pub total_cash: Money,
    /// Manual income minus expenses.
    pub external_total: Money,
}

impl DailyCashPosition {
    /// Computes the position from the day's movements.
    ///
    /// Movements dated on another day are skipped. Movements without a
    /// timestamp were fetched for `date` and are counted.
    pub fn compute(
        date: NaiveDate,
        minor_balance: Money,
        total_sales: Money,
        movements: &[Movement],
    ) -> Self {
        let on_date = movements
            .iter()
            .filter(|m| m.date().map_or(true, |d| d == date));

        let (manual_income, expenses) =
            on_date.fold((Money::zero(), Money::zero()), |(inc, exp), m| match m.kind {
                MovementKind::Ingreso => (inc + m.value, exp),
                MovementKind::Egreso => (inc, exp + m.value),
            });

        DailyCashPosition {
            date,
            minor_balance,
            total_sales,
            income: manual_income + total_sales,
            expenses,
            total_cash: minor_balance - total_sales,
            external_total: manual_income - expenses,
        }
    }

    /// Balance a close would leave, starting from `previous_balance`.
    pub fn closing_preview(&self, previous_balance: Money) -> Money {
        closing_balance(previous_balance, self.income, self.expenses)
    }
}

/// `previous + income − expenses`.
pub fn closing_balance(previous: Money, income: Money, expenses: Money) -> Money {
    previous + income - expenses
}

// =============================================================================
// Pre-checks
// =============================================================================

/// Validates a counted closing value.
pub fn check_close(counted: Money) -> CoreResult<Money> {
    Ok(validate_positive_amount("closing value", counted)?)
}

/// Validates a transfer against the last known caja mayor balance.
///
/// ```rust
/// use drogueria_core::cash::check_transfer;
/// use drogueria_core::{CoreError, Money};
///
/// let err = check_transfer(Money::from_pesos(10_000), Money::from_pesos(8_000)).unwrap_err();
/// assert!(matches!(err, CoreError::TransferExceedsBalance { .. }));
/// ```
pub fn check_transfer(amount: Money, major_balance: Money) -> CoreResult<Money> {
    validate_positive_amount("transfer", amount)?;

    if amount > major_balance {
        return Err(CoreError::TransferExceedsBalance {
            amount,
            balance: major_balance,
        });
    }

    Ok(amount)
}

/// Blank reasons become [`DEFAULT_MOVEMENT_REASON`].
pub fn normalize_reason(reason: &str) -> String {
    let reason = reason.trim();
    if reason.is_empty() {
        DEFAULT_MOVEMENT_REASON.to_string()
    } else {
        reason.to_string()
    }
}

/// Validates a manual movement and builds the request.
pub fn validate_movement(
    value: Money,
    kind: MovementKind,
    reason: &str,
) -> Result<NewMovement, ValidationError> {
    let value = validate_positive_amount("movement value", value)?;
    let reason = validate_reason(reason)?;

    Ok(NewMovement {
        value,
        kind,
        reason: normalize_reason(reason),
    })
}

/// The movement that completes a transfer on the caja menor side.
pub fn transfer_movement(amount: Money) -> NewMovement {
    NewMovement {
        value: amount,
        kind: MovementKind::Ingreso,
        reason: TRANSFER_REASON.to_string(),
    }
}

// =============================================================================
// Register State
// =============================================================================

/// What the client last saw of one cash register.
///
/// The backend owns the balance; this is only the latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CashRegisterState {
    pub kind: CashRegisterKind,
    pub balance: Money,
    pub last_closing_value: Option<Money>,
    pub history: Page<ClosingRecord>,
    pub status: Option<CashRegisterStatus>,
}

impl CashRegisterState {
    pub fn new(kind: CashRegisterKind) -> Self {
        CashRegisterState {
            kind,
            balance: Money::zero(),
            last_closing_value: None,
            history: Page::empty(0, 10),
            status: None,
        }
    }

    /// Stores a history page; its newest record becomes the last closing.
    pub fn set_history(&mut self, history: Page<ClosingRecord>) {
        if let Some(latest) = history
            .content
            .iter()
            .filter(|r| r.timestamp.is_some())
            .max_by_key(|r| r.timestamp)
            .or_else(|| history.content.first())
        {
            self.last_closing_value = Some(latest.value);
        }
        self.history = history;
    }

    pub fn record_close(&mut self, counted: Money) {
        self.last_closing_value = Some(counted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(s: &str) -> Option<NaiveDateTime> {
        Some(NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap())
    }

    fn movement(value: i64, kind: MovementKind, ts: Option<NaiveDateTime>) -> Movement {
        Movement {
            id: Some(1),
            value: Money::from_pesos(value),
            kind,
            reason: "x".into(),
            timestamp: ts,
        }
    }

    #[test]
    fn test_daily_position() {
        let movements = vec![
            movement(10_000, MovementKind::Ingreso, at("2026-03-14 08:00:00")),
            movement(3_000, MovementKind::Egreso, at("2026-03-14 12:30:00")),
            movement(2_000, MovementKind::Ingreso, None),
            movement(99_000, MovementKind::Ingreso, at("2026-03-13 18:00:00")),
        ];

        let position = DailyCashPosition::compute(
            date("2026-03-14"),
            Money::from_pesos(150_000),
            Money::from_pesos(80_000),
            &movements,
        );

        assert_eq!(position.income.pesos(), 92_000);
        assert_eq!(position.expenses.pesos(), 3_000);
        assert_eq!(position.total_cash.pesos(), 70_000);
        assert_eq!(position.external_total.pesos(), 9_000);
        assert_eq!(position.closing_preview(Money::from_pesos(1_000)).pesos(), 90_000);
    }

    #[test]
    fn test_position_with_no_movements() {
        let position = DailyCashPosition::compute(date("2026-03-14"), Money::zero(), Money::zero(), &[]);
        assert_eq!(position.income, Money::zero());
        assert_eq!(position.external_total, Money::zero());
    }

    #[test]
    fn test_check_close_rejects_non_positive() {
        assert!(check_close(Money::zero()).is_err());
        assert!(check_close(Money::from_pesos(-5)).is_err());
        assert_eq!(check_close(Money::from_pesos(5)).unwrap().pesos(), 5);
    }

    #[test]
    fn test_check_transfer_bounds() {
        let balance = Money::from_pesos(8_000);
        assert!(matches!(
            check_transfer(Money::zero(), balance),
            Err(CoreError::Validation(ValidationError::MustBePositive { .. }))
        ));
        assert!(matches!(
            check_transfer(Money::from_pesos(10_000), balance),
            Err(CoreError::TransferExceedsBalance { .. })
        ));
        assert_eq!(check_transfer(balance, balance).unwrap(), balance);
    }

    #[test]
    fn test_blank_reason_gets_default() {
        let movement = validate_movement(Money::from_pesos(500), MovementKind::Egreso, "   ").unwrap();
        assert_eq!(movement.reason, DEFAULT_MOVEMENT_REASON);
        assert!(validate_movement(Money::zero(), MovementKind::Egreso, "x").is_err());
    }

    #[test]
    fn test_transfer_movement_shape() {
        let movement = transfer_movement(Money::from_pesos(4_000));
        assert_eq!(movement.kind, MovementKind::Ingreso);
        assert_eq!(movement.reason, TRANSFER_REASON);
    }

    #[test]
    fn test_history_sets_last_closing_value() {
        let mut state = CashRegisterState::new(CashRegisterKind::Major);
        state.set_history(Page {
            content: vec![
                ClosingRecord { id: Some(1), timestamp: at("2026-03-12 20:00:00"), value: Money::from_pesos(100) },
                ClosingRecord { id: Some(2), timestamp: at("2026-03-13 20:00:00"), value: Money::from_pesos(200) },
            ],
            total_pages: 1,
            total_elements: 2,
            number: 0,
            size: 10,
        });
        assert_eq!(state.last_closing_value, Some(Money::from_pesos(200)));

        state.record_close(Money::from_pesos(300));
        assert_eq!(state.last_closing_value, Some(Money::from_pesos(300)));
    }
}
