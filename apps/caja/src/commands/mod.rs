//! # Commands Module
//!
//! The workflows the operator triggers. Each one is generic over the
//! backend traits of `drogueria-http`, so the same code runs against the
//! real API and against in-memory fakes.
//!
//! ## Command Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Caja Commands                                   │
//! │                                                                         │
//! │  CART                        CHECKOUT                                  │
//! │  ──────────────────          ──────────────────                        │
//! │  resolve_product             submit_sale                               │
//! │  scan / select_product       refresh_next_sale_id                      │
//! │  add_selected                load_client / cancel_sale                 │
//! │                                                                         │
//! │  CASH (CashDesk)             MOVEMENTS                                 │
//! │  ──────────────────          ──────────────────                        │
//! │  refresh_balance             list_for_date                             │
//! │  close / history / status    create                                    │
//! │  transfer_major_to_minor     delete                                    │
//! │  load_position / change_date                                           │
//! │                                                                         │
//! │  SALES HISTORY                                                          │
//! │  ──────────────────                                                     │
//! │  completed_sales / search                                               │
//! │  sale_detail                                                            │
//! │  issue_electronic_invoice / electronic_invoices                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reads degrade to an empty value and a notice. Writes report the error
//! and leave local state as it was. Nothing is retried.

pub mod cart;
pub mod cash;
pub mod checkout;
pub mod movement;
pub mod sales;

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{PosError, PosResult};

/// Awaits `fut` unless `token` is cancelled first. A cancelled call's
/// response, if it ever arrives, is dropped.
pub(crate) async fn cancellable<F, T>(token: &CancellationToken, fut: F) -> PosResult<T>
where
    F: Future<Output = T>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(PosError::cancelled()),
        out = fut => Ok(out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cancelled_token_wins() {
        let token = CancellationToken::new();
        token.cancel();
        let result = cancellable(&token, async { 5 }).await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_live_token_passes_value() {
        let token = CancellationToken::new();
        assert_eq!(cancellable(&token, async { 5 }).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_cancel_during_wait() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let result = cancellable(&token, std::future::pending::<()>()).await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
