//! # Checkout Commands
//!
//! Takes a validated cart through payment and posts the sale.
//!
//! ## Submit Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         submit_sale                                     │
//! │                                                                         │
//! │  CollectingCart                                                         │
//! │       │ validate form + cart ── invalid ──► error notice (no request)  │
//! │       ▼                                                                 │
//! │  PromptingPayment                                                       │
//! │       │ parse tender ───────── refused ──► error notice (no request)   │
//! │       ▼                                                                 │
//! │  Submitting                                                             │
//! │       │ [recheck removed products]                                      │
//! │       │ POST /venta/guardar ── error ────► fail: cart + form kept      │
//! │       ▼                                                                 │
//! │  GET /venta/siguiente-id (best effort)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  complete: cart reset, form cleared, "Cambio: $ 5,000"                 │
//! │                                                                         │
//! │  Every await is raced against the session's cancellation token.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{info, warn};

use drogueria_core::{Client, ClientField, ClientForm, CoreError, Money};
use drogueria_http::{ClientBackend, ProductBackend, SaleBackend};

use crate::commands::cancellable;
use crate::error::{PosError, PosResult};
use crate::notify::{Notice, Notifier};
use crate::state::{CartSession, SessionContext};

/// What a successful submission produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    /// Id assigned by the backend, when it returned one.
    pub sale_id: Option<i64>,
    pub total: Money,
    pub tendered: Money,
    pub change: Money,
    /// Provisional id for the next sale.
    pub next_sale_id: Option<i64>,
}

/// Validates, takes payment and posts the sale.
///
/// Validation and tender errors never reach the backend. A backend failure
/// keeps the cart and the client form for another attempt.
pub async fn submit_sale<B, N>(
    session: &mut CartSession,
    ctx: &SessionContext,
    backend: &B,
    notifier: &N,
    tendered: &str,
) -> PosResult<SaleReceipt>
where
    B: SaleBackend + ProductBackend,
    N: Notifier,
{
    let session_id = session.id();

    let validated = {
        let (cart, checkout) = session.parts_mut();
        checkout
            .begin()
            .and_then(|_| checkout.validate(cart))
            .and_then(|_| checkout.accept_tender(tendered, cart))
    };
    let tender = match validated {
        Ok(tender) => tender,
        Err(err) => {
            let err = PosError::from(err);
            notifier.notify(Notice::error(&err.message));
            return Err(err);
        }
    };

    if ctx.recheck_removed_on_submit {
        if let Err(err) = recheck_removed(session, backend).await {
            return Err(fail_submission(session, notifier, err));
        }
    }

    let draft = session.checkout().build_sale(session.cart(), ctx.user_id)?;
    let total = session.cart().total();
    info!(
        session_id = %session_id,
        client = %draft.client_id,
        lines = draft.lines.len(),
        total = %total,
        "Submitting sale"
    );

    let token = session.cancellation();
    let saved = match cancellable(&token, backend.save_sale(&draft)).await {
        Ok(Ok(saved)) => saved,
        Ok(Err(e)) => {
            let err = PosError::from_backend(e, "The sale could not be saved");
            return Err(fail_submission(session, notifier, err));
        }
        Err(cancelled) => {
            // A closed session is already idle; only an open one goes back.
            session.checkout_mut().fail(&cancelled.message).ok();
            return Err(cancelled);
        }
    };

    let next_sale_id = match cancellable(&token, backend.next_sale_id()).await {
        Ok(Ok(id)) => Some(id),
        Ok(Err(e)) => {
            warn!(session_id = %session_id, error = %e, "Could not refresh the next sale id");
            None
        }
        Err(_) => None,
    };

    let change = {
        let (cart, checkout) = session.parts_mut();
        checkout.complete(cart, next_sale_id)?
    };
    session.clear_caches();

    info!(
        session_id = %session_id,
        sale_id = ?saved.id,
        change = %change,
        "Sale saved"
    );
    notifier.notify(Notice::success(
        format!("Cambio: {}", change),
        ctx.success_notice,
    ));

    Ok(SaleReceipt {
        sale_id: saved.id,
        total,
        tendered: tender.tendered,
        change,
        next_sale_id,
    })
}

fn fail_submission<N: Notifier>(session: &mut CartSession, notifier: &N, err: PosError) -> PosError {
    warn!(session_id = %session.id(), error = %err, "Sale not saved");
    session.checkout_mut().fail(&err.message).ok();
    notifier.notify(Notice::error(&err.message));
    err
}

/// Asks the backend again about every product in the cart.
async fn recheck_removed<B: ProductBackend>(
    session: &mut CartSession,
    backend: &B,
) -> PosResult<()> {
    let codes: BTreeSet<String> = session
        .cart()
        .lines()
        .iter()
        .map(|l| l.product_code.clone())
        .collect();

    let token = session.cancellation();
    for code in codes {
        let removed = cancellable(&token, backend.is_removed(&code))
            .await?
            .map_err(|e| PosError::from_backend(e, "Could not check the products"))?;
        session.remember_removed(&code, removed);
        if removed {
            return Err(CoreError::RemovedProduct(code).into());
        }
    }
    Ok(())
}

/// Refreshes the provisional id shown for the next sale. Failure leaves
/// the previous id.
pub async fn refresh_next_sale_id<B: SaleBackend>(
    session: &mut CartSession,
    backend: &B,
) -> Option<i64> {
    let token = session.cancellation();
    match cancellable(&token, backend.next_sale_id()).await {
        Ok(Ok(id)) => {
            session.checkout_mut().set_provisional_sale_id(Some(id));
        }
        Ok(Err(e)) => warn!(error = %e, "Could not load the next sale id"),
        Err(_) => {}
    }
    session.checkout().provisional_sale_id()
}

/// Fills the client form from the backend.
///
/// An unknown cédula stays in the form with a `ClientNotFound` error on the
/// id field, and the same error is returned.
pub async fn load_client<B: ClientBackend>(
    session: &mut CartSession,
    backend: &B,
    cedula: &str,
) -> PosResult<Client> {
    let cedula = cedula.trim();
    let token = session.cancellation();
    let found = cancellable(&token, backend.find_client(cedula))
        .await?
        .map_err(|e| PosError::from_backend(e, "Could not look up the client"))?;

    let form = session.checkout_mut().form_mut();
    match found {
        Some(client) => {
            *form = ClientForm::from_client(&client);
            Ok(client)
        }
        None => {
            let missing = CoreError::ClientNotFound(cedula.to_string());
            form.id = cedula.to_string();
            form.set_error(ClientField::Id, missing.to_string());
            Err(missing.into())
        }
    }
}

/// Puts the generic "consumidor final" client in an empty form.
pub fn use_default_client(session: &mut CartSession, ctx: &SessionContext) {
    let form = session.checkout_mut().form_mut();
    if form.id.trim().is_empty() {
        form.id = ctx.default_client_id.clone();
    }
    if form.name.trim().is_empty() {
        form.name = "Consumidor final".to_string();
    }
    if form.address.trim().is_empty() {
        form.address = "N/A".to_string();
    }
}

/// Cancels a saved sale.
pub async fn cancel_sale<B, N>(
    backend: &B,
    ctx: &SessionContext,
    notifier: &N,
    sale_id: i64,
) -> PosResult<bool>
where
    B: SaleBackend,
    N: Notifier,
{
    match backend.cancel_sale(sale_id).await {
        Ok(cancelled) => {
            info!(sale_id, cancelled, "Sale cancelled");
            notifier.notify(Notice::success(
                format!("Sale {} cancelled", sale_id),
                ctx.success_notice,
            ));
            Ok(cancelled)
        }
        Err(e) => {
            let err = PosError::from_backend(e, "The sale could not be cancelled");
            notifier.notify(Notice::error(&err.message));
            Err(err)
        }
    }
}
