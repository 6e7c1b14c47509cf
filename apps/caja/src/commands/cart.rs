//! # Cart Commands
//!
//! Product selection and adding lines, with the backend lookups they need.
//!
//! ```text
//! scan "P1" ──► resolve_product ── no exact match ──► ProductNotFound
//!                     │                               (selection cleared)
//!                     ▼
//!               select_product ──► units of sale ──► add_selected
//! ```

use tracing::{debug, warn};

use drogueria_core::{AddOutcome, CoreError, ProductSummary, UnitOfSale};
use drogueria_http::{HttpResult, ProductBackend};

use crate::commands::cancellable;
use crate::error::{PosError, PosResult};
use crate::notify::{Notice, Notifier};
use crate::state::{CartSession, SelectionOutcome};

/// Finds the product whose code is exactly `code`.
///
/// Answers come from the session cache first; a miss fetches the product
/// list once and caches it. An unknown code clears the active selection.
pub async fn resolve_product<B, N>(
    session: &mut CartSession,
    backend: &B,
    notifier: &N,
    code: &str,
) -> PosResult<ProductSummary>
where
    B: ProductBackend,
    N: Notifier,
{
    let code = code.trim();
    if code.is_empty() {
        return Err(PosError::validation("Enter a product code"));
    }

    if let Some(product) = session.cached_product(code) {
        debug!(product_code = code, "Product from session cache");
        return Ok(product.clone());
    }

    let token = session.cancellation();
    let products = match cancellable(&token, backend.list_products()).await? {
        Ok(products) => products,
        Err(e) => {
            let err = PosError::from_backend(e, "Could not load the products");
            notifier.notify(Notice::error(&err.message));
            return Err(err);
        }
    };

    let found = products.iter().find(|p| p.code == code).cloned();
    session.remember_products(products);

    match found {
        Some(product) => Ok(product),
        None => {
            session.clear_selection();
            let err: PosError = CoreError::ProductNotFound(code.to_string()).into();
            notifier.notify(Notice::error(&err.message));
            Err(err)
        }
    }
}

/// Resolves a scanned or typed code and selects the product.
pub async fn scan_product<B, N>(
    session: &mut CartSession,
    backend: &B,
    notifier: &N,
    code: &str,
) -> PosResult<SelectionOutcome>
where
    B: ProductBackend,
    N: Notifier,
{
    let product = resolve_product(session, backend, notifier, code).await?;
    select_product(session, backend, notifier, &product.code, &product.name).await
}

/// Loads the units of sale of `product_code` and makes them the active
/// selection, unless another selection started in the meantime.
pub async fn select_product<B, N>(
    session: &mut CartSession,
    backend: &B,
    notifier: &N,
    product_code: &str,
    product_name: &str,
) -> PosResult<SelectionOutcome>
where
    B: ProductBackend,
    N: Notifier,
{
    let ticket = session.begin_selection();

    let units = match session.cached_units(product_code) {
        Some(units) => {
            debug!(product_code, "Units of sale from session cache");
            units
        }
        None => {
            let token = session.cancellation();
            match cancellable(&token, load_units(backend, product_code)).await? {
                Ok(units) => units,
                Err(e) => {
                    let err = PosError::from_backend(e, "Could not load the units of sale");
                    notifier.notify(Notice::error(&err.message));
                    return Err(err);
                }
            }
        }
    };

    if units.is_empty() {
        let err: PosError = CoreError::NoUnitsOfSale(product_code.to_string()).into();
        notifier.notify(Notice::error(&err.message));
        return Err(err);
    }

    Ok(session.complete_selection(ticket, product_code, product_name, units))
}

/// Fetches a catalog without touching any session; pair with
/// [`CartSession::begin_selection`] and [`CartSession::complete_selection`]
/// when several selections may be in flight.
pub async fn load_units<B: ProductBackend>(
    backend: &B,
    product_code: &str,
) -> HttpResult<Vec<UnitOfSale>> {
    backend.units_of_sale(product_code).await
}

/// Whether the backend flagged the product as removed. Answers are cached
/// for the session.
pub async fn check_removed<B: ProductBackend>(
    session: &mut CartSession,
    backend: &B,
    product_code: &str,
) -> PosResult<bool> {
    if let Some(removed) = session.cached_removed(product_code) {
        return Ok(removed);
    }

    let token = session.cancellation();
    let removed = cancellable(&token, backend.is_removed(product_code))
        .await?
        .map_err(|e| PosError::from_backend(e, "Could not check the product"))?;

    session.remember_removed(product_code, removed);
    Ok(removed)
}

/// Adds the pending quantity of the selected unit to the cart.
///
/// A removed product is refused. An increment above the known stock is
/// added anyway and reported with an error notice.
pub async fn add_selected<B, N>(
    session: &mut CartSession,
    backend: &B,
    notifier: &N,
) -> PosResult<AddOutcome>
where
    B: ProductBackend,
    N: Notifier,
{
    let product_code = session
        .catalog()
        .map(|c| c.product_code().to_string())
        .ok_or_else(|| PosError::validation("No product selected"))?;

    let removed = match check_removed(session, backend, &product_code).await {
        Ok(removed) => removed,
        Err(err) => {
            notifier.notify(Notice::error(&err.message));
            return Err(err);
        }
    };
    if removed {
        let err: PosError = CoreError::RemovedProduct(product_code).into();
        notifier.notify(Notice::error(&err.message));
        return Err(err);
    }

    let outcome = session.add_pending().map_err(|err| {
        notifier.notify(Notice::error(&err.message));
        err
    })?;

    if outcome.exceeds_available {
        warn!(
            session_id = %session.id(),
            product_code = %product_code,
            quantity = %outcome.quantity,
            "Cart line is above available stock"
        );
        notifier.notify(Notice::error(format!(
            "{} now exceeds the available stock",
            product_code
        )));
    }

    Ok(outcome)
}
