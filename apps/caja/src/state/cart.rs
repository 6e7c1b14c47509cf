//! # Cart Session
//!
//! One operator's sale in progress: the cart, the checkout state machine,
//! the product being selected and the scale focus. Owned by exactly one
//! caller; workflows take `&mut CartSession`.
//!
//! ## Selection Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Product Selection                                    │
//! │                                                                         │
//! │  scan "P1" ──► begin_selection() ──► ticket #7                         │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │       units of sale (cache or backend, raced against cancellation)     │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │  complete_selection(#7, ...) ── newer ticket issued? ──► Stale (drop)  │
//! │                       │                                                 │
//! │                       ▼                                                 │
//! │  catalog shown, cart learns the units, pending form gets unit stock    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Cancellation
//! Each session owns a `CancellationToken`. Closing or dropping the session
//! cancels it, so every backend call still in flight for this session
//! returns `Cancelled` and its response is ignored.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use drogueria_core::discount::parse_discount_input;
use drogueria_core::scale::{
    apply_reading, FocusTarget, FocusTracker, FrameBuffer, PendingAdd, ReadingOutcome,
    ScaleReading,
};
use drogueria_core::{
    AddOutcome, Cart, CartTotals, Checkout, CoreError, LineKey, Money, ProductSummary, Quantity,
    SelectionTicket, SelectionTracker, UnitCatalog, UnitOfSale,
};

use crate::config::CajaConfig;
use crate::error::{PosError, PosResult};
use crate::state::cache::LookupCache;
use crate::state::session::SessionContext;

/// What happened to a catalog that arrived for a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionOutcome {
    /// The catalog is now the active selection.
    Applied,
    /// A newer selection started while this one was loading.
    Stale,
}

/// Catalog caching settings for a session.
#[derive(Debug, Clone, Copy)]
pub struct CacheOptions {
    pub capacity: usize,
    pub cache_catalogs: bool,
}

impl Default for CacheOptions {
    fn default() -> Self {
        CacheOptions::from_config(&CajaConfig::default())
    }
}

impl CacheOptions {
    pub fn from_config(config: &CajaConfig) -> Self {
        CacheOptions {
            capacity: config.cache.capacity,
            cache_catalogs: config.cache.cache_catalogs,
        }
    }
}

#[derive(Debug)]
pub struct CartSession {
    id: Uuid,
    cart: Cart,
    checkout: Checkout,
    selections: SelectionTracker,
    catalog: Option<UnitCatalog>,
    catalogs: Option<LookupCache<String, Vec<UnitOfSale>>>,
    products: LookupCache<String, ProductSummary>,
    removed: LookupCache<String, bool>,
    focus: FocusTracker,
    pending: PendingAdd,
    frames: FrameBuffer,
    cancel: CancellationToken,
}

impl CartSession {
    pub fn new(session: &SessionContext, cache: CacheOptions) -> Self {
        let id = Uuid::new_v4();
        debug!(session_id = %id, cache_catalogs = cache.cache_catalogs, "Cart session opened");

        CartSession {
            id,
            cart: Cart::new(session.tax_rate),
            checkout: Checkout::new(),
            selections: SelectionTracker::new(),
            catalog: None,
            catalogs: cache
                .cache_catalogs
                .then(|| LookupCache::new(cache.capacity)),
            products: LookupCache::new(cache.capacity),
            removed: LookupCache::new(cache.capacity),
            focus: FocusTracker::new(),
            pending: PendingAdd::default(),
            frames: FrameBuffer::new(),
            cancel: CancellationToken::new(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Correlation id for logs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn cart_mut(&mut self) -> &mut Cart {
        &mut self.cart
    }

    pub fn totals(&self) -> CartTotals {
        self.cart.totals()
    }

    pub fn checkout(&self) -> &Checkout {
        &self.checkout
    }

    pub fn checkout_mut(&mut self) -> &mut Checkout {
        &mut self.checkout
    }

    /// Both halves at once, for steps that move the cart through checkout.
    pub fn parts_mut(&mut self) -> (&mut Cart, &mut Checkout) {
        (&mut self.cart, &mut self.checkout)
    }

    pub fn catalog(&self) -> Option<&UnitCatalog> {
        self.catalog.as_ref()
    }

    pub fn pending(&self) -> &PendingAdd {
        &self.pending
    }

    // =========================================================================
    // Cancellation
    // =========================================================================

    /// A child of the session token; cancelled when the session is.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancels in-flight calls and drops the checkout back to idle.
    pub fn close(&mut self) {
        debug!(session_id = %self.id, "Cart session closed");
        self.cancel.cancel();
        self.selections.invalidate();
        self.checkout.close();
    }

    // =========================================================================
    // Product selection
    // =========================================================================

    /// Starts a selection; any catalog still loading becomes stale.
    pub fn begin_selection(&mut self) -> SelectionTicket {
        self.selections.issue()
    }

    /// A product resolved earlier in this session.
    pub fn cached_product(&self, code: &str) -> Option<&ProductSummary> {
        self.products.get(&code.to_string())
    }

    /// Keeps resolved products for the next scan. The cache is bounded, so
    /// only the last `capacity` products of a long list stay.
    pub fn remember_products(&mut self, products: impl IntoIterator<Item = ProductSummary>) {
        for product in products {
            self.products.insert(product.code.clone(), product);
        }
    }

    /// Drops the active selection after a code that matched nothing.
    pub fn clear_selection(&mut self) {
        self.selections.invalidate();
        self.catalog = None;
        self.pending = PendingAdd::default();
    }

    /// Catalog from the session cache, when catalog caching is on.
    pub fn cached_units(&self, product_code: &str) -> Option<Vec<UnitOfSale>> {
        self.catalogs
            .as_ref()
            .and_then(|c| c.get(&product_code.to_string()))
            .cloned()
    }

    /// Applies a loaded catalog if `ticket` is still the latest selection.
    pub fn complete_selection(
        &mut self,
        ticket: SelectionTicket,
        product_code: &str,
        product_name: &str,
        units: Vec<UnitOfSale>,
    ) -> SelectionOutcome {
        if !self.selections.is_current(ticket) {
            debug!(
                session_id = %self.id,
                product_code,
                ticket = ticket.value(),
                "Discarding stale catalog"
            );
            return SelectionOutcome::Stale;
        }

        if let Some(cache) = self.catalogs.as_mut() {
            cache.insert(product_code.to_string(), units.clone());
        }
        self.cart.register_units(product_code, units.clone());

        let catalog = UnitCatalog::new(product_code, product_name, units);
        self.pending = PendingAdd {
            selected: true,
            quantity: Quantity::zero(),
            available: catalog.active_available(),
        };
        self.catalog = Some(catalog);
        SelectionOutcome::Applied
    }

    /// Switches the active unit of the selected product.
    pub fn select_unit(&mut self, index: usize) -> PosResult<UnitOfSale> {
        let catalog = self
            .catalog
            .as_mut()
            .ok_or_else(|| PosError::validation("No product selected"))?;
        let unit = catalog.select(index)?.clone();
        self.pending.available = Some(unit.available);
        self.pending.quantity = self.pending.quantity.clamp_to(Some(unit.available));
        Ok(unit)
    }

    /// Types a quantity into the pending form (clamped to the unit's stock).
    pub fn set_pending_quantity(&mut self, quantity: Quantity) -> Quantity {
        self.pending.quantity = quantity.clamp_to(self.pending.available);
        self.pending.quantity
    }

    /// Adds the pending quantity of the active unit to the cart.
    ///
    /// The caller checks the product is not removed first.
    pub fn add_pending(&mut self) -> PosResult<AddOutcome> {
        let catalog = self
            .catalog
            .as_ref()
            .ok_or_else(|| PosError::validation("No product selected"))?;
        let unit = catalog
            .active()
            .ok_or_else(|| CoreError::NoUnitsOfSale(catalog.product_code().to_string()))?;

        if self.cart.known_units(catalog.product_code()).is_empty() {
            self.cart
                .register_units(catalog.product_code(), catalog.units().to_vec());
        }

        let outcome = self.cart.add_or_increment(
            catalog.product_code(),
            catalog.product_name(),
            &unit.name,
            self.pending.quantity,
            unit.sale_price,
        )?;

        self.pending.quantity = Quantity::zero();
        Ok(outcome)
    }

    // =========================================================================
    // Removed-product answers
    // =========================================================================

    pub fn cached_removed(&self, product_code: &str) -> Option<bool> {
        self.removed.get(&product_code.to_string()).copied()
    }

    pub fn remember_removed(&mut self, product_code: &str, removed: bool) {
        self.removed.insert(product_code.to_string(), removed);
    }

    /// Forgets everything cached about a product (after a write touching it).
    pub fn invalidate_product(&mut self, product_code: &str) {
        let key = product_code.to_string();
        self.removed.invalidate(&key);
        self.products.invalidate(&key);
        if let Some(cache) = self.catalogs.as_mut() {
            cache.invalidate(&key);
        }
    }

    /// Drops every cached answer (stock changed after a sale).
    pub fn clear_caches(&mut self) {
        self.removed.clear();
        if let Some(cache) = self.catalogs.as_mut() {
            cache.clear();
        }
    }

    // =========================================================================
    // Discount
    // =========================================================================

    /// Applies the discount typed by the operator (`"5,000"`).
    pub fn apply_discount_input(&mut self, raw: &str) -> PosResult<Money> {
        Ok(self.cart.apply_discount(parse_discount_input(raw))?)
    }

    pub fn cancel_discount(&mut self) -> Money {
        self.cart.cancel_discount()
    }

    // =========================================================================
    // Scale
    // =========================================================================

    pub fn focus(&mut self, target: FocusTarget) {
        self.focus.focus(target);
    }

    pub fn blur(&mut self, target: &FocusTarget) {
        self.focus.blur(target);
    }

    pub fn focused(&self) -> Option<&FocusTarget> {
        self.focus.current()
    }

    pub fn apply_reading(&mut self, reading: &ScaleReading) -> ReadingOutcome {
        let outcome = apply_reading(&self.focus, &mut self.cart, &mut self.pending, reading);
        if let ReadingOutcome::CartLine { key, quantity } = &outcome {
            if quantity.is_zero() {
                self.focus.blur(&FocusTarget::CartLine(key.clone()));
            }
        }
        outcome
    }

    /// Feeds raw serial text from the scale and applies every complete frame.
    pub fn feed_scale(&mut self, chunk: &str) -> Vec<ReadingOutcome> {
        let readings = self.frames.push(chunk);
        readings.iter().map(|r| self.apply_reading(r)).collect()
    }

    /// Removes a line, dropping scale focus if it pointed at it.
    pub fn remove_line(&mut self, key: &LineKey) -> PosResult<()> {
        self.cart.remove(key)?;
        self.focus.blur(&FocusTarget::CartLine(key.clone()));
        Ok(())
    }
}

impl Drop for CartSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
