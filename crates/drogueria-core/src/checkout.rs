//! # Checkout Workflow
//!
//! The pure half of sale submission: phases, the client form, tender parsing
//! and the sale draft. The network half lives in `apps/caja`.
//!
//! ## Phases
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Idle ──begin()──► CollectingCart ◄──────────────────────────────┐     │
//! │                          │                                        │     │
//! │                     validate()                                    │     │
//! │                          │                                        │     │
//! │                          ▼          form invalid / empty cart     │     │
//! │                    ValidatingForm ───────────────────────────────►│     │
//! │                          │                                        │     │
//! │                          ▼          cancel / bad tender           │     │
//! │                  PromptingPayment ───────────────────────────────►│     │
//! │                          │                                        │     │
//! │                   accept_tender()                                 │     │
//! │                          ▼                                        │     │
//! │                     Submitting ──complete()── cart reset ────────►│     │
//! │                          │                                        │     │
//! │                          └──────fail()──── cart kept ────────────►┘     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any other call returns [`CoreError::InvalidTransition`] and leaves the
//! phase unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult, TenderError, ValidationError};
use crate::money::{Money, Quantity};
use crate::types::Client;
use crate::validation::{validate_client_id, validate_required};

// =============================================================================
// Phase
// =============================================================================

/// Where a checkout session currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CheckoutPhase {
    Idle,
    CollectingCart,
    ValidatingForm,
    PromptingPayment,
    Submitting,
}

impl Default for CheckoutPhase {
    fn default() -> Self {
        CheckoutPhase::Idle
    }
}

impl fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CheckoutPhase::Idle => "idle",
            CheckoutPhase::CollectingCart => "collecting the cart",
            CheckoutPhase::ValidatingForm => "validating the client form",
            CheckoutPhase::PromptingPayment => "waiting for payment",
            CheckoutPhase::Submitting => "submitting",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Client Form
// =============================================================================

/// Fields of the client form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ClientField {
    Id,
    Name,
    Address,
    Phone,
    Email,
}

impl ClientField {
    pub const ALL: [ClientField; 5] = [
        ClientField::Id,
        ClientField::Name,
        ClientField::Address,
        ClientField::Phone,
        ClientField::Email,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            ClientField::Id => "client id",
            ClientField::Name => "name",
            ClientField::Address => "address",
            ClientField::Phone => "phone",
            ClientField::Email => "email",
        }
    }
}

/// The client section of the checkout screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ClientForm {
    /// Cédula.
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    touched: Vec<ClientField>,
    /// Lookup failures attached to a field, e.g. an unknown cédula.
    #[serde(default)]
    errors: Vec<(ClientField, String)>,
}

impl ClientForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// A form pre-filled from a client found by cédula.
    pub fn from_client(client: &Client) -> Self {
        ClientForm {
            id: client.id.clone(),
            name: client.name.clone(),
            address: client.address.clone(),
            phone: client.phone.clone().unwrap_or_default(),
            email: client.email.clone().unwrap_or_default(),
            touched: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Checks the required fields.
    ///
    /// Every missing field is listed in one [`ValidationError::IncompleteForm`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        let missing: Vec<String> = [
            (ClientField::Id, &self.id),
            (ClientField::Name, &self.name),
            (ClientField::Address, &self.address),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field.label().to_string())
        .collect();

        if !missing.is_empty() {
            return Err(ValidationError::IncompleteForm { fields: missing });
        }

        validate_client_id(&self.id)?;
        validate_required(ClientField::Name.label(), &self.name, 200)?;
        validate_required(ClientField::Address.label(), &self.address, 200)?;
        Ok(())
    }

    pub fn touch(&mut self, field: ClientField) {
        if !self.touched.contains(&field) {
            self.touched.push(field);
        }
    }

    /// Marks every field as touched so the UI shows every error at once.
    pub fn mark_all_touched(&mut self) {
        for field in ClientField::ALL {
            self.touch(field);
        }
    }

    pub fn is_touched(&self, field: ClientField) -> bool {
        self.touched.contains(&field)
    }

    /// Attaches an error to `field` and marks it touched so it shows.
    pub fn set_error(&mut self, field: ClientField, message: impl Into<String>) {
        self.clear_error(field);
        self.errors.push((field, message.into()));
        self.touch(field);
    }

    pub fn clear_error(&mut self, field: ClientField) {
        self.errors.retain(|(f, _)| *f != field);
    }

    pub fn error(&self, field: ClientField) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, message)| message.as_str())
    }

    /// Empties the form after a completed sale.
    pub fn clear(&mut self) {
        *self = ClientForm::default();
    }

    /// The client record this form describes.
    pub fn to_client(&self) -> Client {
        let optional = |s: &str| {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        };
        Client {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            phone: optional(&self.phone),
            email: optional(&self.email),
        }
    }
}

// =============================================================================
// Tender
// =============================================================================

/// An accepted cash payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Tender {
    pub tendered: Money,
    pub change: Money,
}

/// Reads the "amount received" prompt.
///
/// Accepts formatted input ("30,000", "$ 30000") and fractional input, which
/// is floored to whole pesos before comparing with the total.
///
/// ```rust
/// use drogueria_core::checkout::parse_tender;
/// use drogueria_core::{Money, TenderError};
///
/// let tender = parse_tender("30,000", Money::from_pesos(25_000)).unwrap();
/// assert_eq!(tender.change.pesos(), 5_000);
///
/// assert_eq!(parse_tender("", Money::from_pesos(1)), Err(TenderError::Missing));
/// ```
pub fn parse_tender(raw: &str, total: Money) -> Result<Tender, TenderError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TenderError::Missing);
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    let tendered = cleaned
        .parse::<f64>()
        .ok()
        .and_then(Money::floor_from_f64)
        .ok_or(TenderError::NotNumeric)?;

    if tendered < total {
        return Err(TenderError::Insufficient { tendered, total });
    }

    Ok(Tender {
        tendered,
        change: tendered - total,
    })
}

// =============================================================================
// Sale Draft
// =============================================================================

/// One line of a sale as the backend receives it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLine {
    pub product_code: String,
    #[ts(type = "number")]
    pub quantity: Quantity,
    pub unit_name: String,
}

/// A sale ready to be posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleDraft {
    pub client_id: String,
    pub user_id: i64,
    pub discount: Money,
    pub tendered: Money,
    pub change: Money,
    pub lines: Vec<SaleLine>,
}

impl SaleDraft {
    /// Sum the backend will recompute from the lines, minus the discount.
    pub fn expected_total(&self) -> Money {
        self.tendered - self.change
    }
}

// =============================================================================
// Checkout
// =============================================================================

/// Checkout state for one cart session.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkout {
    phase: CheckoutPhase,
    form: ClientForm,
    tender: Option<Tender>,
    /// Id shown on screen before saving; the saved sale may get another.
    provisional_sale_id: Option<i64>,
    last_error: Option<String>,
}

impl Checkout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    pub fn form(&self) -> &ClientForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ClientForm {
        &mut self.form
    }

    pub fn tender(&self) -> Option<Tender> {
        self.tender
    }

    pub fn provisional_sale_id(&self) -> Option<i64> {
        self.provisional_sale_id
    }

    pub fn set_provisional_sale_id(&mut self, id: Option<i64>) {
        self.provisional_sale_id = id;
    }

    /// Message of the last failed step, cleared when a new attempt starts.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn expect_phase(&self, expected: CheckoutPhase, action: &str) -> CoreResult<()> {
        if self.phase != expected {
            return Err(CoreError::InvalidTransition {
                phase: self.phase.to_string(),
                action: action.to_string(),
            });
        }
        Ok(())
    }

    fn abort(&mut self, err: CoreError) -> CoreError {
        self.phase = CheckoutPhase::CollectingCart;
        self.tender = None;
        self.last_error = Some(err.to_string());
        err
    }

    /// Opens the session. Calling it on an open session is a no-op.
    pub fn begin(&mut self) -> CoreResult<()> {
        match self.phase {
            CheckoutPhase::Idle | CheckoutPhase::CollectingCart => {
                self.phase = CheckoutPhase::CollectingCart;
                Ok(())
            }
            _ => self.expect_phase(CheckoutPhase::Idle, "begin a sale"),
        }
    }

    /// Validates the form and the cart, then asks for payment.
    ///
    /// On failure every form field is marked touched and the session goes
    /// back to collecting the cart.
    pub fn validate(&mut self, cart: &Cart) -> CoreResult<()> {
        self.expect_phase(CheckoutPhase::CollectingCart, "check out")?;
        self.phase = CheckoutPhase::ValidatingForm;
        self.last_error = None;

        if let Err(err) = self.form.validate() {
            self.form.mark_all_touched();
            return Err(self.abort(err.into()));
        }

        if cart.is_empty() {
            return Err(self.abort(CoreError::EmptyCart));
        }

        if cart.total().is_negative() {
            return Err(self.abort(CoreError::NegativeTotal {
                total: cart.real_total(),
                discount: cart.discount(),
            }));
        }

        self.phase = CheckoutPhase::PromptingPayment;
        Ok(())
    }

    /// Reads the tendered amount. A rejected amount ends the attempt.
    pub fn accept_tender(&mut self, raw: &str, cart: &Cart) -> CoreResult<Tender> {
        self.expect_phase(CheckoutPhase::PromptingPayment, "accept payment")?;

        match parse_tender(raw, cart.total()) {
            Ok(tender) => {
                self.tender = Some(tender);
                self.phase = CheckoutPhase::Submitting;
                Ok(tender)
            }
            Err(err) => Err(self.abort(err.into())),
        }
    }

    /// Closes the payment prompt without paying.
    pub fn cancel_payment(&mut self) -> CoreResult<()> {
        self.expect_phase(CheckoutPhase::PromptingPayment, "cancel payment")?;
        self.phase = CheckoutPhase::CollectingCart;
        self.tender = None;
        Ok(())
    }

    /// Assembles the sale to post.
    pub fn build_sale(&self, cart: &Cart, user_id: i64) -> CoreResult<SaleDraft> {
        self.expect_phase(CheckoutPhase::Submitting, "build the sale")?;
        let tender = self.tender.ok_or_else(|| CoreError::InvalidTransition {
            phase: self.phase.to_string(),
            action: "build the sale without a tender".to_string(),
        })?;

        Ok(SaleDraft {
            client_id: self.form.id.trim().to_string(),
            user_id,
            discount: cart.discount(),
            tendered: tender.tendered,
            change: tender.change,
            lines: cart
                .lines()
                .iter()
                .map(|line| SaleLine {
                    product_code: line.product_code.clone(),
                    quantity: line.quantity,
                    unit_name: line.unit_name.clone(),
                })
                .collect(),
        })
    }

    /// Records a saved sale: resets the cart, clears the form and stores the
    /// next provisional id. Returns the change to announce.
    pub fn complete(&mut self, cart: &mut Cart, next_sale_id: Option<i64>) -> CoreResult<Money> {
        self.expect_phase(CheckoutPhase::Submitting, "complete the sale")?;
        let change = self.tender.map(|t| t.change).unwrap_or_default();

        cart.reset();
        self.form.clear();
        self.tender = None;
        self.last_error = None;
        self.provisional_sale_id = next_sale_id;
        self.phase = CheckoutPhase::CollectingCart;
        Ok(change)
    }

    /// Records a failed submission. Cart and form stay as they were.
    pub fn fail(&mut self, message: impl Into<String>) -> CoreResult<()> {
        self.expect_phase(CheckoutPhase::Submitting, "fail the sale")?;
        self.phase = CheckoutPhase::CollectingCart;
        self.tender = None;
        self.last_error = Some(message.into());
        Ok(())
    }

    /// Drops the session back to idle (e.g. the operator logs out).
    pub fn close(&mut self) {
        self.phase = CheckoutPhase::Idle;
        self.tender = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaxRate;

    fn filled_form() -> ClientForm {
        ClientForm {
            id: "222222222222".into(),
            name: "Consumidor final".into(),
            address: "Calle 1 # 2-3".into(),
            ..ClientForm::default()
        }
    }

    fn cart_of(total: i64) -> Cart {
        let mut cart = Cart::new(TaxRate::default());
        cart.add_or_increment("P1", "Producto 1", "Unidad", Quantity::from_units(1), Money::from_pesos(total))
            .unwrap();
        cart
    }

    fn ready_checkout() -> Checkout {
        let mut checkout = Checkout::new();
        checkout.begin().unwrap();
        *checkout.form_mut() = filled_form();
        checkout
    }

    #[test]
    fn test_form_lists_every_missing_field() {
        let form = ClientForm {
            id: "123".into(),
            ..ClientForm::default()
        };
        match form.validate().unwrap_err() {
            ValidationError::IncompleteForm { fields } => {
                assert_eq!(fields, vec!["name".to_string(), "address".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_field_error_is_replaced_and_cleared() {
        let mut form = ClientForm::new();
        form.set_error(ClientField::Id, "Client not found: 999");
        form.set_error(ClientField::Id, "Client not found: 998");
        assert_eq!(form.error(ClientField::Id), Some("Client not found: 998"));
        assert!(form.is_touched(ClientField::Id));
        assert_eq!(form.error(ClientField::Name), None);

        form.clear_error(ClientField::Id);
        assert_eq!(form.error(ClientField::Id), None);
    }

    #[test]
    fn test_invalid_form_marks_all_touched_and_returns_to_cart() {
        let mut checkout = Checkout::new();
        checkout.begin().unwrap();
        let cart = cart_of(25_000);

        assert!(checkout.validate(&cart).is_err());
        assert_eq!(checkout.phase(), CheckoutPhase::CollectingCart);
        assert!(ClientField::ALL.iter().all(|f| checkout.form().is_touched(*f)));
        assert!(checkout.last_error().is_some());
    }

    #[test]
    fn test_empty_cart_is_rejected() {
        let mut checkout = ready_checkout();
        let err = checkout.validate(&Cart::default()).unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
        assert_eq!(checkout.phase(), CheckoutPhase::CollectingCart);
    }

    #[test]
    fn test_parse_tender_modes() {
        let total = Money::from_pesos(25_000);
        assert_eq!(parse_tender("  ", total), Err(TenderError::Missing));
        assert_eq!(parse_tender("veinte mil", total), Err(TenderError::NotNumeric));
        assert_eq!(
            parse_tender("20000", total),
            Err(TenderError::Insufficient {
                tendered: Money::from_pesos(20_000),
                total
            })
        );

        let tender = parse_tender("$ 30,000.75", total).unwrap();
        assert_eq!(tender.tendered.pesos(), 30_000);
        assert_eq!(tender.change.pesos(), 5_000);
    }

    #[test]
    fn test_exact_tender_gives_zero_change() {
        let tender = parse_tender("25000", Money::from_pesos(25_000)).unwrap();
        assert_eq!(tender.change, Money::zero());
    }

    #[test]
    fn test_insufficient_tender_aborts_to_cart() {
        let mut checkout = ready_checkout();
        let cart = cart_of(25_000);
        checkout.validate(&cart).unwrap();

        let err = checkout.accept_tender("20000", &cart).unwrap_err();
        assert!(matches!(err, CoreError::Tender(TenderError::Insufficient { .. })));
        assert_eq!(checkout.phase(), CheckoutPhase::CollectingCart);
        assert!(checkout.tender().is_none());
    }

    #[test]
    fn test_happy_path_builds_and_completes() {
        let mut checkout = ready_checkout();
        let mut cart = cart_of(25_000);
        checkout.validate(&cart).unwrap();
        checkout.accept_tender("30000", &cart).unwrap();

        let draft = checkout.build_sale(&cart, 7).unwrap();
        assert_eq!(draft.client_id, "222222222222");
        assert_eq!(draft.user_id, 7);
        assert_eq!(draft.change.pesos(), 5_000);
        assert_eq!(draft.expected_total().pesos(), 25_000);
        assert_eq!(draft.lines.len(), 1);
        assert_eq!(draft.lines[0].unit_name, "Unidad");

        let change = checkout.complete(&mut cart, Some(43)).unwrap();
        assert_eq!(change.pesos(), 5_000);
        assert!(cart.is_empty());
        assert_eq!(checkout.form().id, "");
        assert_eq!(checkout.provisional_sale_id(), Some(43));
        assert_eq!(checkout.phase(), CheckoutPhase::CollectingCart);
    }

    #[test]
    fn test_failed_submission_keeps_cart_and_form() {
        let mut checkout = ready_checkout();
        let cart = cart_of(25_000);
        checkout.validate(&cart).unwrap();
        checkout.accept_tender("30000", &cart).unwrap();

        checkout.fail("Stock insuficiente").unwrap();
        assert_eq!(checkout.phase(), CheckoutPhase::CollectingCart);
        assert_eq!(checkout.form().id, "222222222222");
        assert_eq!(cart.len(), 1);
        assert_eq!(checkout.last_error(), Some("Stock insuficiente"));
    }

    #[test]
    fn test_illegal_transitions() {
        let mut checkout = Checkout::new();
        let cart = cart_of(1_000);

        assert!(matches!(
            checkout.validate(&cart),
            Err(CoreError::InvalidTransition { .. })
        ));
        assert!(checkout.build_sale(&cart, 1).is_err());
        assert!(checkout.cancel_payment().is_err());
        assert_eq!(checkout.phase(), CheckoutPhase::Idle);
    }

    #[test]
    fn test_cancel_payment_returns_to_cart() {
        let mut checkout = ready_checkout();
        let cart = cart_of(1_000);
        checkout.validate(&cart).unwrap();
        checkout.cancel_payment().unwrap();
        assert_eq!(checkout.phase(), CheckoutPhase::CollectingCart);
    }

    #[test]
    fn test_form_round_trips_client() {
        let client = Client {
            id: "1020".into(),
            name: "Ana".into(),
            address: "Cra 5".into(),
            phone: None,
            email: Some("ana@example.com".into()),
        };
        assert_eq!(ClientForm::from_client(&client).to_client(), client);
    }
}
