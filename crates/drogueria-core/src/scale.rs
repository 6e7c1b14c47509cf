//! # Weight Scale Input
//!
//! Turns the scale's serial text into readings and routes each reading to
//! whichever quantity field has focus.
//!
//! ## Frame Grammar
//! ```text
//!   [ST|US] [junk] [+|-] digits [.digits] [spaces] [kg|g|lb]
//!    │                                               │
//!    │  ST / missing → stable                        └─ missing → kg
//!    └─ US → unstable (still settling)
//!
//!   "ST,GS,+  1.234kg"  → 1.234 kg, stable
//!   "US  0.512 kg"      → 0.512 kg, unstable
//!   "0,750"             → 0.750 kg, stable
//! ```
//!
//! ## Routing
//! ```text
//!  reading ─► stable? ─no─► Ignored(Unstable)
//!               │yes
//!               ▼
//!   raw ≥ 0.01? ─no─► Ignored(BelowThreshold)
//!               │yes
//!               ▼
//!          focus? ─ none ─────────► Ignored(NoFocus)
//!               ├─ CartLine(key) ─► round 3 dp, Cart::set_quantity (clamps)
//!               └─ PendingForm ───► no product selected? Ignored(NoSelection)
//!                                   else round 2 dp, clamp to unit stock
//! ```
//!
//! The noise threshold applies to the number the scale printed, before any
//! unit conversion, so `"5 g"` passes and becomes 0.005 kg.

use serde::Serialize;

use crate::cart::{Cart, LineKey};
use crate::money::Quantity;

const POUND_IN_KG: f64 = 0.453_592_37;

// =============================================================================
// Readings
// =============================================================================

/// Unit printed by the scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightUnit {
    Kg,
    G,
    Lb,
}

/// One parsed scale frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleReading {
    /// Weight in `unit`, rounded to 3 decimals.
    pub weight: f64,
    pub unit: WeightUnit,
    pub stable: bool,
}

impl ScaleReading {
    pub fn kilograms(&self) -> f64 {
        match self.unit {
            WeightUnit::Kg => self.weight,
            WeightUnit::G => self.weight / 1000.0,
            WeightUnit::Lb => self.weight * POUND_IN_KG,
        }
    }

    /// Weight in kilograms as a quantity (3 decimals).
    pub fn quantity(&self) -> Quantity {
        Quantity::from_f64(self.kilograms())
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Parses a single frame (already split from the stream).
///
/// Returns `None` when the frame holds no number.
pub fn parse_frame(frame: &str) -> Option<ScaleReading> {
    let cleaned: String = frame
        .chars()
        .filter(|c| !c.is_control() && *c != '(' && *c != ')')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    let upper = cleaned.to_ascii_uppercase();
    let (stable, rest) = if upper.starts_with("US") {
        (false, &cleaned[2..])
    } else if upper.starts_with("ST") {
        (true, &cleaned[2..])
    } else {
        (true, cleaned)
    };

    let start = rest.find(|c: char| c.is_ascii_digit() || c == '-' || c == '+')?;
    let mut chars = rest[start..].char_indices().peekable();
    let mut number = String::new();

    if let Some(&(_, sign)) = chars.peek() {
        if sign == '-' || sign == '+' {
            number.push(sign);
            chars.next();
            while matches!(chars.peek(), Some(&(_, ' '))) {
                chars.next();
            }
        }
    }

    let mut digits = 0;
    while let Some(&(_, c)) = chars.peek() {
        if c.is_ascii_digit() {
            number.push(c);
            digits += 1;
            chars.next();
        } else {
            break;
        }
    }
    if digits == 0 {
        return None;
    }

    // fraction only counts if at least one digit follows the dot
    let tail: String = chars.clone().map(|(_, c)| c).collect();
    let mut tail = tail.as_str();
    if let Some(after_dot) = tail.strip_prefix('.') {
        let frac_len = after_dot
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(after_dot.len());
        if frac_len > 0 {
            number.push('.');
            number.push_str(&after_dot[..frac_len]);
            tail = &after_dot[frac_len..];
        }
    }

    let weight: f64 = number.parse().ok()?;
    let unit = parse_unit(tail.trim_start_matches(' '));

    Some(ScaleReading {
        weight: round3(weight),
        unit,
        stable,
    })
}

fn parse_unit(text: &str) -> WeightUnit {
    let lower = text.to_ascii_lowercase();
    if lower.starts_with("kg") {
        WeightUnit::Kg
    } else if lower.starts_with('g') {
        WeightUnit::G
    } else if lower.starts_with("lb") {
        WeightUnit::Lb
    } else {
        WeightUnit::Kg
    }
}

/// Accumulates raw serial chunks and yields complete frames.
///
/// Frames end at `\r`, `\n` or ETX (`0x03`); a trailing partial frame is
/// kept for the next chunk.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    pending: String,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) -> Vec<ScaleReading> {
        self.pending.push_str(chunk);

        let is_terminator = |c: char| c == '\r' || c == '\n' || c == '\x03';
        let Some(last) = self.pending.rfind(is_terminator) else {
            return Vec::new();
        };

        let complete: String = self.pending.drain(..=last).collect();
        complete
            .split(is_terminator)
            .filter(|f| !f.trim().is_empty())
            .filter_map(parse_frame)
            .collect()
    }

    /// Drops any partial frame (e.g. after a reconnect).
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

// =============================================================================
// Focus Routing
// =============================================================================

/// Which quantity field receives scale readings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FocusTarget {
    CartLine(LineKey),
    PendingForm,
}

/// Last-focus-wins tracker; at most one target at a time.
#[derive(Debug, Default)]
pub struct FocusTracker {
    current: Option<FocusTarget>,
}

impl FocusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&mut self, target: FocusTarget) {
        self.current = Some(target);
    }

    /// Clears focus only if `target` still holds it.
    pub fn blur(&mut self, target: &FocusTarget) {
        if self.current.as_ref() == Some(target) {
            self.current = None;
        }
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    pub fn current(&self) -> Option<&FocusTarget> {
        self.current.as_ref()
    }
}

/// Quantity field of the "add product" form, before the line exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingAdd {
    /// False until a product's units of sale are loaded into the form.
    pub selected: bool,
    pub quantity: Quantity,
    /// Stock of the unit currently selected in the form.
    pub available: Option<Quantity>,
}

/// Why a reading changed nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    Unstable,
    BelowThreshold,
    NoFocus,
    NoSelection,
    LineGone,
}

/// What a reading did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadingOutcome {
    CartLine { key: LineKey, quantity: Quantity },
    PendingForm { quantity: Quantity },
    Ignored(IgnoreReason),
}

/// Applies a reading to the focused field.
pub fn apply_reading(
    focus: &FocusTracker,
    cart: &mut Cart,
    pending: &mut PendingAdd,
    reading: &ScaleReading,
) -> ReadingOutcome {
    if !reading.stable {
        return ReadingOutcome::Ignored(IgnoreReason::Unstable);
    }

    if !reading.weight.is_finite() || reading.weight < Quantity::MIN_READING.to_f64() {
        return ReadingOutcome::Ignored(IgnoreReason::BelowThreshold);
    }

    match focus.current() {
        None => ReadingOutcome::Ignored(IgnoreReason::NoFocus),
        Some(FocusTarget::CartLine(key)) => {
            match cart.set_quantity(key, reading.quantity()) {
                Ok(applied) => ReadingOutcome::CartLine {
                    key: key.clone(),
                    quantity: applied,
                },
                Err(_) => ReadingOutcome::Ignored(IgnoreReason::LineGone),
            }
        }
        Some(FocusTarget::PendingForm) if !pending.selected => {
            ReadingOutcome::Ignored(IgnoreReason::NoSelection)
        }
        Some(FocusTarget::PendingForm) => {
            let quantity = reading
                .quantity()
                .round_to(2)
                .clamp_to(pending.available);
            pending.quantity = quantity;
            ReadingOutcome::PendingForm { quantity }
        }
    }
}
