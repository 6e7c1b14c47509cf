use drogueria_core::cash::check_transfer;
use drogueria_core::{Cart, CoreError, LineKey, Money, Quantity, TaxRate, UnitOfSale};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add { product: usize, unit: usize, milli: i64 },
    SetQuantity { product: usize, unit: usize, milli: i64 },
    SetUnit { product: usize, from: usize, to: usize },
    Remove { product: usize, unit: usize },
    Discount(i64),
    CancelDiscount,
}

const PRODUCTS: [&str; 3] = ["P1", "P2", "P3"];
const UNITS: [(&str, i64, i64); 3] = [("Unidad", 1_500, 12), ("Blister", 9_000, 4), ("Caja", 52_000, 1)];

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..3usize, 0..3usize, 1..20_000i64).prop_map(|(product, unit, milli)| Op::Add { product, unit, milli }),
        (0..3usize, 0..3usize, -5_000..40_000i64)
            .prop_map(|(product, unit, milli)| Op::SetQuantity { product, unit, milli }),
        (0..3usize, 0..3usize, 0..3usize).prop_map(|(product, from, to)| Op::SetUnit { product, from, to }),
        (0..3usize, 0..3usize).prop_map(|(product, unit)| Op::Remove { product, unit }),
        (-1_000..200_000i64).prop_map(Op::Discount),
        Just(Op::CancelDiscount),
    ]
}

fn units() -> Vec<UnitOfSale> {
    UNITS
        .iter()
        .map(|(name, price, available)| UnitOfSale {
            name: (*name).to_string(),
            purchase_price: Money::from_pesos(price / 2),
            sale_price: Money::from_pesos(*price),
            available: Quantity::from_units(*available),
            min_stock: Quantity::zero(),
            active: true,
        })
        .collect()
}

fn stocked_cart() -> Cart {
    let mut cart = Cart::new(TaxRate::from_bps(1900));
    for code in PRODUCTS {
        cart.register_units(code, units());
    }
    cart
}

fn key(product: usize, unit: usize) -> LineKey {
    LineKey::new(PRODUCTS[product], UNITS[unit].0)
}

fn run(cart: &mut Cart, op: &Op) {
    match op {
        Op::Add { product, unit, milli } => {
            let (name, price, _) = UNITS[*unit];
            let _ = cart.add_or_increment(
                PRODUCTS[*product],
                PRODUCTS[*product],
                name,
                Quantity::from_milli(*milli),
                Money::from_pesos(price),
            );
        }
        Op::SetQuantity { product, unit, milli } => {
            let _ = cart.set_quantity(&key(*product, *unit), Quantity::from_milli(*milli));
        }
        Op::SetUnit { product, from, to } => {
            let _ = cart.set_unit(&key(*product, *from), UNITS[*to].0);
        }
        Op::Remove { product, unit } => {
            let _ = cart.remove(&key(*product, *unit));
        }
        Op::Discount(amount) => {
            let _ = cart.apply_discount(Money::from_pesos(*amount));
        }
        Op::CancelDiscount => {
            cart.cancel_discount();
        }
    }
}

proptest! {
    /// Subtotal is the sum of line totals and total is subtotal minus discount.
    #[test]
    fn cart_totals_match_lines(ops in prop::collection::vec(op(), 0..40)) {
        let mut cart = stocked_cart();
        for op in &ops {
            run(&mut cart, op);

            let expected: Money = cart.lines().iter().map(|l| l.unit_price.multiply_quantity(l.quantity)).sum();
            prop_assert_eq!(cart.subtotal(), expected);
            prop_assert_eq!(cart.total(), cart.subtotal() - cart.discount());
            prop_assert!(cart.total() >= Money::zero());
            prop_assert!(cart.lines().iter().all(|l| l.quantity.is_positive()));
        }
    }

    /// A set quantity never exceeds the unit's stock and is never negative.
    #[test]
    fn set_quantity_is_clamped(
        setup in prop::collection::vec(op(), 0..10),
        product in 0..3usize,
        unit in 0..3usize,
        milli in -100_000..100_000i64,
    ) {
        let mut cart = stocked_cart();
        for op in &setup {
            run(&mut cart, op);
        }
        let (name, price, available) = UNITS[unit];
        cart.add_or_increment(PRODUCTS[product], PRODUCTS[product], name, Quantity::from_milli(1), Money::from_pesos(price))
            .unwrap();

        let applied = cart.set_quantity(&key(product, unit), Quantity::from_milli(milli)).unwrap();
        prop_assert!(applied >= Quantity::zero());
        prop_assert!(applied <= Quantity::from_units(available));

        match cart.line(&key(product, unit)) {
            Some(line) => prop_assert_eq!(line.quantity, applied),
            None => prop_assert!(applied.is_zero()),
        }
    }

    /// A discount never drives the total below zero; an oversized one changes nothing.
    #[test]
    fn discount_never_negative(price in 1..100_000i64, units in 1..20i64, amount in -10_000..3_000_000i64) {
        let mut cart = Cart::default();
        cart.add_or_increment("P1", "P1", "Unidad", Quantity::from_units(units), Money::from_pesos(price)).unwrap();
        let before = cart.total();

        let result = cart.apply_discount(Money::from_pesos(amount));
        prop_assert!(cart.total() >= Money::zero());

        if amount > cart.real_total().pesos() {
            let is_negative_total = matches!(result, Err(CoreError::NegativeTotal { .. }));
            prop_assert!(is_negative_total);
            prop_assert_eq!(cart.total(), before);
        }
    }

    /// Applying then cancelling a discount restores the previous total.
    #[test]
    fn discount_round_trip(price in 1..100_000i64, units in 1..20i64, fraction in 1..=100i64) {
        let mut cart = Cart::default();
        cart.add_or_increment("P1", "P1", "Unidad", Quantity::from_units(units), Money::from_pesos(price)).unwrap();
        let before = cart.total();
        let discount = Money::from_pesos((before.pesos() * fraction / 100).max(1));

        cart.apply_discount(discount).unwrap();
        prop_assert_eq!(cart.cancel_discount(), before);
        prop_assert_eq!(cart.total(), before);
    }

    /// A transfer outside (0, balance] is rejected.
    #[test]
    fn transfer_is_bounded(amount in -50_000..200_000i64, balance in 0..100_000i64) {
        let result = check_transfer(Money::from_pesos(amount), Money::from_pesos(balance));
        if amount <= 0 || amount > balance {
            prop_assert!(result.is_err());
        } else {
            prop_assert_eq!(result.unwrap().pesos(), amount);
        }
    }
}
