/// Property-based tests for the totals engine and balance resolver
///
/// These tests check the reconciliation rules across randomly generated
/// tickets and tender mixes.
use proptest::prelude::*;
use rust_decimal::Decimal;
use till_core::{
    compute_totals, Balance, LineItem, Money, PaymentLedger, PaymentMethod, RoundingMode, TaxRate,
    MONEY_TOLERANCE,
};

// Strategy to generate an amount with up to three decimal places
fn amount_strategy(max_thousandths: i64) -> impl Strategy<Value = Money> {
    (0..=max_thousandths).prop_map(|m| Money::new(Decimal::new(m, 3)))
}

fn line_strategy() -> impl Strategy<Value = LineItem> {
    (any::<bool>(), 1i64..=20, amount_strategy(500_000), amount_strategy(20_000)).prop_map(
        |(is_service, qty, price, discount)| {
            let line = if is_service {
                LineItem::service("svc", "Service", qty, price)
            } else {
                LineItem::product("prd", "Product", qty, price)
            };
            line.with_discount(discount)
        },
    )
}

fn rounding_strategy() -> impl Strategy<Value = RoundingMode> {
    prop_oneof![
        Just(RoundingMode::None),
        Just(RoundingMode::Nearest5),
        Just(RoundingMode::Nearest10),
    ]
}

fn method_strategy() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![
        Just(PaymentMethod::Cash),
        Just(PaymentMethod::Card),
        Just(PaymentMethod::Voucher),
    ]
}

proptest! {
    #[test]
    fn test_totals_are_deterministic(
        lines in prop::collection::vec(line_strategy(), 0..10),
        discount in amount_strategy(50_000),
        bps in 0u32..=2500,
        tip in amount_strategy(50_000),
        rounding in rounding_strategy(),
    ) {
        let a = compute_totals(&lines, discount, TaxRate::from_bps(bps), tip, rounding);
        let b = compute_totals(&lines, discount, TaxRate::from_bps(bps), tip, rounding);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn test_tip_never_changes_tax(
        lines in prop::collection::vec(line_strategy(), 1..10),
        bps in 0u32..=2500,
        tip in amount_strategy(100_000),
    ) {
        let rate = TaxRate::from_bps(bps);
        let without = compute_totals(&lines, Money::zero(), rate, Money::zero(), RoundingMode::None);
        let with = compute_totals(&lines, Money::zero(), rate, tip, RoundingMode::None);

        prop_assert_eq!(without.tax, with.tax);
        prop_assert_eq!(with.total - without.total, tip);
    }

    #[test]
    fn test_discount_never_exceeds_subtotal(
        lines in prop::collection::vec(line_strategy(), 0..10),
        discount in amount_strategy(1_000_000),
    ) {
        let totals = compute_totals(&lines, discount, TaxRate::from_bps(825), Money::zero(), RoundingMode::None);
        prop_assert!(totals.discount <= totals.subtotal);
        prop_assert!(!totals.tax.is_negative());
        prop_assert!(!totals.total.is_negative());
    }

    #[test]
    fn test_rounding_moves_total_by_at_most_half_a_step(
        lines in prop::collection::vec(line_strategy(), 1..10),
        bps in 0u32..=2500,
    ) {
        let rate = TaxRate::from_bps(bps);
        let exact = compute_totals(&lines, Money::zero(), rate, Money::zero(), RoundingMode::None);
        let nearest_5 = compute_totals(&lines, Money::zero(), rate, Money::zero(), RoundingMode::Nearest5);
        let nearest_10 = compute_totals(&lines, Money::zero(), rate, Money::zero(), RoundingMode::Nearest10);

        prop_assert!((nearest_5.total - exact.total).abs() <= Money::new(Decimal::new(25, 3)));
        prop_assert!((nearest_10.total - exact.total).abs() <= Money::new(Decimal::new(5, 2)));
        prop_assert_eq!(nearest_5.tax, exact.tax);
    }

    #[test]
    fn test_balance_remaining_and_change_exclusive(
        total in amount_strategy(1_000_000),
        tenders in prop::collection::vec((method_strategy(), amount_strategy(500_000)), 0..6),
    ) {
        let mut ledger = PaymentLedger::new();
        for (method, amount) in tenders {
            ledger.add_payment(method, amount, None);
        }
        let balance = Balance::resolve(total, &ledger);

        prop_assert!(balance.remaining.is_zero() || balance.change.is_zero());
        prop_assert_eq!(balance.paid - balance.change + balance.remaining, total);
        prop_assert_eq!(balance.is_fully_paid, balance.remaining <= MONEY_TOLERANCE);
    }
}
