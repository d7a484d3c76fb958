//! Order pricing rules: unit prices, line subtotals, shipping tiers and totals.

use rust_decimal::Decimal;
use serde::Serialize;

/// Currency amounts are kept at two decimal places.
const MONEY_SCALE: u32 = 2;

/// Flat-fee shipping that becomes free once the subtotal reaches a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingPolicy {
    free_shipping_threshold: Decimal,
    flat_fee: Decimal,
}

impl ShippingPolicy {
    pub fn new(free_shipping_threshold: Decimal, flat_fee: Decimal) -> Self {
        Self {
            free_shipping_threshold,
            flat_fee,
        }
    }

    pub fn free_shipping_threshold(&self) -> Decimal {
        self.free_shipping_threshold
    }

    pub fn flat_fee(&self) -> Decimal {
        self.flat_fee
    }

    /// Shipping charged for an order with the given subtotal.
    pub fn cost(&self, subtotal: Decimal) -> Decimal {
        if subtotal >= self.free_shipping_threshold {
            Decimal::ZERO
        } else {
            self.flat_fee
        }
    }
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self::new(Decimal::from(2000), Decimal::from(80))
    }
}

/// Base product price plus the variant's adjustment, if any.
pub fn unit_price(base_price: Decimal, variant_adjustment: Option<Decimal>) -> Decimal {
    (base_price + variant_adjustment.unwrap_or(Decimal::ZERO)).round_dp(MONEY_SCALE)
}

pub fn line_subtotal(unit_price: Decimal, quantity: i32) -> Decimal {
    unit_price * Decimal::from(quantity)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    pub fn from_line_subtotals<I>(line_subtotals: I, shipping: &ShippingPolicy) -> Self
    where
        I: IntoIterator<Item = Decimal>,
    {
        let subtotal: Decimal = line_subtotals.into_iter().sum();
        let shipping_cost = shipping.cost(subtotal);
        Self {
            subtotal,
            shipping_cost,
            total: subtotal + shipping_cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn two_items_below_threshold_pay_flat_fee() {
        let unit = unit_price(dec!(100), None);
        let totals =
            OrderTotals::from_line_subtotals([line_subtotal(unit, 2)], &ShippingPolicy::default());

        assert_eq!(totals.subtotal, dec!(200));
        assert_eq!(totals.shipping_cost, dec!(80));
        assert_eq!(totals.total, dec!(280));
    }

    #[test]
    fn order_above_threshold_ships_free() {
        let totals = OrderTotals::from_line_subtotals(
            [line_subtotal(dec!(2500), 1)],
            &ShippingPolicy::default(),
        );

        assert_eq!(totals.shipping_cost, Decimal::ZERO);
        assert_eq!(totals.total, dec!(2500));
    }

    #[test]
    fn threshold_is_inclusive() {
        let policy = ShippingPolicy::default();
        assert_eq!(policy.cost(dec!(2000)), Decimal::ZERO);
        assert_eq!(policy.cost(dec!(1999.99)), dec!(80));
    }

    #[test]
    fn variant_adjustment_is_added_to_base_price() {
        assert_eq!(unit_price(dec!(1200), Some(dec!(150.50))), dec!(1350.50));
        assert_eq!(unit_price(dec!(1200), Some(dec!(-200))), dec!(1000));
        assert_eq!(unit_price(dec!(99.999), None), dec!(100.00));
    }

    fn money() -> impl Strategy<Value = Decimal> {
        (0i64..500_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        #[test]
        fn subtotal_is_sum_of_lines(
            lines in prop::collection::vec((money(), 1i32..20), 1..10),
        ) {
            let subtotals: Vec<Decimal> = lines
                .iter()
                .map(|(price, qty)| line_subtotal(unit_price(*price, None), *qty))
                .collect();
            let expected: Decimal = subtotals.iter().copied().sum();

            let totals = OrderTotals::from_line_subtotals(subtotals, &ShippingPolicy::default());
            prop_assert_eq!(totals.subtotal, expected);
            prop_assert_eq!(totals.total, totals.subtotal + totals.shipping_cost);
        }

        #[test]
        fn shipping_is_free_iff_threshold_reached(
            subtotal in money(),
            threshold in money(),
            fee in money(),
        ) {
            let policy = ShippingPolicy::new(threshold, fee);
            let cost = policy.cost(subtotal);
            if subtotal >= threshold {
                prop_assert_eq!(cost, Decimal::ZERO);
            } else {
                prop_assert_eq!(cost, fee);
            }
        }
    }
}
