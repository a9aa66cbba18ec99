//! # Cart Totals
//!
//! Builds a [`CartTotals`] snapshot from an item list and a rule set.
//!
//! ## Pipeline
//! ```text
//! items ──► weight   = Σ weight × qty ─────────────► delivery::quote(weight)
//!      └──► subtotal = Σ price × qty ──┬──────────► tax::calculate(subtotal)
//!                                      │
//!                  grand_total = subtotal + tax.total + delivery_charge
//! ```
//!
//! Every field is derived fresh on every call; nothing is carried over from
//! a previous snapshot.

use crate::delivery::{self, UnmatchedWeightPolicy};
use crate::money::Money;
use crate::tax;
use crate::types::{CartItem, CartTotals, PricingRules};

/// Computes the totals for `items` under `rules`.
///
/// Amounts saturate rather than overflow. A [`Cart`](crate::Cart) never
/// holds more than [`Money::MAX`], so its totals are always exact.
pub fn compute_snapshot(
    items: &[CartItem],
    rules: &PricingRules,
    policy: UnmatchedWeightPolicy,
) -> CartTotals {
    let weight: f64 = items.iter().map(CartItem::line_weight).sum();
    let subtotal = items
        .iter()
        .map(|item| item.line_total().unwrap_or(Money::MAX))
        .fold(Money::zero(), Money::saturating_add)
        .min(Money::MAX);
    let total_quantity: u64 = items.iter().map(|i| u64::from(i.quantity)).sum();

    let tax = tax::calculate(subtotal, &rules.tax);
    let delivery = delivery::quote(weight, &rules.delivery_tiers, policy);

    CartTotals {
        item_count: items.len(),
        total_quantity,
        weight,
        subtotal,
        tax: tax.total,
        cgst: tax.cgst,
        sgst: tax.sgst,
        delivery_charge: delivery.charge,
        delivery_status: delivery.status,
        grand_total: subtotal
            .saturating_add(tax.total)
            .saturating_add(delivery.charge),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeliveryStatus, DeliveryTier, TaxSettings};

    #[test]
    fn test_reference_cart_with_default_rules() {
        let items = vec![CartItem::new("tea", Money::from_major_minor(299, 0), 2, 500.0)];
        let totals = compute_snapshot(&items, &PricingRules::default(), UnmatchedWeightPolicy::Free);

        assert_eq!(totals.subtotal, Money::from_major_minor(598, 0));
        assert_eq!(totals.weight, 1_000.0);
        assert_eq!(totals.tax, Money::from_major_minor(107, 64));
        assert_eq!(totals.cgst + totals.sgst, totals.tax);
        assert_eq!(totals.delivery_charge, Money::zero());
        assert_eq!(totals.delivery_status, DeliveryStatus::Matched);
        assert_eq!(totals.grand_total, Money::from_major_minor(705, 64));
        assert_eq!(totals.item_count, 1);
        assert_eq!(totals.total_quantity, 2);
    }

    #[test]
    fn test_empty_cart() {
        let totals = compute_snapshot(&[], &PricingRules::default(), UnmatchedWeightPolicy::Free);
        assert_eq!(totals.grand_total, Money::zero());
        assert_eq!(totals.weight, 0.0);
        assert_eq!(totals.delivery_status, DeliveryStatus::Matched);
    }

    #[test]
    fn test_delivery_and_tax_follow_rules() {
        let rules = PricingRules {
            delivery_tiers: vec![DeliveryTier::unbounded(0.0, Money::from_major_minor(40, 0))],
            tax: TaxSettings {
                is_active: false,
                ..TaxSettings::default()
            },
        };
        let items = vec![
            CartItem::new("a", Money::from_cents(10_000), 1, 200.0),
            CartItem::new("b", Money::from_cents(2_550), 2, 50.0),
        ];

        let totals = compute_snapshot(&items, &rules, UnmatchedWeightPolicy::Free);
        assert_eq!(totals.subtotal.cents(), 15_100);
        assert_eq!(totals.weight, 300.0);
        assert!(totals.tax.is_zero());
        assert_eq!(totals.grand_total.cents(), 15_100 + 4_000);
    }

    #[test]
    fn test_unserviceable_weight_under_strict_policy() {
        let rules = PricingRules {
            delivery_tiers: vec![DeliveryTier::bounded(0.0, 100.0, Money::zero())],
            tax: TaxSettings::default(),
        };
        let items = vec![CartItem::new("anvil", Money::from_cents(100), 1, 50_000.0)];

        let totals = compute_snapshot(&items, &rules, UnmatchedWeightPolicy::Reject);
        assert_eq!(totals.delivery_status, DeliveryStatus::Unserviceable);
        assert_eq!(totals.grand_total, totals.subtotal + totals.tax);
    }

    #[test]
    fn test_oversized_items_saturate_instead_of_panicking() {
        let items = vec![
            CartItem::new("a", Money::from_cents(i64::MAX / 2), 3, 1.0),
            CartItem::new("b", Money::from_cents(i64::MAX / 2), 1, 1.0),
        ];

        let totals = compute_snapshot(&items, &PricingRules::default(), UnmatchedWeightPolicy::Free);
        assert_eq!(totals.subtotal, Money::MAX);
        assert!(totals.grand_total >= totals.subtotal);
        assert_eq!(totals.cgst + totals.sgst, totals.tax);
    }
}
