//! # Cart Totals Aggregator
//!
//! Owns the cart and keeps its [`CartTotals`] in step with it.
//!
//! ## Recompute Triggers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   mutate(Add | Remove | SetQuantity | Clear) ──┐                       │
//! │                                                 ├──► recompute()        │
//! │   rule store commit (via RecomputeHook) ────────┘        │              │
//! │                                                          ▼              │
//! │              compute_snapshot(items, rules, policy) ──► snapshot        │
//! │                                                                         │
//! │   Every trigger rebuilds the whole snapshot from the current items     │
//! │   and whatever rules are in the store right now, defaults included.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A rejected or no-op mutation still recomputes, so the snapshot always
//! reflects the latest rules after any call.

use std::sync::Arc;

use bazaar_core::{
    compute_snapshot, Cart, CartChange, CartItem, CartOp, CartTotals, UnmatchedWeightPolicy,
};
use tracing::{debug, warn};

use crate::rules::RuleStore;

/// Cart plus its latest computed totals.
#[derive(Debug)]
pub struct CartTotalsAggregator {
    cart: Cart,
    rules: Arc<RuleStore>,
    policy: UnmatchedWeightPolicy,
    snapshot: CartTotals,
}

impl CartTotalsAggregator {
    /// Creates an aggregator over an empty cart.
    pub fn new(rules: Arc<RuleStore>, policy: UnmatchedWeightPolicy) -> Self {
        Self::with_cart(Cart::new(), rules, policy)
    }

    /// Creates an aggregator over an existing cart and computes its totals.
    pub fn with_cart(cart: Cart, rules: Arc<RuleStore>, policy: UnmatchedWeightPolicy) -> Self {
        let mut aggregator = CartTotalsAggregator {
            cart,
            rules,
            policy,
            snapshot: CartTotals::default(),
        };
        aggregator.recompute();
        aggregator
    }

    /// Applies `op` and returns the recomputed totals.
    pub fn mutate(&mut self, op: CartOp) -> CartTotals {
        self.apply(op).1
    }

    /// Like [`mutate`](Self::mutate), also reporting what the op did.
    pub fn apply(&mut self, op: CartOp) -> (CartChange, CartTotals) {
        let change = self.cart.apply(op);
        match &change {
            CartChange::Rejected(reason) => warn!(%reason, "Cart item rejected"),
            CartChange::Unchanged => debug!("Cart op had no effect"),
            _ => debug!(?change, items = self.cart.item_count(), "Cart updated"),
        }

        (change, self.recompute())
    }

    /// Rebuilds the snapshot against the current rules.
    pub fn recompute(&mut self) -> CartTotals {
        let snapshot = self
            .rules
            .with(|rules| compute_snapshot(self.cart.items(), rules, self.policy));
        self.snapshot = snapshot;
        self.snapshot.clone()
    }

    /// The totals as of the last recompute.
    pub fn snapshot(&self) -> &CartTotals {
        &self.snapshot
    }

    /// The current cart lines.
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    /// The policy applied when no delivery tier matches.
    pub fn policy(&self) -> UnmatchedWeightPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::{DeliveryStatus, DeliveryTier, Money, RuleUpdate};

    fn tea() -> CartItem {
        CartItem::new("tea", Money::from_major_minor(299, 0), 2, 500.0)
    }

    fn aggregator() -> CartTotalsAggregator {
        CartTotalsAggregator::new(Arc::new(RuleStore::new()), UnmatchedWeightPolicy::Free)
    }

    #[test]
    fn test_add_computes_reference_totals() {
        let mut agg = aggregator();
        let (change, totals) = agg.apply(CartOp::Add(tea()));

        assert_eq!(change, CartChange::Added);
        assert_eq!(totals.subtotal, Money::from_major_minor(598, 0));
        assert_eq!(totals.weight, 1_000.0);
        assert_eq!(totals.tax, Money::from_major_minor(107, 64));
        assert_eq!(totals.delivery_charge, Money::zero());
        assert_eq!(totals.grand_total, Money::from_major_minor(705, 64));
        assert_eq!(agg.snapshot(), &totals);
    }

    #[test]
    fn test_add_then_remove_matches_empty_cart() {
        let mut agg = aggregator();
        let empty = agg.snapshot().clone();

        agg.mutate(CartOp::Add(tea()));
        let totals = agg.mutate(CartOp::Remove("tea".to_string()));

        assert_eq!(totals, empty);
        assert!(agg.items().is_empty());
    }

    #[test]
    fn test_set_quantity_to_zero_removes() {
        let mut agg = aggregator();
        agg.mutate(CartOp::Add(tea()));

        let (change, totals) = agg.apply(CartOp::SetQuantity {
            id: "tea".to_string(),
            quantity: 0,
        });
        assert_eq!(change, CartChange::Removed);
        assert_eq!(totals.item_count, 0);
        assert!(totals.grand_total.is_zero());
    }

    #[test]
    fn test_unknown_id_is_noop_but_recomputes() {
        let rules = Arc::new(RuleStore::new());
        let mut agg = CartTotalsAggregator::new(Arc::clone(&rules), UnmatchedWeightPolicy::Free);
        agg.mutate(CartOp::Add(CartItem::new("rice", Money::from_cents(10_000), 1, 2_000.0)));
        assert_eq!(agg.snapshot().delivery_charge, Money::from_major_minor(50, 0));

        // Rules change behind the aggregator's back.
        rules.commit(RuleUpdate::Delivery(vec![DeliveryTier::unbounded(
            0.0,
            Money::from_major_minor(20, 0),
        )]));

        let (change, totals) = agg.apply(CartOp::Remove("missing".to_string()));
        assert_eq!(change, CartChange::Unchanged);
        assert_eq!(totals.delivery_charge, Money::from_major_minor(20, 0));
    }

    #[test]
    fn test_rejected_item_leaves_cart_unchanged() {
        let mut agg = aggregator();
        let (change, totals) = agg.apply(CartOp::Add(CartItem::new(
            "bad",
            Money::from_cents(-5),
            1,
            1.0,
        )));

        assert!(matches!(change, CartChange::Rejected(_)));
        assert_eq!(totals.item_count, 0);
    }

    #[test]
    fn test_oversized_quantity_is_rejected_and_cart_stays_usable() {
        let mut agg = aggregator();
        agg.mutate(CartOp::Add(CartItem::new("gold", Money::from_cents(10_000_000_000), 1, 1.0)));
        let before = agg.snapshot().clone();

        let (change, totals) = agg.apply(CartOp::SetQuantity {
            id: "gold".to_string(),
            quantity: 10_000_000_000,
        });
        assert!(matches!(change, CartChange::Rejected(_)));
        assert_eq!(totals, before);
        assert_eq!(agg.items()[0].quantity, 1);

        assert_eq!(agg.recompute(), before);
        let totals = agg.mutate(CartOp::SetQuantity {
            id: "gold".to_string(),
            quantity: 2,
        });
        assert_eq!(totals.subtotal.cents(), 20_000_000_000);
    }

    #[test]
    fn test_reject_policy_flags_unserviceable() {
        let rules = Arc::new(RuleStore::new());
        rules.commit(RuleUpdate::Delivery(vec![DeliveryTier::bounded(
            0.0,
            1_000.0,
            Money::zero(),
        )]));
        let mut agg = CartTotalsAggregator::new(rules, UnmatchedWeightPolicy::Reject);

        let totals = agg.mutate(CartOp::Add(CartItem::new(
            "sack",
            Money::from_cents(100),
            1,
            25_000.0,
        )));
        assert_eq!(totals.delivery_status, DeliveryStatus::Unserviceable);
        assert_eq!(agg.policy(), UnmatchedWeightPolicy::Reject);
    }
}
