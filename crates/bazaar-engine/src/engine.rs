//! # Pricing Engine
//!
//! One handle over the rule store, the loader and the cart.
//!
//! ## Wiring
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          PricingEngine                                  │
//! │                                                                         │
//! │   Arc<RuleStore> ◄──── writes ──── ConfigLoader ◄──── ConfigSource      │
//! │        │                                │                               │
//! │        │ reads                          │ RecomputeHook                 │
//! │        ▼                                ▼                               │
//! │   CartTotalsAggregator ◄──────── Arc<CartStore> ──► KeyValueStore       │
//! │                                         │                               │
//! │                                         └──► watch::Receiver<CartTotals>│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Building the engine registers the cart as the loader's recompute hook, so
//! a rule load that lands after the shopper filled the cart reprices it
//! without any further mutation.

use std::sync::Arc;

use bazaar_core::{CartChange, CartItem, CartOp, CartTotals, ConfigKind, UnmatchedWeightPolicy};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::loader::{ConfigLoader, LoadOutcome, LoadState};
use crate::persistence::{FileStore, KeyValueStore, MemoryStore};
use crate::rules::RuleStore;
use crate::source::{ConfigSource, HttpConfigSource};
use crate::store::CartStore;

/// Cheap-to-clone handle over a wired engine.
#[derive(Debug, Clone)]
pub struct PricingEngine {
    rules: Arc<RuleStore>,
    loader: ConfigLoader,
    cart: Arc<CartStore>,
}

impl PricingEngine {
    /// Wires an engine from its parts.
    pub fn new(
        source: Arc<dyn ConfigSource>,
        storage: Arc<dyn KeyValueStore>,
        storage_key: impl Into<String>,
        policy: UnmatchedWeightPolicy,
    ) -> Self {
        let rules = Arc::new(RuleStore::new());
        let cart = Arc::new(CartStore::new(Arc::clone(&rules), policy, storage, storage_key));
        let loader = ConfigLoader::new(source, Arc::clone(&rules));
        loader.set_recompute_hook(cart.clone());

        PricingEngine { rules, loader, cart }
    }

    /// Builds the HTTP source and file-backed cart described by `config`.
    ///
    /// Falls back to an in-memory cart when no storage directory can be
    /// determined for this platform.
    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let source = Arc::new(HttpConfigSource::new(&config.service)?);

        let storage: Arc<dyn KeyValueStore> =
            match config.cart.storage_dir.clone().or_else(FileStore::default_dir) {
                Some(dir) => {
                    let store = FileStore::new(dir)?;
                    debug!(dir = %store.dir().display(), "Saving cart to disk");
                    Arc::new(store)
                }
                None => {
                    warn!("No data directory available, cart will not be saved");
                    Arc::new(MemoryStore::new())
                }
            };

        info!(
            service = %config.service.base_url,
            policy = %config.unmatched_weight(),
            "Pricing engine configured"
        );
        Ok(Self::new(
            source,
            storage,
            config.cart.storage_key.clone(),
            config.unmatched_weight(),
        ))
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Applies a cart operation and returns the new totals.
    pub fn mutate(&self, op: CartOp) -> CartTotals {
        self.cart.mutate(op)
    }

    /// Applies a cart operation, also reporting what it did.
    pub fn apply(&self, op: CartOp) -> (CartChange, CartTotals) {
        self.cart.apply(op)
    }

    /// Recomputes the totals against the current rules.
    pub fn recompute(&self) -> CartTotals {
        self.cart.recompute()
    }

    pub fn snapshot(&self) -> CartTotals {
        self.cart.snapshot()
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.cart.items()
    }

    pub fn subscribe(&self) -> watch::Receiver<CartTotals> {
        self.cart.subscribe()
    }

    // =========================================================================
    // Rules
    // =========================================================================

    /// Loads one rule set unless already loaded. See [`ConfigLoader::load`].
    pub async fn load(&self, kind: ConfigKind) -> LoadOutcome {
        self.loader.load(kind).await
    }

    /// Reloads one rule set unconditionally.
    pub async fn refresh(&self, kind: ConfigKind) -> LoadOutcome {
        self.loader.refresh(kind).await
    }

    /// Loads delivery tiers and tax settings concurrently.
    pub async fn load_all(&self) -> (LoadOutcome, LoadOutcome) {
        tokio::join!(
            self.loader.load(ConfigKind::Delivery),
            self.loader.load(ConfigKind::Tax)
        )
    }

    pub fn is_loaded(&self, kind: ConfigKind) -> bool {
        self.loader.is_loaded(kind)
    }

    pub fn state(&self, kind: ConfigKind) -> LoadState {
        self.loader.state(kind)
    }

    pub fn rules(&self) -> &Arc<RuleStore> {
        &self.rules
    }

    pub fn loader(&self) -> &ConfigLoader {
        &self.loader
    }

    pub fn cart(&self) -> &Arc<CartStore> {
        &self.cart
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use async_trait::async_trait;
    use bazaar_core::{Money, TaxSettings};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves a fixed body (or failure) per kind.
    #[derive(Default)]
    struct FixedSource {
        bodies: HashMap<ConfigKind, Value>,
        calls: AtomicUsize,
    }

    impl FixedSource {
        fn with(mut self, kind: ConfigKind, body: Value) -> Self {
            self.bodies.insert(kind, body);
            self
        }
    }

    #[async_trait]
    impl ConfigSource for FixedSource {
        async fn fetch(&self, kind: ConfigKind) -> EngineResult<Value> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.bodies
                .get(&kind)
                .cloned()
                .ok_or_else(|| EngineError::Transport("connection refused".into()))
        }
    }

    fn engine(source: FixedSource) -> PricingEngine {
        PricingEngine::new(
            Arc::new(source),
            Arc::new(MemoryStore::new()),
            "cart",
            UnmatchedWeightPolicy::Free,
        )
    }

    fn tea() -> CartItem {
        CartItem::new("tea", Money::from_major_minor(299, 0), 2, 500.0)
    }

    #[tokio::test]
    async fn test_late_delivery_rules_reprice_existing_cart() {
        let source = FixedSource::default().with(
            ConfigKind::Delivery,
            json!({ "data": [
                { "minWeight": 0, "maxWeight": 500, "charge": 0, "isActive": true },
                { "minWeight": 500, "maxWeight": null, "charge": 50, "isActive": true }
            ]}),
        );
        let engine = engine(source);
        let mut updates = engine.subscribe();

        let before = engine.mutate(CartOp::Add(tea()));
        assert_eq!(before.delivery_charge, Money::zero());
        updates.borrow_and_update();

        assert_eq!(engine.load(ConfigKind::Delivery).await, LoadOutcome::Loaded);

        // No mutation since the load.
        let after = engine.snapshot();
        assert_eq!(after.delivery_charge.cents(), 5_000);
        assert_eq!(after.grand_total, before.grand_total + Money::from_major_minor(50, 0));
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow().delivery_charge.cents(), 5_000);
    }

    #[tokio::test]
    async fn test_failed_tax_load_leaves_default_rates() {
        let engine = engine(FixedSource::default());

        assert_eq!(engine.load(ConfigKind::Tax).await, LoadOutcome::FellBack);
        assert_eq!(engine.rules().tax(), TaxSettings::default());
        assert!(!engine.is_loaded(ConfigKind::Tax));

        let totals = engine.mutate(CartOp::Add(tea()));
        assert_eq!(totals.grand_total, Money::from_major_minor(705, 64));
    }

    #[tokio::test]
    async fn test_concurrent_tax_loads_fetch_once() {
        let source = Arc::new(
            FixedSource::default().with(ConfigKind::Tax, json!({ "gstRate": 5, "isActive": true })),
        );
        let engine = PricingEngine::new(
            source.clone(),
            Arc::new(MemoryStore::new()),
            "cart",
            UnmatchedWeightPolicy::Free,
        );

        let (a, b) = tokio::join!(engine.load(ConfigKind::Tax), engine.load(ConfigKind::Tax));
        assert_eq!(a, LoadOutcome::Loaded);
        assert_eq!(b, LoadOutcome::Loaded);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let tax = engine.rules().tax();
        assert_eq!(tax.gst_rate.bps(), 500);
        assert_eq!(tax.cgst_rate.bps() + tax.sgst_rate.bps(), 500);
    }

    #[tokio::test]
    async fn test_load_all_loads_both_kinds() {
        let source = FixedSource::default()
            .with(ConfigKind::Tax, json!({ "data": { "gst_rate": "12", "is_active": "true" } }))
            .with(ConfigKind::Delivery, json!([{ "min_weight": 0, "charge": "30" }]));
        let engine = engine(source);

        assert_eq!(engine.load_all().await, (LoadOutcome::Loaded, LoadOutcome::Loaded));
        assert_eq!(engine.state(ConfigKind::Delivery), LoadState::Loaded);
        assert_eq!(engine.state(ConfigKind::Tax), LoadState::Loaded);

        let totals = engine.mutate(CartOp::Add(CartItem::new("rice", Money::from_cents(10_000), 1, 5.0)));
        assert_eq!(totals.tax.cents(), 1_200);
        assert_eq!(totals.delivery_charge.cents(), 3_000);
        assert_eq!(totals.grand_total.cents(), 14_200);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let engine = engine(FixedSource::default());
        let other = engine.clone();

        other.mutate(CartOp::Add(tea()));
        assert_eq!(engine.items().len(), 1);
        assert_eq!(engine.snapshot(), other.snapshot());
    }
}
