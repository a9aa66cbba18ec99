//! # Cart Store
//!
//! The reactive container the storefront reads cart totals from.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  mutate(op) ───┐                                                        │
//! │                ├──► Mutex<CartTotalsAggregator> ──► CartTotals          │
//! │  recompute() ──┘           │                            │               │
//! │     ▲                      │ items changed               ├──► watch tx  │
//! │     │                      ▼                             │    (every    │
//! │  ConfigLoader       KeyValueStore.set(key, json)         │   publish)   │
//! │  (RecomputeHook)    KeyValueStore.remove(key) on Clear   ▼              │
//! │                                                     subscribers         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Persistence is best effort: a failed write is logged and the in-memory
//! cart stays authoritative.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bazaar_core::{Cart, CartChange, CartItem, CartOp, CartTotals, UnmatchedWeightPolicy};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::aggregator::CartTotalsAggregator;
use crate::error::EngineError;
use crate::loader::RecomputeHook;
use crate::persistence::{KeyValueStore, MemoryStore};
use crate::rules::RuleStore;

/// Default key the cart is stored under.
pub const DEFAULT_STORAGE_KEY: &str = "cart";

/// Shared cart state with persistence and change notification.
pub struct CartStore {
    aggregator: Mutex<CartTotalsAggregator>,
    storage: Arc<dyn KeyValueStore>,
    storage_key: String,
    updates: watch::Sender<CartTotals>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("storage_key", &self.storage_key)
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

impl CartStore {
    /// Creates a store, restoring any cart saved under `storage_key`.
    pub fn new(
        rules: Arc<RuleStore>,
        policy: UnmatchedWeightPolicy,
        storage: Arc<dyn KeyValueStore>,
        storage_key: impl Into<String>,
    ) -> Self {
        let storage_key = storage_key.into();
        let cart = restore(storage.as_ref(), &storage_key);
        let aggregator = CartTotalsAggregator::with_cart(cart, rules, policy);
        let (updates, _) = watch::channel(aggregator.snapshot().clone());

        CartStore {
            aggregator: Mutex::new(aggregator),
            storage,
            storage_key,
            updates,
        }
    }

    /// Creates a store that keeps the cart in memory only.
    pub fn in_memory(rules: Arc<RuleStore>, policy: UnmatchedWeightPolicy) -> Self {
        Self::new(rules, policy, Arc::new(MemoryStore::new()), DEFAULT_STORAGE_KEY)
    }

    fn lock(&self) -> MutexGuard<'_, CartTotalsAggregator> {
        self.aggregator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `op`, saves the cart and publishes the new totals.
    pub fn mutate(&self, op: CartOp) -> CartTotals {
        self.apply(op).1
    }

    /// Like [`mutate`](Self::mutate), also reporting what the op did.
    pub fn apply(&self, op: CartOp) -> (CartChange, CartTotals) {
        let mut aggregator = self.lock();
        let (change, totals) = aggregator.apply(op);

        if change.is_change() {
            self.persist(&change, aggregator.items());
        }
        self.updates.send_replace(totals.clone());

        (change, totals)
    }

    /// Recomputes against the current rules and publishes the result.
    pub fn recompute(&self) -> CartTotals {
        let mut aggregator = self.lock();
        let totals = aggregator.recompute();
        self.updates.send_replace(totals.clone());
        totals
    }

    /// The totals as of the last recompute.
    pub fn snapshot(&self) -> CartTotals {
        self.lock().snapshot().clone()
    }

    /// A copy of the current cart lines.
    pub fn items(&self) -> Vec<CartItem> {
        self.lock().items().to_vec()
    }

    /// Receives every published snapshot, starting with the current one.
    pub fn subscribe(&self) -> watch::Receiver<CartTotals> {
        self.updates.subscribe()
    }

    fn persist(&self, change: &CartChange, items: &[CartItem]) {
        let result = if matches!(change, CartChange::Cleared) {
            self.storage.remove(&self.storage_key)
        } else {
            serde_json::to_string(items)
                .map_err(EngineError::from)
                .and_then(|json| self.storage.set(&self.storage_key, &json))
        };

        match result {
            Ok(()) => debug!(key = %self.storage_key, items = items.len(), "Cart saved"),
            Err(err) => warn!(key = %self.storage_key, error = %err, "Failed to save cart"),
        }
    }
}

impl RecomputeHook for CartStore {
    fn recompute(&self) {
        CartStore::recompute(self);
    }
}

/// Reads a saved cart. Missing or unreadable data gives an empty cart.
fn restore(storage: &dyn KeyValueStore, key: &str) -> Cart {
    let saved = match storage.get(key) {
        Ok(Some(json)) => json,
        Ok(None) => return Cart::new(),
        Err(err) => {
            warn!(%key, error = %err, "Could not read saved cart, starting empty");
            return Cart::new();
        }
    };

    match serde_json::from_str::<Vec<CartItem>>(&saved) {
        Ok(items) => {
            let cart = Cart::from_items(items);
            info!(%key, items = cart.item_count(), "Restored saved cart");
            cart
        }
        Err(err) => {
            warn!(%key, error = %err, "Saved cart is corrupt, starting empty");
            Cart::new()
        }
    }
}
