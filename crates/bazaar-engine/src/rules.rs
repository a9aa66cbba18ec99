//! # Rule Store
//!
//! The shared, replaceable pricing rules every snapshot is computed against.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         RuleStore per kind                              │
//! │                                                                         │
//! │   new() ──► built-in defaults, loaded = false                          │
//! │                │                                                        │
//! │                │ commit(update)          reset_to_default(kind)        │
//! │                ▼                                  │                     │
//! │   remote values, loaded = true,                   ▼                     │
//! │   last_loaded_at = now                 defaults, loaded = false        │
//! │                                                                         │
//! │   Only the ConfigLoader writes. The aggregator only reads.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each kind is replaced as a whole, together with its flag and timestamp,
//! under one write lock. Readers never see tiers from one load paired with a
//! flag from another.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bazaar_core::{ConfigKind, DeliveryTier, PricingRules, RuleUpdate, TaxSettings};
use chrono::{DateTime, Utc};

/// Everything guarded by the store's lock.
#[derive(Debug, Default)]
struct RuleState {
    rules: PricingRules,
    loaded: HashMap<ConfigKind, DateTime<Utc>>,
}

/// Thread-safe holder of the current [`PricingRules`].
///
/// Shared as `Arc<RuleStore>`; build one per engine (or per test) rather
/// than reaching for a global.
#[derive(Debug, Default)]
pub struct RuleStore {
    state: RwLock<RuleState>,
}

impl RuleStore {
    /// Creates a store holding the built-in defaults, nothing loaded.
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock cannot leave a half-applied update:
    // every write is a single assignment.
    fn read(&self) -> RwLockReadGuard<'_, RuleState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RuleState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns a copy of the current rules.
    pub fn rules(&self) -> PricingRules {
        self.read().rules.clone()
    }

    /// Returns a copy of the current delivery tiers.
    pub fn delivery_tiers(&self) -> Vec<DeliveryTier> {
        self.read().rules.delivery_tiers.clone()
    }

    /// Returns the current tax settings.
    pub fn tax(&self) -> TaxSettings {
        self.read().rules.tax
    }

    /// Returns true once a remote load of `kind` has been committed.
    pub fn is_loaded(&self, kind: ConfigKind) -> bool {
        self.read().loaded.contains_key(&kind)
    }

    /// When `kind` was last committed from a remote load.
    pub fn last_loaded_at(&self, kind: ConfigKind) -> Option<DateTime<Utc>> {
        self.read().loaded.get(&kind).copied()
    }

    /// Runs `f` against the current rules without cloning them.
    pub fn with<R>(&self, f: impl FnOnce(&PricingRules) -> R) -> R {
        f(&self.read().rules)
    }

    /// Replaces one kind with freshly loaded values and marks it loaded.
    pub(crate) fn commit(&self, update: RuleUpdate) -> DateTime<Utc> {
        let now = Utc::now();
        let kind = update.kind();

        let mut state = self.write();
        update.apply_to(&mut state.rules);
        state.loaded.insert(kind, now);
        now
    }

    /// Puts the built-in defaults back for `kind` and clears its loaded flag.
    pub(crate) fn reset_to_default(&self, kind: ConfigKind) {
        let mut state = self.write();
        RuleUpdate::defaults(kind).apply_to(&mut state.rules);
        state.loaded.remove(&kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazaar_core::Money;

    #[test]
    fn test_new_store_holds_defaults() {
        let store = RuleStore::new();
        assert_eq!(store.rules(), PricingRules::default());
        assert!(!store.is_loaded(ConfigKind::Delivery));
        assert!(!store.is_loaded(ConfigKind::Tax));
        assert!(store.last_loaded_at(ConfigKind::Tax).is_none());
    }

    #[test]
    fn test_commit_replaces_one_kind() {
        let store = RuleStore::new();
        let tiers = vec![DeliveryTier::unbounded(0.0, Money::from_cents(4_000))];

        let at = store.commit(RuleUpdate::Delivery(tiers.clone()));

        assert_eq!(store.delivery_tiers(), tiers);
        assert!(store.is_loaded(ConfigKind::Delivery));
        assert_eq!(store.last_loaded_at(ConfigKind::Delivery), Some(at));
        // Tax untouched
        assert!(!store.is_loaded(ConfigKind::Tax));
        assert_eq!(store.tax(), TaxSettings::default());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let store = RuleStore::new();
        store.commit(RuleUpdate::Tax(TaxSettings::from_percentages(5.0, 2.5, 2.5)));
        assert!(store.is_loaded(ConfigKind::Tax));

        store.reset_to_default(ConfigKind::Tax);
        assert_eq!(store.tax(), TaxSettings::default());
        assert!(!store.is_loaded(ConfigKind::Tax));
        assert!(store.last_loaded_at(ConfigKind::Tax).is_none());
    }

    #[test]
    fn test_with_reads_in_place() {
        let store = RuleStore::new();
        let count = store.with(|rules| rules.delivery_tiers.len());
        assert_eq!(count, 4);
    }
}
