//! # Configuration Loader
//!
//! Loads delivery tiers and tax settings into the [`RuleStore`], once.
//!
//! ## Per-Kind State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Load State per ConfigKind                        │
//! │                                                                         │
//! │  ┌────────────┐   load() / refresh()   ┌───────────┐                   │
//! │  │ NOT LOADED │ ─────────────────────► │  LOADING  │◄──┐ refresh()     │
//! │  └────────────┘                        └─────┬─────┘   │               │
//! │        ▲                                     │         │               │
//! │        │ failed, nothing loaded before       │ ok      │               │
//! │        │ (defaults committed)                ▼         │               │
//! │        └──────────────────────────────  ┌──────────┐   │               │
//! │                                         │  LOADED  │───┘               │
//! │               failed after an earlier   └──────────┘                   │
//! │               success: stays LOADED,                                    │
//! │               last-known-good values kept                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Coalescing and Ordering
//! ```text
//!  caller A ── load(tax) ──► claim slot, gen 1, spawn fetch ──┐
//!  caller B ── load(tax) ──► slot busy, join gen 1 ───────────┤ watch
//!                                                             ▼
//!                             fetch ─► settle(gen 1) ─► commit ─► hook ─► send
//!
//!  refresh(tax) ──► gen 2, spawn fetch (gen 1 keeps running)
//!  a result with gen ≤ last committed gen is discarded (Superseded)
//! ```
//!
//! Fetches run as spawned tasks, so dropping a caller's future never aborts
//! one halfway. `load()` never returns an error: transport and payload
//! failures are logged and answered with a fallback.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bazaar_core::payload;
use bazaar_core::validation::{audit_tax, audit_tiers, RuleWarning};
use bazaar_core::{ConfigKind, RuleUpdate};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::rules::RuleStore;
use crate::source::ConfigSource;

// =============================================================================
// Public Types
// =============================================================================

/// Load state of one rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
}

impl fmt::Display for LoadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadState::NotLoaded => write!(f, "not_loaded"),
            LoadState::Loading => write!(f, "loading"),
            LoadState::Loaded => write!(f, "loaded"),
        }
    }
}

/// What a `load()` or `refresh()` call ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The kind was already loaded; nothing was fetched.
    AlreadyLoaded,
    /// Fresh remote values were committed.
    Loaded,
    /// The fetch failed; last-known-good values or defaults are in use.
    FellBack,
    /// A newer attempt had already committed; this result was discarded.
    Superseded,
}

/// Called synchronously after every commit to the rule store.
pub trait RecomputeHook: Send + Sync {
    fn recompute(&self);
}

impl<F> RecomputeHook for F
where
    F: Fn() + Send + Sync,
{
    fn recompute(&self) {
        self()
    }
}

// =============================================================================
// Slots
// =============================================================================

type Completion = watch::Receiver<Option<LoadOutcome>>;

#[derive(Debug)]
struct InFlight {
    generation: u64,
    done: Completion,
}

#[derive(Debug, Default)]
struct Slot {
    state: LoadState,
    /// Last generation handed out.
    issued: u64,
    /// Last generation whose result was applied.
    committed: u64,
    /// The newest attempt still running.
    in_flight: Option<InFlight>,
}

struct LoaderInner {
    source: Arc<dyn ConfigSource>,
    rules: Arc<RuleStore>,
    slots: Mutex<HashMap<ConfigKind, Slot>>,
    hook: Mutex<Option<Arc<dyn RecomputeHook>>>,
}

// =============================================================================
// Config Loader
// =============================================================================

/// Coalescing, fallback-aware loader for remote pricing rules.
///
/// Cheap to clone; clones share slots, store and hook.
#[derive(Clone)]
pub struct ConfigLoader {
    inner: Arc<LoaderInner>,
}

impl fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("delivery", &self.state(ConfigKind::Delivery))
            .field("tax", &self.state(ConfigKind::Tax))
            .finish()
    }
}

impl ConfigLoader {
    /// Creates a loader that fetches from `source` into `rules`.
    pub fn new(source: Arc<dyn ConfigSource>, rules: Arc<RuleStore>) -> Self {
        ConfigLoader {
            inner: Arc::new(LoaderInner {
                source,
                rules,
                slots: Mutex::new(HashMap::new()),
                hook: Mutex::new(None),
            }),
        }
    }

    /// Registers the hook run after every commit. Replaces any earlier one.
    pub fn set_recompute_hook(&self, hook: Arc<dyn RecomputeHook>) {
        *self
            .inner
            .hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(hook);
    }

    /// The store this loader writes to.
    pub fn rules(&self) -> &Arc<RuleStore> {
        &self.inner.rules
    }

    /// Loads `kind` unless it is already loaded.
    ///
    /// Concurrent calls share one fetch. Never fails: on error the store
    /// keeps its last-known-good values, or defaults if none.
    pub async fn load(&self, kind: ConfigKind) -> LoadOutcome {
        let (generation, done) = {
            let mut slots = self.inner.lock_slots();
            let slot = slots.entry(kind).or_default();

            match &slot.in_flight {
                Some(flight) => {
                    debug!(%kind, generation = flight.generation, "Joining in-flight load");
                    (flight.generation, flight.done.clone())
                }
                None if slot.state == LoadState::Loaded => return LoadOutcome::AlreadyLoaded,
                None => self.start(kind, slot),
            }
        };

        self.inner.wait(kind, generation, done).await
    }

    /// Fetches `kind` again regardless of its state.
    ///
    /// An earlier in-flight attempt keeps running but can no longer
    /// overwrite this one's result.
    pub async fn refresh(&self, kind: ConfigKind) -> LoadOutcome {
        let (generation, done) = {
            let mut slots = self.inner.lock_slots();
            let slot = slots.entry(kind).or_default();
            self.start(kind, slot)
        };

        self.inner.wait(kind, generation, done).await
    }

    /// Returns true once remote values for `kind` are in the store.
    pub fn is_loaded(&self, kind: ConfigKind) -> bool {
        self.inner.rules.is_loaded(kind)
    }

    /// Current state of `kind`.
    pub fn state(&self, kind: ConfigKind) -> LoadState {
        self.inner
            .lock_slots()
            .get(&kind)
            .map(|slot| slot.state)
            .unwrap_or_default()
    }

    /// Claims the next generation and spawns its fetch. Caller holds the
    /// slots lock.
    fn start(&self, kind: ConfigKind, slot: &mut Slot) -> (u64, Completion) {
        slot.issued += 1;
        let generation = slot.issued;
        let (tx, rx) = watch::channel(None);

        slot.state = LoadState::Loading;
        slot.in_flight = Some(InFlight {
            generation,
            done: rx.clone(),
        });
        debug!(%kind, generation, "Starting load");

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let source = Arc::clone(&inner.source);
            let result = match tokio::spawn(async move { source.fetch(kind).await }).await {
                Ok(result) => result,
                Err(join_err) => {
                    warn!(%kind, generation, error = %join_err, "Fetch task failed");
                    Err(EngineError::TaskFailed(kind))
                }
            };

            let outcome = inner.settle(kind, generation, result);
            // Every waiter may have gone away; the commit already happened.
            let _ = tx.send(Some(outcome));
        });

        (generation, rx)
    }
}

impl LoaderInner {
    fn lock_slots(&self) -> MutexGuard<'_, HashMap<ConfigKind, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn wait(&self, kind: ConfigKind, generation: u64, mut done: Completion) -> LoadOutcome {
        let reported = match done.wait_for(Option::is_some).await {
            Ok(outcome) => *outcome,
            Err(_) => None,
        };

        match reported {
            Some(outcome) => outcome,
            // The task died between fetch and send. Settling again is
            // harmless: a generation is only ever applied once.
            None => self.settle(kind, generation, Err(EngineError::TaskFailed(kind))),
        }
    }

    /// Applies one attempt's result, then runs the recompute hook.
    fn settle(&self, kind: ConfigKind, generation: u64, result: EngineResult<Value>) -> LoadOutcome {
        let outcome = {
            let mut slots = self.lock_slots();
            let slot = slots.entry(kind).or_default();

            if generation <= slot.committed {
                debug!(
                    %kind,
                    generation,
                    committed = slot.committed,
                    "Discarding superseded load result"
                );
                return LoadOutcome::Superseded;
            }

            let parsed = result.and_then(|value| Ok(payload::parse(kind, &value)?));
            let outcome = match parsed {
                Ok(update) => {
                    for warning in audit(&update) {
                        warn!(%kind, %warning, "Remote rules look inconsistent; using them as given");
                    }
                    let at = self.rules.commit(update);
                    info!(%kind, generation, loaded_at = %at, "Pricing rules loaded");
                    LoadOutcome::Loaded
                }
                Err(err) if self.rules.is_loaded(kind) => {
                    warn!(
                        %kind,
                        generation,
                        transport = err.is_transport(),
                        error = %err,
                        "Load failed, keeping last-known-good rules"
                    );
                    LoadOutcome::FellBack
                }
                Err(err) => {
                    warn!(
                        %kind,
                        generation,
                        transport = err.is_transport(),
                        error = %err,
                        "Load failed, using built-in defaults"
                    );
                    self.rules.reset_to_default(kind);
                    LoadOutcome::FellBack
                }
            };

            slot.committed = generation;
            if generation == slot.issued {
                slot.in_flight = None;
                slot.state = if self.rules.is_loaded(kind) {
                    LoadState::Loaded
                } else {
                    LoadState::NotLoaded
                };
            }
            outcome
        };

        self.notify_recompute();
        outcome
    }

    fn notify_recompute(&self) {
        let hook = self
            .hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            hook.recompute();
        }
    }
}

fn audit(update: &RuleUpdate) -> Vec<RuleWarning> {
    match update {
        RuleUpdate::Delivery(tiers) => audit_tiers(tiers),
        RuleUpdate::Tax(settings) => audit_tax(settings),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
