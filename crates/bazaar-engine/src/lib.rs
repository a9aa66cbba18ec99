//! # bazaar-engine: Pricing Runtime for the Bazaar Storefront
//!
//! Loads remote pricing rules, keeps the cart and its totals, and saves the
//! cart between sessions. All pricing math lives in `bazaar-core`; this
//! crate adds the network, the clock, the filesystem and concurrency.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Pricing Engine Runtime                           │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                  PricingEngine (one handle, cheap clone)          │  │
//! │  └───────┬──────────────────────┬──────────────────────┬────────────┘  │
//! │          ▼                      ▼                      ▼               │
//! │  ┌────────────────┐   ┌──────────────────┐   ┌────────────────────┐    │
//! │  │ ConfigLoader   │   │ RuleStore        │   │ CartStore          │    │
//! │  │                │   │                  │   │                    │    │
//! │  │ one fetch per  │──►│ tiers + tax +    │◄──│ aggregator, watch  │    │
//! │  │ kind, newest   │   │ loaded flags     │   │ channel, persisted │    │
//! │  │ wins, falls    │   │                  │   │ item list          │    │
//! │  │ back on error  │   └──────────────────┘   └─────────▲──────────┘    │
//! │  └───────┬────────┘                                    │               │
//! │          │ ConfigSource (HTTP)        RecomputeHook ───┘               │
//! │          ▼                                                             │
//! │   GET /delivery-charges, GET /tax-settings                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`engine`] - `PricingEngine` wiring
//! - [`loader`] - Coalescing config loader and its state machine
//! - [`rules`] - Shared rule store
//! - [`source`] - Config sources (HTTP)
//! - [`aggregator`] - Cart plus recomputed totals
//! - [`store`] - Reactive, persisted cart store
//! - [`persistence`] - Key-value storage for the cart
//! - [`config`] - Engine configuration (TOML + env)
//! - [`logging`] - Tracing subscriber setup
//! - [`error`] - Engine error types
//!
//! ## Example Usage
//! ```rust,no_run
//! use bazaar_core::{CartItem, CartOp, Money};
//! use bazaar_engine::{EngineConfig, PricingEngine};
//!
//! # async fn run() -> bazaar_engine::EngineResult<()> {
//! let config = EngineConfig::load(None)?;
//! let engine = PricingEngine::from_config(&config)?;
//!
//! engine.mutate(CartOp::Add(CartItem::new("tea", Money::from_major_minor(299, 0), 2, 500.0)));
//! engine.load_all().await;
//!
//! println!("{}", engine.snapshot().grand_total);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregator;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod logging;
pub mod persistence;
pub mod rules;
pub mod source;
pub mod store;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use aggregator::CartTotalsAggregator;
pub use config::{CartSettings, EngineConfig, PricingSettings, ServiceSettings};
pub use engine::PricingEngine;
pub use error::{EngineError, EngineResult};
pub use loader::{ConfigLoader, LoadOutcome, LoadState, RecomputeHook};
pub use persistence::{FileStore, KeyValueStore, MemoryStore};
pub use rules::RuleStore;
pub use source::{ConfigSource, HttpConfigSource};
pub use store::CartStore;
