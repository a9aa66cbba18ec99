//! # bazaar-core: Pure Pricing Logic for the Bazaar Storefront
//!
//! This crate holds every pricing rule of the storefront as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Bazaar Pricing Architecture                       │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Storefront (pages, cart, checkout)              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ mutate / load / snapshot               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        bazaar-engine (RuleStore, ConfigLoader, CartStore)       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazaar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ │   │
//! │  │  │  money  │ │ delivery │ │   tax   │ │  cart   │ │  totals  │ │   │
//! │  │  │  Money  │ │  tiers   │ │ GST     │ │ CartOp  │ │ snapshot │ │   │
//! │  │  └─────────┘ └──────────┘ └─────────┘ └─────────┘ └──────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CLOCKS • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Rule and cart types (DeliveryTier, TaxSettings, CartItem, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`delivery`] - Weight-tiered delivery charge resolution
//! - [`tax`] - GST calculation with CGST/SGST split
//! - [`cart`] - Cart item list and its mutations
//! - [`totals`] - Wholesale cart totals snapshot
//! - [`payload`] - Normalization of remote rule payloads
//! - [`validation`] - Field checks and soft rule audits
//! - [`error`] - Pricing error types
//!
//! ## Example Usage
//!
//! ```rust
//! use bazaar_core::{compute_snapshot, CartItem, Money, PricingRules, UnmatchedWeightPolicy};
//!
//! let items = vec![CartItem::new("tea", Money::from_major_minor(299, 0), 2, 500.0)];
//! let totals = compute_snapshot(&items, &PricingRules::default(), UnmatchedWeightPolicy::Free);
//!
//! assert_eq!(totals.subtotal.cents(), 59_800);
//! assert_eq!(totals.tax.cents(), 10_764);
//! assert_eq!(totals.delivery_charge.cents(), 0);
//! assert_eq!(totals.grand_total.cents(), 70_564);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod delivery;
pub mod error;
pub mod money;
pub mod payload;
pub mod tax;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartOp, CartChange};
pub use delivery::{DeliveryQuote, UnmatchedWeightPolicy};
pub use error::{PricingError, PricingResult, ValidationError};
pub use money::Money;
pub use tax::TaxBreakdown;
pub use totals::compute_snapshot;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default GST rate in basis points (18%).
pub const DEFAULT_GST_BPS: u32 = 1800;

/// Default CGST share in basis points (9%).
pub const DEFAULT_CGST_BPS: u32 = 900;

/// Default SGST share in basis points (9%).
pub const DEFAULT_SGST_BPS: u32 = 900;
