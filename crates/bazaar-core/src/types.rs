//! # Domain Types
//!
//! Rule and cart types shared by the resolver, the tax calculator and the
//! engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DeliveryTier   │   │   TaxSettings   │   │    CartItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  min_weight     │   │  gst_rate       │   │  id (unique)    │       │
//! │  │  max_weight?    │   │  cgst_rate      │   │  price (Money)  │       │
//! │  │  charge         │   │  sgst_rate      │   │  quantity ≥ 1   │       │
//! │  │  is_active      │   │  is_active      │   │  weight (g)     │       │
//! │  └────────┬────────┘   └────────┬────────┘   └────────┬────────┘       │
//! │           └──────────┬──────────┘                     │                │
//! │                      ▼                                 ▼                │
//! │              ┌───────────────┐               ┌─────────────────┐       │
//! │              │ PricingRules  │──────────────►│   CartTotals    │       │
//! │              └───────────────┘  compute_     │   (snapshot)    │       │
//! │                                 snapshot     └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{DEFAULT_CGST_BPS, DEFAULT_GST_BPS, DEFAULT_SGST_BPS};

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% GST
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage, as remote payloads quote it.
    ///
    /// Out-of-range percentages saturate at zero and `u32::MAX` bps; the
    /// payload parser rejects them before they get here.
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round().max(0.0) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

// =============================================================================
// Config Kind
// =============================================================================

/// The two remotely configured rule sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ConfigKind {
    /// Weight-tiered delivery charges.
    Delivery,
    /// GST settings.
    Tax,
}

impl ConfigKind {
    /// Every kind, in load order.
    pub const ALL: [ConfigKind; 2] = [ConfigKind::Delivery, ConfigKind::Tax];
}

impl fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigKind::Delivery => write!(f, "delivery"),
            ConfigKind::Tax => write!(f, "tax"),
        }
    }
}

impl FromStr for ConfigKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "delivery" | "shipping" => Ok(ConfigKind::Delivery),
            "tax" | "gst" => Ok(ConfigKind::Tax),
            _ => Err(ValidationError::Required {
                field: "config kind (delivery | tax)".to_string(),
            }),
        }
    }
}

// =============================================================================
// Delivery Tier
// =============================================================================

/// A contiguous, inclusive weight range mapped to a flat delivery charge.
///
/// `max_weight: None` marks the open-ended top tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryTier {
    /// Lower bound in grams, inclusive.
    pub min_weight: f64,

    /// Upper bound in grams, inclusive. `None` = unbounded.
    pub max_weight: Option<f64>,

    /// Flat charge for carts in this range.
    pub charge: Money,

    /// Inactive tiers are ignored by the resolver.
    pub is_active: bool,
}

impl DeliveryTier {
    /// Creates an active bounded tier.
    pub fn bounded(min_weight: f64, max_weight: f64, charge: Money) -> Self {
        DeliveryTier {
            min_weight,
            max_weight: Some(max_weight),
            charge,
            is_active: true,
        }
    }

    /// Creates an active open-ended tier.
    pub fn unbounded(min_weight: f64, charge: Money) -> Self {
        DeliveryTier {
            min_weight,
            max_weight: None,
            charge,
            is_active: true,
        }
    }

    /// Returns the same tier marked inactive.
    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Checks whether `weight` lies within `[min_weight, max_weight]`.
    ///
    /// Ignores `is_active`; the resolver filters on that separately.
    #[inline]
    pub fn contains(&self, weight: f64) -> bool {
        weight >= self.min_weight && self.max_weight.map_or(true, |max| weight <= max)
    }
}

/// Built-in delivery tiers used until the remote table loads.
///
/// Neighbouring tiers share their boundary weight; first-match resolution
/// gives it to the lighter tier, so fractional weights never fall in a gap.
pub fn default_delivery_tiers() -> Vec<DeliveryTier> {
    vec![
        DeliveryTier::bounded(0.0, 1_000.0, Money::zero()),
        DeliveryTier::bounded(1_000.0, 5_000.0, Money::from_major_minor(50, 0)),
        DeliveryTier::bounded(5_000.0, 10_000.0, Money::from_major_minor(100, 0)),
        DeliveryTier::unbounded(10_000.0, Money::from_major_minor(150, 0)),
    ]
}

// =============================================================================
// Tax Settings
// =============================================================================

/// GST configuration with its central/state split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxSettings {
    pub gst_rate: TaxRate,
    pub cgst_rate: TaxRate,
    pub sgst_rate: TaxRate,
    /// When false no tax is charged at all.
    pub is_active: bool,
}

impl TaxSettings {
    /// Creates active settings from percentages.
    pub fn from_percentages(gst: f64, cgst: f64, sgst: f64) -> Self {
        TaxSettings {
            gst_rate: TaxRate::from_percentage(gst),
            cgst_rate: TaxRate::from_percentage(cgst),
            sgst_rate: TaxRate::from_percentage(sgst),
            is_active: true,
        }
    }

    /// Checks the soft invariant `cgst + sgst == gst`.
    pub fn split_is_consistent(&self) -> bool {
        self.cgst_rate.bps().checked_add(self.sgst_rate.bps()) == Some(self.gst_rate.bps())
    }
}

impl Default for TaxSettings {
    /// 18% GST split 9% / 9%.
    fn default() -> Self {
        TaxSettings {
            gst_rate: TaxRate::from_bps(DEFAULT_GST_BPS),
            cgst_rate: TaxRate::from_bps(DEFAULT_CGST_BPS),
            sgst_rate: TaxRate::from_bps(DEFAULT_SGST_BPS),
            is_active: true,
        }
    }
}

// =============================================================================
// Pricing Rules
// =============================================================================

/// The full rule set a snapshot is computed against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingRules {
    pub delivery_tiers: Vec<DeliveryTier>,
    pub tax: TaxSettings,
}

impl Default for PricingRules {
    fn default() -> Self {
        PricingRules {
            delivery_tiers: default_delivery_tiers(),
            tax: TaxSettings::default(),
        }
    }
}

/// A whole-kind replacement for a [`PricingRules`] value.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleUpdate {
    Delivery(Vec<DeliveryTier>),
    Tax(TaxSettings),
}

impl RuleUpdate {
    /// Which rule set this update replaces.
    pub fn kind(&self) -> ConfigKind {
        match self {
            RuleUpdate::Delivery(_) => ConfigKind::Delivery,
            RuleUpdate::Tax(_) => ConfigKind::Tax,
        }
    }

    /// The built-in defaults for `kind`.
    pub fn defaults(kind: ConfigKind) -> Self {
        match kind {
            ConfigKind::Delivery => RuleUpdate::Delivery(default_delivery_tiers()),
            ConfigKind::Tax => RuleUpdate::Tax(TaxSettings::default()),
        }
    }

    /// Applies this update, replacing the whole rule set of its kind.
    pub fn apply_to(self, rules: &mut PricingRules) {
        match self {
            RuleUpdate::Delivery(tiers) => rules.delivery_tiers = tiers,
            RuleUpdate::Tax(tax) => rules.tax = tax,
        }
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the shopper's cart. Items are unique by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product identifier; the cart's identity key.
    pub id: String,

    /// Display name, not used in any computation.
    #[serde(default)]
    pub name: String,

    /// Unit price.
    pub price: Money,

    /// Units in the cart (≥ 1).
    pub quantity: u32,

    /// Unit weight in grams.
    pub weight: f64,
}

impl CartItem {
    /// Creates an unnamed cart item.
    pub fn new(id: impl Into<String>, price: Money, quantity: u32, weight: f64) -> Self {
        CartItem {
            id: id.into(),
            name: String::new(),
            price,
            quantity,
            weight,
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Line total (price × quantity), or `None` if it overflows.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.price.checked_multiply_quantity(self.quantity)
    }

    /// Line weight in grams (weight × quantity).
    #[inline]
    pub fn line_weight(&self) -> f64 {
        self.weight * f64::from(self.quantity)
    }
}

// =============================================================================
// Cart Totals Snapshot
// =============================================================================

/// How the delivery charge of a snapshot was arrived at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// An active tier covered the cart weight.
    #[default]
    Matched,
    /// No tier matched; charged nothing under the permissive policy.
    Unmatched,
    /// No tier matched under the strict policy; checkout should refuse.
    Unserviceable,
}

/// The complete set of derived cart totals at a point in time.
///
/// Always rebuilt from scratch by [`compute_snapshot`](crate::compute_snapshot).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Number of distinct items.
    pub item_count: usize,
    /// Sum of quantities.
    #[ts(type = "number")]
    pub total_quantity: u64,
    /// Total weight in grams.
    pub weight: f64,
    pub subtotal: Money,
    /// GST total (`cgst + sgst`).
    pub tax: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub delivery_charge: Money,
    pub delivery_status: DeliveryStatus,
    /// `subtotal + tax + delivery_charge`.
    pub grand_total: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(18.0).bps(), 1800);
        assert_eq!(TaxRate::from_percentage(2.5).bps(), 250);
        assert_eq!(TaxRate::from_percentage(-3.0).bps(), 0);
        assert!((TaxRate::from_bps(825).percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_config_kind_parsing() {
        assert_eq!("delivery".parse::<ConfigKind>().unwrap(), ConfigKind::Delivery);
        assert_eq!("GST".parse::<ConfigKind>().unwrap(), ConfigKind::Tax);
        assert!("payments".parse::<ConfigKind>().is_err());
        assert_eq!(ConfigKind::Tax.to_string(), "tax");
    }

    #[test]
    fn test_tier_contains_is_inclusive() {
        let tier = DeliveryTier::bounded(1_000.0, 5_000.0, Money::zero());
        assert!(tier.contains(1_000.0));
        assert!(tier.contains(5_000.0));
        assert!(!tier.contains(999.99));
        assert!(!tier.contains(5_000.01));

        let top = DeliveryTier::unbounded(10_000.0, Money::zero());
        assert!(top.contains(f64::MAX));
        assert!(!top.contains(f64::NAN));
    }

    #[test]
    fn test_default_tax_settings() {
        let tax = TaxSettings::default();
        assert_eq!(tax, TaxSettings::from_percentages(18.0, 9.0, 9.0));
        assert!(tax.split_is_consistent());
    }

    #[test]
    fn test_rule_update_replaces_whole_kind() {
        let mut rules = PricingRules::default();
        RuleUpdate::Delivery(vec![DeliveryTier::unbounded(0.0, Money::from_cents(100))])
            .apply_to(&mut rules);
        assert_eq!(rules.delivery_tiers.len(), 1);

        RuleUpdate::defaults(ConfigKind::Delivery).apply_to(&mut rules);
        assert_eq!(rules, PricingRules::default());
    }

    #[test]
    fn test_cart_item_line_totals() {
        let item = CartItem::new("tea", Money::from_cents(29_900), 2, 500.0).with_name("Assam Tea");
        assert_eq!(item.line_total(), Some(Money::from_cents(59_800)));
        assert_eq!(item.line_weight(), 1_000.0);

        let pricey = CartItem::new("gold", Money::from_cents(i64::MAX / 2), 3, 1.0);
        assert_eq!(pricey.line_total(), None);
        assert_eq!(item.name, "Assam Tea");
    }

    #[test]
    fn test_cart_item_deserializes_without_name() {
        let item: CartItem =
            serde_json::from_str(r#"{"id":"a","price":1000,"quantity":1,"weight":100.0}"#).unwrap();
        assert_eq!(item.name, "");
        assert_eq!(item.price.cents(), 1000);
    }
}
