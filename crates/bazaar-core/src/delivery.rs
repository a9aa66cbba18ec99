//! # Delivery Charge Resolution
//!
//! Maps a cart weight onto the configured delivery tier table.
//!
//! ## Resolution Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FIRST MATCH WINS (listed order, active tiers only)                     │
//! │                                                                         │
//! │  tiers:  [0 ─── 1000] → ₹0                                              │
//! │                 [1000 ─── 5000] → ₹100                                  │
//! │                           [10000 ─── ∞) → ₹300                          │
//! │                                                                         │
//! │  1000 g   → ₹0    (shared boundary: earlier tier wins)                  │
//! │  2500 g   → ₹100                                                        │
//! │  7000 g   → none  (gap: policy decides)                                 │
//! │  999999 g → ₹300                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Weights are compared exactly as given; no rounding happens here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PricingError, PricingResult, ValidationError};
use crate::money::Money;
use crate::types::{DeliveryStatus, DeliveryTier};

// =============================================================================
// Unmatched Weight Policy
// =============================================================================

/// What to do with a weight no active tier covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedWeightPolicy {
    /// Deliver for free.
    #[default]
    Free,
    /// Treat the tier table as misconfigured and refuse to quote.
    Reject,
}

impl fmt::Display for UnmatchedWeightPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedWeightPolicy::Free => write!(f, "free"),
            UnmatchedWeightPolicy::Reject => write!(f, "reject"),
        }
    }
}

impl FromStr for UnmatchedWeightPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" | "permissive" => Ok(UnmatchedWeightPolicy::Free),
            "reject" | "strict" | "error" => Ok(UnmatchedWeightPolicy::Reject),
            _ => Err(ValidationError::Required {
                field: "unmatched weight policy (free | reject)".to_string(),
            }),
        }
    }
}

// =============================================================================
// Resolution
// =============================================================================

/// Finds the first active tier, in listed order, containing `weight`.
pub fn find_tier(weight: f64, tiers: &[DeliveryTier]) -> Option<&DeliveryTier> {
    tiers
        .iter()
        .filter(|tier| tier.is_active)
        .find(|tier| tier.contains(weight))
}

/// Resolves the delivery charge for `weight` grams.
///
/// ## Example
/// ```rust
/// use bazaar_core::delivery::resolve;
/// use bazaar_core::{DeliveryTier, Money, UnmatchedWeightPolicy};
///
/// let tiers = vec![
///     DeliveryTier::bounded(0.0, 1000.0, Money::zero()),
///     DeliveryTier::bounded(1000.0, 5000.0, Money::from_cents(10_000)),
/// ];
///
/// let charge = resolve(1000.0, &tiers, UnmatchedWeightPolicy::Free).unwrap();
/// assert!(charge.is_zero());
///
/// assert!(resolve(6000.0, &tiers, UnmatchedWeightPolicy::Reject).is_err());
/// ```
pub fn resolve(
    weight: f64,
    tiers: &[DeliveryTier],
    policy: UnmatchedWeightPolicy,
) -> PricingResult<Money> {
    match find_tier(weight, tiers) {
        Some(tier) => Ok(tier.charge),
        None => match policy {
            UnmatchedWeightPolicy::Free => Ok(Money::zero()),
            UnmatchedWeightPolicy::Reject => Err(PricingError::NoDeliveryTier { weight }),
        },
    }
}

/// A resolved charge together with how it was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryQuote {
    pub charge: Money,
    pub status: DeliveryStatus,
}

/// Like [`resolve`], but never fails: an unmatched weight is reported in
/// the quote's status instead, with a zero charge.
pub fn quote(weight: f64, tiers: &[DeliveryTier], policy: UnmatchedWeightPolicy) -> DeliveryQuote {
    let Some(tier) = find_tier(weight, tiers) else {
        let status = match policy {
            UnmatchedWeightPolicy::Free => DeliveryStatus::Unmatched,
            UnmatchedWeightPolicy::Reject => DeliveryStatus::Unserviceable,
        };
        return DeliveryQuote {
            charge: Money::zero(),
            status,
        };
    };

    DeliveryQuote {
        charge: tier.charge,
        status: DeliveryStatus::Matched,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn rupees(major: i64) -> Money {
        Money::from_major_minor(major, 0)
    }

    fn boundary_tiers() -> Vec<DeliveryTier> {
        vec![
            DeliveryTier::bounded(0.0, 1_000.0, rupees(0)),
            DeliveryTier::bounded(1_000.0, 5_000.0, rupees(100)),
            DeliveryTier::unbounded(10_000.0, rupees(300)),
        ]
    }

    #[test]
    fn test_shared_boundary_goes_to_first_listed_tier() {
        let tiers = boundary_tiers();
        assert_eq!(resolve(1_000.0, &tiers, UnmatchedWeightPolicy::Free).unwrap(), rupees(0));
        assert_eq!(resolve(1_000.5, &tiers, UnmatchedWeightPolicy::Free).unwrap(), rupees(100));
    }

    #[test]
    fn test_first_match_beats_narrower_range() {
        let tiers = vec![
            DeliveryTier::bounded(0.0, 10_000.0, rupees(80)),
            DeliveryTier::bounded(2_000.0, 3_000.0, rupees(20)),
        ];
        assert_eq!(resolve(2_500.0, &tiers, UnmatchedWeightPolicy::Free).unwrap(), rupees(80));
    }

    #[test]
    fn test_unbounded_top_tier() {
        let tiers = boundary_tiers();
        assert_eq!(resolve(999_999.0, &tiers, UnmatchedWeightPolicy::Free).unwrap(), rupees(300));
        assert_eq!(resolve(10_000.0, &tiers, UnmatchedWeightPolicy::Free).unwrap(), rupees(300));
    }

    #[test]
    fn test_inactive_tiers_are_skipped() {
        let tiers = vec![
            DeliveryTier::bounded(0.0, 1_000.0, rupees(10)).inactive(),
            DeliveryTier::bounded(0.0, 1_000.0, rupees(40)),
        ];
        assert_eq!(resolve(500.0, &tiers, UnmatchedWeightPolicy::Free).unwrap(), rupees(40));
    }

    #[test]
    fn test_unmatched_weight_follows_policy() {
        let tiers = boundary_tiers();
        assert_eq!(resolve(7_000.0, &tiers, UnmatchedWeightPolicy::Free).unwrap(), Money::zero());

        let err = resolve(7_000.0, &tiers, UnmatchedWeightPolicy::Reject).unwrap_err();
        assert!(matches!(err, PricingError::NoDeliveryTier { weight } if weight == 7_000.0));

        assert!(resolve(10.0, &[], UnmatchedWeightPolicy::Free).unwrap().is_zero());
    }

    #[test]
    fn test_inverted_tier_is_used_as_given() {
        // min > max can never contain anything; it is not silently repaired.
        let tiers = vec![
            DeliveryTier::bounded(5_000.0, 1_000.0, rupees(10)),
            DeliveryTier::unbounded(0.0, rupees(60)),
        ];
        assert_eq!(resolve(3_000.0, &tiers, UnmatchedWeightPolicy::Free).unwrap(), rupees(60));
    }

    #[test]
    fn test_every_weight_maps_to_one_tier_or_zero() {
        let tiers = boundary_tiers();
        for step in 0..=240 {
            let weight = f64::from(step) * 50.0;
            let charge = resolve(weight, &tiers, UnmatchedWeightPolicy::Free).unwrap();
            let expected = find_tier(weight, &tiers).map_or(Money::zero(), |tier| tier.charge);
            assert_eq!(charge, expected, "weight {weight}");
        }
    }

    #[test]
    fn test_quote_reports_status() {
        let tiers = boundary_tiers();
        let matched = quote(500.0, &tiers, UnmatchedWeightPolicy::Free);
        assert_eq!(matched.status, DeliveryStatus::Matched);

        let free = quote(7_000.0, &tiers, UnmatchedWeightPolicy::Free);
        assert_eq!(free.status, DeliveryStatus::Unmatched);
        assert!(free.charge.is_zero());

        let refused = quote(7_000.0, &tiers, UnmatchedWeightPolicy::Reject);
        assert_eq!(refused.status, DeliveryStatus::Unserviceable);
        assert!(refused.charge.is_zero());
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("free".parse::<UnmatchedWeightPolicy>().unwrap(), UnmatchedWeightPolicy::Free);
        assert_eq!("Strict".parse::<UnmatchedWeightPolicy>().unwrap(), UnmatchedWeightPolicy::Reject);
        assert!("maybe".parse::<UnmatchedWeightPolicy>().is_err());
    }
}
