//! # Validation Module
//!
//! Field checks for cart input, and soft audits for rule tables.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Payload shape (payload.rs)                                   │
//! │  ├── Missing fields, bad types, negative or out-of-range numbers │
//! │  └── HARD: the payload is rejected, the loader falls back              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Rule audits (THIS MODULE)                                    │
//! │  ├── Inverted ranges, gaps, overlaps, rate split mismatch              │
//! │  └── SOFT: reported as warnings, rules are used as given               │
//! │                                                                         │
//! │  Layer 3: Cart input (THIS MODULE)                                     │
//! │  ├── Empty ids, negative prices or weights, zero quantities            │
//! │  └── The op is refused; the cart and its totals are untouched          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;

use crate::error::ValidationError;
use crate::types::{CartItem, DeliveryTier, TaxSettings};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Cart Input
// =============================================================================

/// Validates an item before it enters the cart.
///
/// ## Rules
/// - `id` must not be blank
/// - `price` must not be negative
/// - `quantity` must be at least 1
/// - `weight` must be a finite, non-negative number of grams
pub fn validate_cart_item(item: &CartItem) -> ValidationResult<()> {
    if item.id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    if item.price.is_negative() {
        return Err(ValidationError::Negative {
            field: "price".to_string(),
        });
    }

    if item.quantity == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    validate_weight(item.weight)
}

/// Validates a weight in grams.
///
/// ## Example
/// ```rust
/// use bazaar_core::validation::validate_weight;
///
/// assert!(validate_weight(0.0).is_ok());
/// assert!(validate_weight(-1.0).is_err());
/// assert!(validate_weight(f64::NAN).is_err());
/// ```
pub fn validate_weight(weight: f64) -> ValidationResult<()> {
    if !weight.is_finite() {
        return Err(ValidationError::NotFinite {
            field: "weight".to_string(),
        });
    }

    if weight < 0.0 {
        return Err(ValidationError::Negative {
            field: "weight".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Rule Audits
// =============================================================================

/// A soft rule violation. The rules are still used exactly as given.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleWarning {
    /// `min_weight > max_weight`; the tier can never match.
    InvertedTier { index: usize, min: f64, max: f64 },
    /// Weights between two consecutive active tiers are not covered.
    Gap { after: usize, from: f64, to: f64 },
    /// Two consecutive active tiers overlap beyond a shared boundary.
    Overlap { after: usize, at: f64 },
    /// An active tier follows the open-ended tier and is unreachable above it.
    AfterUnbounded { index: usize },
    /// The table has no active tier at all.
    NoActiveTiers,
    /// `cgst + sgst != gst`.
    SplitMismatch { gst_bps: u32, cgst_bps: u32, sgst_bps: u32 },
}

impl fmt::Display for RuleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleWarning::InvertedTier { index, min, max } => {
                write!(f, "tier {index} has min weight {min} above max weight {max}")
            }
            RuleWarning::Gap { after, from, to } => {
                write!(f, "weights between {from} g and {to} g after tier {after} have no tier")
            }
            RuleWarning::Overlap { after, at } => {
                write!(f, "tier after {after} starts at {at} g, inside the previous tier")
            }
            RuleWarning::AfterUnbounded { index } => {
                write!(f, "tier {index} follows the open-ended tier")
            }
            RuleWarning::NoActiveTiers => write!(f, "no active delivery tiers"),
            RuleWarning::SplitMismatch {
                gst_bps,
                cgst_bps,
                sgst_bps,
            } => write!(
                f,
                "cgst ({cgst_bps} bps) + sgst ({sgst_bps} bps) does not equal gst ({gst_bps} bps)"
            ),
        }
    }
}

/// Audits a tier table for inverted ranges, gaps and overlaps.
///
/// Consecutive active tiers are compared in listed order. A tier starting
/// exactly at its predecessor's max is the expected shared boundary and is
/// not reported.
pub fn audit_tiers(tiers: &[DeliveryTier]) -> Vec<RuleWarning> {
    let mut warnings = Vec::new();

    for (index, tier) in tiers.iter().enumerate() {
        if let Some(max) = tier.max_weight {
            if tier.min_weight > max {
                warnings.push(RuleWarning::InvertedTier {
                    index,
                    min: tier.min_weight,
                    max,
                });
            }
        }
    }

    let active: Vec<(usize, &DeliveryTier)> =
        tiers.iter().enumerate().filter(|(_, t)| t.is_active).collect();

    if active.is_empty() {
        warnings.push(RuleWarning::NoActiveTiers);
        return warnings;
    }

    for pair in active.windows(2) {
        let (prev_index, prev) = pair[0];
        let (index, next) = pair[1];

        let Some(prev_max) = prev.max_weight else {
            warnings.push(RuleWarning::AfterUnbounded { index });
            continue;
        };

        if next.min_weight > prev_max {
            warnings.push(RuleWarning::Gap {
                after: prev_index,
                from: prev_max,
                to: next.min_weight,
            });
        } else if next.min_weight < prev_max {
            warnings.push(RuleWarning::Overlap {
                after: prev_index,
                at: next.min_weight,
            });
        }
    }

    warnings
}

/// Audits tax settings for a rate split that does not add up.
pub fn audit_tax(settings: &TaxSettings) -> Vec<RuleWarning> {
    if settings.split_is_consistent() {
        return Vec::new();
    }

    vec![RuleWarning::SplitMismatch {
        gst_bps: settings.gst_rate.bps(),
        cgst_bps: settings.cgst_rate.bps(),
        sgst_bps: settings.sgst_rate.bps(),
    }]
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::default_delivery_tiers;

    #[test]
    fn test_validate_cart_item() {
        let ok = CartItem::new("a", Money::from_cents(100), 1, 10.0);
        assert!(validate_cart_item(&ok).is_ok());

        let free = CartItem::new("a", Money::zero(), 1, 0.0);
        assert!(validate_cart_item(&free).is_ok());

        let blank = CartItem::new("  ", Money::from_cents(100), 1, 10.0);
        assert_eq!(
            validate_cart_item(&blank),
            Err(ValidationError::Required {
                field: "id".to_string()
            })
        );

        let zero_qty = CartItem::new("a", Money::from_cents(100), 0, 10.0);
        assert!(validate_cart_item(&zero_qty).is_err());

        let heavy_nan = CartItem::new("a", Money::from_cents(100), 1, f64::NAN);
        assert!(validate_cart_item(&heavy_nan).is_err());
    }

    #[test]
    fn test_default_tiers_are_clean() {
        assert!(audit_tiers(&default_delivery_tiers()).is_empty());
    }

    #[test]
    fn test_audit_reports_gap_overlap_and_inversion() {
        let tiers = vec![
            DeliveryTier::bounded(0.0, 1_000.0, Money::zero()),
            DeliveryTier::bounded(1_500.0, 3_000.0, Money::zero()),
            DeliveryTier::bounded(2_000.0, 4_000.0, Money::zero()),
            DeliveryTier::bounded(9_000.0, 8_000.0, Money::zero()).inactive(),
        ];
        let warnings = audit_tiers(&tiers);

        assert!(warnings.contains(&RuleWarning::Gap {
            after: 0,
            from: 1_000.0,
            to: 1_500.0
        }));
        assert!(warnings.contains(&RuleWarning::Overlap { after: 1, at: 2_000.0 }));
        assert!(warnings.contains(&RuleWarning::InvertedTier {
            index: 3,
            min: 9_000.0,
            max: 8_000.0
        }));
    }

    #[test]
    fn test_audit_flags_unreachable_and_empty_tables() {
        let tiers = vec![
            DeliveryTier::unbounded(0.0, Money::zero()),
            DeliveryTier::bounded(10.0, 20.0, Money::zero()),
        ];
        assert_eq!(audit_tiers(&tiers), vec![RuleWarning::AfterUnbounded { index: 1 }]);

        let all_off = vec![DeliveryTier::unbounded(0.0, Money::zero()).inactive()];
        assert_eq!(audit_tiers(&all_off), vec![RuleWarning::NoActiveTiers]);
    }

    #[test]
    fn test_audit_tax_split() {
        assert!(audit_tax(&TaxSettings::default()).is_empty());

        let skewed = TaxSettings::from_percentages(18.0, 9.0, 8.0);
        let warnings = audit_tax(&skewed);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].to_string(),
            "cgst (900 bps) + sgst (800 bps) does not equal gst (1800 bps)"
        );
    }
}
