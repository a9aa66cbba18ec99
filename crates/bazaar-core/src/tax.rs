//! # Tax Calculation
//!
//! GST on a cart subtotal, split into its central (CGST) and state (SGST)
//! components.
//!
//! The split is taken as a share of the computed total rather than from
//! the subtotal, and SGST is the remainder, so `cgst + sgst == total`
//! holds to the paisa even when the configured rates do not add up.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::TaxSettings;

/// Tax owed on a subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    pub total: Money,
    pub cgst: Money,
    pub sgst: Money,
}

impl TaxBreakdown {
    /// No tax.
    pub const fn zero() -> Self {
        TaxBreakdown {
            total: Money::zero(),
            cgst: Money::zero(),
            sgst: Money::zero(),
        }
    }
}

/// Calculates GST on `subtotal`.
///
/// ## Example
/// ```rust
/// use bazaar_core::tax::calculate;
/// use bazaar_core::{Money, TaxSettings};
///
/// let tax = calculate(Money::from_cents(59_800), &TaxSettings::default());
/// assert_eq!(tax.total.cents(), 10_764);
/// assert_eq!(tax.cgst.cents(), 5_382);
/// assert_eq!(tax.sgst.cents(), 5_382);
/// ```
pub fn calculate(subtotal: Money, settings: &TaxSettings) -> TaxBreakdown {
    if !settings.is_active || settings.gst_rate.is_zero() {
        return TaxBreakdown::zero();
    }

    let total = subtotal.calculate_tax(settings.gst_rate);
    let cgst = total.apportion(settings.cgst_rate.bps(), settings.gst_rate.bps());

    TaxBreakdown {
        total,
        cgst,
        sgst: total.saturating_sub(cgst),
    }
}
