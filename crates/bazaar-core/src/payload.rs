//! # Rule Payload Normalization
//!
//! Turns the JSON the configuration service returns into rule types.
//!
//! ## Accepted Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DELIVERY                                                               │
//! │    [ {tier}, ... ]                          bare array                  │
//! │    { "data": [ ... ] }                      wrapped                     │
//! │    { "data": { "deliveryCharges": [...] } } nested wrappers             │
//! │    wrapper keys: data, tiers, deliveryCharges, delivery_charges,        │
//! │                  charges, items                                         │
//! │                                                                         │
//! │  TAX                                                                    │
//! │    { "gstRate": 18, ... }                   bare object                 │
//! │    { "data": { ... } }                      wrapped                     │
//! │    [ { ... }, ... ]                         list: first active entry    │
//! │    wrapper keys: data, settings, tax, taxSettings, tax_settings         │
//! │                                                                         │
//! │  Field names may be camelCase or snake_case. Numbers may arrive as      │
//! │  numeric strings.                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Anything else is [`PricingError::Malformed`].

use serde_json::{Map, Value};

use crate::error::{PricingError, PricingResult};
use crate::money::Money;
use crate::types::{ConfigKind, DeliveryTier, RuleUpdate, TaxRate, TaxSettings};

/// How many wrapper objects deep we look for the payload body.
const MAX_ENVELOPE_DEPTH: usize = 3;

const DELIVERY_WRAPPERS: &[&str] = &[
    "data",
    "tiers",
    "deliveryCharges",
    "delivery_charges",
    "charges",
    "items",
];

const TAX_WRAPPERS: &[&str] = &["data", "settings", "tax", "taxSettings", "tax_settings"];

const GST_FIELDS: &[&str] = &["gstRate", "gst_rate", "gst"];

/// Highest tax rate accepted from the service, in percent.
const MAX_RATE_PERCENT: f64 = 100.0;

/// Parses a payload for `kind` into a whole-kind rule update.
pub fn parse(kind: ConfigKind, value: &Value) -> PricingResult<RuleUpdate> {
    match kind {
        ConfigKind::Delivery => parse_delivery_tiers(value).map(RuleUpdate::Delivery),
        ConfigKind::Tax => parse_tax_settings(value).map(RuleUpdate::Tax),
    }
}

// =============================================================================
// Delivery
// =============================================================================

/// Parses a delivery tier table, keeping the listed order.
pub fn parse_delivery_tiers(value: &Value) -> PricingResult<Vec<DeliveryTier>> {
    let kind = ConfigKind::Delivery;
    let list = find_tier_list(value, 0)
        .ok_or_else(|| PricingError::malformed(kind, "expected an array of delivery tiers"))?;

    list.iter()
        .enumerate()
        .map(|(index, entry)| {
            let obj = entry.as_object().ok_or_else(|| {
                PricingError::malformed(kind, format!("tier {index} is not an object"))
            })?;
            parse_tier(obj).map_err(|reason| {
                PricingError::malformed(kind, format!("tier {index}: {reason}"))
            })
        })
        .collect()
}

fn find_tier_list(value: &Value, depth: usize) -> Option<&Vec<Value>> {
    match value {
        Value::Array(list) => Some(list),
        Value::Object(obj) if depth < MAX_ENVELOPE_DEPTH => DELIVERY_WRAPPERS
            .iter()
            .filter_map(|key| obj.get(*key))
            .find_map(|inner| find_tier_list(inner, depth + 1)),
        _ => None,
    }
}

fn parse_tier(obj: &Map<String, Value>) -> Result<DeliveryTier, String> {
    let min_weight = required_number(obj, &["minWeight", "min_weight", "min"])?;
    let max_weight = optional_number(obj, &["maxWeight", "max_weight", "max"])?;
    let charge = required_number(obj, &["charge", "amount", "deliveryCharge", "delivery_charge"])?;
    let is_active = optional_bool(obj, &["isActive", "is_active", "active"])?.unwrap_or(true);

    let charge = Money::from_major(charge)
        .filter(|charge| *charge <= Money::MAX)
        .ok_or_else(|| "charge is out of range".to_string())?;

    Ok(DeliveryTier {
        min_weight,
        max_weight,
        charge,
        is_active,
    })
}

// =============================================================================
// Tax
// =============================================================================

/// Parses GST settings.
///
/// When both split rates are absent the GST rate is halved between them;
/// when one is absent it takes whatever the other leaves of GST.
pub fn parse_tax_settings(value: &Value) -> PricingResult<TaxSettings> {
    let kind = ConfigKind::Tax;
    let obj = find_tax_object(value, 0)
        .ok_or_else(|| PricingError::malformed(kind, "expected a tax settings object"))?;

    parse_tax(obj).map_err(|reason| PricingError::malformed(kind, reason))
}

fn find_tax_object(value: &Value, depth: usize) -> Option<&Map<String, Value>> {
    if depth >= MAX_ENVELOPE_DEPTH {
        return None;
    }

    match value {
        Value::Object(obj) if lookup(obj, GST_FIELDS).is_some() => Some(obj),
        Value::Object(obj) => TAX_WRAPPERS
            .iter()
            .filter_map(|key| obj.get(*key))
            .find_map(|inner| find_tax_object(inner, depth + 1)),
        Value::Array(list) => {
            let candidates: Vec<&Map<String, Value>> = list
                .iter()
                .filter_map(|entry| find_tax_object(entry, depth + 1))
                .collect();
            candidates
                .iter()
                .find(|obj| {
                    optional_bool(obj, &["isActive", "is_active", "active"])
                        .ok()
                        .flatten()
                        .unwrap_or(true)
                })
                .or(candidates.first())
                .copied()
        }
        _ => None,
    }
}

fn parse_tax(obj: &Map<String, Value>) -> Result<TaxSettings, String> {
    let gst = rate(required_number(obj, GST_FIELDS)?, GST_FIELDS[0])?;
    let cgst = optional_number(obj, CGST_FIELDS)?
        .map(|pct| rate(pct, CGST_FIELDS[0]))
        .transpose()?;
    let sgst = optional_number(obj, SGST_FIELDS)?
        .map(|pct| rate(pct, SGST_FIELDS[0]))
        .transpose()?;
    let is_active = optional_bool(obj, &["isActive", "is_active", "active"])?.unwrap_or(true);

    let remainder = |other: TaxRate| TaxRate::from_bps(gst.bps().saturating_sub(other.bps()));
    let (cgst_rate, sgst_rate) = match (cgst, sgst) {
        (Some(c), Some(s)) => (c, s),
        (Some(c), None) => (c, remainder(c)),
        (None, Some(s)) => (remainder(s), s),
        (None, None) => {
            let half = TaxRate::from_bps(gst.bps() / 2);
            (half, remainder(half))
        }
    };

    Ok(TaxSettings {
        gst_rate: gst,
        cgst_rate,
        sgst_rate,
        is_active,
    })
}

const CGST_FIELDS: &[&str] = &["cgstRate", "cgst_rate", "cgst"];
const SGST_FIELDS: &[&str] = &["sgstRate", "sgst_rate", "sgst"];

fn rate(pct: f64, name: &str) -> Result<TaxRate, String> {
    if pct > MAX_RATE_PERCENT {
        return Err(format!("{name} {pct} is above {MAX_RATE_PERCENT}%"));
    }
    Ok(TaxRate::from_percentage(pct))
}

// =============================================================================
// Field Helpers
// =============================================================================

fn lookup<'a>(
    obj: &'a Map<String, Value>,
    names: &[&'static str],
) -> Option<(&'static str, &'a Value)> {
    names
        .iter()
        .find_map(|name| obj.get(*name).filter(|v| !v.is_null()).map(|v| (*name, v)))
}

fn required_number(obj: &Map<String, Value>, names: &[&'static str]) -> Result<f64, String> {
    optional_number(obj, names)?.ok_or_else(|| format!("{} is missing", names[0]))
}

fn optional_number(obj: &Map<String, Value>, names: &[&'static str]) -> Result<Option<f64>, String> {
    let Some((name, value)) = lookup(obj, names) else {
        return Ok(None);
    };

    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| format!("{name} is not a number"))?;

    if !number.is_finite() {
        return Err(format!("{name} is not a finite number"));
    }
    if number < 0.0 {
        return Err(format!("{name} must not be negative"));
    }

    Ok(Some(number))
}

fn optional_bool(obj: &Map<String, Value>, names: &[&'static str]) -> Result<Option<bool>, String> {
    let Some((name, value)) = lookup(obj, names) else {
        return Ok(None);
    };

    match value {
        Value::Bool(b) => Ok(Some(*b)),
        Value::Number(n) if n.as_i64() == Some(0) => Ok(Some(false)),
        Value::Number(n) if n.as_i64() == Some(1) => Ok(Some(true)),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(format!("{name} is not a boolean")),
        },
        _ => Err(format!("{name} is not a boolean")),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bare_tier_array() {
        let tiers = parse_delivery_tiers(&json!([
            { "minWeight": 0, "maxWeight": 1000, "charge": 0, "isActive": true },
            { "minWeight": 1000, "maxWeight": null, "charge": 49.5 }
        ]))
        .unwrap();

        assert_eq!(tiers.len(), 2);
        assert_eq!(tiers[0], DeliveryTier::bounded(0.0, 1_000.0, Money::zero()));
        assert_eq!(tiers[1], DeliveryTier::unbounded(1_000.0, Money::from_cents(4_950)));
    }

    #[test]
    fn test_wrapped_and_snake_case_tiers() {
        let payload = json!({
            "success": true,
            "data": { "delivery_charges": [
                { "min_weight": "0", "max_weight": "500", "amount": "25", "is_active": 0 },
                { "min_weight": 500, "charge": 60 }
            ]}
        });
        let tiers = parse_delivery_tiers(&payload).unwrap();

        assert!(!tiers[0].is_active);
        assert_eq!(tiers[0].charge.cents(), 2_500);
        assert_eq!(tiers[1].max_weight, None);
        assert!(tiers[1].is_active);
    }

    #[test]
    fn test_malformed_tiers_are_rejected() {
        let cases = [
            json!({ "message": "ok" }),
            json!("tiers"),
            json!([{ "maxWeight": 10, "charge": 1 }]),
            json!([{ "minWeight": 0, "charge": "free" }]),
            json!([{ "minWeight": -5, "charge": 1 }]),
            json!([{ "minWeight": 0, "charge": 1, "isActive": "sometimes" }]),
            json!([{ "minWeight": 0, "charge": 5e16 }]),
            json!([42]),
        ];
        for case in cases {
            let err = parse_delivery_tiers(&case).unwrap_err();
            assert!(matches!(err, PricingError::Malformed { kind: ConfigKind::Delivery, .. }), "{case}");
        }
    }

    #[test]
    fn test_inverted_tier_parses_as_given() {
        let tiers = parse_delivery_tiers(&json!([{ "minWeight": 10, "maxWeight": 5, "charge": 1 }])).unwrap();
        assert_eq!(tiers[0].min_weight, 10.0);
        assert_eq!(tiers[0].max_weight, Some(5.0));
    }

    #[test]
    fn test_tax_shapes() {
        let bare = parse_tax_settings(&json!({
            "gstRate": 18, "cgstRate": 9, "sgstRate": 9, "isActive": true
        }))
        .unwrap();
        assert_eq!(bare, TaxSettings::default());

        let wrapped = parse_tax_settings(&json!({ "data": { "gst_rate": "12" } })).unwrap();
        assert_eq!(wrapped, TaxSettings::from_percentages(12.0, 6.0, 6.0));

        let listed = parse_tax_settings(&json!({ "settings": [
            { "gstRate": 5, "isActive": false },
            { "gstRate": 28, "cgstRate": 14 }
        ]}))
        .unwrap();
        assert_eq!(listed, TaxSettings::from_percentages(28.0, 14.0, 14.0));
    }

    #[test]
    fn test_tax_split_defaults() {
        let only_cgst = parse_tax_settings(&json!({ "gstRate": 18, "cgstRate": 10 })).unwrap();
        assert_eq!(only_cgst.sgst_rate.bps(), 800);

        let full = parse_tax_settings(&json!({ "gstRate": 100 })).unwrap();
        assert_eq!(full.gst_rate.bps(), 10_000);

        let odd = parse_tax_settings(&json!({ "gstRate": 0.05 })).unwrap();
        assert_eq!(odd.gst_rate.bps(), 5);
        assert_eq!(odd.cgst_rate.bps() + odd.sgst_rate.bps(), 5);
    }

    #[test]
    fn test_malformed_tax_is_rejected() {
        for case in [
            json!({ "cgstRate": 9 }),
            json!({ "gstRate": "eighteen" }),
            json!({ "gstRate": -1 }),
            json!({ "gstRate": 1e10 }),
            json!({ "gstRate": 18, "cgstRate": 150 }),
            json!({ "gstRate": 18, "sgst_rate": "101" }),
            json!([]),
            json!(null),
        ] {
            let err = parse_tax_settings(&case).unwrap_err();
            assert!(matches!(err, PricingError::Malformed { kind: ConfigKind::Tax, .. }), "{case}");
        }
    }

    #[test]
    fn test_parse_dispatches_on_kind() {
        let update = parse(ConfigKind::Tax, &json!({ "gstRate": 18 })).unwrap();
        assert_eq!(update.kind(), ConfigKind::Tax);
    }
}
