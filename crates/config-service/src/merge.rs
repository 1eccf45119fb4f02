// =============================================================================
// Partial-field merge — a one-field PUT patch must not blow away the rest of
// `thresholds`/`risk_limits`.
// =============================================================================

use aurora_domain::{RiskLimits, Thresholds};
use serde_json::Value;

/// Overlay `patch`'s top-level keys onto `base`, leaving every key `patch`
/// does not mention untouched. Both inputs are expected to be JSON objects;
/// anything else is returned unmodified.
fn overlay(base: Value, patch: Option<Value>) -> Value {
    let Some(Value::Object(patch_map)) = patch else {
        return base;
    };
    let Value::Object(mut base_map) = base else {
        return Value::Object(patch_map);
    };
    for (key, value) in patch_map {
        base_map.insert(key, value);
    }
    Value::Object(base_map)
}

/// Merge a partial `thresholds` patch over the previous profile's values.
pub fn merge_thresholds(previous: Thresholds, patch: Option<Value>) -> Thresholds {
    let base = serde_json::to_value(previous).expect("Thresholds always serialises");
    serde_json::from_value(overlay(base, patch)).unwrap_or(previous)
}

/// Merge a partial `risk_limits` patch over the previous profile's values.
pub fn merge_risk_limits(previous: RiskLimits, patch: Option<Value>) -> RiskLimits {
    let base = serde_json::to_value(previous).expect("RiskLimits always serialises");
    serde_json::from_value(overlay(base, patch)).unwrap_or(previous)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn patching_one_threshold_field_preserves_the_rest() {
        let previous = Thresholds::default();
        let merged = merge_thresholds(previous, Some(json!({"aa": 0.01})));
        assert_eq!(merged.aa, 0.01);
        assert_eq!(merged.bb, previous.bb);
        assert_eq!(merged.hh, previous.hh);
    }

    #[test]
    fn absent_patch_leaves_risk_limits_unchanged() {
        let previous = RiskLimits {
            group_max: 7,
            ..RiskLimits::default()
        };
        let merged = merge_risk_limits(previous, None);
        assert_eq!(merged.group_max, 7);
    }

    #[test]
    fn patching_one_risk_limit_field_preserves_the_rest() {
        let previous = RiskLimits::default();
        let merged = merge_risk_limits(previous, Some(json!({"duplicate_max": 9})));
        assert_eq!(merged.duplicate_max, 9);
        assert_eq!(merged.leverage_max, previous.leverage_max);
        assert_eq!(merged.margin_per_leg, previous.margin_per_leg);
    }
}
