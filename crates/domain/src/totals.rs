// =============================================================================
// totals_from_events — shared aggregation behind dynamic stats and the
// midnight archiver
// =============================================================================

use serde::Serialize;

use crate::position::{EventType, PositionEvent};

/// Per-logic amount/count pairs plus the headline open/close/net totals,
/// computed from a slice of events. The same shape backs both the
/// short-TTL dynamic view and the archived daily snapshot — only the input
/// event slice differs (all-time vs. one UTC day).
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Totals {
    pub total_open: f64,
    pub total_open_count: u64,
    pub total_close: f64,
    pub total_close_count: u64,
    pub logic1_amount: f64,
    pub logic1_count: u64,
    pub logic2_amount: f64,
    pub logic2_count: u64,
    pub logic3_amount: f64,
    pub logic3_count: u64,
    pub logic4_amount: f64,
    pub logic4_count: u64,
    pub logic5_amount: f64,
    pub logic5_count: u64,
    pub net_profit: f64,
    pub event_count: u64,
}

pub fn totals_from_events(events: &[PositionEvent]) -> Totals {
    let mut totals = Totals::default();

    for event in events {
        totals.event_count += 1;
        let notional_per_leg = event
            .data
            .get("notional_per_leg")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);
        let notional_total = notional_per_leg * 2.0;

        match event.event_type {
            EventType::Open => {
                totals.total_open += notional_total;
                totals.total_open_count += 1;
            }
            EventType::Close => {
                totals.total_close += notional_total;
                totals.total_close_count += 1;
                if let Some(reason) = event.logic_reason {
                    let (amount, count) = match reason {
                        crate::position::LogicReason::Logic1 => {
                            (&mut totals.logic1_amount, &mut totals.logic1_count)
                        }
                        crate::position::LogicReason::Logic2 => {
                            (&mut totals.logic2_amount, &mut totals.logic2_count)
                        }
                        crate::position::LogicReason::Logic3 => {
                            (&mut totals.logic3_amount, &mut totals.logic3_count)
                        }
                        crate::position::LogicReason::Logic4 => {
                            (&mut totals.logic4_amount, &mut totals.logic4_count)
                        }
                        crate::position::LogicReason::Logic5 => {
                            (&mut totals.logic5_amount, &mut totals.logic5_count)
                        }
                    };
                    *amount += notional_total;
                    *count += 1;
                }
                totals.net_profit += event.realized_pnl.unwrap_or(0.0);
            }
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::LogicReason;
    use chrono::Utc;
    use serde_json::json;

    fn event(event_type: EventType, logic: Option<LogicReason>, pnl: Option<f64>, notional_per_leg: f64) -> PositionEvent {
        PositionEvent {
            id: 0,
            group_id: "BTCUSDT-20260101000000".to_string(),
            symbol: "BTCUSDT".to_string(),
            event_type,
            logic_reason: logic,
            realized_pnl: pnl,
            data: json!({ "notional_per_leg": notional_per_leg }),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn open_events_accumulate_into_total_open_only() {
        let events = vec![event(EventType::Open, None, None, 100.0)];
        let totals = totals_from_events(&events);
        assert_eq!(totals.total_open, 200.0);
        assert_eq!(totals.total_open_count, 1);
        assert_eq!(totals.total_close, 0.0);
    }

    #[test]
    fn close_events_bucket_by_logic_reason() {
        let events = vec![
            event(EventType::Close, Some(LogicReason::Logic3), Some(12.5), 100.0),
            event(EventType::Close, Some(LogicReason::Logic3), Some(-4.0), 100.0),
            event(EventType::Close, Some(LogicReason::Logic1), Some(2.0), 50.0),
        ];
        let totals = totals_from_events(&events);
        assert_eq!(totals.logic3_amount, 400.0);
        assert_eq!(totals.logic3_count, 2);
        assert_eq!(totals.logic1_amount, 100.0);
        assert_eq!(totals.logic1_count, 1);
        assert!((totals.net_profit - 10.5).abs() < 1e-9);
    }

    #[test]
    fn missing_notional_defaults_to_zero() {
        let mut e = event(EventType::Open, None, None, 0.0);
        e.data = json!({});
        let totals = totals_from_events(&[e]);
        assert_eq!(totals.total_open, 0.0);
    }
}
