// =============================================================================
// decide_close — the five-rule position-closure decision table
// =============================================================================
//
// Pure function: no database, no bus, no clock reads beyond what the caller
// already resolved into plain numbers. Rules are evaluated in strict
// priority order and the first match wins.
// =============================================================================

use aurora_domain::{LogicReason, Thresholds};

/// Everything a caller needs to persist once a rule fires: the reason, the
/// return breakdown used to decide, and the marks the breakdown was
/// computed from (so the caller can price legs at close with the same
/// numbers the decision was made on).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CloseDecision {
    pub reason: LogicReason,
    pub long_return: f64,
    pub short_return: f64,
    pub total_return: f64,
    pub worst_return: f64,
    pub current_diff: f64,
}

/// Catastrophic single-leg loss floor — rule `logic5` fires regardless of
/// any other threshold once either leg crosses this.
const CATASTROPHIC_RETURN: f64 = -0.9;

/// Evaluate the five-rule closure table for one open group.
///
/// `funding_diff_at_open` is the group's `funding_diff` as recorded when it
/// was opened (or last closed-and-reopened); `current_diff` is the
/// differential observed from this tick's snapshots. Both entry prices and
/// both marks must already be resolved (`mark_price` falling back to
/// `index_price`) — a missing price is the caller's cue to skip the group
/// for this tick rather than call this function at all.
pub fn decide_close(
    funding_diff_at_open: f64,
    long_entry: f64,
    long_mark: f64,
    short_entry: f64,
    short_mark: f64,
    current_diff: f64,
    countdown_minutes: f64,
    thresholds: &Thresholds,
) -> Option<CloseDecision> {
    let long_return = (long_mark - long_entry) / long_entry;
    let short_return = (short_entry - short_mark) / short_entry;
    let total_return = long_return + short_return;
    let worst_return = long_return.min(short_return);

    // Strict opposite-sign test: a zero on either side does not reverse.
    let diff_reversed = funding_diff_at_open * current_diff < 0.0;
    let diff_ok = current_diff.abs() <= thresholds.bb;

    let reason = if long_return <= CATASTROPHIC_RETURN || short_return <= CATASTROPHIC_RETURN {
        Some(LogicReason::Logic5)
    } else if total_return <= -thresholds.gg {
        Some(LogicReason::Logic4)
    } else if total_return >= thresholds.ff {
        Some(LogicReason::Logic3)
    } else if worst_return <= -thresholds.hh && total_return >= thresholds.ee {
        Some(LogicReason::Logic2)
    } else if ((diff_ok || diff_reversed) && total_return >= thresholds.cc)
        || (countdown_minutes <= thresholds.dd && diff_ok)
    {
        Some(LogicReason::Logic1)
    } else {
        None
    };

    reason.map(|reason| CloseDecision {
        reason,
        long_return,
        short_return,
        total_return,
        worst_return,
        current_diff,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> Thresholds {
        Thresholds {
            aa: 0.0005,
            bb: 0.0002,
            cc: 0.0001,
            dd: 5.0,
            ee: 0.0002,
            ff: 0.0010,
            gg: 0.0020,
            hh: 0.001,
        }
    }

    #[test]
    fn no_rule_fires_when_everything_is_inert() {
        let decision = decide_close(0.0005, 100.0, 100.0, 100.0, 100.0, 0.0005, 999.0, &thresholds());
        assert!(decision.is_none());
    }

    #[test]
    fn logic5_fires_on_catastrophic_long_leg() {
        // long 100 -> 9: long_return = -0.91
        let decision = decide_close(0.0005, 100.0, 9.0, 100.0, 100.0, 0.0005, 999.0, &thresholds());
        assert_eq!(decision.unwrap().reason, LogicReason::Logic5);
    }

    #[test]
    fn logic5_fires_on_catastrophic_short_leg() {
        // short 100 -> 191: short_return = (100-191)/100 = -0.91
        let decision = decide_close(0.0005, 100.0, 100.0, 100.0, 191.0, 0.0005, 999.0, &thresholds());
        assert_eq!(decision.unwrap().reason, LogicReason::Logic5);
    }

    #[test]
    fn logic4_stop_loss_on_total_return() {
        // entry_prices=(100,100), marks=(90,110): long=-0.1, short=-0.1, total=-0.2
        let decision = decide_close(0.0005, 100.0, 90.0, 100.0, 110.0, 0.0005, 999.0, &thresholds());
        let decision = decision.unwrap();
        assert_eq!(decision.reason, LogicReason::Logic4);
        assert!((decision.total_return - (-0.2)).abs() < 1e-12);
    }

    #[test]
    fn logic3_take_profit_on_total_return() {
        // long 100->110 (+0.10), short 100->90 (+0.10): total = 0.20 >= ff(0.001)
        let decision = decide_close(0.0005, 100.0, 110.0, 100.0, 90.0, 0.0005, 999.0, &thresholds());
        assert_eq!(decision.unwrap().reason, LogicReason::Logic3);
    }

    #[test]
    fn logic2_single_leg_stop_with_partial_profit() {
        // long 100->89.8 (-0.102, below -hh=0.001), short 100->89 (+0.11);
        // total = 0.008 >= ee(0.0002), worst = -0.102 <= -hh; but must not
        // cross logic3/logic4 thresholds first.
        let t = Thresholds {
            ff: 0.5,
            gg: 0.5,
            ..thresholds()
        };
        let decision = decide_close(0.0005, 100.0, 89.8, 100.0, 89.0, 0.0005, 999.0, &t);
        assert_eq!(decision.unwrap().reason, LogicReason::Logic2);
    }

    #[test]
    fn logic1_fires_on_convergence_with_profit() {
        // current_diff within bb, total_return above cc, nothing else fires.
        let t = Thresholds {
            ff: 0.5,
            gg: 0.5,
            ee: 0.5,
            hh: 0.5,
            ..thresholds()
        };
        let decision = decide_close(0.0008, 100.0, 100.3, 100.0, 99.9, 0.0001, 999.0, &t);
        let decision = decision.unwrap();
        assert_eq!(decision.reason, LogicReason::Logic1);
    }

    #[test]
    fn logic1_fires_on_diff_reversal_even_outside_bb() {
        let t = Thresholds {
            ff: 0.5,
            gg: 0.5,
            ee: 0.5,
            hh: 0.5,
            ..thresholds()
        };
        // opened with positive diff, now observing a negative diff larger
        // in magnitude than bb — diff_reversed should still permit logic1
        // provided total_return clears cc.
        let decision = decide_close(0.0008, 100.0, 100.3, 100.0, 99.9, -0.0010, 999.0, &t);
        assert_eq!(decision.unwrap().reason, LogicReason::Logic1);
    }

    #[test]
    fn logic1_does_not_reverse_on_exact_zero_either_side() {
        let t = Thresholds {
            ff: 0.5,
            gg: 0.5,
            ee: 0.5,
            hh: 0.5,
            cc: 0.5, // make the total_return branch unreachable
            ..thresholds()
        };
        // group opened at diff=0.0 (neither sign), current diff is clearly
        // outside bb and not a strict sign flip from zero — should not fire
        // via the reversal path, and countdown is inert here.
        let decision = decide_close(0.0, 100.0, 100.3, 100.0, 99.9, 0.0010, 999.0, &t);
        assert!(decision.is_none());
    }

    #[test]
    fn logic1_fires_on_settlement_countdown_when_diff_ok() {
        let t = Thresholds {
            ff: 0.5,
            gg: 0.5,
            ee: 0.5,
            hh: 0.5,
            cc: 0.5, // block the total_return branch
            ..thresholds()
        };
        let decision = decide_close(0.0005, 100.0, 100.0, 100.0, 100.0, 0.0001, 3.0, &t);
        assert_eq!(decision.unwrap().reason, LogicReason::Logic1);
    }

    #[test]
    fn priority_favors_logic5_over_everything_else() {
        // total_return also clears logic3's take-profit bar, but a leg is
        // catastrophic — logic5 must win.
        let decision = decide_close(0.0005, 100.0, 9.0, 100.0, 200.0, 0.0005, 999.0, &thresholds());
        assert_eq!(decision.unwrap().reason, LogicReason::Logic5);
    }
}
