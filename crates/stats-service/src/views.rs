// =============================================================================
// Open-positions view — per-leg live returns against the latest snapshots
// =============================================================================

use aurora_domain::{FundingSnapshot, PositionGroup, PositionLeg, Side, Venue};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PositionLegView {
    pub venue: Venue,
    pub side: Side,
    pub entry_price: f64,
    pub mark_price: Option<f64>,
    pub live_return: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionGroupView {
    pub group_id: String,
    pub symbol: String,
    pub long_leg: PositionLegView,
    pub short_leg: PositionLegView,
    pub current_funding_diff: Option<f64>,
    pub current_countdown_secs: Option<i64>,
    pub duration_seconds: i64,
    pub opened_at: DateTime<Utc>,
}

fn mark_of(snapshot: Option<&FundingSnapshot>) -> Option<f64> {
    snapshot.and_then(|s| s.mark_price.or(s.index_price))
}

/// `long_return = (mark - entry) / entry`; `short_return = (entry - mark) /
/// entry` — short wins when price falls. Mirrors the risk daemon's closure
/// formulas so the live view and the eventual closure decision agree on
/// what "currently profitable" means.
fn leg_return(side: Side, entry: f64, mark: Option<f64>) -> Option<f64> {
    let mark = mark?;
    Some(match side {
        Side::Long => (mark - entry) / entry,
        Side::Short => (entry - mark) / entry,
    })
}

/// Build the live view for one open group, given the latest snapshot for
/// each leg's venue (if one could be found).
pub fn build_group_view(
    group: &PositionGroup,
    legs: &[PositionLeg],
    long_snapshot: Option<&FundingSnapshot>,
    short_snapshot: Option<&FundingSnapshot>,
) -> Option<PositionGroupView> {
    let long_leg = legs.iter().find(|l| l.side == Side::Long)?;
    let short_leg = legs.iter().find(|l| l.side == Side::Short)?;

    let long_mark = mark_of(long_snapshot);
    let short_mark = mark_of(short_snapshot);

    let current_funding_diff = match (long_snapshot, short_snapshot) {
        (Some(l), Some(s)) => Some(l.rate8h() - s.rate8h()),
        _ => None,
    };
    let current_countdown_secs = match (long_snapshot, short_snapshot) {
        (Some(l), Some(s)) => Some(l.settle_countdown_secs().min(s.settle_countdown_secs())),
        _ => None,
    };

    Some(PositionGroupView {
        group_id: group.group_id.clone(),
        symbol: group.symbol.clone(),
        long_leg: PositionLegView {
            venue: long_leg.exchange,
            side: Side::Long,
            entry_price: long_leg.entry_price,
            mark_price: long_mark,
            live_return: leg_return(Side::Long, long_leg.entry_price, long_mark),
        },
        short_leg: PositionLegView {
            venue: short_leg.exchange,
            side: Side::Short,
            entry_price: short_leg.entry_price,
            mark_price: short_mark,
            live_return: leg_return(Side::Short, short_leg.entry_price, short_mark),
        },
        current_funding_diff,
        current_countdown_secs,
        duration_seconds: (Utc::now() - group.opened_at).num_seconds(),
        opened_at: group.opened_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use aurora_domain::Status;

    fn leg(side: Side, venue: Venue, entry: f64) -> PositionLeg {
        PositionLeg {
            id: 0,
            group_id: "BTCUSDT-20260101000000".to_string(),
            exchange: venue,
            side,
            quantity: 1000.0,
            entry_price: entry,
            exit_price: None,
            margin: 100.0,
            notional: 1000.0,
            fee_rate: 0.0,
            status: Status::Open,
            opened_at: Utc::now(),
            closed_at: None,
            pnl: None,
        }
    }

    fn group() -> PositionGroup {
        PositionGroup {
            group_id: "BTCUSDT-20260101000000".to_string(),
            symbol: "BTCUSDT".to_string(),
            long_exchange: Venue::VenueB,
            short_exchange: Venue::VenueA,
            leverage: 10.0,
            margin_per_leg: 100.0,
            notional_per_leg: 1000.0,
            funding_diff: 0.0008,
            expected_rate8h: 0.0008,
            realized_pnl: 0.0,
            status: Status::Open,
            simulated: true,
            opened_at: Utc::now(),
            closed_at: None,
            close_reason: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn missing_snapshots_still_yield_a_view_with_null_returns() {
        let g = group();
        let legs = vec![leg(Side::Long, Venue::VenueB, 100.0), leg(Side::Short, Venue::VenueA, 100.0)];
        let view = build_group_view(&g, &legs, None, None).unwrap();
        assert!(view.long_leg.live_return.is_none());
        assert!(view.current_funding_diff.is_none());
    }

    #[test]
    fn live_return_matches_long_short_formula() {
        let g = group();
        let legs = vec![leg(Side::Long, Venue::VenueB, 100.0), leg(Side::Short, Venue::VenueA, 100.0)];
        let long_snap = FundingSnapshot::from_venue_b("BTCUSDT_UMCBL", 0.0001, 8.0, 0, Some(110.0), None);
        let short_snap = FundingSnapshot::from_venue_a("BTCUSDT", 0.0001, 8.0, 0, Some(90.0), None);
        let view = build_group_view(&g, &legs, Some(&long_snap), Some(&short_snap)).unwrap();
        assert!((view.long_leg.live_return.unwrap() - 0.1).abs() < 1e-12);
        assert!((view.short_leg.live_return.unwrap() - 0.1).abs() < 1e-12);
    }
}
