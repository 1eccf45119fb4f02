mod config_listener;
mod env;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use aurora_bus::StreamBus;
use aurora_domain::{FundingSnapshot, RuntimeConfigCell, Venue};
use parking_lot::RwLock;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::env::EnvSettings;

/// Last snapshot seen per venue per symbol, used to pair up the two legs of
/// a candidate opportunity.
#[derive(Default)]
struct LatestRates {
    by_venue: RwLock<HashMap<Venue, HashMap<String, FundingSnapshot>>>,
}

impl LatestRates {
    fn record(&self, snapshot: FundingSnapshot) {
        self.by_venue
            .write()
            .entry(snapshot.venue)
            .or_default()
            .insert(snapshot.symbol.clone(), snapshot);
    }

    fn counterpart(&self, venue: Venue, symbol: &str) -> Option<FundingSnapshot> {
        let other = match venue {
            Venue::VenueA => Venue::VenueB,
            Venue::VenueB => Venue::VenueA,
        };
        self.by_venue.read().get(&other)?.get(symbol).cloned()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = EnvSettings::load();
    info!("strategy-engine starting");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .build()?;
    let initial_state = config_listener::bootstrap(&client, &settings.config_service_url).await;
    let config_cell = Arc::new(RuntimeConfigCell::new(initial_state));
    tokio::spawn(config_listener::run(config_cell.clone(), settings.redis_url.clone()));

    let bus = StreamBus::connect(&settings.redis_url).await?;
    let rates = Arc::new(LatestRates::default());

    let consumer = tokio::spawn(consume_loop(bus, rates, config_cell));

    tokio::select! {
        result = consumer => {
            if let Err(e) = result {
                error!(error = %e, "consumer task panicked");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    info!("strategy-engine stopped");
    Ok(())
}

async fn consume_loop(bus: StreamBus, rates: Arc<LatestRates>, config_cell: Arc<RuntimeConfigCell>) {
    let mut last_id = "0-0".to_string();
    info!(from = %last_id, "strategy consumer started");
    loop {
        let (snapshots, next_id) = match bus.read_snapshots(&last_id, 100, 5000).await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "read funding snapshots failed");
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };
        last_id = next_id;

        for snapshot in snapshots {
            if let Err(e) = evaluate(&bus, &rates, &config_cell, snapshot).await {
                error!(error = %e, "evaluate opportunity failed");
            }
        }
    }
}

async fn evaluate(
    bus: &StreamBus,
    rates: &LatestRates,
    config_cell: &RuntimeConfigCell,
    snapshot: FundingSnapshot,
) -> anyhow::Result<()> {
    let config = config_cell.get();
    if !config.global_enable {
        return Ok(());
    }

    let venue = snapshot.venue;
    let symbol = snapshot.symbol.clone();
    rates.record(snapshot.clone());

    let Some(other) = rates.counterpart(venue, &symbol) else {
        return Ok(());
    };

    let Some((long_venue, short_venue, funding_diff)) =
        decide_direction(venue, snapshot.rate8h(), other.venue, other.rate8h(), config.thresholds.aa)
    else {
        return Ok(());
    };

    let opportunity =
        aurora_domain::Opportunity::create(symbol.clone(), long_venue, short_venue, funding_diff, snapshot.rate8h());

    info!(
        group_id = %opportunity.group_id,
        symbol = %symbol,
        funding_diff,
        long_venue = %long_venue,
        short_venue = %short_venue,
        "opportunity detected"
    );
    let entry_id = bus.publish_opportunity(&opportunity).await?;
    info!(entry_id = %entry_id, "published opportunity");
    Ok(())
}

/// Pure direction decision: `funding_diff = this.rate8h - other.rate8h`; the
/// leg with the lower rate8h goes long, the other goes short. Below
/// threshold (strict `<`) is not an opportunity.
fn decide_direction(
    this_venue: Venue,
    this_rate8h: f64,
    other_venue: Venue,
    other_rate8h: f64,
    aa_threshold: f64,
) -> Option<(Venue, Venue, f64)> {
    let funding_diff = this_rate8h - other_rate8h;
    if funding_diff.abs() < aa_threshold {
        return None;
    }
    if funding_diff > 0.0 {
        Some((other_venue, this_venue, funding_diff))
    } else {
        Some((this_venue, other_venue, funding_diff))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_is_not_an_opportunity() {
        assert!(decide_direction(Venue::VenueA, 0.0001, Venue::VenueB, 0.00005, 0.0005).is_none());
    }

    #[test]
    fn exactly_at_threshold_is_not_an_opportunity() {
        assert!(decide_direction(Venue::VenueA, 0.0005, Venue::VenueB, 0.0, 0.0005).is_none());
    }

    #[test]
    fn higher_rate_venue_goes_short() {
        let (long, short, diff) = decide_direction(Venue::VenueA, 0.001, Venue::VenueB, 0.0001, 0.0005).unwrap();
        assert_eq!(short, Venue::VenueA);
        assert_eq!(long, Venue::VenueB);
        assert!((diff - 0.0009).abs() < 1e-12);
    }

    #[test]
    fn lower_rate_venue_goes_long_when_other_is_higher() {
        let (long, short, diff) = decide_direction(Venue::VenueA, 0.0001, Venue::VenueB, 0.001, 0.0005).unwrap();
        assert_eq!(long, Venue::VenueA);
        assert_eq!(short, Venue::VenueB);
        assert!((diff - (-0.0009)).abs() < 1e-12);
    }
}
