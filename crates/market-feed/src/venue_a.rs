// =============================================================================
// Venue A client — a single bulk request returns funding data for every
// perpetual symbol at once.
// =============================================================================

use aurora_domain::FundingSnapshot;
use tracing::warn;

const FUNDING_URL: &str = "https://fapi.binance.com/fapi/v1/premiumIndex";

#[derive(serde::Deserialize)]
struct RawItem {
    symbol: String,
    #[serde(rename = "lastFundingRate")]
    last_funding_rate: Option<String>,
    #[serde(rename = "markPrice")]
    mark_price: Option<String>,
    #[serde(rename = "indexPrice")]
    index_price: Option<String>,
    #[serde(rename = "nextFundingTime")]
    next_funding_time: Option<i64>,
}

/// Fetch every symbol's current funding snapshot in one request. Items that
/// fail to parse are logged and skipped rather than aborting the whole batch.
pub async fn fetch(client: &reqwest::Client) -> anyhow::Result<Vec<FundingSnapshot>> {
    let items: Vec<RawItem> = client.get(FUNDING_URL).send().await?.error_for_status()?.json().await?;

    let mut snapshots = Vec::with_capacity(items.len());
    for item in items {
        match to_snapshot(&item) {
            Ok(snap) => snapshots.push(snap),
            Err(e) => warn!(symbol = %item.symbol, error = %e, "skip venue_a item"),
        }
    }
    Ok(snapshots)
}

fn to_snapshot(item: &RawItem) -> anyhow::Result<FundingSnapshot> {
    let rate = item
        .last_funding_rate
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("missing lastFundingRate"))?
        .parse::<f64>()?;
    let mark_price = item.mark_price.as_deref().and_then(|s| s.parse::<f64>().ok());
    let index_price = item.index_price.as_deref().and_then(|s| s.parse::<f64>().ok());
    let next_funding_time_ms = item.next_funding_time.unwrap_or(0);

    Ok(FundingSnapshot::from_venue_a(
        item.symbol.clone(),
        rate,
        8.0,
        next_funding_time_ms,
        mark_price,
        index_price,
    ))
}
