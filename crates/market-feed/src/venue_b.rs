// =============================================================================
// Venue B client — list active contracts, then fetch each contract's funding
// rate individually, bounded by a concurrency semaphore.
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;

use aurora_domain::FundingSnapshot;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

const CONTRACTS_URLS: &[&str] = &[
    "https://api.bitget.com/api/v2/mix/market/contracts",
    "https://api.bitget.com/api/mix/v1/market/contracts",
];

/// `(url, carries a marginCoin query parameter)`
const FUNDING_ENDPOINTS: &[(&str, bool)] = &[
    ("https://api.bitget.com/api/v2/mix/market/current-fund-rate", true),
    ("https://api.bitget.com/api/mix/v1/market/currentFundRate", false),
];

const PRODUCT_TYPE: &str = "USDT-FUTURES";

struct Contract {
    symbol: String,
    margin_coin: String,
}

/// Fetch the contract list, then every contract's funding rate concurrently
/// (bounded by `concurrency`). A contract whose funding request fails on
/// every endpoint variant is simply absent from the result.
pub async fn fetch(client: &reqwest::Client, concurrency: usize) -> anyhow::Result<Vec<FundingSnapshot>> {
    let contracts = fetch_contracts(client).await?;
    if contracts.is_empty() {
        return Ok(Vec::new());
    }

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = Vec::with_capacity(contracts.len());
    for contract in contracts {
        let client = client.clone();
        let semaphore = semaphore.clone();
        tasks.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            fetch_funding(&client, &contract).await
        }));
    }

    let mut snapshots = Vec::with_capacity(tasks.len());
    for task in tasks {
        match task.await {
            Ok(Some(snap)) => snapshots.push(snap),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "venue_b funding task panicked"),
        }
    }
    info!(count = snapshots.len(), "fetched venue_b funding entries");
    Ok(snapshots)
}

async fn fetch_contracts(client: &reqwest::Client) -> anyhow::Result<Vec<Contract>> {
    for url in CONTRACTS_URLS {
        let resp = match client.get(*url).query(&[("productType", PRODUCT_TYPE)]).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(url = %url, error = %e, "fetch venue_b contracts failed");
                continue;
            }
        };
        if !resp.status().is_success() {
            warn!(url = %url, status = %resp.status(), "venue_b contract endpoint unavailable");
            continue;
        }
        let payload: Value = match resp.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!(url = %url, error = %e, "decode venue_b contracts failed");
                continue;
            }
        };

        let data = payload.get("data").cloned().unwrap_or(Value::Null);
        let list = match data {
            Value::Array(items) => items,
            Value::Object(obj) => obj.get("symbols").and_then(Value::as_array).cloned().unwrap_or_default(),
            _ => Vec::new(),
        };
        if list.is_empty() {
            continue;
        }

        let contracts: Vec<Contract> = list
            .iter()
            .filter_map(|c| {
                let symbol = c.get("symbol")?.as_str()?.to_string();
                let margin_coin = c
                    .get("marginCoin")
                    .or_else(|| c.get("quoteCoin"))
                    .and_then(Value::as_str)
                    .unwrap_or("USDT")
                    .to_string();
                Some(Contract { symbol, margin_coin })
            })
            .collect();
        info!(count = contracts.len(), url = %url, "fetched venue_b contracts");
        return Ok(contracts);
    }
    Ok(Vec::new())
}

async fn fetch_funding(client: &reqwest::Client, contract: &Contract) -> Option<FundingSnapshot> {
    let base_symbol = contract.symbol.split('_').next().unwrap_or(&contract.symbol);

    for (url, with_margin) in FUNDING_ENDPOINTS {
        let mut query: HashMap<&str, &str> = HashMap::from([
            ("symbol", base_symbol),
            ("productType", PRODUCT_TYPE),
            ("marginCoin", contract.margin_coin.as_str()),
        ]);
        if !with_margin {
            query.remove("marginCoin");
        }

        let resp = match client.get(*url).query(&query).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                debug!(url = %url, status = %r.status(), "venue_b funding request failed");
                continue;
            }
            Err(e) => {
                debug!(url = %url, error = %e, "venue_b funding request failed");
                continue;
            }
        };

        let payload: Value = match resp.json().await {
            Ok(v) => v,
            Err(_) => continue,
        };
        let data = payload.get("data").cloned().unwrap_or(Value::Null);
        let record = match &data {
            Value::Object(obj) => {
                if let Some(Value::Array(items)) = obj.get("data") {
                    items.first().cloned()
                } else if let Some(Value::Array(items)) = obj.get("list") {
                    items.first().cloned()
                } else {
                    Some(data.clone())
                }
            }
            Value::Array(items) => items.first().cloned(),
            _ => None,
        };

        let Some(mut record) = record else { continue };
        if record.get("symbol").is_none() {
            if let Value::Object(map) = &mut record {
                map.insert("symbol".to_string(), Value::String(contract.symbol.clone()));
            }
        }

        match to_snapshot(&record) {
            Ok(snap) => return Some(snap),
            Err(e) => {
                debug!(symbol = %contract.symbol, error = %e, "normalize venue_b funding failed");
                return None;
            }
        }
    }
    None
}

fn to_snapshot(item: &Value) -> anyhow::Result<FundingSnapshot> {
    let raw_rate = item
        .get("fundingRate")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<f64>().ok())
        .or_else(|| item.get("fundingRate").and_then(Value::as_f64))
        .unwrap_or(0.0);
    let settle_hours = item
        .get("fundingRateInterval")
        .and_then(|v| v.as_str().and_then(|s| s.parse::<f64>().ok()).or_else(|| v.as_f64()))
        .unwrap_or(8.0);
    let next_time_ms = item
        .get("nextUpdate")
        .and_then(|v| v.as_str().and_then(|s| s.parse::<i64>().ok()).or_else(|| v.as_i64()))
        .unwrap_or(0);
    let symbol = item
        .get("symbol")
        .and_then(Value::as_str)
        .ok_or_else(|| anyhow::anyhow!("missing symbol"))?
        .to_string();

    Ok(FundingSnapshot::from_venue_b(symbol, raw_rate, settle_hours, next_time_ms, None, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_snapshot_strips_contract_suffix() {
        let item = json!({
            "symbol": "BTCUSDT_UMCBL",
            "fundingRate": "0.00015",
            "fundingRateInterval": "8",
            "nextUpdate": "1700000000000",
        });
        let snap = to_snapshot(&item).unwrap();
        assert_eq!(snap.symbol, "BTCUSDT");
        assert_eq!(snap.instrument.as_deref(), Some("BTCUSDT_UMCBL"));
        assert!((snap.funding_rate_raw - 0.00015).abs() < 1e-12);
    }

    #[test]
    fn to_snapshot_requires_symbol() {
        let item = json!({"fundingRate": "0.0001"});
        assert!(to_snapshot(&item).is_err());
    }
}
