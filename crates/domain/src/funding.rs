// =============================================================================
// FundingSnapshot — one venue's funding-rate reading for one symbol
// =============================================================================

use std::collections::HashMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::venue::Venue;

/// A single funding-rate observation captured from one venue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingSnapshot {
    pub venue: Venue,
    pub symbol: String,

    /// The raw per-settlement-interval funding rate as reported by the venue.
    pub funding_rate_raw: f64,

    /// Hours between funding settlements for this instrument (1, 4, or 8).
    pub settle_interval_hours: f64,

    /// Epoch milliseconds of the next funding settlement.
    pub next_funding_time_ms: i64,

    /// The venue's own instrument identifier, if it differs from `symbol`
    /// (e.g. Venue B's contract suffix before normalisation).
    pub instrument: Option<String>,

    pub mark_price: Option<f64>,
    pub index_price: Option<f64>,

    /// Epoch milliseconds when this snapshot was captured.
    pub captured_at_ms: i64,
}

impl FundingSnapshot {
    /// Normalise `funding_rate_raw` onto a common 8-hour basis so that rates
    /// from venues with different settlement cadences are comparable.
    pub fn rate8h(&self) -> f64 {
        if self.settle_interval_hours <= 0.0 {
            return 0.0;
        }
        self.funding_rate_raw * (8.0 / self.settle_interval_hours)
    }

    /// Seconds remaining until the next funding settlement, relative to now.
    /// Floored at zero once the settlement time has passed.
    pub fn settle_countdown_secs(&self) -> i64 {
        let now_ms = Utc::now().timestamp_millis();
        ((self.next_funding_time_ms - now_ms) / 1000).max(0)
    }

    /// Build a snapshot from Venue A's raw funding-rate payload fields.
    pub fn from_venue_a(
        symbol: impl Into<String>,
        funding_rate_raw: f64,
        settle_interval_hours: f64,
        next_funding_time_ms: i64,
        mark_price: Option<f64>,
        index_price: Option<f64>,
    ) -> Self {
        Self {
            venue: Venue::VenueA,
            symbol: symbol.into(),
            funding_rate_raw,
            settle_interval_hours,
            next_funding_time_ms,
            instrument: None,
            mark_price,
            index_price,
            captured_at_ms: Utc::now().timestamp_millis(),
        }
    }

    /// Build a snapshot from Venue B's raw contract payload. Venue B reports
    /// a contract identifier carrying a product suffix (e.g. `_UMCBL`); the
    /// suffix is stripped to derive the normalised `symbol` and the
    /// untouched identifier is kept in `instrument`.
    pub fn from_venue_b(
        raw_contract: impl Into<String>,
        funding_rate_raw: f64,
        settle_interval_hours: f64,
        next_funding_time_ms: i64,
        mark_price: Option<f64>,
        index_price: Option<f64>,
    ) -> Self {
        let raw_contract = raw_contract.into();
        let symbol = strip_venue_b_suffix(&raw_contract);
        Self {
            venue: Venue::VenueB,
            symbol,
            funding_rate_raw,
            settle_interval_hours,
            next_funding_time_ms,
            instrument: Some(raw_contract),
            mark_price,
            index_price,
            captured_at_ms: Utc::now().timestamp_millis(),
        }
    }

    /// Serialise into the scalar-string field map the bus writes to a Redis
    /// stream entry. `None` fields are simply omitted rather than written as
    /// a literal `"None"` string.
    pub fn to_stream_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("venue".to_string(), self.venue.as_str().to_string()),
            ("symbol".to_string(), self.symbol.clone()),
            ("funding_rate_raw".to_string(), self.funding_rate_raw.to_string()),
            (
                "settle_interval_hours".to_string(),
                self.settle_interval_hours.to_string(),
            ),
            (
                "next_funding_time_ms".to_string(),
                self.next_funding_time_ms.to_string(),
            ),
            ("captured_at_ms".to_string(), self.captured_at_ms.to_string()),
        ];
        if let Some(instrument) = &self.instrument {
            fields.push(("instrument".to_string(), instrument.clone()));
        }
        if let Some(mark_price) = self.mark_price {
            fields.push(("mark_price".to_string(), mark_price.to_string()));
        }
        if let Some(index_price) = self.index_price {
            fields.push(("index_price".to_string(), index_price.to_string()));
        }
        fields
    }

    /// Parse a snapshot back out of a Redis stream field map. Absent fields
    /// and the literal string `"None"` are both treated as null for the
    /// optional fields — some writers stringify `None` explicitly.
    pub fn from_stream_fields(fields: &HashMap<String, String>) -> Result<Self, DomainError> {
        let get = |key: &'static str| -> Result<&String, DomainError> {
            fields.get(key).ok_or(DomainError::MissingField(key))
        };

        let venue = Venue::parse(get("venue")?)?;
        let symbol = get("symbol")?.clone();

        let funding_rate_raw = parse_f64(get("funding_rate_raw")?, "funding_rate_raw")?;
        let settle_interval_hours = parse_f64(get("settle_interval_hours")?, "settle_interval_hours")?;
        let next_funding_time_ms = get("next_funding_time_ms")?
            .parse::<i64>()
            .map_err(|e| DomainError::InvalidField {
                field: "next_funding_time_ms",
                reason: e.to_string(),
            })?;

        let captured_at_ms = fields
            .get("captured_at_ms")
            .and_then(|s| optional_str(s))
            .and_then(|s| s.parse::<i64>().ok())
            .unwrap_or_else(|| Utc::now().timestamp_millis());

        Ok(Self {
            venue,
            symbol,
            funding_rate_raw,
            settle_interval_hours,
            next_funding_time_ms,
            instrument: fields.get("instrument").and_then(|s| optional_str(s)).map(str::to_string),
            mark_price: fields
                .get("mark_price")
                .and_then(|s| optional_str(s))
                .and_then(|s| s.parse::<f64>().ok()),
            index_price: fields
                .get("index_price")
                .and_then(|s| optional_str(s))
                .and_then(|s| s.parse::<f64>().ok()),
            captured_at_ms,
        })
    }
}

/// Treat an empty string or the literal `"None"` as absent.
fn optional_str(s: &str) -> Option<&str> {
    if s.is_empty() || s == "None" {
        None
    } else {
        Some(s)
    }
}

fn parse_f64(s: &str, field: &'static str) -> Result<f64, DomainError> {
    s.parse::<f64>().map_err(|e| DomainError::InvalidField {
        field,
        reason: e.to_string(),
    })
}

fn strip_venue_b_suffix(raw: &str) -> String {
    for suffix in ["_UMCBL", "_DMCBL"] {
        if let Some(stripped) = raw.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn venue_b_suffix_is_stripped_into_symbol() {
        let snap = FundingSnapshot::from_venue_b("BTCUSDT_UMCBL", 0.0001, 8.0, 0, None, None);
        assert_eq!(snap.symbol, "BTCUSDT");
        assert_eq!(snap.instrument.as_deref(), Some("BTCUSDT_UMCBL"));
    }

    #[test]
    fn rate8h_normalises_non_8h_interval() {
        let snap = FundingSnapshot::from_venue_a("BTCUSDT", 0.0002, 4.0, 0, None, None);
        assert!((snap.rate8h() - 0.0004).abs() < 1e-12);
    }

    #[test]
    fn rate8h_is_zero_for_zero_interval() {
        let snap = FundingSnapshot::from_venue_a("BTCUSDT", 0.0002, 0.0, 0, None, None);
        assert_eq!(snap.rate8h(), 0.0);
    }

    #[test]
    fn stream_roundtrip_preserves_required_fields() {
        let snap = FundingSnapshot::from_venue_a("ETHUSDT", 0.0003, 8.0, 1_700_000_000_000, Some(3000.0), None);
        let fields: HashMap<String, String> = snap.to_stream_fields().into_iter().collect();
        let parsed = FundingSnapshot::from_stream_fields(&fields).unwrap();
        assert_eq!(parsed.symbol, "ETHUSDT");
        assert_eq!(parsed.venue, Venue::VenueA);
        assert_eq!(parsed.mark_price, Some(3000.0));
        assert_eq!(parsed.index_price, None);
    }

    #[test]
    fn stream_parse_tolerates_literal_none_string() {
        let mut fields = HashMap::new();
        fields.insert("venue".to_string(), "venue_a".to_string());
        fields.insert("symbol".to_string(), "BTCUSDT".to_string());
        fields.insert("funding_rate_raw".to_string(), "0.0001".to_string());
        fields.insert("settle_interval_hours".to_string(), "8".to_string());
        fields.insert("next_funding_time_ms".to_string(), "0".to_string());
        fields.insert("mark_price".to_string(), "None".to_string());

        let parsed = FundingSnapshot::from_stream_fields(&fields).unwrap();
        assert_eq!(parsed.mark_price, None);
    }

    #[test]
    fn stream_parse_fails_on_missing_required_field() {
        let fields = HashMap::new();
        assert!(FundingSnapshot::from_stream_fields(&fields).is_err());
    }
}
