// =============================================================================
// Opportunity — a funding-rate divergence worth opening a hedged pair against
// =============================================================================

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::venue::Venue;

/// A detected cross-venue funding-rate divergence, published by the
/// strategy stage and consumed by the execution stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Deterministic idempotency key: `"{symbol}-{YYYYMMDDHHMMSS}"` (UTC).
    pub group_id: String,
    pub symbol: String,
    pub long_venue: Venue,
    pub short_venue: Venue,

    /// `short_venue.rate8h() - long_venue.rate8h()` at detection time.
    pub funding_diff: f64,

    /// Expected combined 8h funding income if the pair is opened now.
    pub expected_rate8h: f64,

    pub created_at: DateTime<Utc>,
}

impl Opportunity {
    /// Build an opportunity, deriving its deterministic `group_id` from the
    /// symbol and the current UTC timestamp.
    pub fn create(
        symbol: impl Into<String>,
        long_venue: Venue,
        short_venue: Venue,
        funding_diff: f64,
        expected_rate8h: f64,
    ) -> Self {
        let symbol = symbol.into();
        let created_at = Utc::now();
        let group_id = format!("{}-{}", symbol, created_at.format("%Y%m%d%H%M%S"));
        Self {
            group_id,
            symbol,
            long_venue,
            short_venue,
            funding_diff,
            expected_rate8h,
            created_at,
        }
    }

    pub fn to_stream_fields(&self) -> Vec<(String, String)> {
        vec![
            ("group_id".to_string(), self.group_id.clone()),
            ("symbol".to_string(), self.symbol.clone()),
            ("long_venue".to_string(), self.long_venue.as_str().to_string()),
            ("short_venue".to_string(), self.short_venue.as_str().to_string()),
            ("funding_diff".to_string(), self.funding_diff.to_string()),
            ("expected_rate8h".to_string(), self.expected_rate8h.to_string()),
            ("created_at".to_string(), self.created_at.to_rfc3339()),
        ]
    }

    pub fn from_stream_fields(fields: &HashMap<String, String>) -> Result<Self, DomainError> {
        let get = |key: &'static str| -> Result<&String, DomainError> {
            fields.get(key).ok_or(DomainError::MissingField(key))
        };

        let funding_diff = get("funding_diff")?
            .parse::<f64>()
            .map_err(|e| DomainError::InvalidField {
                field: "funding_diff",
                reason: e.to_string(),
            })?;
        let expected_rate8h = get("expected_rate8h")?
            .parse::<f64>()
            .map_err(|e| DomainError::InvalidField {
                field: "expected_rate8h",
                reason: e.to_string(),
            })?;
        let created_at = DateTime::parse_from_rfc3339(get("created_at")?)
            .map_err(|e| DomainError::InvalidField {
                field: "created_at",
                reason: e.to_string(),
            })?
            .with_timezone(&Utc);

        Ok(Self {
            group_id: get("group_id")?.clone(),
            symbol: get("symbol")?.clone(),
            long_venue: Venue::parse(get("long_venue")?)?,
            short_venue: Venue::parse(get("short_venue")?)?,
            funding_diff,
            expected_rate8h,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_id_embeds_symbol_and_timestamp() {
        let opp = Opportunity::create("BTCUSDT", Venue::VenueA, Venue::VenueB, 0.0004, 0.0006);
        assert!(opp.group_id.starts_with("BTCUSDT-"));
        assert_eq!(opp.group_id.len(), "BTCUSDT-".len() + 14);
    }

    #[test]
    fn stream_roundtrip_preserves_all_fields() {
        let opp = Opportunity::create("ETHUSDT", Venue::VenueB, Venue::VenueA, -0.0002, 0.0003);
        let fields: HashMap<String, String> = opp.to_stream_fields().into_iter().collect();
        let parsed = Opportunity::from_stream_fields(&fields).unwrap();
        assert_eq!(parsed, opp);
    }
}
