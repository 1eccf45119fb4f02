// =============================================================================
// Venue — the two funding-rate sources this pipeline cross-references
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// One of the two exchanges the arbitrage pipeline watches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Venue {
    #[serde(rename = "venue_a")]
    VenueA,
    #[serde(rename = "venue_b")]
    VenueB,
}

impl Venue {
    /// Parse a venue from its lowercase wire name (`"venue_a"` / `"venue_b"`).
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        match raw {
            "venue_a" => Ok(Self::VenueA),
            "venue_b" => Ok(Self::VenueB),
            other => Err(DomainError::UnknownVenue(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VenueA => "venue_a",
            Self::VenueB => "venue_b",
        }
    }
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_venues() {
        assert_eq!(Venue::parse("venue_a").unwrap(), Venue::VenueA);
        assert_eq!(Venue::parse("venue_b").unwrap(), Venue::VenueB);
    }

    #[test]
    fn rejects_unknown_venue() {
        assert!(Venue::parse("venue_c").is_err());
    }

    #[test]
    fn display_roundtrips_through_parse() {
        for v in [Venue::VenueA, Venue::VenueB] {
            assert_eq!(Venue::parse(&v.to_string()).unwrap(), v);
        }
    }
}
