// =============================================================================
// Shared in-memory state — latest batch per venue, readiness flag
// =============================================================================

use std::collections::HashMap;

use aurora_domain::{FundingSnapshot, Venue};
use parking_lot::RwLock;

#[derive(Default)]
pub struct FeedState {
    latest: RwLock<HashMap<Venue, Vec<FundingSnapshot>>>,
}

impl FeedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&self, venue: Venue, snapshots: Vec<FundingSnapshot>) {
        self.latest.write().insert(venue, snapshots);
    }

    pub fn latest(&self, venue: Venue) -> Vec<FundingSnapshot> {
        self.latest.read().get(&venue).cloned().unwrap_or_default()
    }

    /// `None` until at least one venue has completed a cycle.
    pub fn counts(&self) -> Option<(usize, usize)> {
        let guard = self.latest.read();
        if guard.is_empty() {
            return None;
        }
        Some((
            guard.get(&Venue::VenueA).map(Vec::len).unwrap_or(0),
            guard.get(&Venue::VenueB).map(Vec::len).unwrap_or(0),
        ))
    }
}
