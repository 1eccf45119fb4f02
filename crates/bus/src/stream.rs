// =============================================================================
// Redis stream wrapper — funding snapshots (append-only) and opportunities
// (consumer-group, at-least-once)
// =============================================================================

use std::collections::HashMap;

use aurora_domain::{FundingSnapshot, Opportunity};
use redis::aio::ConnectionManager;
use redis::streams::{StreamMaxlen, StreamReadOptions, StreamReadReply};
use redis::{AsyncCommands, RedisResult, Value};
use tracing::{debug, warn};

use crate::error::BusError;

pub const FUNDING_STREAM: &str = "funding_snapshots";
pub const OPPORTUNITY_STREAM: &str = "funding_opportunities";
pub const OPPORTUNITY_CONSUMER_GROUP: &str = "execution_gateway";

/// A connected handle onto the two streams this pipeline uses.
#[derive(Clone)]
pub struct StreamBus {
    conn: ConnectionManager,
}

impl StreamBus {
    pub async fn connect(redis_url: &str) -> Result<Self, BusError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    // -------------------------------------------------------------------
    // Funding snapshots — append-only, approximately trimmed
    // -------------------------------------------------------------------

    /// Publish one funding snapshot, trimming the stream to approximately
    /// `maxlen` entries.
    pub async fn publish_snapshot(
        &self,
        snapshot: &FundingSnapshot,
        maxlen: usize,
    ) -> Result<String, BusError> {
        let mut conn = self.conn.clone();
        let fields = snapshot.to_stream_fields();
        let id: String = conn
            .xadd_maxlen(FUNDING_STREAM, StreamMaxlen::Approx(maxlen), "*", &fields)
            .await?;
        Ok(id)
    }

    /// Read every snapshot entry appended after `last_id`, returning the
    /// cursor to resume from on the next call.
    pub async fn read_snapshots(
        &self,
        last_id: &str,
        count: usize,
        block_ms: usize,
    ) -> Result<(Vec<FundingSnapshot>, String), BusError> {
        let mut conn = self.conn.clone();
        let opts = StreamReadOptions::default().count(count).block(block_ms);
        let reply: StreamReadReply = conn
            .xread_options(&[FUNDING_STREAM], &[last_id], &opts)
            .await?;

        let mut snapshots = Vec::new();
        let mut cursor = last_id.to_string();
        for key in reply.keys {
            for entry in key.ids {
                cursor = entry.id.clone();
                let fields = fields_from_value_map(&entry.map);
                match FundingSnapshot::from_stream_fields(&fields) {
                    Ok(snap) => snapshots.push(snap),
                    Err(e) => warn!(error = %e, entry_id = %entry.id, "skipping malformed funding snapshot entry"),
                }
            }
        }
        Ok((snapshots, cursor))
    }

    /// Scan the most recent `count` snapshot entries without moving a
    /// cursor. Used by the risk daemon's batched per-tick lookup and by the
    /// stats service's latest-snapshot view — both only need "what is
    /// current", not a gap-free read.
    pub async fn scan_recent_snapshots(&self, count: usize) -> Result<Vec<FundingSnapshot>, BusError> {
        let mut conn = self.conn.clone();
        let entries: Vec<(String, HashMap<String, Value>)> =
            conn.xrevrange_count(FUNDING_STREAM, "+", "-", count).await?;

        let mut snapshots = Vec::with_capacity(entries.len());
        for (id, map) in entries {
            let fields = fields_from_value_map(&map);
            match FundingSnapshot::from_stream_fields(&fields) {
                Ok(snap) => snapshots.push(snap),
                Err(e) => debug!(error = %e, entry_id = %id, "skipping malformed funding snapshot entry"),
            }
        }
        Ok(snapshots)
    }

    // -------------------------------------------------------------------
    // Opportunities — consumer group, at-least-once delivery
    // -------------------------------------------------------------------

    pub async fn publish_opportunity(&self, opp: &Opportunity) -> Result<String, BusError> {
        let mut conn = self.conn.clone();
        let fields = opp.to_stream_fields();
        let id: String = conn
            .xadd_maxlen(
                OPPORTUNITY_STREAM,
                StreamMaxlen::Approx(crate::DEFAULT_STREAM_MAXLEN),
                "*",
                &fields,
            )
            .await?;
        Ok(id)
    }

    /// Create the consumer group if it does not already exist, tolerating
    /// the `BUSYGROUP` error Redis returns when it does.
    pub async fn ensure_consumer_group(&self) -> Result<(), BusError> {
        let mut conn = self.conn.clone();
        let result: RedisResult<()> = conn
            .xgroup_create_mkstream(OPPORTUNITY_STREAM, OPPORTUNITY_CONSUMER_GROUP, "0-0")
            .await;
        match result {
            Ok(()) => Ok(()),
            Err(e) if e.to_string().contains("BUSYGROUP") => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Read up to `count` undelivered opportunities for `consumer`, blocking
    /// up to `block_ms` milliseconds if none are immediately available.
    pub async fn read_opportunities(
        &self,
        consumer: &str,
        count: usize,
        block_ms: usize,
    ) -> Result<Vec<(String, Opportunity)>, BusError> {
        let mut conn = self.conn.clone();
        let opts = StreamReadOptions::default()
            .group(OPPORTUNITY_CONSUMER_GROUP, consumer)
            .count(count)
            .block(block_ms);
        let reply: StreamReadReply = conn
            .xread_options(&[OPPORTUNITY_STREAM], &[">"], &opts)
            .await?;

        let mut out = Vec::new();
        for key in reply.keys {
            for entry in key.ids {
                let fields = fields_from_value_map(&entry.map);
                match Opportunity::from_stream_fields(&fields) {
                    Ok(opp) => out.push((entry.id.clone(), opp)),
                    Err(e) => warn!(error = %e, entry_id = %entry.id, "skipping malformed opportunity entry"),
                }
            }
        }
        Ok(out)
    }

    pub async fn ack_opportunity(&self, entry_id: &str) -> Result<(), BusError> {
        let mut conn = self.conn.clone();
        let _: i64 = conn
            .xack(OPPORTUNITY_STREAM, OPPORTUNITY_CONSUMER_GROUP, &[entry_id])
            .await?;
        Ok(())
    }
}

/// Convert a Redis stream entry's field map into plain strings, matching the
/// scalar-field convention every publisher in this pipeline writes.
fn fields_from_value_map(map: &HashMap<String, Value>) -> HashMap<String, String> {
    map.iter()
        .filter_map(|(k, v)| {
            redis::from_redis_value::<String>(v)
                .ok()
                .map(|s| (k.clone(), s))
        })
        .collect()
}
