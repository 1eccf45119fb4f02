// =============================================================================
// Midnight archiver — sleeps until the next UTC midnight, archives the day
// that just ended, repeats.
// =============================================================================

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use sqlx::PgPool;
use tracing::{error, info};

pub async fn run(pool: PgPool) {
    loop {
        let sleep_for = duration_until_next_midnight();
        info!(seconds = sleep_for.as_secs(), "archiver sleeping until next UTC midnight");
        tokio::time::sleep(sleep_for).await;

        let date = (Utc::now() - ChronoDuration::days(1)).date_naive();
        match crate::core::archive_snapshot(&pool, date).await {
            Ok(snapshot) => info!(date = %snapshot.snapshot_date, "archived daily stats snapshot"),
            Err(e) => {
                error!(error = %e, date = %date, "archive snapshot failed, retrying shortly");
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

fn duration_until_next_midnight() -> Duration {
    let now = Utc::now();
    let tomorrow = now.date_naive() + ChronoDuration::days(1);
    let next_midnight = tomorrow.and_hms_opt(0, 0, 0).expect("midnight always valid").and_utc();
    (next_midnight - now).to_std().unwrap_or(Duration::from_secs(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_midnight_is_always_in_the_future_and_under_a_day() {
        let d = duration_until_next_midnight();
        assert!(d.as_secs() <= 86_400);
    }
}
