// =============================================================================
// Connection pool bootstrap
// =============================================================================

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::error::StoreError;

/// Open a pool against `database_url` and run any pending migrations.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("database pool connected and migrations applied");
    Ok(pool)
}
