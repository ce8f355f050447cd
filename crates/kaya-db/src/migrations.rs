//! # Database Migrations
//!
//! Embedded SQL migrations for the local ledger.
//!
//! ## Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  0001_initial_schema.sql        ✓ products, categories, variants,      │
//! │                                   batches, customers, orders            │
//! │  0002_tax_rules_and_quotes.sql  ✓ tax_rules, quotes, product defaults,  │
//! │                                   order tax snapshot                    │
//! │                                                                         │
//! │  Additive only: new columns carry a DEFAULT so rows written by an       │
//! │  older build read back complete. Existing migrations are never edited.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;

/// Migrations from `crates/kaya-db/migrations`, embedded at compile time.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Runs all pending database migrations. Safe to call repeatedly.
pub async fn run_migrations(pool: &SqlitePool) -> DbResult<()> {
    info!("Checking for pending migrations");

    MIGRATOR.run(pool).await?;

    info!("All migrations applied successfully");
    Ok(())
}

/// Returns `(total, applied)` migration counts, for diagnostics.
pub async fn migration_status(pool: &SqlitePool) -> DbResult<(usize, usize)> {
    let total = MIGRATOR.migrations.len();

    let applied: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _sqlx_migrations")
        .fetch_one(pool)
        .await?;

    Ok((total, applied as usize))
}
