//! # Batch Repository
//!
//! Receiving, correcting and removing stock lots. Each write moves the parent
//! product's stock in the same transaction.
//!
//! ```text
//! insert   quantity Q            products.stock = stock + Q
//! update   remaining R1 → R2     products.stock = MAX(0, stock + R2 − R1)
//! delete   remaining R           products.stock = MAX(0, stock − R)
//! ```
//!
//! Sales never touch batches, so the sum of remaining quantities drifts from
//! `products.stock` over time. Nothing reconciles the two.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::{money_text, parse_money};
use crate::change::{ChangeNotifier, Table};
use crate::error::{DbError, DbResult};
use kaya_core::{Batch, BatchUpdate, LocalId, NewBatch};

const COLUMNS: &str = "id, product_id, variant_id, batch_number, quantity, remaining_quantity, \
                       cost_price, expiry_date, manufacturing_date, supplier, notes, created_at";

#[derive(Debug, sqlx::FromRow)]
struct BatchRow {
    id: i64,
    product_id: i64,
    variant_id: Option<i64>,
    batch_number: String,
    quantity: i64,
    remaining_quantity: i64,
    cost_price: String,
    expiry_date: Option<DateTime<Utc>>,
    manufacturing_date: Option<DateTime<Utc>>,
    supplier: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<BatchRow> for Batch {
    type Error = DbError;

    fn try_from(row: BatchRow) -> DbResult<Self> {
        Ok(Batch {
            id: row.id,
            product_id: row.product_id,
            variant_id: row.variant_id,
            batch_number: row.batch_number,
            quantity: row.quantity,
            remaining_quantity: row.remaining_quantity,
            cost_price: parse_money("cost_price", &row.cost_price)?,
            expiry_date: row.expiry_date,
            manufacturing_date: row.manufacturing_date,
            supplier: row.supplier,
            notes: row.notes,
            created_at: row.created_at,
        })
    }
}

fn into_batches(rows: Vec<BatchRow>) -> DbResult<Vec<Batch>> {
    rows.into_iter().map(Batch::try_from).collect()
}

/// Repository for batch operations.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    pool: SqlitePool,
    changes: ChangeNotifier,
}

impl BatchRepository {
    pub fn new(pool: SqlitePool, changes: ChangeNotifier) -> Self {
        BatchRepository { pool, changes }
    }

    /// All batches, soonest expiry first. Batches without an expiry sort last.
    pub async fn list(&self) -> DbResult<Vec<Batch>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM batches ORDER BY expiry_date IS NULL, expiry_date, id"
        );
        let rows: Vec<BatchRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        into_batches(rows)
    }

    pub async fn list_for_product(&self, product_id: LocalId) -> DbResult<Vec<Batch>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM batches WHERE product_id = ?1 \
             ORDER BY expiry_date IS NULL, expiry_date, id"
        );
        let rows: Vec<BatchRow> = sqlx::query_as(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        into_batches(rows)
    }

    pub async fn get(&self, id: LocalId) -> DbResult<Option<Batch>> {
        let sql = format!("SELECT {COLUMNS} FROM batches WHERE id = ?1");
        let row: Option<BatchRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Batch::try_from).transpose()
    }

    /// Receives a batch and adds its quantity to the product's stock.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - The product does not exist
    pub async fn insert(&self, new: &NewBatch) -> DbResult<Batch> {
        debug!(
            product_id = %new.product_id,
            batch_number = %new.batch_number,
            quantity = new.quantity,
            "Receiving batch"
        );

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            r#"
            INSERT INTO batches (
                product_id, variant_id, batch_number, quantity, remaining_quantity,
                cost_price, expiry_date, manufacturing_date, supplier, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(new.product_id)
        .bind(new.variant_id)
        .bind(new.batch_number.trim())
        .bind(new.quantity)
        .bind(new.effective_remaining())
        .bind(money_text(new.cost_price))
        .bind(new.expiry_date)
        .bind(new.manufacturing_date)
        .bind(&new.supplier)
        .bind(&new.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::ForeignKeyViolation { .. } => DbError::not_found("Product", new.product_id),
            other => other,
        })?
        .last_insert_rowid();

        sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
            .bind(new.product_id)
            .bind(new.quantity)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        self.changes.notify(&[Table::Batches, Table::Products]);

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Batch", id))
    }

    /// Applies a partial update. A change in remaining quantity moves the
    /// product's stock by the difference, floored at zero.
    pub async fn update(&self, id: LocalId, update: &BatchUpdate) -> DbResult<Batch> {
        debug!(id = %id, "Updating batch");

        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {COLUMNS} FROM batches WHERE id = ?1");
        let row: Option<BatchRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let current = Batch::try_from(row.ok_or_else(|| DbError::not_found("Batch", id))?)?;

        let remaining = update
            .remaining_quantity
            .unwrap_or(current.remaining_quantity);

        sqlx::query(
            r#"
            UPDATE batches SET
                batch_number = ?2,
                quantity = ?3,
                remaining_quantity = ?4,
                cost_price = ?5,
                expiry_date = ?6,
                manufacturing_date = ?7,
                supplier = ?8,
                notes = ?9
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(
            update
                .batch_number
                .as_deref()
                .map(str::trim)
                .unwrap_or(&current.batch_number),
        )
        .bind(update.quantity.unwrap_or(current.quantity))
        .bind(remaining)
        .bind(money_text(update.cost_price.unwrap_or(current.cost_price)))
        .bind(update.expiry_date.or(current.expiry_date))
        .bind(update.manufacturing_date.or(current.manufacturing_date))
        .bind(update.supplier.clone().or(current.supplier))
        .bind(update.notes.clone().or(current.notes))
        .execute(&mut *tx)
        .await?;

        let delta = remaining - current.remaining_quantity;
        if delta != 0 {
            sqlx::query(
                "UPDATE products SET stock = MAX(0, stock + ?2), updated_at = ?3 WHERE id = ?1",
            )
            .bind(current.product_id)
            .bind(delta)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
            debug!(product_id = %current.product_id, delta, "Stock adjusted by batch edit");
        }

        tx.commit().await?;

        if delta != 0 {
            self.changes.notify(&[Table::Batches, Table::Products]);
        } else {
            self.changes.notify(&[Table::Batches]);
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Batch", id))
    }

    /// Deletes a batch and takes its remaining quantity off the product's
    /// stock, floored at zero.
    pub async fn delete(&self, id: LocalId) -> DbResult<()> {
        debug!(id = %id, "Deleting batch");

        let mut tx = self.pool.begin().await?;

        let found: Option<(i64, i64)> =
            sqlx::query_as("SELECT product_id, remaining_quantity FROM batches WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (product_id, remaining) = found.ok_or_else(|| DbError::not_found("Batch", id))?;

        sqlx::query("DELETE FROM batches WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if remaining > 0 {
            sqlx::query(
                "UPDATE products SET stock = MAX(0, stock - ?2), updated_at = ?3 WHERE id = ?1",
            )
            .bind(product_id)
            .bind(remaining)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.changes.notify(&[Table::Batches, Table::Products]);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
