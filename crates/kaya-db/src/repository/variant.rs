//! Product variants. A variant's stock is its own and is never summed into
//! the parent product.

use std::collections::BTreeMap;

use sqlx::SqlitePool;
use tracing::debug;

use super::{money_text, parse_money};
use crate::change::{ChangeNotifier, Table};
use crate::error::{DbError, DbResult};
use kaya_core::{LocalId, NewVariant, ProductVariant};

const COLUMNS: &str = "id, product_id, name, sku, barcode, price, stock, attributes";

#[derive(Debug, sqlx::FromRow)]
struct VariantRow {
    id: i64,
    product_id: i64,
    name: String,
    sku: Option<String>,
    barcode: Option<String>,
    price: String,
    stock: i64,
    attributes: String,
}

impl TryFrom<VariantRow> for ProductVariant {
    type Error = DbError;

    fn try_from(row: VariantRow) -> DbResult<Self> {
        let attributes: BTreeMap<String, String> = serde_json::from_str(&row.attributes)?;
        Ok(ProductVariant {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            sku: row.sku,
            barcode: row.barcode,
            price: parse_money("price", &row.price)?,
            stock: row.stock,
            attributes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct VariantRepository {
    pool: SqlitePool,
    changes: ChangeNotifier,
}

impl VariantRepository {
    pub fn new(pool: SqlitePool, changes: ChangeNotifier) -> Self {
        VariantRepository { pool, changes }
    }

    pub async fn list_for_product(&self, product_id: LocalId) -> DbResult<Vec<ProductVariant>> {
        let sql = format!("SELECT {COLUMNS} FROM product_variants WHERE product_id = ?1 ORDER BY id");
        let rows: Vec<VariantRow> = sqlx::query_as(&sql)
            .bind(product_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(ProductVariant::try_from).collect()
    }

    pub async fn get(&self, id: LocalId) -> DbResult<Option<ProductVariant>> {
        let sql = format!("SELECT {COLUMNS} FROM product_variants WHERE id = ?1");
        let row: Option<VariantRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(ProductVariant::try_from).transpose()
    }

    /// Inserts a variant. The parent product must exist.
    pub async fn insert(&self, new: &NewVariant) -> DbResult<ProductVariant> {
        debug!(product_id = %new.product_id, name = %new.name, "Inserting variant");

        let id = sqlx::query(
            r#"
            INSERT INTO product_variants (product_id, name, sku, barcode, price, stock, attributes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(new.product_id)
        .bind(new.name.trim())
        .bind(&new.sku)
        .bind(&new.barcode)
        .bind(money_text(new.price))
        .bind(new.stock)
        .bind(serde_json::to_string(&new.attributes)?)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.changes.notify(&[Table::Variants]);

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Variant", id))
    }

    /// Replaces a variant's fields. The parent product cannot change.
    pub async fn update(&self, id: LocalId, update: &NewVariant) -> DbResult<ProductVariant> {
        debug!(id = %id, "Updating variant");

        let result = sqlx::query(
            r#"
            UPDATE product_variants
            SET name = ?2, sku = ?3, barcode = ?4, price = ?5, stock = ?6, attributes = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.name.trim())
        .bind(&update.sku)
        .bind(&update.barcode)
        .bind(money_text(update.price))
        .bind(update.stock)
        .bind(serde_json::to_string(&update.attributes)?)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Variant", id));
        }

        self.changes.notify(&[Table::Variants]);

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Variant", id))
    }

    /// Deletes a variant. Batches pointing at it keep their product and lose
    /// the variant link.
    pub async fn delete(&self, id: LocalId) -> DbResult<()> {
        debug!(id = %id, "Deleting variant");

        let result = sqlx::query("DELETE FROM product_variants WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Variant", id));
        }

        self.changes.notify(&[Table::Variants, Table::Batches]);
        Ok(())
    }
}
