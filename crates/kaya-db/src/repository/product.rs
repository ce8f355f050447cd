//! # Product Repository
//!
//! ## Key Operations
//! - Lookup by id, barcode, and LIKE search over name / sku / barcode
//! - Insert and partial update, naming the category by id or new name
//! - Delete, cascading to the product's variants and batches
//!
//! Stock is never touched by checkout. Outside direct edits it moves only
//! through batch writes (see [`BatchRepository`](super::BatchRepository)).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::category::resolve_category;
use super::{like_pattern, money_text, parse_money};
use crate::change::{ChangeNotifier, Table};
use crate::error::{DbError, DbResult};
use kaya_core::{LocalId, NewProduct, Product, ProductUpdate};

const COLUMNS: &str = "id, name, price, category, category_id, stock, low_stock_threshold, \
                       barcode, sku, image, description, is_active, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: String,
    category: String,
    category_id: Option<i64>,
    stock: i64,
    low_stock_threshold: i64,
    barcode: Option<String>,
    sku: Option<String>,
    image: Option<String>,
    description: Option<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        Ok(Product {
            id: row.id,
            name: row.name,
            price: parse_money("price", &row.price)?,
            category: row.category,
            category_id: row.category_id,
            stock: row.stock,
            low_stock_threshold: row.low_stock_threshold,
            barcode: row.barcode,
            sku: row.sku,
            image: row.image,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_products(rows: Vec<ProductRow>) -> DbResult<Vec<Product>> {
    rows.into_iter().map(Product::try_from).collect()
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let product = db.products().find_by_barcode("2001").await?;
/// let results = db.products().search("rice", 20).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    changes: ChangeNotifier,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool, changes: ChangeNotifier) -> Self {
        ProductRepository { pool, changes }
    }

    /// All products by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {COLUMNS} FROM products ORDER BY name");
        let rows: Vec<ProductRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        into_products(rows)
    }

    /// Active products by name (the till's product grid).
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let sql = format!("SELECT {COLUMNS} FROM products WHERE is_active = 1 ORDER BY name");
        let rows: Vec<ProductRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        into_products(rows)
    }

    /// Active products in one category.
    pub async fn list_by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM products WHERE is_active = 1 AND category = ?1 ORDER BY name"
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(category)
            .fetch_all(&self.pool)
            .await?;
        into_products(rows)
    }

    /// Gets a product by its id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get(&self, id: LocalId) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {COLUMNS} FROM products WHERE id = ?1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Product::try_from).transpose()
    }

    /// Fetches the given products keyed by id. Missing ids are simply absent
    /// from the map.
    pub async fn get_many(&self, ids: &[LocalId]) -> DbResult<HashMap<LocalId, Product>> {
        let mut found = HashMap::with_capacity(ids.len());
        for id in ids {
            if found.contains_key(id) {
                continue;
            }
            if let Some(product) = self.get(*id).await? {
                found.insert(*id, product);
            }
        }
        Ok(found)
    }

    /// Finds an active product by exact barcode.
    pub async fn find_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let barcode = barcode.trim();
        debug!(barcode = %barcode, "Looking up barcode");

        let sql = format!(
            "SELECT {COLUMNS} FROM products WHERE barcode = ?1 AND is_active = 1 ORDER BY id LIMIT 1"
        );
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(barcode)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Product::try_from).transpose()
    }

    /// Searches name, sku and barcode by substring. An empty query lists
    /// active products.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Product>> {
        let query = query.trim();
        debug!(query = %query, limit = %limit, "Searching products");

        let sql = format!(
            "SELECT {COLUMNS} FROM products \
             WHERE is_active = 1 \
               AND (?1 = '' \
                    OR name LIKE ?2 ESCAPE '\\' \
                    OR sku LIKE ?2 ESCAPE '\\' \
                    OR barcode LIKE ?2 ESCAPE '\\') \
             ORDER BY name LIMIT ?3"
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(query)
            .bind(like_pattern(query))
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Search returned products");
        into_products(rows)
    }

    /// Inserts a product, creating its category first if it names a new one.
    pub async fn insert(&self, new: &NewProduct) -> DbResult<Product> {
        debug!(name = %new.name, "Inserting product");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let category = resolve_category(&mut *tx, &new.category, now).await?;

        let id = sqlx::query(
            r#"
            INSERT INTO products (
                name, price, category, category_id, stock, low_stock_threshold,
                barcode, sku, image, description, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
            "#,
        )
        .bind(new.name.trim())
        .bind(money_text(new.price))
        .bind(&category.name)
        .bind(category.id)
        .bind(new.stock)
        .bind(new.low_stock_threshold)
        .bind(&new.barcode)
        .bind(&new.sku)
        .bind(&new.image)
        .bind(&new.description)
        .bind(new.is_active)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;

        if category.created {
            self.changes.notify(&[Table::Categories, Table::Products]);
        } else {
            self.changes.notify(&[Table::Products]);
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Applies a partial update. `None` fields are left as they are.
    pub async fn update(&self, id: LocalId, update: &ProductUpdate) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {COLUMNS} FROM products WHERE id = ?1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let current =
            Product::try_from(row.ok_or_else(|| DbError::not_found("Product", id))?)?;

        let (category, category_id, category_created) = match &update.category {
            Some(category_ref) => {
                let resolved = resolve_category(&mut *tx, category_ref, now).await?;
                (resolved.name, Some(resolved.id), resolved.created)
            }
            None => (current.category.clone(), current.category_id, false),
        };

        let name = update
            .name
            .as_deref()
            .map(str::trim)
            .unwrap_or(&current.name)
            .to_string();

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                price = ?3,
                category = ?4,
                category_id = ?5,
                stock = ?6,
                low_stock_threshold = ?7,
                barcode = ?8,
                sku = ?9,
                image = ?10,
                description = ?11,
                is_active = ?12,
                updated_at = ?13
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(money_text(update.price.unwrap_or(current.price)))
        .bind(category)
        .bind(category_id)
        .bind(update.stock.unwrap_or(current.stock))
        .bind(update.low_stock_threshold.unwrap_or(current.low_stock_threshold))
        .bind(update.barcode.clone().or(current.barcode))
        .bind(update.sku.clone().or(current.sku))
        .bind(update.image.clone().or(current.image))
        .bind(update.description.clone().or(current.description))
        .bind(update.is_active.unwrap_or(current.is_active))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if category_created {
            self.changes.notify(&[Table::Categories, Table::Products]);
        } else {
            self.changes.notify(&[Table::Products]);
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Activates or deactivates a product. Inactive products stay in the
    /// ledger but leave the till and the low-stock alerts.
    pub async fn set_active(&self, id: LocalId, active: bool) -> DbResult<()> {
        debug!(id = %id, active, "Setting product active flag");

        let result = sqlx::query("UPDATE products SET is_active = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(active)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.changes.notify(&[Table::Products]);
        Ok(())
    }

    /// Deletes a product together with its batches and variants.
    pub async fn delete(&self, id: LocalId) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let mut tx = self.pool.begin().await?;

        let batches = sqlx::query("DELETE FROM batches WHERE product_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let variants = sqlx::query("DELETE FROM product_variants WHERE product_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // tx drops here and rolls back
            return Err(DbError::not_found("Product", id));
        }

        tx.commit().await?;
        debug!(id = %id, batches, variants, "Product delete cascaded");

        self.changes
            .notify(&[Table::Products, Table::Variants, Table::Batches]);
        Ok(())
    }

    /// Counts active products.
    pub async fn count_active(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Counts all products, active or not.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig, Table};
    use kaya_core::{CategoryRef, Money, NewProduct, ProductUpdate};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn jollof() -> NewProduct {
        NewProduct {
            stock: 50,
            barcode: Some("1001".into()),
            sku: Some("FOOD-JOL".into()),
            ..NewProduct::new(
                "Jollof Rice & Chicken",
                Money::from_major(45),
                CategoryRef::New { name: "Food".into() },
            )
        }
    }

    #[tokio::test]
    async fn test_insert_with_new_category_creates_it_once() {
        let db = setup().await;
        let first = db.products().insert(&jollof()).await.unwrap();

        let mut second = jollof();
        second.name = "Fried Rice & Fish".into();
        second.barcode = Some("1002".into());
        let second = db.products().insert(&second).await.unwrap();

        assert_eq!(first.category, "Food");
        assert_eq!(first.category_id, second.category_id);
        assert_eq!(db.categories().list().await.unwrap().len(), 1);
        assert_eq!(first.price, Money::from_major(45));
        assert_eq!(first.low_stock_threshold, 10);
        assert!(first.is_active);
    }

    #[tokio::test]
    async fn test_insert_with_missing_category_id() {
        let db = setup().await;
        let mut product = jollof();
        product.category = CategoryRef::Existing { id: 42 };
        assert!(db.products().insert(&product).await.unwrap_err().is_not_found());
        assert_eq!(db.products().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_by_barcode_and_search() {
        let db = setup().await;
        let product = db.products().insert(&jollof()).await.unwrap();

        let found = db.products().find_by_barcode("1001").await.unwrap().unwrap();
        assert_eq!(found.id, product.id);
        assert!(db.products().find_by_barcode("9999").await.unwrap().is_none());

        assert_eq!(db.products().search("jollof", 20).await.unwrap().len(), 1);
        assert_eq!(db.products().search("FOOD-", 20).await.unwrap().len(), 1);
        assert_eq!(db.products().search("", 20).await.unwrap().len(), 1);
        assert!(db.products().search("waakye", 20).await.unwrap().is_empty());

        db.products().set_active(product.id, false).await.unwrap();
        assert!(db.products().find_by_barcode("1001").await.unwrap().is_none());
        assert_eq!(db.products().count_active().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = setup().await;
        let product = db.products().insert(&jollof()).await.unwrap();

        let update = ProductUpdate {
            price: Some(Money::from_cents(4750)),
            category: Some(CategoryRef::New { name: "Meals".into() }),
            ..Default::default()
        };
        let updated = db.products().update(product.id, &update).await.unwrap();

        assert_eq!(updated.price, Money::from_cents(4750));
        assert_eq!(updated.category, "Meals");
        assert_eq!(updated.name, product.name);
        assert_eq!(updated.stock, 50);
        assert_eq!(updated.barcode.as_deref(), Some("1001"));
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let db = setup().await;
        let product = db.products().insert(&jollof()).await.unwrap();

        sqlx::query(
            "INSERT INTO product_variants (product_id, name, price) VALUES (?1, 'Large', '55')",
        )
        .bind(product.id)
        .execute(db.pool())
        .await
        .unwrap();

        let mut rx = db.subscribe();
        db.products().delete(product.id).await.unwrap();

        assert!(db.products().get(product.id).await.unwrap().is_none());
        assert!(db.variants().list_for_product(product.id).await.unwrap().is_empty());
        assert_eq!(rx.recv().await.unwrap(), Table::Products);
        assert!(db.products().delete(product.id).await.unwrap_err().is_not_found());
    }
}
