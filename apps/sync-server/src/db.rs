//! Database layer for the sync server.
//!
//! One SQLite file holding mirror tables keyed by the terminal's `clientId`.
//!
//! ```text
//! products   upsert            created | updated   synced = all results
//! orders     insert if absent  created | exists    synced = created only
//! customers  upsert            created | updated   synced = all results
//! ```
//!
//! Each push is written in a single transaction.

use std::path::Path;
use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::SqliteConnection;
use tracing::{debug, info};

use kaya_core::Money;
use kaya_sync::protocol::{
    CustomerPayload, ItemResult, OrderPayload, ProductPayload, StatusResponse, SyncAction,
    SyncResponse,
};

use crate::error::ServerResult;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

fn money_text(money: Money) -> String {
    money.decimal().to_string()
}

/// Database connection pool.
#[derive(Debug, Clone)]
pub struct SyncStore {
    pool: SqlitePool,
}

impl SyncStore {
    /// Opens (creating if needed) the database file and runs migrations.
    pub async fn open(path: &Path) -> ServerResult<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))?
            .journal_mode(SqliteJournalMode::Wal)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = SyncStore { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Single-connection in-memory store, for tests.
    pub async fn in_memory() -> ServerResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .max_lifetime(None)
            .idle_timeout(None)
            .connect("sqlite::memory:")
            .await?;

        let store = SyncStore { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> ServerResult<()> {
        MIGRATOR.run(&self.pool).await?;
        info!("Database migrations complete");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // =========================================================================
    // Sync Operations
    // =========================================================================

    /// Upserts products by client id.
    pub async fn upsert_products(&self, products: &[ProductPayload]) -> ServerResult<SyncResponse> {
        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(products.len());

        for product in products {
            let action = upsert_product(&mut *tx, product).await?;
            results.push(ItemResult {
                client_id: product.client_id,
                action,
            });
        }

        tx.commit().await?;
        debug!(count = results.len(), "Products upserted");

        Ok(SyncResponse {
            synced: results.len() as u64,
            results,
        })
    }

    /// Inserts orders that are not already stored. Existing orders are left
    /// untouched.
    pub async fn insert_orders(&self, orders: &[OrderPayload]) -> ServerResult<SyncResponse> {
        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(orders.len());
        let now = Utc::now();

        for order in orders {
            let inserted = sqlx::query(
                r#"
                INSERT INTO synced_orders (
                    client_id, items, subtotal, tax, tax_rule_name, tax_rate, discount,
                    discount_type, total, status, payment_methods, customer_id, notes,
                    created_at, synced_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
                ON CONFLICT (client_id) DO NOTHING
                "#,
            )
            .bind(order.client_id)
            .bind(serde_json::to_string(&order.items)?)
            .bind(money_text(order.subtotal))
            .bind(money_text(order.tax))
            .bind(&order.tax_rule_name)
            .bind(order.tax_rate.map(|r| r.fraction().to_string()))
            .bind(money_text(order.discount))
            .bind(order.discount_type.map(|t| t.as_str()))
            .bind(money_text(order.total))
            .bind(order.status.as_str())
            .bind(serde_json::to_string(&order.payment_methods)?)
            .bind(order.customer_id)
            .bind(&order.notes)
            .bind(order.created_at)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            let action = if inserted == 1 {
                SyncAction::Created
            } else {
                SyncAction::Exists
            };
            results.push(ItemResult {
                client_id: order.client_id,
                action,
            });
        }

        tx.commit().await?;

        let synced = results
            .iter()
            .filter(|r| r.action == SyncAction::Created)
            .count() as u64;
        debug!(received = results.len(), synced, "Orders stored");

        Ok(SyncResponse { synced, results })
    }

    /// Upserts customers by client id.
    pub async fn upsert_customers(
        &self,
        customers: &[CustomerPayload],
    ) -> ServerResult<SyncResponse> {
        let mut tx = self.pool.begin().await?;
        let mut results = Vec::with_capacity(customers.len());
        let now = Utc::now();

        for customer in customers {
            let existed = exists(&mut *tx, "synced_customers", customer.client_id).await?;

            sqlx::query(
                r#"
                INSERT INTO synced_customers (client_id, name, phone, balance, synced_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT (client_id) DO UPDATE SET
                    name = excluded.name,
                    phone = excluded.phone,
                    balance = excluded.balance,
                    synced_at = excluded.synced_at
                "#,
            )
            .bind(customer.client_id)
            .bind(&customer.name)
            .bind(&customer.phone)
            .bind(money_text(customer.balance))
            .bind(now)
            .execute(&mut *tx)
            .await?;

            results.push(ItemResult {
                client_id: customer.client_id,
                action: upsert_action(existed),
            });
        }

        tx.commit().await?;
        debug!(count = results.len(), "Customers upserted");

        Ok(SyncResponse {
            synced: results.len() as u64,
            results,
        })
    }

    /// Row counts of the three mirror tables.
    pub async fn status(&self) -> ServerResult<StatusResponse> {
        let (products, orders, customers): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM synced_products),
                (SELECT COUNT(*) FROM synced_orders),
                (SELECT COUNT(*) FROM synced_customers)
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(StatusResponse {
            products,
            orders,
            customers,
        })
    }
}

fn upsert_action(existed: bool) -> SyncAction {
    if existed {
        SyncAction::Updated
    } else {
        SyncAction::Created
    }
}

async fn exists(conn: &mut SqliteConnection, table: &str, client_id: i64) -> ServerResult<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE client_id = ?1)");
    let found: bool = sqlx::query_scalar(&sql)
        .bind(client_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(found)
}

async fn upsert_product(
    conn: &mut SqliteConnection,
    product: &ProductPayload,
) -> ServerResult<SyncAction> {
    let existed = exists(conn, "synced_products", product.client_id).await?;

    sqlx::query(
        r#"
        INSERT INTO synced_products (
            client_id, name, price, category, stock, low_stock_threshold, barcode, sku,
            image, description, is_active, created_at, updated_at, synced_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        ON CONFLICT (client_id) DO UPDATE SET
            name = excluded.name,
            price = excluded.price,
            category = excluded.category,
            stock = excluded.stock,
            low_stock_threshold = excluded.low_stock_threshold,
            barcode = excluded.barcode,
            sku = excluded.sku,
            image = excluded.image,
            description = excluded.description,
            is_active = excluded.is_active,
            updated_at = excluded.updated_at,
            synced_at = excluded.synced_at
        "#,
    )
    .bind(product.client_id)
    .bind(&product.name)
    .bind(money_text(product.price))
    .bind(&product.category)
    .bind(product.stock)
    .bind(product.low_stock_threshold)
    .bind(&product.barcode)
    .bind(&product.sku)
    .bind(&product.image)
    .bind(&product.description)
    .bind(product.is_active)
    .bind(product.created_at)
    .bind(product.updated_at)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(upsert_action(existed))
}
