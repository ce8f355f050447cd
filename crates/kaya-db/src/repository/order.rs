//! # Order Repository
//!
//! The order log is append-only. After insert the only field that changes is
//! `synced`, and the only rows ever deleted are drafts being loaded back
//! into the cart.
//!
//! ## Sync Set
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │  list_unsynced()  =  synced = 0  AND  status != 'draft'            │
//! │                      oldest first                                  │
//! │                                                                    │
//! │  mark_synced(ids) =  synced = 1 for exactly the ids the server     │
//! │                      acknowledged (created or exists)              │
//! └────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::{like_pattern, money_text, parse_discount_type, parse_money, parse_rate, rate_text};
use crate::change::{ChangeNotifier, Table};
use crate::error::{DbError, DbResult};
use kaya_core::{LocalId, NewOrder, Order, OrderItem, OrderStatus, PaymentSplit};

const COLUMNS: &str = "id, items, subtotal, tax, tax_rule_name, tax_rate, discount, discount_type, \
                       total, status, payments, customer_id, notes, created_at, synced";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    items: String,
    subtotal: String,
    tax: String,
    tax_rule_name: Option<String>,
    tax_rate: Option<String>,
    discount: String,
    discount_type: Option<String>,
    total: String,
    status: OrderStatus,
    payments: String,
    customer_id: Option<i64>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    synced: bool,
}

impl TryFrom<OrderRow> for Order {
    type Error = DbError;

    fn try_from(row: OrderRow) -> DbResult<Self> {
        let items: Vec<OrderItem> = serde_json::from_str(&row.items)?;
        let payments: Vec<PaymentSplit> = serde_json::from_str(&row.payments)?;

        Ok(Order {
            id: row.id,
            items,
            subtotal: parse_money("subtotal", &row.subtotal)?,
            tax: parse_money("tax", &row.tax)?,
            tax_rule_name: row.tax_rule_name,
            tax_rate: row.tax_rate.as_deref().map(parse_rate).transpose()?,
            discount: parse_money("discount", &row.discount)?,
            discount_type: parse_discount_type(row.discount_type.as_deref())?,
            total: parse_money("total", &row.total)?,
            status: row.status,
            payments,
            customer_id: row.customer_id,
            notes: row.notes,
            created_at: row.created_at,
            synced: row.synced,
        })
    }
}

fn into_orders(rows: Vec<OrderRow>) -> DbResult<Vec<Order>> {
    rows.into_iter().map(Order::try_from).collect()
}

/// Repository for the order log.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    changes: ChangeNotifier,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool, changes: ChangeNotifier) -> Self {
        OrderRepository { pool, changes }
    }

    /// Appends an order. It starts unsynced.
    pub async fn insert(&self, new: &NewOrder) -> DbResult<Order> {
        debug!(
            status = %new.status,
            total = %new.total,
            items = new.items.len(),
            "Inserting order"
        );

        let id = sqlx::query(
            r#"
            INSERT INTO orders (
                items, subtotal, tax, tax_rule_name, tax_rate, discount, discount_type,
                total, status, payments, customer_id, notes, created_at, synced
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 0)
            "#,
        )
        .bind(serde_json::to_string(&new.items)?)
        .bind(money_text(new.subtotal))
        .bind(money_text(new.tax))
        .bind(&new.tax_rule_name)
        .bind(new.tax_rate.map(rate_text))
        .bind(money_text(new.discount))
        .bind(new.discount_type.map(|t| t.as_str()))
        .bind(money_text(new.total))
        .bind(new.status)
        .bind(serde_json::to_string(&new.payments)?)
        .bind(new.customer_id)
        .bind(&new.notes)
        .bind(new.created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.changes.notify(&[Table::Orders]);

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }

    pub async fn get(&self, id: LocalId) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {COLUMNS} FROM orders WHERE id = ?1");
        let row: Option<OrderRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Order::try_from).transpose()
    }

    /// All orders, newest first.
    pub async fn list(&self) -> DbResult<Vec<Order>> {
        let sql = format!("SELECT {COLUMNS} FROM orders ORDER BY created_at DESC, id DESC");
        let rows: Vec<OrderRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        into_orders(rows)
    }

    /// Orders with the given status, newest first.
    pub async fn list_by_status(&self, status: OrderStatus) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM orders WHERE status = ?1 ORDER BY created_at DESC, id DESC"
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        into_orders(rows)
    }

    /// Searches non-draft orders by id substring or payment method.
    ///
    /// `"12"` matches orders 12, 112, 120...; `"momo"` matches every order
    /// with a mobile-money leg.
    pub async fn search(&self, query: &str) -> DbResult<Vec<Order>> {
        let query = query.trim();
        debug!(query = %query, "Searching orders");

        if query.is_empty() {
            let sql = format!(
                "SELECT {COLUMNS} FROM orders WHERE status != 'draft' \
                 ORDER BY created_at DESC, id DESC"
            );
            let rows: Vec<OrderRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
            return into_orders(rows);
        }

        let method_pattern = format!(
            "%\"method\":\"{}",
            &like_pattern(&query.to_lowercase())[1..]
        );

        let sql = format!(
            "SELECT {COLUMNS} FROM orders \
             WHERE status != 'draft' \
               AND (CAST(id AS TEXT) LIKE ?1 ESCAPE '\\' \
                    OR payments LIKE ?2 ESCAPE '\\') \
             ORDER BY created_at DESC, id DESC"
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&sql)
            .bind(like_pattern(query))
            .bind(method_pattern)
            .fetch_all(&self.pool)
            .await?;
        into_orders(rows)
    }

    /// Orders the sync agent still has to push, oldest first. Drafts never
    /// appear here.
    pub async fn list_unsynced(&self) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM orders WHERE synced = 0 AND status != 'draft' \
             ORDER BY created_at, id"
        );
        let rows: Vec<OrderRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        into_orders(rows)
    }

    /// Flags the given orders as synced. Already-synced or unknown ids are
    /// skipped, so repeating a call is harmless.
    ///
    /// ## Returns
    /// The number of orders that changed state.
    pub async fn mark_synced(&self, ids: &[LocalId]) -> DbResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut marked = 0;

        for id in ids {
            marked += sqlx::query("UPDATE orders SET synced = 1 WHERE id = ?1 AND synced = 0")
                .bind(*id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }

        tx.commit().await?;
        debug!(requested = ids.len(), marked, "Orders marked synced");

        if marked > 0 {
            self.changes.notify(&[Table::Orders]);
        }
        Ok(marked)
    }

    /// Number of orders still waiting for sync.
    pub async fn count_unsynced(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE synced = 0 AND status != 'draft'",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Deletes an order. Used to consume a draft when it is loaded.
    pub async fn delete(&self, id: LocalId) -> DbResult<()> {
        debug!(id = %id, "Deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        self.changes.notify(&[Table::Orders]);
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::{Database, DbConfig};
    use kaya_core::{
        DiscountType, Money, NewOrder, OrderItem, OrderStatus, PaymentMethod, PaymentSplit,
        TaxRate,
    };

    fn order(status: OrderStatus, method: PaymentMethod, minutes_ago: i64) -> NewOrder {
        NewOrder {
            items: vec![OrderItem {
                product_id: 1,
                name: "Jollof Rice & Chicken".into(),
                price: Money::from_major(45),
                quantity: 2,
                discount: Money::ZERO,
            }],
            subtotal: Money::from_major(90),
            tax: Money::from_cents(1350),
            tax_rule_name: Some("VAT".into()),
            tax_rate: Some(TaxRate::from_percent(15).unwrap()),
            discount: Money::ZERO,
            discount_type: Some(DiscountType::Flat),
            total: Money::from_cents(10350),
            status,
            payments: vec![PaymentSplit::new(method, Money::from_cents(10350))],
            customer_id: None,
            notes: None,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_preserves_snapshot() {
        let db = setup().await;
        let saved = db
            .orders()
            .insert(&order(OrderStatus::Completed, PaymentMethod::Cash, 0))
            .await
            .unwrap();

        let loaded = db.orders().get(saved.id).await.unwrap().unwrap();
        assert_eq!(loaded.total, Money::from_cents(10350));
        assert_eq!(loaded.tax, Money::from_cents(1350));
        assert_eq!(loaded.tax_rate, Some(TaxRate::from_percent(15).unwrap()));
        assert_eq!(loaded.discount_type, Some(DiscountType::Flat));
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.amount_paid(), loaded.total);
        assert!(!loaded.synced);
    }

    #[tokio::test]
    async fn test_unsynced_excludes_drafts_and_is_oldest_first() {
        let db = setup().await;
        let newer = db
            .orders()
            .insert(&order(OrderStatus::Completed, PaymentMethod::Cash, 1))
            .await
            .unwrap();
        db.orders()
            .insert(&order(OrderStatus::Draft, PaymentMethod::Cash, 5))
            .await
            .unwrap();
        let older = db
            .orders()
            .insert(&order(OrderStatus::Refunded, PaymentMethod::Momo, 10))
            .await
            .unwrap();

        let ids: Vec<_> = db
            .orders()
            .list_unsynced()
            .await
            .unwrap()
            .into_iter()
            .map(|o| o.id)
            .collect();
        assert_eq!(ids, vec![older.id, newer.id]);
        assert_eq!(db.orders().count_unsynced().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_mark_synced_is_idempotent() {
        let db = setup().await;
        let saved = db
            .orders()
            .insert(&order(OrderStatus::Completed, PaymentMethod::Cash, 0))
            .await
            .unwrap();

        assert_eq!(db.orders().mark_synced(&[saved.id, 999]).await.unwrap(), 1);
        assert_eq!(db.orders().mark_synced(&[saved.id]).await.unwrap(), 0);
        assert!(db.orders().get(saved.id).await.unwrap().unwrap().synced);
        assert!(db.orders().list_unsynced().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_by_id_and_method() {
        let db = setup().await;
        let cash = db
            .orders()
            .insert(&order(OrderStatus::Completed, PaymentMethod::Cash, 2))
            .await
            .unwrap();
        let momo = db
            .orders()
            .insert(&order(OrderStatus::Completed, PaymentMethod::Momo, 1))
            .await
            .unwrap();

        let found = db.orders().search("MoMo").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, momo.id);

        let found = db.orders().search(&cash.id.to_string()).await.unwrap();
        assert!(found.iter().any(|o| o.id == cash.id));

        assert_eq!(db.orders().search("").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_by_status_and_delete_draft() {
        let db = setup().await;
        let draft = db
            .orders()
            .insert(&order(OrderStatus::Draft, PaymentMethod::Cash, 0))
            .await
            .unwrap();

        let drafts = db.orders().list_by_status(OrderStatus::Draft).await.unwrap();
        assert_eq!(drafts.len(), 1);

        db.orders().delete(draft.id).await.unwrap();
        assert!(db.orders().list_by_status(OrderStatus::Draft).await.unwrap().is_empty());
        assert!(db.orders().delete(draft.id).await.unwrap_err().is_not_found());
    }
}
