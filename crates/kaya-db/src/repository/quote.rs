//! Quotes. Unlike drafts they outlive conversion: a converted quote stays in
//! the table with status `converted`.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use super::{money_text, parse_discount_type, parse_money, parse_rate, rate_text};
use crate::change::{ChangeNotifier, Table};
use crate::error::{DbError, DbResult};
use kaya_core::{LocalId, NewQuote, OrderItem, Quote, QuoteStatus};

const COLUMNS: &str = "id, items, subtotal, tax, tax_rule_name, tax_rate, discount, discount_type, \
                       total, status, customer_name, notes, valid_until, created_at";

#[derive(Debug, sqlx::FromRow)]
struct QuoteRow {
    id: i64,
    items: String,
    subtotal: String,
    tax: String,
    tax_rule_name: Option<String>,
    tax_rate: Option<String>,
    discount: String,
    discount_type: Option<String>,
    total: String,
    status: QuoteStatus,
    customer_name: Option<String>,
    notes: Option<String>,
    valid_until: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<QuoteRow> for Quote {
    type Error = DbError;

    fn try_from(row: QuoteRow) -> DbResult<Self> {
        let items: Vec<OrderItem> = serde_json::from_str(&row.items)?;
        Ok(Quote {
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
            customer_name: row.customer_name,
            notes: row.notes,
            valid_until: row.valid_until,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct QuoteRepository {
    pool: SqlitePool,
    changes: ChangeNotifier,
}

impl QuoteRepository {
    pub fn new(pool: SqlitePool, changes: ChangeNotifier) -> Self {
        QuoteRepository { pool, changes }
    }

    /// Saves a quote as `active`.
    pub async fn insert(&self, new: &NewQuote) -> DbResult<Quote> {
        debug!(total = %new.total, valid_until = %new.valid_until, "Inserting quote");

        let id = sqlx::query(
            r#"
            INSERT INTO quotes (
                items, subtotal, tax, tax_rule_name, tax_rate, discount, discount_type,
                total, status, customer_name, notes, valid_until, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
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
        .bind(QuoteStatus::Active)
        .bind(&new.customer_name)
        .bind(&new.notes)
        .bind(new.valid_until)
        .bind(new.created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.changes.notify(&[Table::Quotes]);

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Quote", id))
    }

    pub async fn get(&self, id: LocalId) -> DbResult<Option<Quote>> {
        let sql = format!("SELECT {COLUMNS} FROM quotes WHERE id = ?1");
        let row: Option<QuoteRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Quote::try_from).transpose()
    }

    /// All quotes, newest first. Stored status is returned as-is; use
    /// [`Quote::effective_status`] to see expiry.
    pub async fn list(&self) -> DbResult<Vec<Quote>> {
        let sql = format!("SELECT {COLUMNS} FROM quotes ORDER BY created_at DESC, id DESC");
        let rows: Vec<QuoteRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Quote::try_from).collect()
    }

    pub async fn set_status(&self, id: LocalId, status: QuoteStatus) -> DbResult<()> {
        debug!(id = %id, status = %status, "Setting quote status");

        let result = sqlx::query("UPDATE quotes SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Quote", id));
        }

        self.changes.notify(&[Table::Quotes]);
        Ok(())
    }

    pub async fn delete(&self, id: LocalId) -> DbResult<()> {
        debug!(id = %id, "Deleting quote");

        let result = sqlx::query("DELETE FROM quotes WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Quote", id));
        }

        self.changes.notify(&[Table::Quotes]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::{Database, DbConfig};
    use kaya_core::{Money, NewQuote, OrderItem, QuoteStatus};

    fn quote(days_ago: i64, valid_days: i64) -> NewQuote {
        let created_at = Utc::now() - Duration::days(days_ago);
        NewQuote {
            items: vec![OrderItem {
                product_id: 3,
                name: "Banku & Tilapia".into(),
                price: Money::from_major(65),
                quantity: 4,
                discount: Money::ZERO,
            }],
            subtotal: Money::from_major(260),
            tax: Money::ZERO,
            tax_rule_name: None,
            tax_rate: None,
            discount: Money::ZERO,
            discount_type: None,
            total: Money::from_major(260),
            customer_name: Some("Ama Mensah".into()),
            notes: None,
            valid_until: created_at + Duration::days(valid_days),
            created_at,
        }
    }

    #[tokio::test]
    async fn test_saved_quote_is_active_until_it_lapses() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let fresh = db.quotes().insert(&quote(0, 7)).await.unwrap();
        let stale = db.quotes().insert(&quote(10, 7)).await.unwrap();

        let now = Utc::now();
        assert_eq!(fresh.status, QuoteStatus::Active);
        assert_eq!(stale.status, QuoteStatus::Active);
        assert_eq!(stale.effective_status(now), QuoteStatus::Expired);
        assert!(fresh.is_convertible(now));

        let listed = db.quotes().list().await.unwrap();
        assert_eq!(listed[0].id, fresh.id);
    }

    #[tokio::test]
    async fn test_converted_quote_is_kept() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let saved = db.quotes().insert(&quote(0, 7)).await.unwrap();

        db.quotes().set_status(saved.id, QuoteStatus::Converted).await.unwrap();

        let loaded = db.quotes().get(saved.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, QuoteStatus::Converted);
        assert!(!loaded.is_convertible(Utc::now()));

        db.quotes().delete(saved.id).await.unwrap();
        assert!(db.quotes().get(saved.id).await.unwrap().is_none());
    }
}
