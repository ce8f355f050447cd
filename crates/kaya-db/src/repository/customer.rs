use sqlx::SqlitePool;
use tracing::debug;

use super::{money_text, parse_money};
use crate::change::{ChangeNotifier, Table};
use crate::error::{DbError, DbResult};
use kaya_core::{Customer, LocalId, NewCustomer};

const COLUMNS: &str = "id, name, phone, balance";

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: i64,
    name: String,
    phone: String,
    balance: String,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = DbError;

    fn try_from(row: CustomerRow) -> DbResult<Self> {
        Ok(Customer {
            id: row.id,
            name: row.name,
            phone: row.phone,
            balance: parse_money("balance", &row.balance)?,
        })
    }
}

/// Repository for customer accounts.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
    changes: ChangeNotifier,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool, changes: ChangeNotifier) -> Self {
        CustomerRepository { pool, changes }
    }

    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let sql = format!("SELECT {COLUMNS} FROM customers ORDER BY name");
        let rows: Vec<CustomerRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Customer::try_from).collect()
    }

    pub async fn get(&self, id: LocalId) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {COLUMNS} FROM customers WHERE id = ?1");
        let row: Option<CustomerRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Customer::try_from).transpose()
    }

    pub async fn insert(&self, new: &NewCustomer) -> DbResult<Customer> {
        debug!(name = %new.name, "Inserting customer");

        let id = sqlx::query("INSERT INTO customers (name, phone, balance) VALUES (?1, ?2, ?3)")
            .bind(new.name.trim())
            .bind(new.phone.trim())
            .bind(money_text(new.balance))
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        self.changes.notify(&[Table::Customers]);

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    pub async fn update(&self, id: LocalId, update: &NewCustomer) -> DbResult<Customer> {
        debug!(id = %id, "Updating customer");

        let result =
            sqlx::query("UPDATE customers SET name = ?2, phone = ?3, balance = ?4 WHERE id = ?1")
                .bind(id)
                .bind(update.name.trim())
                .bind(update.phone.trim())
                .bind(money_text(update.balance))
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.changes.notify(&[Table::Customers]);

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Deletes a customer. Orders that reference the id keep it.
    pub async fn delete(&self, id: LocalId) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.changes.notify(&[Table::Customers]);
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
