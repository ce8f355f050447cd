//! Tax rules. At most one rule carries the default flag; writes that set it
//! clear it on every other rule in the same transaction.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{parse_rate, rate_text};
use crate::change::{ChangeNotifier, Table};
use crate::error::{DbError, DbResult};
use kaya_core::{LocalId, NewTaxRule, TaxRule};

const COLUMNS: &str = "id, name, rate, is_default, is_active";

#[derive(Debug, sqlx::FromRow)]
struct TaxRuleRow {
    id: i64,
    name: String,
    rate: String,
    is_default: bool,
    is_active: bool,
}

impl TryFrom<TaxRuleRow> for TaxRule {
    type Error = DbError;

    fn try_from(row: TaxRuleRow) -> DbResult<Self> {
        Ok(TaxRule {
            id: row.id,
            name: row.name,
            rate: parse_rate(&row.rate)?,
            is_default: row.is_default,
            is_active: row.is_active,
        })
    }
}

async fn clear_default(conn: &mut SqliteConnection, except: LocalId) -> DbResult<()> {
    sqlx::query("UPDATE tax_rules SET is_default = 0 WHERE id != ?1 AND is_default = 1")
        .bind(except)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct TaxRuleRepository {
    pool: SqlitePool,
    changes: ChangeNotifier,
}

impl TaxRuleRepository {
    pub fn new(pool: SqlitePool, changes: ChangeNotifier) -> Self {
        TaxRuleRepository { pool, changes }
    }

    /// All rules, default first.
    pub async fn list(&self) -> DbResult<Vec<TaxRule>> {
        let sql = format!("SELECT {COLUMNS} FROM tax_rules ORDER BY is_default DESC, name");
        let rows: Vec<TaxRuleRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(TaxRule::try_from).collect()
    }

    pub async fn get(&self, id: LocalId) -> DbResult<Option<TaxRule>> {
        let sql = format!("SELECT {COLUMNS} FROM tax_rules WHERE id = ?1");
        let row: Option<TaxRuleRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(TaxRule::try_from).transpose()
    }

    /// The active default rule, if any. A cart starts with this rule.
    pub async fn get_default(&self) -> DbResult<Option<TaxRule>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM tax_rules WHERE is_default = 1 AND is_active = 1 LIMIT 1"
        );
        let row: Option<TaxRuleRow> = sqlx::query_as(&sql).fetch_optional(&self.pool).await?;
        row.map(TaxRule::try_from).transpose()
    }

    pub async fn insert(&self, new: &NewTaxRule) -> DbResult<TaxRule> {
        debug!(name = %new.name, default = new.is_default, "Inserting tax rule");

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            "INSERT INTO tax_rules (name, rate, is_default, is_active) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(new.name.trim())
        .bind(rate_text(new.rate))
        .bind(new.is_default)
        .bind(new.is_active)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        if new.is_default {
            clear_default(&mut *tx, id).await?;
        }

        tx.commit().await?;
        self.changes.notify(&[Table::TaxRules]);

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("TaxRule", id))
    }

    pub async fn update(&self, id: LocalId, update: &NewTaxRule) -> DbResult<TaxRule> {
        debug!(id = %id, "Updating tax rule");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE tax_rules SET name = ?2, rate = ?3, is_default = ?4, is_active = ?5 WHERE id = ?1",
        )
        .bind(id)
        .bind(update.name.trim())
        .bind(rate_text(update.rate))
        .bind(update.is_default)
        .bind(update.is_active)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("TaxRule", id));
        }

        if update.is_default {
            clear_default(&mut *tx, id).await?;
        }

        tx.commit().await?;
        self.changes.notify(&[Table::TaxRules]);

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("TaxRule", id))
    }

    /// Makes `id` the only default rule.
    pub async fn set_default(&self, id: LocalId) -> DbResult<()> {
        debug!(id = %id, "Setting default tax rule");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE tax_rules SET is_default = 1 WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("TaxRule", id));
        }

        clear_default(&mut *tx, id).await?;

        tx.commit().await?;
        self.changes.notify(&[Table::TaxRules]);
        Ok(())
    }

    pub async fn delete(&self, id: LocalId) -> DbResult<()> {
        debug!(id = %id, "Deleting tax rule");

        let result = sqlx::query("DELETE FROM tax_rules WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("TaxRule", id));
        }

        self.changes.notify(&[Table::TaxRules]);
        Ok(())
    }
}
