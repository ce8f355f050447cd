//! # Category Repository
//!
//! Categories are joined to products by name, not id. Renaming one rewrites
//! the denormalized name on every product that carries the old one.
//!
//! ```text
//! rename "Food" → "Meals"
//!
//!   categories   id=1  "Food"  ──►  "Meals"
//!   products     category = "Food"   ──►  "Meals"   (all of them)
//!                category = "Drinks"      untouched
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::change::{ChangeNotifier, Table};
use crate::error::{DbError, DbResult};
use kaya_core::{Category, CategoryRef, LocalId, NewCategory};

const COLUMNS: &str = "id, name, description, color, created_at";

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i64,
    name: String,
    description: Option<String>,
    color: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: row.id,
            name: row.name,
            description: row.description,
            color: row.color,
            created_at: row.created_at,
        }
    }
}

/// The category a product write ended up pointing at.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedCategory {
    pub id: LocalId,
    pub name: String,
    /// A new category row was inserted.
    pub created: bool,
}

/// Resolves a [`CategoryRef`] inside the caller's transaction, creating the
/// category if a new name is given and none exists yet.
pub(crate) async fn resolve_category(
    conn: &mut SqliteConnection,
    category: &CategoryRef,
    now: DateTime<Utc>,
) -> DbResult<ResolvedCategory> {
    match category {
        CategoryRef::Existing { id } => {
            let name: Option<String> = sqlx::query_scalar("SELECT name FROM categories WHERE id = ?1")
                .bind(*id)
                .fetch_optional(&mut *conn)
                .await?;
            let name = name.ok_or_else(|| DbError::not_found("Category", id))?;
            Ok(ResolvedCategory {
                id: *id,
                name,
                created: false,
            })
        }
        CategoryRef::New { name } => {
            let name = name.trim();
            let existing: Option<i64> =
                sqlx::query_scalar("SELECT id FROM categories WHERE name = ?1")
                    .bind(name)
                    .fetch_optional(&mut *conn)
                    .await?;

            if let Some(id) = existing {
                return Ok(ResolvedCategory {
                    id,
                    name: name.to_string(),
                    created: false,
                });
            }

            debug!(name = %name, "Creating category for product");
            let id = sqlx::query("INSERT INTO categories (name, created_at) VALUES (?1, ?2)")
                .bind(name)
                .bind(now)
                .execute(&mut *conn)
                .await?
                .last_insert_rowid();

            Ok(ResolvedCategory {
                id,
                name: name.to_string(),
                created: true,
            })
        }
    }
}

/// Repository for category operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
    changes: ChangeNotifier,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool, changes: ChangeNotifier) -> Self {
        CategoryRepository { pool, changes }
    }

    /// All categories by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let sql = format!("SELECT {COLUMNS} FROM categories ORDER BY name");
        let rows: Vec<CategoryRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    pub async fn get(&self, id: LocalId) -> DbResult<Option<Category>> {
        let sql = format!("SELECT {COLUMNS} FROM categories WHERE id = ?1");
        let row: Option<CategoryRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Category::from))
    }

    /// Inserts a category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - A category with that name exists
    pub async fn insert(&self, new: &NewCategory) -> DbResult<Category> {
        let name = new.name.trim();
        debug!(name = %name, "Inserting category");

        let result = sqlx::query(
            "INSERT INTO categories (name, description, color, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(name)
        .bind(&new.description)
        .bind(&new.color)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("category", name),
            other => other,
        })?;

        self.changes.notify(&[Table::Categories]);

        let id = result.last_insert_rowid();
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Replaces a category's fields. A name change cascades to every product
    /// carrying the old name, in the same transaction.
    pub async fn update(&self, id: LocalId, update: &NewCategory) -> DbResult<Category> {
        let new_name = update.name.trim();
        debug!(id = %id, name = %new_name, "Updating category");

        let mut tx = self.pool.begin().await?;

        let old_name: Option<String> = sqlx::query_scalar("SELECT name FROM categories WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let old_name = old_name.ok_or_else(|| DbError::not_found("Category", id))?;

        sqlx::query("UPDATE categories SET name = ?2, description = ?3, color = ?4 WHERE id = ?1")
            .bind(id)
            .bind(new_name)
            .bind(&update.description)
            .bind(&update.color)
            .execute(&mut *tx)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("category", new_name),
                other => other,
            })?;

        let renamed = old_name != new_name;
        if renamed {
            let moved = sqlx::query(
                "UPDATE products SET category = ?2, updated_at = ?3 WHERE category = ?1",
            )
            .bind(&old_name)
            .bind(new_name)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?
            .rows_affected();
            debug!(from = %old_name, to = %new_name, products = moved, "Category rename cascaded");
        }

        tx.commit().await?;

        if renamed {
            self.changes.notify(&[Table::Categories, Table::Products]);
        } else {
            self.changes.notify(&[Table::Categories]);
        }

        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Deletes a category. Products keep their denormalized name.
    pub async fn delete(&self, id: LocalId) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        self.changes.notify(&[Table::Categories]);
        Ok(())
    }
}
