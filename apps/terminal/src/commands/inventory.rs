//! # Inventory Commands
//!
//! Product, category and variant management.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Products    list / search / barcode lookup / create / update /         │
//! │              activate / delete (removes its variants and batches)       │
//! │  Categories  list / create / update (rename moves products) / delete    │
//! │  Variants    list for product / create / update / delete                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Input is validated here before any write.

use serde::Deserialize;
use tracing::{debug, info};

use kaya_core::validation::{
    validate_category_name, validate_color, validate_price, validate_product_name,
    validate_search_query, validate_stock, validate_threshold,
};
use kaya_core::{
    Category, CategoryRef, LocalId, NewCategory, NewProduct, NewVariant, Product, ProductUpdate,
    ProductVariant, ValidationError,
};
use kaya_db::Database;

use crate::error::{ApiError, ApiResult};

/// Default page size for product search.
pub const DEFAULT_SEARCH_LIMIT: u32 = 50;

/// Which products to list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    /// Only products in this category (active only)
    #[serde(default)]
    pub category: Option<String>,
    /// Include deactivated products
    #[serde(default)]
    pub include_inactive: bool,
}

// =============================================================================
// Products
// =============================================================================

pub async fn list_products(db: &Database, filter: ProductFilter) -> ApiResult<Vec<Product>> {
    debug!(?filter, "list_products command");

    let products = match (&filter.category, filter.include_inactive) {
        (Some(category), _) => db.products().list_by_category(category).await?,
        (None, true) => db.products().list().await?,
        (None, false) => db.products().list_active().await?,
    };
    Ok(products)
}

/// Searches name, SKU and barcode.
pub async fn search_products(
    db: &Database,
    query: &str,
    limit: Option<u32>,
) -> ApiResult<Vec<Product>> {
    debug!(query = %query, limit = ?limit, "search_products command");

    let query = validate_search_query(query)?;
    let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT).clamp(1, 500);
    Ok(db.products().search(&query, limit).await?)
}

pub async fn get_product(db: &Database, id: LocalId) -> ApiResult<Product> {
    debug!(id = %id, "get_product command");
    db.products()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))
}

pub async fn get_product_by_barcode(db: &Database, barcode: &str) -> ApiResult<Product> {
    debug!(barcode = %barcode, "get_product_by_barcode command");
    db.products()
        .find_by_barcode(barcode)
        .await?
        .ok_or_else(|| ApiError::not_found("Product with barcode", barcode))
}

pub async fn create_product(db: &Database, new: NewProduct) -> ApiResult<Product> {
    debug!(name = %new.name, "create_product command");

    validate_product_name(&new.name)?;
    validate_price(new.price)?;
    validate_stock(new.stock)?;
    validate_threshold(new.low_stock_threshold)?;
    validate_category_ref(&new.category)?;

    let product = db.products().insert(&new).await?;
    info!(id = %product.id, name = %product.name, category = %product.category, "Product created");
    Ok(product)
}

/// Applies the fields present in `update`.
pub async fn update_product(db: &Database, id: LocalId, update: ProductUpdate) -> ApiResult<Product> {
    debug!(id = %id, "update_product command");

    if let Some(name) = &update.name {
        validate_product_name(name)?;
    }
    if let Some(price) = update.price {
        validate_price(price)?;
    }
    if let Some(stock) = update.stock {
        validate_stock(stock)?;
    }
    if let Some(threshold) = update.low_stock_threshold {
        validate_threshold(threshold)?;
    }
    if let Some(category) = &update.category {
        validate_category_ref(category)?;
    }

    Ok(db.products().update(id, &update).await?)
}

pub async fn set_product_active(db: &Database, id: LocalId, active: bool) -> ApiResult<Product> {
    debug!(id = %id, active, "set_product_active command");
    db.products().set_active(id, active).await?;
    get_product(db, id).await
}

/// Deletes a product together with its variants and batches.
pub async fn delete_product(db: &Database, id: LocalId) -> ApiResult<()> {
    debug!(id = %id, "delete_product command");
    db.products().delete(id).await?;
    info!(id = %id, "Product deleted");
    Ok(())
}

fn validate_category_ref(category: &CategoryRef) -> Result<(), ValidationError> {
    match category {
        CategoryRef::Existing { .. } => Ok(()),
        CategoryRef::New { name } => validate_category_name(name),
    }
}

// =============================================================================
// Categories
// =============================================================================

pub async fn list_categories(db: &Database) -> ApiResult<Vec<Category>> {
    debug!("list_categories command");
    Ok(db.categories().list().await?)
}

pub async fn create_category(db: &Database, new: NewCategory) -> ApiResult<Category> {
    debug!(name = %new.name, "create_category command");
    validate_category(&new)?;
    Ok(db.categories().insert(&new).await?)
}

/// Replaces a category. A new name is carried over to its products.
pub async fn update_category(db: &Database, id: LocalId, update: NewCategory) -> ApiResult<Category> {
    debug!(id = %id, name = %update.name, "update_category command");
    validate_category(&update)?;
    Ok(db.categories().update(id, &update).await?)
}

/// Deletes a category. Its products keep the category name.
pub async fn delete_category(db: &Database, id: LocalId) -> ApiResult<()> {
    debug!(id = %id, "delete_category command");
    Ok(db.categories().delete(id).await?)
}

fn validate_category(category: &NewCategory) -> Result<(), ValidationError> {
    validate_category_name(&category.name)?;
    if let Some(color) = &category.color {
        validate_color(color)?;
    }
    Ok(())
}

// =============================================================================
// Variants
// =============================================================================

pub async fn list_variants(db: &Database, product_id: LocalId) -> ApiResult<Vec<ProductVariant>> {
    debug!(product_id = %product_id, "list_variants command");
    Ok(db.variants().list_for_product(product_id).await?)
}

pub async fn create_variant(db: &Database, new: NewVariant) -> ApiResult<ProductVariant> {
    debug!(product_id = %new.product_id, name = %new.name, "create_variant command");
    validate_variant(&new)?;
    Ok(db.variants().insert(&new).await?)
}

pub async fn update_variant(
    db: &Database,
    id: LocalId,
    update: NewVariant,
) -> ApiResult<ProductVariant> {
    debug!(id = %id, "update_variant command");
    validate_variant(&update)?;
    Ok(db.variants().update(id, &update).await?)
}

pub async fn delete_variant(db: &Database, id: LocalId) -> ApiResult<()> {
    debug!(id = %id, "delete_variant command");
    Ok(db.variants().delete(id).await?)
}

fn validate_variant(variant: &NewVariant) -> Result<(), ValidationError> {
    validate_product_name(&variant.name)?;
    validate_price(variant.price)?;
    validate_stock(variant.stock)
}
