//! # Starter Catalogue
//!
//! A fresh install opens with two categories, eight products and a default
//! VAT rule so the till is usable before anyone touches inventory.
//!
//! ```text
//! Food   (#f97316)  1001 Jollof Rice & Chicken   45.00   50
//!                   1002 Fried Rice & Fish       40.00   45
//!                   1003 Banku & Tilapia         65.00   30
//!                   1004 Waakye Special          35.00   60
//! Drinks (#3b82f6)  2001 Sobolo (500ml)          10.00  100
//!                   2002 Coca Cola (300ml)        8.00  100
//!                   2003 Alvaro                  10.00   80
//!                   2004 Pure Water               2.00  500
//! VAT 15% (default)
//! ```

use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use kaya_core::{CategoryRef, Money, NewCategory, NewProduct, NewTaxRule, TaxRate};

struct StarterProduct {
    name: &'static str,
    price: i64,
    stock: i64,
    threshold: i64,
    barcode: &'static str,
}

const FOOD: &[StarterProduct] = &[
    StarterProduct { name: "Jollof Rice & Chicken", price: 45, stock: 50, threshold: 10, barcode: "1001" },
    StarterProduct { name: "Fried Rice & Fish", price: 40, stock: 45, threshold: 10, barcode: "1002" },
    StarterProduct { name: "Banku & Tilapia", price: 65, stock: 30, threshold: 10, barcode: "1003" },
    StarterProduct { name: "Waakye Special", price: 35, stock: 60, threshold: 10, barcode: "1004" },
];

const DRINKS: &[StarterProduct] = &[
    StarterProduct { name: "Sobolo (500ml)", price: 10, stock: 100, threshold: 20, barcode: "2001" },
    StarterProduct { name: "Coca Cola (300ml)", price: 8, stock: 100, threshold: 20, barcode: "2002" },
    StarterProduct { name: "Alvaro", price: 10, stock: 80, threshold: 20, barcode: "2003" },
    StarterProduct { name: "Pure Water", price: 2, stock: 500, threshold: 50, barcode: "2004" },
];

/// Seeds the starter catalogue if the products table is empty.
///
/// ## Returns
/// * `Ok(true)` - The catalogue was written
/// * `Ok(false)` - Products already exist; nothing was touched
pub async fn seed_if_empty(db: &Database) -> DbResult<bool> {
    let existing = db.products().count().await?;
    if existing > 0 {
        info!(existing, "Products present, skipping seed");
        return Ok(false);
    }

    info!("Seeding starter catalogue");

    let groups = [
        ("Food", "#f97316", "Prepared meals and dishes", FOOD),
        ("Drinks", "#3b82f6", "Beverages and refreshments", DRINKS),
    ];

    for (name, color, description, products) in groups {
        let category = db
            .categories()
            .insert(&NewCategory {
                name: name.to_string(),
                description: Some(description.to_string()),
                color: Some(color.to_string()),
            })
            .await?;

        for starter in products {
            let product = NewProduct {
                stock: starter.stock,
                low_stock_threshold: starter.threshold,
                barcode: Some(starter.barcode.to_string()),
                ..NewProduct::new(
                    starter.name,
                    Money::from_major(starter.price),
                    CategoryRef::Existing { id: category.id },
                )
            };
            db.products().insert(&product).await?;
        }
    }

    db.tax_rules()
        .insert(&NewTaxRule {
            name: "VAT".to_string(),
            rate: TaxRate::from_percent(kaya_core::DEFAULT_TAX_PERCENT)
                .map_err(|e| crate::DbError::invalid_data("tax_rate", e))?,
            is_default: true,
            is_active: true,
        })
        .await?;

    info!(products = FOOD.len() + DRINKS.len(), "Starter catalogue seeded");
    Ok(true)
}
