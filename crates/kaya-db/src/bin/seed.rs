//! # Seed the Starter Catalogue
//!
//! ## Usage
//! ```bash
//! # Seed ./kaya_dev.db
//! cargo run -p kaya-db --bin seed
//!
//! # Specify database path
//! cargo run -p kaya-db --bin seed -- --db ./data/kaya.db
//! ```
//!
//! Does nothing if the database already has products.

use std::env;

use kaya_db::seed::seed_if_empty;
use kaya_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kaya_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Kaya POS Seed");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kaya_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Kaya POS Seed");
    println!("=============");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    if !seed_if_empty(&db).await? {
        let existing = db.products().count().await?;
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let products = db.products().list().await?;
    for product in &products {
        println!(
            "  {:<6} {:<24} {:>8}  stock {}",
            product.barcode.as_deref().unwrap_or("-"),
            product.name,
            product.price,
            product.stock
        );
    }

    println!();
    println!("✓ Seeded {} products", products.len());

    db.close().await;
    Ok(())
}
