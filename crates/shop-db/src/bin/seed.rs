//! # Seed Data
//!
//! Populates the database with the demo catalog and a demo user.
//!
//! ## Usage
//! ```bash
//! # Seed ./shop.db
//! cargo run -p shop-db --bin seed
//!
//! # Specify database path
//! cargo run -p shop-db --bin seed -- --db ./data/shop.db
//! ```
//!
//! ## Seeded Data
//! - Categories: Elektronik, Fashion, Rumah Tangga
//! - 5 products with stock
//! - Demo user: `demo@local.test` / `password123`
//!
//! Safe to run repeatedly: existing categories and the demo user are kept,
//! and products are only inserted into an empty catalog.

use std::env;

use shop_core::{Email, Money};
use shop_db::password::hash_password;
use shop_db::{Database, DbConfig, NewProduct};

const CATEGORIES: &[&str] = &["Elektronik", "Fashion", "Rumah Tangga"];

/// (name, description, price in whole rupiah, image, stock, category index)
const PRODUCTS: &[(&str, &str, i64, &str, i64, usize)] = &[
    (
        "Headphone Bluetooth",
        "Suara jernih, baterai 30 jam.",
        299_000,
        "https://picsum.photos/seed/1/600/400",
        50,
        0,
    ),
    (
        "Smartwatch Basic",
        "Monitoring langkah & detak jantung.",
        499_000,
        "https://picsum.photos/seed/2/600/400",
        35,
        0,
    ),
    (
        "Kemeja Pria Slim Fit",
        "Bahan adem, nyaman dipakai.",
        159_000,
        "https://picsum.photos/seed/3/600/400",
        120,
        1,
    ),
    (
        "Gaun Kasual",
        "Ringan dan stylish untuk harian.",
        199_000,
        "https://picsum.photos/seed/4/600/400",
        70,
        1,
    ),
    (
        "Set Pisau Dapur",
        "Stainless steel, tajam dan awet.",
        129_000,
        "https://picsum.photos/seed/5/600/400",
        80,
        2,
    ),
];

const DEMO_EMAIL: &str = "demo@local.test";
const DEMO_PASSWORD: &str = "password123";
const DEMO_NAME: &str = "Demo User";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./shop.db");

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
                println!("Mini Shop Seed Data");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./shop.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Mini Shop Seed Data");
    println!("======================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Categories
    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for name in CATEGORIES {
        let id = match db.categories().find_by_name(name).await? {
            Some(existing) => existing.id,
            None => db.categories().insert(name).await?,
        };
        category_ids.push(id);
    }
    println!("✓ {} categories", category_ids.len());

    // Products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Catalog already has {} products, skipping products", existing);
    } else {
        for (name, description, price, image_url, stock, category) in PRODUCTS {
            let product = NewProduct {
                name: name.to_string(),
                description: Some(description.to_string()),
                price: Money::from_major_minor(*price, 0),
                image_url: Some(image_url.to_string()),
                stock: *stock,
                category_id: category_ids.get(*category).copied(),
            };

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.name, e);
                continue;
            }
        }
        println!("✓ {} products", PRODUCTS.len());
    }

    // Demo user
    let demo_email = Email::parse(DEMO_EMAIL)?;
    if db.users().find_by_email(&demo_email).await?.is_none() {
        let hash = hash_password(DEMO_PASSWORD)?;
        db.users().create(&demo_email, &hash, DEMO_NAME).await?;
        println!("✓ Demo user {} / {}", DEMO_EMAIL, DEMO_PASSWORD);
    } else {
        println!("✓ Demo user already present");
    }

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
