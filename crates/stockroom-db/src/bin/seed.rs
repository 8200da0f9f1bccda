//! # Seed Data Generator
//!
//! Populates the database with a demo catalog and a batch of orders.
//!
//! ## Usage
//! ```bash
//! # Seed ./stockroom_dev.db with 12 orders (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # More orders, different file
//! cargo run -p stockroom-db --bin seed -- --orders 40 --db ./data/stockroom.db
//! ```
//!
//! ## Generated Data
//! - Categories: Drinks, Snacks, Bakery, Household
//! - Items: a handful per category, stock 20-60
//! - Orders: every fifth cancelled, every third of the rest completed,
//!   the others left pending

use std::env;

use anyhow::Context;
use stockroom_core::order::{NewOrder, OrderLineRequest};
use stockroom_core::{CategoryInput, ItemInput};
use stockroom_db::{Database, DbConfig};

/// (category, color, items as (name, price cents))
const CATALOG: &[(&str, &str, &[(&str, i64)])] = &[
    (
        "Drinks",
        "#2f80ed",
        &[
            ("Sparkling Water", 129),
            ("Cola 330ml", 149),
            ("Orange Juice 1L", 329),
            ("Cold Brew", 399),
        ],
    ),
    (
        "Snacks",
        "#f2994a",
        &[
            ("Sea Salt Crisps", 199),
            ("Dark Chocolate Bar", 249),
            ("Trail Mix", 449),
        ],
    ),
    (
        "Bakery",
        "#bb6bd9",
        &[
            ("Sourdough Loaf", 549),
            ("Croissant", 229),
            ("Blueberry Muffin", 279),
        ],
    ),
    (
        "Household",
        "#27ae60",
        &[
            ("Dish Soap", 389),
            ("Paper Towels", 599),
            ("Batteries AA 4pk", 799),
        ],
    ),
];

const CUSTOMERS: &[&str] = &[
    "Walk-in", "Ana Ruiz", "Sam Okafor", "Lee Chen", "Priya Nair", "Tom Becker",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();

    let mut orders: usize = 12;
    let mut db_path = String::from("./stockroom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--orders" | "-o" => {
                if i + 1 < args.len() {
                    orders = args[i + 1].parse().unwrap_or(12);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -o, --orders <N>   Number of demo orders (default: 12)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockroom Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!("Orders:   {}", orders);
    println!();

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .with_context(|| format!("opening {}", db_path))?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.items().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Catalog
    println!();
    println!("Creating catalog...");

    let mut item_ids = Vec::new();
    for (sort_order, (category_name, color, items)) in CATALOG.iter().enumerate() {
        let category = db
            .categories()
            .create(&CategoryInput {
                name: category_name.to_string(),
                color: color.to_string(),
                sort_order: sort_order as i64,
            })
            .await?;

        for (idx, (name, price_cents)) in items.iter().enumerate() {
            let item = db
                .items()
                .create(&ItemInput {
                    name: name.to_string(),
                    price_cents: *price_cents,
                    quantity: 20 + ((sort_order * 7 + idx * 13) % 41) as i64,
                    weight_grams: None,
                    in_stock: None,
                })
                .await?;
            db.items()
                .set_categories(&item.id, &[category.id.clone()])
                .await?;
            item_ids.push(item.id);
        }

        println!("  {} ({} items)", category_name, items.len());
    }

    // Orders
    println!();
    println!("Creating orders...");

    let engine = db.order_engine();
    let mut created = 0;
    for n in 0..orders {
        let first = &item_ids[n % item_ids.len()];
        let second = &item_ids[(n * 5 + 3) % item_ids.len()];

        let request = NewOrder {
            customer_name: CUSTOMERS[n % CUSTOMERS.len()].to_string(),
            items: vec![
                OrderLineRequest {
                    item_id: first.clone(),
                    quantity: 1 + (n % 3) as i64,
                    unit_price_cents: None,
                },
                OrderLineRequest {
                    item_id: second.clone(),
                    quantity: 1,
                    unit_price_cents: None,
                },
            ],
        };

        let order = match engine.create_order(&request).await {
            Ok(order) => order,
            Err(e) => {
                eprintln!("Failed to create order {}: {}", n + 1, e);
                continue;
            }
        };

        if n % 5 == 4 {
            engine.update_status(&order.id, "cancelled", None).await?;
        } else if n % 3 == 0 {
            let method = if n % 2 == 0 { "cash" } else { "card" };
            engine.update_status(&order.id, "completed", Some(method)).await?;
        }

        created += 1;
    }

    println!("✓ Created {} orders", created);
    println!();
    println!("✓ Seed complete!");

    Ok(())
}
