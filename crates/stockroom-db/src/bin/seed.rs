//! # Seed Data Generator
//!
//! Populates a development database with products, the default tier
//! ladder, and a demo customer.
//!
//! ## Usage
//! ```bash
//! # 200 products (default)
//! cargo run -p stockroom-db --bin seed
//!
//! cargo run -p stockroom-db --bin seed -- --count 1000 --db ./data/stockroom.db
//! ```
//!
//! Products are named `{Category} {Item} {Size}`, priced 1.99 to 24.99,
//! with 0 to 100 units of stock. The demo customer has a locked password
//! (`!`) and cannot log in; register a real account through `/register`.

use chrono::Utc;
use std::env;
use stockroom_core::{default_ladder, Product, UserRole};
use stockroom_db::{new_id, Database, DbConfig, NewUser};

const CATEGORIES: &[(&str, &[&str])] = &[
    ("Hardware", &["Bolt", "Nut", "Washer", "Hinge", "Bracket", "Screw"]),
    ("Paint", &["Primer", "Gloss", "Matte", "Varnish", "Stain"]),
    ("Garden", &["Hose", "Rake", "Trowel", "Planter", "Seed Mix"]),
    ("Electrical", &["Cable", "Switch", "Socket", "Fuse", "Bulb", "Tape"]),
    ("Plumbing", &["Pipe", "Valve", "Elbow", "Tap", "Seal"]),
];

const SIZES: &[(&str, i64)] = &[("S", 0), ("M", 150), ("L", 400), ("Bulk", 1_200)];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 200;
    let mut db_path = String::from("./stockroom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if let Some(v) = args.get(i + 1) {
                    count = v.parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(v) = args.get(i + 1) {
                    db_path = v.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 200)");
                println!("  -d, --db <PATH>    Database file path (default: ./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Stockroom Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);
    println!("Products: {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    // Tiers
    if db.tiers().count().await? == 0 {
        let ladder = default_ladder();
        db.tiers().insert_all(&ladder).await?;
        println!("✓ Seeded {} tiers", ladder.len());
    } else {
        println!("⚠ Tiers already present, leaving them");
    }

    // Demo customer
    let base_tier = db
        .tiers()
        .list()
        .await?
        .into_iter()
        .next()
        .map(|t| t.id)
        .unwrap_or_else(|| stockroom_core::BASELINE_TIER_ID.to_string());
    match db
        .users()
        .create(&NewUser {
            name: "Demo Customer".to_string(),
            email: "demo@stockroom.test".to_string(),
            password_hash: "!".to_string(),
            role: UserRole::Customer,
            tier_id: base_tier,
        })
        .await
    {
        Ok(user) => println!("✓ Created demo customer {}", user.id),
        Err(e) => println!("⚠ Demo customer not created: {}", e),
    }

    // Products
    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products, skipping", existing);
        return Ok(());
    }

    let start = std::time::Instant::now();
    let products: Vec<Product> = catalogue().take(count).collect();
    for chunk in products.chunks(100) {
        db.products().insert_many(chunk).await?;
    }

    println!(
        "✓ Generated {} products in {:?}",
        products.len(),
        start.elapsed()
    );
    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Endless cycle of generated products; callers take what they need.
fn catalogue() -> impl Iterator<Item = Product> {
    let combos: Vec<(&str, &str, &str, i64)> = CATEGORIES
        .iter()
        .flat_map(|(cat, items)| {
            items.iter().flat_map(move |item| {
                SIZES
                    .iter()
                    .map(move |(size, addon)| (*cat, *item, *size, *addon))
            })
        })
        .collect();

    (0usize..).map(move |n| {
        let (cat, item, size, addon) = combos[n % combos.len()];
        let round = n / combos.len();
        let name = if round == 0 {
            format!("{cat} {item} {size}")
        } else {
            format!("{cat} {item} {size} #{round}")
        };
        generate_product(name, addon, n)
    })
}

fn generate_product(name: String, price_addon: i64, seed: usize) -> Product {
    let now = Utc::now();
    Product {
        id: new_id(),
        name,
        description: None,
        price_cents: 199 + ((seed * 37) % 1_100) as i64 + price_addon,
        stock: (seed % 101) as i64,
        created_at: now,
        updated_at: now,
    }
}
