//! # Seed Data Generator
//!
//! Populates a development database with one seller, one buyer, a small
//! catalog and some deposited coins.
//!
//! ## Usage
//! ```bash
//! # Seed ./vending.db
//! cargo run -p vending-db --bin seed
//!
//! # Seed another file
//! VENDING_DATABASE_PATH=./data/dev.db cargo run -p vending-db --bin seed
//! ```
//!
//! Running it twice is harmless: an already populated database is left alone.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use vending_core::{CoreResult, ErrorKind, NewAccount, NewProduct, Principal, Role};
use vending_db::{Database, DbConfig};
use vending_engine::{VendingConfig, VendingMachine};

const SEED_PASSWORD: &str = "vend-dev-123";

/// (name, unit cost in cents, stock)
const PRODUCTS: &[(&str, i64, i64)] = &[
    ("Cola", 150, 20),
    ("Sparkling Water", 100, 30),
    ("Orange Juice", 185, 12),
    ("Salted Crisps", 120, 25),
    ("Chocolate Bar", 95, 40),
    ("Granola Bar", 135, 18),
];

/// Coins the seeded buyer starts with.
const DEPOSITS: &[i64] = &[100, 100, 50, 20, 10, 5];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = VendingConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(path = %config.database_path, "Seeding vending database");

    let db = Database::new(DbConfig::from(&config)).await?;
    let machine = VendingMachine::new(Arc::new(db.clone()), &config);

    let seller = match register(&machine, "seed-seller", Role::Seller).await {
        Ok(seller) => seller,
        Err(e) if e.kind() == ErrorKind::DuplicateName => {
            info!("Database already populated, skipping seed");
            db.close().await;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let buyer = register(&machine, "seed-buyer", Role::Buyer).await?;

    let mut products = Vec::with_capacity(PRODUCTS.len());
    for (name, unit_cost, amount_available) in PRODUCTS {
        let product = machine
            .create_product(
                &seller,
                NewProduct {
                    name: name.to_string(),
                    unit_cost: *unit_cost,
                    amount_available: *amount_available,
                },
            )
            .await?;
        products.push(product);
    }
    info!(count = products.len(), "Products created");

    let mut balance = None;
    for coin in DEPOSITS {
        balance = Some(machine.deposit(&buyer, *coin).await?);
    }

    let summary = serde_json::json!({
        "seller": machine.get_account(&seller, &seller.id).await?,
        "buyer": machine.get_account(&buyer, &buyer.id).await?,
        "password": SEED_PASSWORD,
        "buyer_balance": balance,
        "products": products,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    db.close().await;
    info!("Seed complete");
    Ok(())
}

async fn register(machine: &VendingMachine, username: &str, role: Role) -> CoreResult<Principal> {
    let details = machine
        .register(NewAccount {
            username: username.to_string(),
            password: SEED_PASSWORD.to_string(),
            role,
        })
        .await?;
    info!(id = %details.id, username, role = %role, "Account registered");
    Ok(Principal::new(details.id, details.role))
}
