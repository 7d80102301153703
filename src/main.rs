//! Storefront - inventory-consistent cart, checkout and order lifecycle service

use anyhow::Result;
use rust_decimal::Decimal;
use storefront::api::{self, AppState};
use storefront::domain::aggregates::{Category, Product};
use storefront::domain::value_objects::Money;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let state = AppState::new();
    if std::env::var("SEED_DEMO_DATA").is_ok() {
        seed_demo_data(&state)?;
    }
    let app = api::router(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    tracing::info!("storefront listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}

fn seed_demo_data(state: &AppState) -> Result<()> {
    let electronics = state.categories.insert(Category::create("Electronics", "Devices and gadgets")?)?;
    let books = state.categories.insert(Category::create("Books", "Print and digital books")?)?;
    let products = [
        ("Laptop", Decimal::new(99900, 2), 10, electronics.id()),
        ("Headphones", Decimal::new(7950, 2), 25, electronics.id()),
        ("Rust in Action", Decimal::new(3999, 2), 40, books.id()),
    ];
    for (name, price, stock, category_id) in products {
        state.catalog.insert(Product::create(name, "", Money::usd(price), stock, category_id)?);
    }
    tracing::info!("seeded demo catalog");
    Ok(())
}
