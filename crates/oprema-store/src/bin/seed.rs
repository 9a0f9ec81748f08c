//! # Seed Data Generator
//!
//! Populates the database with a demo catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database file
//! cargo run -p oprema-store --bin seed
//!
//! # Specify database path
//! cargo run -p oprema-store --bin seed -- --db ./data/oprema.db
//! ```
//!
//! ## Generated Data
//! A believable slice of a mobile-accessories shop, bilingual throughout:
//! categories (cases, chargers, headphones, cables), products across each,
//! and a pair of storefront banners.

use std::env;

use chrono::Utc;
use tracing::info;

use oprema_core::{BannerPosition, ProductStatus};
use oprema_store::{
    new_row_id, Backend, BannerCommand, BannerRow, CategoryCommand, CategoryRow, Command,
    DbConfig, DirectBackend, ProductCommand, ProductRow, StoreResult,
};

/// (slug, name_sr, name_en, description_sr, description_en)
const CATEGORIES: &[(&str, &str, &str, &str, &str)] = &[
    (
        "maske",
        "Maske za telefone",
        "Phone cases",
        "Zaštitne maske za sve modele",
        "Protective cases for all models",
    ),
    (
        "punjaci",
        "Punjači",
        "Chargers",
        "Kućni i auto punjači",
        "Wall and car chargers",
    ),
    (
        "slusalice",
        "Slušalice",
        "Headphones",
        "Žičane i bežične slušalice",
        "Wired and wireless headphones",
    ),
    (
        "kablovi",
        "Kablovi",
        "Cables",
        "USB, USB-C i Lightning kablovi",
        "USB, USB-C and Lightning cables",
    ),
];

/// (title_sr, title_en, category, price_cents, old_price_cents, stock, is_new)
const PRODUCTS: &[(&str, &str, &str, i64, Option<i64>, i64, bool)] = &[
    (
        "Silikonska maska za iPhone 15",
        "Silicone case for iPhone 15",
        "maske",
        149_900,
        Some(199_900),
        25,
        false,
    ),
    (
        "Providna maska za Galaxy S24",
        "Clear case for Galaxy S24",
        "maske",
        119_900,
        None,
        30,
        true,
    ),
    (
        "Zaštitno staklo 9H",
        "9H tempered glass",
        "maske",
        79_900,
        None,
        40,
        true,
    ),
    (
        "USB-C punjač 30W",
        "30W USB-C charger",
        "punjaci",
        249_900,
        None,
        12,
        true,
    ),
    (
        "Auto punjač sa dva porta",
        "Dual-port car charger",
        "punjaci",
        179_900,
        Some(219_900),
        18,
        false,
    ),
    (
        "Bežične slušalice",
        "Wireless earbuds",
        "slusalice",
        549_900,
        Some(649_900),
        5,
        false,
    ),
    (
        "Sportske slušalice",
        "Sport headphones",
        "slusalice",
        329_900,
        None,
        9,
        false,
    ),
    (
        "USB-C kabl 2m",
        "2m USB-C cable",
        "kablovi",
        89_900,
        None,
        60,
        false,
    ),
    (
        "Lightning kabl 1m",
        "1m Lightning cable",
        "kablovi",
        99_900,
        Some(129_900),
        45,
        false,
    ),
];

#[tokio::main]
async fn main() -> StoreResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let db_path = parse_db_arg().unwrap_or_else(|| "./data/oprema.db".to_string());
    info!(db = %db_path, "seeding demo catalog");

    let backend = DirectBackend::connect(DbConfig::new(&db_path)).await?;

    seed_categories(&backend).await?;
    seed_products(&backend).await?;
    seed_banners(&backend).await?;

    info!(
        categories = CATEGORIES.len(),
        products = PRODUCTS.len(),
        "seed complete"
    );
    Ok(())
}

fn parse_db_arg() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|arg| arg == "--db")
        .and_then(|index| args.get(index + 1))
        .cloned()
}

async fn seed_categories(backend: &DirectBackend) -> StoreResult<()> {
    let now = Utc::now();
    for (order, (slug, name_sr, name_en, desc_sr, desc_en)) in CATEGORIES.iter().enumerate() {
        let row = CategoryRow {
            id: new_row_id(),
            slug: slug.to_string(),
            name_sr: name_sr.to_string(),
            name_en: name_en.to_string(),
            description_sr: desc_sr.to_string(),
            description_en: desc_en.to_string(),
            parent_id: None,
            is_active: true,
            display_order: order as i64 + 1,
            created_at: now,
            updated_at: now,
        };
        backend
            .execute(Command::Category(CategoryCommand::Insert(Box::new(row))))
            .await?;
    }
    Ok(())
}

async fn seed_products(backend: &DirectBackend) -> StoreResult<()> {
    let now = Utc::now();
    for (title_sr, title_en, category, price, old_price, stock, is_new) in PRODUCTS {
        let row = ProductRow {
            id: new_row_id(),
            title_sr: title_sr.to_string(),
            title_en: title_en.to_string(),
            price_cents: *price,
            old_price_cents: *old_price,
            category: Some(category.to_string()),
            stock: *stock,
            status: ProductStatus::Active,
            is_new: *is_new,
            is_on_sale: old_price.is_some(),
            description_sr: String::new(),
            description_en: String::new(),
            image_url: None,
            created_at: now,
            updated_at: now,
        };
        backend
            .execute(Command::Product(ProductCommand::Insert(Box::new(row))))
            .await?;
    }
    Ok(())
}

async fn seed_banners(backend: &DirectBackend) -> StoreResult<()> {
    let now = Utc::now();
    let banners = [
        BannerRow {
            id: new_row_id(),
            title_sr: "Nova kolekcija maski".into(),
            title_en: "New case collection".into(),
            description_sr: "Pogledajte najnovije modele".into(),
            description_en: "Check out the latest models".into(),
            image_url: Some("/images/banners/hero-maske.webp".into()),
            target_url: Some("/kategorija/maske".into()),
            is_active: true,
            position: BannerPosition::Hero,
            display_order: 1,
            discount_percent: None,
            created_at: now,
            updated_at: now,
        },
        BannerRow {
            id: new_row_id(),
            title_sr: "Letnja akcija".into(),
            title_en: "Summer sale".into(),
            description_sr: "Popust na sve slušalice".into(),
            description_en: "Discount on all headphones".into(),
            image_url: Some("/images/banners/promo-slusalice.webp".into()),
            target_url: Some("/kategorija/slusalice".into()),
            is_active: true,
            position: BannerPosition::Promo,
            display_order: 1,
            discount_percent: Some(15),
            created_at: now,
            updated_at: now,
        },
    ];

    for banner in banners {
        backend
            .execute(Command::Banner(BannerCommand::Insert(Box::new(banner))))
            .await?;
    }
    Ok(())
}
