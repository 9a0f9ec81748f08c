//! # Field-Name Mapping
//!
//! The ONE place storage rows become domain values (and the shared helpers
//! every service uses to decode backend rows).
//!
//! ## Translation Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │            Storage row            │         Domain value                │
//! │  ─────────────────────────────────┼──────────────────────────────────── │
//! │  title_sr / title_en (flat)       │  title: { sr, en } (nested)        │
//! │  snake_case keys                  │  camelCase keys (serde)            │
//! │  status: "outOfStock" (text)      │  ProductStatus::OutOfStock         │
//! │  items: "[{...}]" (JSON text)     │  items: Vec<OrderItem>             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Earlier revisions of this system duplicated a mapping table inside every
//! service; keeping all of them here (with the patch side living in
//! `oprema_store::rows`) is what prevents per-service drift.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use oprema_core::{Banner, Category, Customer, Localized, Order, Product};
use oprema_store::{BannerRow, CategoryRow, CustomerRow, OrderRow, ProductRow, Rows};

use crate::error::{ServiceError, ServiceResult};

// =============================================================================
// Row Decoding
// =============================================================================

/// Decodes backend rows into typed row structs. Any malformed row fails the
/// whole result; the caller's read/write policy decides what that means.
pub(crate) fn parse_rows<T: DeserializeOwned>(rows: Rows) -> ServiceResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(ServiceError::from))
        .collect()
}

/// Decodes the first row, if any. Used by get-by-id style lookups.
pub(crate) fn parse_first<T: DeserializeOwned>(rows: Rows) -> ServiceResult<Option<T>> {
    match rows.into_iter().next() {
        Some(row) => Ok(Some(serde_json::from_value(row)?)),
        None => Ok(None),
    }
}

// =============================================================================
// Row → Domain
// =============================================================================

pub(crate) fn product_from_row(row: ProductRow) -> Product {
    Product {
        id: row.id,
        title: Localized::new(row.title_sr, row.title_en),
        price_cents: row.price_cents,
        old_price_cents: row.old_price_cents,
        category: row.category,
        stock: row.stock,
        status: row.status,
        is_new: row.is_new,
        is_on_sale: row.is_on_sale,
        description: Localized::new(row.description_sr, row.description_en),
        image_url: row.image_url,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub(crate) fn category_from_row(row: CategoryRow) -> Category {
    Category {
        id: row.id,
        slug: row.slug,
        name: Localized::new(row.name_sr, row.name_en),
        description: Localized::new(row.description_sr, row.description_en),
        parent_id: row.parent_id,
        is_active: row.is_active,
        display_order: row.display_order,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub(crate) fn order_from_row(row: OrderRow) -> Order {
    Order {
        id: row.id,
        customer_id: row.customer_id,
        customer_name: row.customer_name,
        customer_email: row.customer_email,
        customer_phone: row.customer_phone,
        shipping_address: row.shipping_address,
        items: row.items,
        total_cents: row.total_cents,
        status: row.status,
        payment_method: row.payment_method,
        payment_status: row.payment_status,
        notes: row.notes,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub(crate) fn customer_from_row(row: CustomerRow) -> Customer {
    Customer {
        id: row.id,
        first_name: row.first_name,
        last_name: row.last_name,
        email: row.email,
        phone: row.phone,
        address: row.address,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

pub(crate) fn banner_from_row(row: BannerRow) -> Banner {
    Banner {
        id: row.id,
        title: Localized::new(row.title_sr, row.title_en),
        description: Localized::new(row.description_sr, row.description_en),
        image_url: row.image_url,
        target_url: row.target_url,
        is_active: row.is_active,
        position: row.position,
        display_order: row.display_order,
        discount_percent: row.discount_percent,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

// =============================================================================
// Partial-Update Deserialization
// =============================================================================

/// Deserializer for `Option<Option<T>>` update fields: a key that is
/// *present* (even as `null`) becomes `Some(inner)`, an *absent* key stays
/// `None` via `#[serde(default)]`. This is how the wire distinguishes
/// "clear this field" from "leave it alone".
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// =============================================================================
// Import Key Normalization
// =============================================================================

/// Converts a camelCase key to snake_case (`priceCents` → `price_cents`).
fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('_');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Normalizes an imported row object so either naming convention is
/// accepted: camelCase keys are rewritten to the storage spelling,
/// snake_case keys pass through untouched.
pub(crate) fn normalize_import_keys(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.into_iter()
                .map(|(key, value)| (camel_to_snake(&key), value))
                .collect(),
        ),
        other => other,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("priceCents"), "price_cents");
        assert_eq!(camel_to_snake("titleSr"), "title_sr");
        assert_eq!(camel_to_snake("stock"), "stock");
        assert_eq!(camel_to_snake("old_price_cents"), "old_price_cents");
    }

    #[test]
    fn test_normalize_import_keys_accepts_both_spellings() {
        let mixed = serde_json::json!({
            "titleSr": "Maska",
            "title_en": "Case",
            "priceCents": 1500
        });
        let normalized = normalize_import_keys(mixed);
        assert_eq!(normalized["title_sr"], "Maska");
        assert_eq!(normalized["title_en"], "Case");
        assert_eq!(normalized["price_cents"], 1500);
    }

    #[test]
    fn test_product_mapping_nests_bilingual_fields() {
        let row = ProductRow {
            id: "p-1".into(),
            title_sr: "Maska".into(),
            title_en: "Case".into(),
            price_cents: 1500,
            old_price_cents: None,
            category: Some("maske".into()),
            stock: 4,
            status: oprema_core::ProductStatus::Active,
            is_new: false,
            is_on_sale: false,
            description_sr: "Opis".into(),
            description_en: "Description".into(),
            image_url: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };
        let product = product_from_row(row);
        assert_eq!(product.title.sr, "Maska");
        assert_eq!(product.title.en, "Case");
        assert_eq!(product.description.get("en"), "Description");

        // Domain values serialize camelCase for the frontend.
        let json = serde_json::to_value(&product).unwrap();
        assert!(json.get("priceCents").is_some());
        assert!(json.get("price_cents").is_none());
    }
}
