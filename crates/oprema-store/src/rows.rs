//! # Storage Rows
//!
//! Storage-shaped records for every entity, plus the per-entity patch types.
//!
//! ## One Mapping Per Entity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Where the column mapping lives                             │
//! │                                                                         │
//! │  Domain type (camelCase, bilingual nested)                             │
//! │       │  oprema-services::mapping                                      │
//! │       ▼                                                                 │
//! │  *Row / *Patch (THIS MODULE - snake_case, flat _sr/_en columns)        │
//! │       │                                                                 │
//! │       ├── Patch::assignments()  → SET list for the SQL adapter         │
//! │       └── Patch::apply()        → same mapping for the local store     │
//! │                                                                         │
//! │  Each column name is written ONCE, here. The SQL renderer and the      │
//! │  local emulation store both consume the same assignment list, so the   │
//! │  two backends cannot drift apart field by field.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Partial Updates
//! Patch fields are `Option<T>`: `None` leaves the column untouched.
//! Nullable columns where "clear this value" is a real admin action
//! (`old_price_cents`, `parent_id`, `discount_percent`, ...) are
//! `Option<Option<T>>` - `Some(None)` writes NULL. Omitted and cleared are
//! therefore different things at the type level.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use oprema_core::{Address, BannerPosition, OrderItem, OrderStatus, PaymentStatus, ProductStatus};

use crate::sql::SqlValue;

/// Generates a fresh row id (UUID v4 string).
pub fn new_row_id() -> String {
    Uuid::new_v4().to_string()
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Embedded Documents
// =============================================================================

/// Serde adapter for embedded JSON documents.
///
/// Order items and addresses live in TEXT columns as encoded JSON. Rows
/// decoded from the database hand us that string; rows built in memory or
/// returned by the query proxy may carry the structured form instead. This
/// module accepts both and always serializes back to the encoded form the
/// column expects.
pub(crate) mod embedded {
    use serde::de::{DeserializeOwned, Error as DeError};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        let json = serde_json::to_value(value).map_err(serde::ser::Error::custom)?;
        if json.is_null() {
            serializer.serialize_none()
        } else {
            let text = serde_json::to_string(&json).map_err(serde::ser::Error::custom)?;
            serializer.serialize_str(&text)
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: DeserializeOwned,
        D: Deserializer<'de>,
    {
        let raw = serde_json::Value::deserialize(deserializer)?;
        match raw {
            serde_json::Value::String(text) => {
                serde_json::from_str(&text).map_err(DeError::custom)
            }
            other => serde_json::from_value(other).map_err(DeError::custom),
        }
    }
}

// =============================================================================
// Products
// =============================================================================

/// A product as the storage backends see it: flat, snake_case, `_sr`/`_en`
/// columns instead of nested bilingual objects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRow {
    #[serde(default = "new_row_id")]
    pub id: String,
    pub title_sr: String,
    pub title_en: String,
    pub price_cents: i64,
    #[serde(default)]
    pub old_price_cents: Option<i64>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_on_sale: bool,
    #[serde(default)]
    pub description_sr: String,
    #[serde(default)]
    pub description_en: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default = "now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "now")]
    pub updated_at: DateTime<Utc>,
}

/// Partial update for a product. See the module docs for `None` vs
/// `Some(None)` semantics.
#[derive(Debug, Clone, Default)]
pub struct ProductPatch {
    pub title_sr: Option<String>,
    pub title_en: Option<String>,
    pub price_cents: Option<i64>,
    pub old_price_cents: Option<Option<i64>>,
    pub category: Option<Option<String>>,
    pub stock: Option<i64>,
    pub status: Option<ProductStatus>,
    pub is_new: Option<bool>,
    pub is_on_sale: Option<bool>,
    pub description_sr: Option<String>,
    pub description_en: Option<String>,
    pub image_url: Option<Option<String>>,
}

impl ProductPatch {
    /// Column/value pairs for every field present in the patch, in
    /// declaration order. The SQL adapter turns this into the SET list;
    /// the local store feeds it through [`ProductPatch::apply`].
    pub fn assignments(&self) -> Vec<(&'static str, SqlValue)> {
        let mut set = Vec::new();
        if let Some(v) = &self.title_sr {
            set.push(("title_sr", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.title_en {
            set.push(("title_en", SqlValue::from(v.clone())));
        }
        if let Some(v) = self.price_cents {
            set.push(("price_cents", SqlValue::Int(v)));
        }
        if let Some(v) = self.old_price_cents {
            set.push(("old_price_cents", SqlValue::nullable_int(v)));
        }
        if let Some(v) = &self.category {
            set.push(("category", SqlValue::nullable_text(v.clone())));
        }
        if let Some(v) = self.stock {
            set.push(("stock", SqlValue::Int(v)));
        }
        if let Some(v) = self.status {
            set.push(("status", SqlValue::Text(v.to_string())));
        }
        if let Some(v) = self.is_new {
            set.push(("is_new", SqlValue::Bool(v)));
        }
        if let Some(v) = self.is_on_sale {
            set.push(("is_on_sale", SqlValue::Bool(v)));
        }
        if let Some(v) = &self.description_sr {
            set.push(("description_sr", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.description_en {
            set.push(("description_en", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.image_url {
            set.push(("image_url", SqlValue::nullable_text(v.clone())));
        }
        set
    }

    /// Applies the same assignments to an in-memory row (local store path).
    pub fn apply(&self, row: &mut ProductRow) {
        if let Some(v) = &self.title_sr {
            row.title_sr = v.clone();
        }
        if let Some(v) = &self.title_en {
            row.title_en = v.clone();
        }
        if let Some(v) = self.price_cents {
            row.price_cents = v;
        }
        if let Some(v) = self.old_price_cents {
            row.old_price_cents = v;
        }
        if let Some(v) = &self.category {
            row.category = v.clone();
        }
        if let Some(v) = self.stock {
            row.stock = v;
        }
        if let Some(v) = self.status {
            row.status = v;
        }
        if let Some(v) = self.is_new {
            row.is_new = v;
        }
        if let Some(v) = self.is_on_sale {
            row.is_on_sale = v;
        }
        if let Some(v) = &self.description_sr {
            row.description_sr = v.clone();
        }
        if let Some(v) = &self.description_en {
            row.description_en = v.clone();
        }
        if let Some(v) = &self.image_url {
            row.image_url = v.clone();
        }
    }

    /// True when the patch carries no assignments at all.
    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRow {
    #[serde(default = "new_row_id")]
    pub id: String,
    pub slug: String,
    pub name_sr: String,
    pub name_en: String,
    #[serde(default)]
    pub description_sr: String,
    #[serde(default)]
    pub description_en: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default = "now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub slug: Option<String>,
    pub name_sr: Option<String>,
    pub name_en: Option<String>,
    pub description_sr: Option<String>,
    pub description_en: Option<String>,
    pub parent_id: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub display_order: Option<i64>,
}

impl CategoryPatch {
    pub fn assignments(&self) -> Vec<(&'static str, SqlValue)> {
        let mut set = Vec::new();
        if let Some(v) = &self.slug {
            set.push(("slug", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.name_sr {
            set.push(("name_sr", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.name_en {
            set.push(("name_en", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.description_sr {
            set.push(("description_sr", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.description_en {
            set.push(("description_en", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.parent_id {
            set.push(("parent_id", SqlValue::nullable_text(v.clone())));
        }
        if let Some(v) = self.is_active {
            set.push(("is_active", SqlValue::Bool(v)));
        }
        if let Some(v) = self.display_order {
            set.push(("display_order", SqlValue::Int(v)));
        }
        set
    }

    pub fn apply(&self, row: &mut CategoryRow) {
        if let Some(v) = &self.slug {
            row.slug = v.clone();
        }
        if let Some(v) = &self.name_sr {
            row.name_sr = v.clone();
        }
        if let Some(v) = &self.name_en {
            row.name_en = v.clone();
        }
        if let Some(v) = &self.description_sr {
            row.description_sr = v.clone();
        }
        if let Some(v) = &self.description_en {
            row.description_en = v.clone();
        }
        if let Some(v) = &self.parent_id {
            row.parent_id = v.clone();
        }
        if let Some(v) = self.is_active {
            row.is_active = v;
        }
        if let Some(v) = self.display_order {
            row.display_order = v;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRow {
    #[serde(default = "new_row_id")]
    pub id: String,
    #[serde(default)]
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[serde(with = "embedded")]
    pub shipping_address: Address,
    #[serde(with = "embedded")]
    pub items: Vec<OrderItem>,
    pub total_cents: i64,
    #[serde(default)]
    pub status: OrderStatus,
    pub payment_method: String,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "now")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Customers
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRow {
    #[serde(default = "new_row_id")]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default, with = "embedded")]
    pub address: Option<Address>,
    #[serde(default = "now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Option<Address>>,
}

impl CustomerPatch {
    pub fn assignments(&self) -> Vec<(&'static str, SqlValue)> {
        let mut set = Vec::new();
        if let Some(v) = &self.first_name {
            set.push(("first_name", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.last_name {
            set.push(("last_name", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.email {
            set.push(("email", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.phone {
            set.push(("phone", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.address {
            let value = match v {
                Some(address) => SqlValue::encoded_json(address),
                None => SqlValue::Null,
            };
            set.push(("address", value));
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }
}

// =============================================================================
// Banners
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannerRow {
    #[serde(default = "new_row_id")]
    pub id: String,
    pub title_sr: String,
    pub title_en: String,
    #[serde(default)]
    pub description_sr: String,
    #[serde(default)]
    pub description_en: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub position: BannerPosition,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default)]
    pub discount_percent: Option<i64>,
    #[serde(default = "now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "now")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct BannerPatch {
    pub title_sr: Option<String>,
    pub title_en: Option<String>,
    pub description_sr: Option<String>,
    pub description_en: Option<String>,
    pub image_url: Option<Option<String>>,
    pub target_url: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub position: Option<BannerPosition>,
    pub display_order: Option<i64>,
    pub discount_percent: Option<Option<i64>>,
}

impl BannerPatch {
    pub fn assignments(&self) -> Vec<(&'static str, SqlValue)> {
        let mut set = Vec::new();
        if let Some(v) = &self.title_sr {
            set.push(("title_sr", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.title_en {
            set.push(("title_en", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.description_sr {
            set.push(("description_sr", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.description_en {
            set.push(("description_en", SqlValue::from(v.clone())));
        }
        if let Some(v) = &self.image_url {
            set.push(("image_url", SqlValue::nullable_text(v.clone())));
        }
        if let Some(v) = &self.target_url {
            set.push(("target_url", SqlValue::nullable_text(v.clone())));
        }
        if let Some(v) = self.is_active {
            set.push(("is_active", SqlValue::Bool(v)));
        }
        if let Some(v) = self.position {
            set.push(("position", SqlValue::Text(v.to_string())));
        }
        if let Some(v) = self.display_order {
            set.push(("display_order", SqlValue::Int(v)));
        }
        if let Some(v) = self.discount_percent {
            set.push(("discount_percent", SqlValue::nullable_int(v)));
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.assignments().is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_patch_has_no_assignments() {
        assert!(ProductPatch::default().is_empty());
        assert!(CategoryPatch::default().is_empty());
        assert!(BannerPatch::default().is_empty());
    }

    #[test]
    fn test_patch_distinguishes_omitted_from_cleared() {
        // Omitted: old price untouched.
        let untouched = ProductPatch::default();
        assert!(untouched.assignments().is_empty());

        // Cleared: old price explicitly set to NULL.
        let cleared = ProductPatch {
            old_price_cents: Some(None),
            ..Default::default()
        };
        let set = cleared.assignments();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].0, "old_price_cents");
        assert_eq!(set[0].1, SqlValue::Null);
    }

    #[test]
    fn test_patch_apply_mirrors_assignments() {
        let mut row = ProductRow {
            id: "p-1".into(),
            title_sr: "Maska".into(),
            title_en: "Case".into(),
            price_cents: 1500,
            old_price_cents: Some(2000),
            category: Some("maske".into()),
            stock: 10,
            status: ProductStatus::Active,
            is_new: false,
            is_on_sale: true,
            description_sr: String::new(),
            description_en: String::new(),
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let patch = ProductPatch {
            price_cents: Some(1200),
            old_price_cents: Some(None),
            is_on_sale: Some(false),
            ..Default::default()
        };
        patch.apply(&mut row);

        assert_eq!(row.price_cents, 1200);
        assert_eq!(row.old_price_cents, None);
        assert!(!row.is_on_sale);
        // Untouched fields survive.
        assert_eq!(row.title_sr, "Maska");
        assert_eq!(row.stock, 10);
    }

    #[test]
    fn test_order_row_embedded_documents_round_trip() {
        let row = OrderRow {
            id: "o-1".into(),
            customer_id: None,
            customer_name: "Mira Petrović".into(),
            customer_email: "mira@example.com".into(),
            customer_phone: "+381641234567".into(),
            shipping_address: Address {
                street: "Knez Mihailova 1".into(),
                city: "Beograd".into(),
                postal_code: "11000".into(),
                country: "Srbija".into(),
            },
            items: vec![OrderItem {
                product_id: "p-1".into(),
                title: "Silikonska maska".into(),
                unit_price_cents: 1000,
                quantity: 2,
            }],
            total_cents: 2000,
            status: OrderStatus::Pending,
            payment_method: "pouzećem".into(),
            payment_status: PaymentStatus::Pending,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&row).unwrap();
        // Embedded documents serialize to encoded strings, like the column.
        assert!(json.get("items").unwrap().is_string());

        let back: OrderRow = serde_json::from_value(json).unwrap();
        assert_eq!(back.items.len(), 1);
        assert_eq!(back.items[0].quantity, 2);
        assert_eq!(back.shipping_address.city, "Beograd");
    }

    #[test]
    fn test_order_row_accepts_structured_embedded_documents() {
        // The query proxy may hand back structured JSON instead of the
        // encoded column text; both must decode.
        let json = serde_json::json!({
            "id": "o-2",
            "customer_name": "Petar Perić",
            "customer_email": "petar@example.com",
            "customer_phone": "+381601112223",
            "shipping_address": {
                "street": "Bulevar oslobođenja 12",
                "city": "Novi Sad",
                "postalCode": "21000",
                "country": "Srbija"
            },
            "items": [
                { "productId": "p-2", "title": "USB-C kabl", "unitPriceCents": 500, "quantity": 1 }
            ],
            "total_cents": 500,
            "payment_method": "card"
        });

        let row: OrderRow = serde_json::from_value(json).unwrap();
        assert_eq!(row.items[0].product_id, "p-2");
        assert_eq!(row.status, OrderStatus::Pending);
    }
}
