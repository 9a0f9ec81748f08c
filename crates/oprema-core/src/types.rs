//! # Domain Types
//!
//! Core domain types used throughout the Oprema storefront.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │     Order       │   │    Category     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  title (sr/en)  │   │  items snapshot │   │  slug (routing) │       │
//! │  │  price_cents    │   │  total_cents    │   │  parent_id      │       │
//! │  │  status         │   │  status         │   │  display_order  │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │     Banner      │   │   Localized     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name parts     │   │  position       │   │  sr: String     │       │
//! │  │  address        │   │  display_order  │   │  en: String     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bilingual Fields
//! Every customer-facing text field is a [`Localized`] pair. Storage keeps
//! the two languages in separate `_sr`/`_en` columns; the translation
//! between the nested and the flat shape lives in the services layer, not
//! here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Localized Text
// =============================================================================

/// A Serbian/English text pair.
///
/// ## Why Not a Map?
/// The shop ships with exactly two languages; a struct keeps both mandatory
/// and serde-checked instead of hoping a `HashMap` has the right keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Localized {
    /// Serbian text (default shop language).
    pub sr: String,
    /// English text.
    pub en: String,
}

impl Localized {
    /// Creates a localized pair from both translations.
    pub fn new(sr: impl Into<String>, en: impl Into<String>) -> Self {
        Localized {
            sr: sr.into(),
            en: en.into(),
        }
    }

    /// Returns the text for a language tag, falling back to Serbian for
    /// anything that is not `"en"`.
    pub fn get(&self, lang: &str) -> &str {
        match lang {
            "en" => &self.en,
            _ => &self.sr,
        }
    }

    /// True when both translations are empty.
    pub fn is_empty(&self) -> bool {
        self.sr.trim().is_empty() && self.en.trim().is_empty()
    }
}

// =============================================================================
// Product
// =============================================================================

/// Availability status of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub enum ProductStatus {
    /// Visible and purchasable on the storefront.
    #[default]
    Active,
    /// Listed but not purchasable.
    OutOfStock,
    /// Admin work-in-progress; never shown on the storefront.
    Draft,
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProductStatus::Active => write!(f, "active"),
            ProductStatus::OutOfStock => write!(f, "outOfStock"),
            ProductStatus::Draft => write!(f, "draft"),
        }
    }
}

/// A product in the catalog.
///
/// ## Invariant (display-level, not enforced)
/// When `old_price_cents` is present it should exceed `price_cents`,
/// otherwise the sale badge percentage makes no sense. [`Product::sale_percentage`]
/// simply returns `None` for nonsensical pairs.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Bilingual display title.
    pub title: Localized,

    /// Current price in para (smallest currency unit).
    pub price_cents: i64,

    /// Pre-sale price in para, shown struck through when present.
    pub old_price_cents: Option<i64>,

    /// Category slug this product belongs to (not a FK-enforced relation).
    pub category: Option<String>,

    /// Units on hand (non-negative).
    pub stock: i64,

    /// Availability status.
    pub status: ProductStatus,

    /// "New arrival" storefront flag.
    pub is_new: bool,

    /// "On sale" storefront flag.
    pub is_on_sale: bool,

    /// Bilingual long description.
    pub description: Localized,

    /// Image reference (URL or blob URL).
    pub image_url: Option<String>,

    /// When the product was created.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the current price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the pre-sale price, if any.
    #[inline]
    pub fn old_price(&self) -> Option<Money> {
        self.old_price_cents.map(Money::from_cents)
    }

    /// Percentage shown on the sale badge, e.g. `Some(25)` for 2000 → 1500.
    ///
    /// Returns `None` when there is no old price or the pair is nonsensical
    /// (old price not strictly greater than the current one).
    pub fn sale_percentage(&self) -> Option<i64> {
        let old = self.old_price_cents?;
        crate::money::discount_percentage(Money::from_cents(old), self.price())
    }

    /// Whether the storefront should allow adding this product to the cart.
    pub fn is_purchasable(&self) -> bool {
        self.status == ProductStatus::Active && self.stock > 0
    }
}

// =============================================================================
// Category
// =============================================================================

/// A catalog category (shallow hierarchy via `parent_id`).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// URL slug, unique; used for routing and product association.
    pub slug: String,

    /// Bilingual name.
    pub name: Localized,

    /// Bilingual description.
    pub description: Localized,

    /// Optional parent category id. Deleting a parent detaches the
    /// children (sets this to `None`) rather than cascading.
    pub parent_id: Option<String>,

    /// Hidden categories stay in the admin but leave the storefront.
    pub is_active: bool,

    /// Sort key for category listings.
    pub display_order: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// True for top-level categories.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

// =============================================================================
// Order
// =============================================================================

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed at checkout, not yet picked up by the admin.
    #[default]
    Pending,
    /// Being prepared for shipment.
    Processing,
    /// Handed to the courier.
    Shipped,
    /// Confirmed received.
    Delivered,
    /// Cancelled by admin or customer.
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Payment state of an order, tracked independently from fulfilment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        };
        write!(f, "{}", s)
    }
}

/// A shipping address embedded in orders and customer profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

/// A line item frozen into an order at checkout time.
///
/// Uses the snapshot pattern: the title and unit price are copies, not live
/// references, so later catalog edits never rewrite order history.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product ID at the time of ordering.
    pub product_id: String,
    /// Display title at the time of ordering (frozen, single language as
    /// shown at checkout).
    pub title: String,
    /// Unit price in para at the time of ordering (frozen).
    pub unit_price_cents: i64,
    /// Quantity ordered.
    pub quantity: i64,
}

impl OrderItem {
    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

/// A customer order.
///
/// ## Invariant (not enforced)
/// The sum of line totals should equal `total_cents`; the storage layer
/// stores whatever total it is handed. [`Order::items_total_cents`] exists
/// so callers can compare the two.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,

    /// Optional reference to a stored customer profile.
    pub customer_id: Option<String>,

    /// Denormalized contact details captured at checkout.
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,

    /// Shipping destination.
    pub shipping_address: Address,

    /// Immutable item snapshot; never mutated after creation.
    pub items: Vec<OrderItem>,

    /// Order total in para, stored as supplied at checkout.
    pub total_cents: i64,

    pub status: OrderStatus,

    /// Free-text payment method ("pouzećem", "card", ...).
    pub payment_method: String,

    pub payment_status: PaymentStatus,

    /// Free-text admin/customer notes.
    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sum of line totals, for comparing against `total_cents`.
    pub fn items_total_cents(&self) -> i64 {
        self.items.iter().map(OrderItem::line_total_cents).sum()
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A stored customer profile (created at checkout or by the admin).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// Default shipping address, if the customer saved one.
    pub address: Option<Address>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// "First Last" display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

// =============================================================================
// Banner / Promotion
// =============================================================================

/// Placement slot a banner renders into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum BannerPosition {
    /// Full-width hero carousel on the landing page.
    Hero,
    /// Promotion strip (discount campaigns live here).
    Promo,
    /// Mid-page tiles on the home page.
    Home,
    /// Category page side banners.
    Category,
}

impl std::fmt::Display for BannerPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BannerPosition::Hero => "hero",
            BannerPosition::Promo => "promo",
            BannerPosition::Home => "home",
            BannerPosition::Category => "category",
        };
        write!(f, "{}", s)
    }
}

/// A storefront banner; a banner carrying `discount_percent` is a promotion.
///
/// Ordering inside a position group is maintained by pairwise
/// `display_order` swaps when the admin moves a banner up or down.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    pub id: String,
    pub title: Localized,
    pub description: Localized,
    pub image_url: Option<String>,
    /// Click-through target.
    pub target_url: Option<String>,
    pub is_active: bool,
    pub position: BannerPosition,
    /// Sort key inside the position group.
    pub display_order: i64,
    /// Present only for promotions.
    pub discount_percent: Option<i64>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Banner {
    /// True when this banner is a discount promotion.
    #[inline]
    pub fn is_promotion(&self) -> bool {
        self.discount_percent.is_some()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
