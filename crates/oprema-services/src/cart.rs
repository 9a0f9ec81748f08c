//! # Cart State
//!
//! The client-only shopping cart. Never persisted server-side: it lives in
//! the session and is destroyed by checkout.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart State Operations                                │
//! │                                                                         │
//! │  Frontend Action          Service Call            Cart State Change    │
//! │  ───────────────          ────────────            ─────────────────    │
//! │                                                                         │
//! │  Click "Dodaj u korpu" ──► add_item() ──────────► items.push / qty+=   │
//! │                                                                         │
//! │  Quantity controls ──────► update_quantity() ───► items[i].qty = n     │
//! │                                                    (0 removes the line) │
//! │                                                                         │
//! │  Click remove ───────────► remove_item() ───────► items.remove(i)      │
//! │                                                                         │
//! │  Successful checkout ────► clear() ─────────────► items.clear()        │
//! │                                                                         │
//! │  All write operations acquire the Mutex lock exclusively.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use oprema_core::validation::validate_quantity;
use oprema_core::{CoreError, CoreResult, Product, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// An item in the shopping cart.
///
/// ## Design Notes
/// The name, price, and image are frozen copies taken when the product was
/// added - the cart keeps displaying consistent data even if the admin
/// edits the product meanwhile. The order snapshot at checkout freezes the
/// same values again into the order row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product ID (for storage lookups and merging duplicate adds).
    pub product_id: String,

    /// Display name in the language the shopper was browsing in (frozen).
    pub name: String,

    /// Unit price in para at the time of adding (frozen).
    pub unit_price_cents: i64,

    /// Image reference for the mini-cart (frozen).
    pub image_url: Option<String>,

    /// Quantity in cart.
    pub quantity: i64,

    /// When this item was added.
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a cart item from a product, freezing display data.
    pub fn from_product(product: &Product, quantity: i64, language: &str) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name: product.title.get(language).to_string(),
            unit_price_cents: product.price_cents,
            image_url: product.image_url.clone(),
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Line total (unit price × quantity).
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Items are unique by `product_id` (adding the same product merges
///   quantities)
/// - Quantity is always 1..=MAX_ITEM_QUANTITY (0 removes the line)
/// - At most MAX_CART_ITEMS distinct lines
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a product or merges into the existing line.
    pub fn add_item(&mut self, product: &Product, quantity: i64, language: &str) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            let merged = item.quantity + quantity;
            if merged > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: merged,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = merged;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(CartItem::from_product(product, quantity, language));
        Ok(())
    }

    /// Sets a line's quantity; zero removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }
        validate_quantity(quantity)?;

        match self.items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(())
            }
            None => Err(CoreError::ProductNotInCart(product_id.to_string())),
        }
    }

    /// Removes a line by product ID.
    pub fn remove_item(&mut self, product_id: &str) -> CoreResult<()> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == before {
            Err(CoreError::ProductNotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Empties the cart (checkout completion, manual clear).
    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total quantity across all lines (the badge number).
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Cart subtotal in para.
    pub fn subtotal_cents(&self) -> i64 {
        self.items.iter().map(CartItem::line_total_cents).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

/// Shared cart state.
///
/// ## Thread Safety
/// `Arc<Mutex<Cart>>`: cart operations are quick and mostly mutating, so a
/// plain Mutex beats the complexity of an RwLock here.
#[derive(Debug, Clone)]
pub struct CartState {
    cart: Arc<Mutex<Cart>>,
}

impl CartState {
    pub fn new() -> Self {
        CartState {
            cart: Arc::new(Mutex::new(Cart::new())),
        }
    }

    /// Executes a function with read access to the cart.
    pub fn with_cart<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Cart) -> R,
    {
        let cart = self.cart.lock().expect("Cart mutex poisoned");
        f(&cart)
    }

    /// Executes a function with write access to the cart.
    pub fn with_cart_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut cart = self.cart.lock().expect("Cart mutex poisoned");
        f(&mut cart)
    }
}

impl Default for CartState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use oprema_core::{Localized, ProductStatus};

    fn test_product(id: &str, price_cents: i64) -> Product {
        Product {
            id: id.to_string(),
            title: Localized::new(format!("Proizvod {}", id), format!("Product {}", id)),
            price_cents,
            old_price_cents: None,
            category: Some("maske".into()),
            stock: 10,
            status: ProductStatus::Active,
            is_new: false,
            is_on_sale: false,
            description: Localized::default(),
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_add_item() {
        let mut cart = Cart::new();
        let product = test_product("p-1", 99_900);

        cart.add_item(&product, 2, "sr").unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal_cents(), 199_800);
        assert_eq!(cart.items[0].name, "Proizvod p-1");
    }

    #[test]
    fn test_cart_add_same_product_merges_quantity() {
        let mut cart = Cart::new();
        let product = test_product("p-1", 99_900);

        cart.add_item(&product, 2, "sr").unwrap();
        cart.add_item(&product, 3, "en").unwrap();

        assert_eq!(cart.item_count(), 1); // Still one line
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_cart_zero_quantity_removes_line() {
        let mut cart = Cart::new();
        let product = test_product("p-1", 99_900);
        cart.add_item(&product, 2, "sr").unwrap();

        cart.update_quantity("p-1", 0).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_rejects_unknown_product() {
        let mut cart = Cart::new();
        let err = cart.update_quantity("nema-ga", 2).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotInCart(_)));
    }

    #[test]
    fn test_cart_clear() {
        let mut cart = Cart::new();
        let product = test_product("p-1", 99_900);
        cart.add_item(&product, 1, "sr").unwrap();
        assert!(!cart.is_empty());

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_quantity_cap() {
        let mut cart = Cart::new();
        let product = test_product("p-1", 99_900);
        cart.add_item(&product, 60, "sr").unwrap();

        let err = cart.add_item(&product, 60, "sr").unwrap_err();
        assert!(matches!(err, CoreError::QuantityTooLarge { .. }));
    }
}
