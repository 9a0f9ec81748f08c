//! # Order Service
//!
//! Checkout and the admin's order pipeline.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Cart ──► checkout() ──► pending ──► processing ──► shipped            │
//! │                             │                          │                │
//! │                             ▼                          ▼                │
//! │                         cancelled                  delivered            │
//! │                                                                         │
//! │  The item list is a snapshot frozen at checkout: later catalog edits   │
//! │  never rewrite order history. payment_status moves independently.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stored total is whatever checkout supplied; the line-item sum is not
//! re-derived or enforced here ([`Order::items_total_cents`] exists for
//! callers that want to compare).

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use oprema_core::validation::{validate_email, validate_phone};
use oprema_core::{Address, CoreError, Order, OrderItem, OrderStatus, PaymentStatus};
use oprema_store::{new_row_id, Command, OrderCommand, OrderRow, QueryRouter};

use crate::cart::CartState;
use crate::error::{ErrorCode, ServiceError, ServiceResult};
use crate::mapping::{order_from_row, parse_first, parse_rows};

// =============================================================================
// Inputs
// =============================================================================

/// Contact and delivery details captured by the checkout form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDetails {
    #[serde(default)]
    pub customer_id: Option<String>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: Address,
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A complete order submission: details plus the frozen item snapshot and
/// the total as the client computed it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    #[serde(flatten)]
    pub details: CheckoutDetails,
    pub items: Vec<OrderItem>,
    pub total_cents: i64,
}

fn row_from_new(order: NewOrder) -> OrderRow {
    let now = Utc::now();
    OrderRow {
        id: new_row_id(),
        customer_id: order.details.customer_id,
        customer_name: order.details.customer_name,
        customer_email: order.details.customer_email,
        customer_phone: order.details.customer_phone,
        shipping_address: order.details.shipping_address,
        items: order.items,
        total_cents: order.total_cents,
        status: OrderStatus::default(),
        payment_method: order.details.payment_method,
        payment_status: PaymentStatus::default(),
        notes: order.details.notes,
        created_at: now,
        updated_at: now,
    }
}

// =============================================================================
// Service
// =============================================================================

/// Order use cases over the query router.
#[derive(Debug, Clone)]
pub struct OrderService {
    router: QueryRouter,
}

impl OrderService {
    pub fn new(router: QueryRouter) -> Self {
        OrderService { router }
    }

    // -------------------------------------------------------------------------
    // Reads (degrade silently)
    // -------------------------------------------------------------------------

    /// Admin order list, newest first.
    pub async fn get_orders(&self) -> Vec<Order> {
        let result: ServiceResult<Vec<Order>> = async {
            let rows = self.router.execute(Command::Order(OrderCommand::List)).await?;
            Ok(parse_rows::<OrderRow>(rows)?
                .into_iter()
                .map(order_from_row)
                .collect())
        }
        .await;

        match result {
            Ok(orders) => orders,
            Err(err) => {
                warn!(error = %err, "get_orders failed, returning empty list");
                Vec::new()
            }
        }
    }

    pub async fn get_order(&self, id: &str) -> Option<Order> {
        let result: ServiceResult<Option<Order>> = async {
            let rows = self
                .router
                .execute(Command::Order(OrderCommand::Get { id: id.to_string() }))
                .await?;
            Ok(parse_first::<OrderRow>(rows)?.map(order_from_row))
        }
        .await;

        match result {
            Ok(order) => order,
            Err(err) => {
                warn!(id = %id, error = %err, "get_order failed");
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Writes (surface errors)
    // -------------------------------------------------------------------------

    /// Stores an order exactly as submitted. Status defaults to `pending`;
    /// the supplied total is stored unchanged.
    pub async fn create_order(&self, order: NewOrder) -> ServiceResult<Order> {
        validate_email(&order.details.customer_email)?;
        validate_phone(&order.details.customer_phone)?;
        if order.items.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let row = row_from_new(order);
        info!(id = %row.id, total_cents = row.total_cents, "creating order");

        let rows = self
            .router
            .execute(Command::Order(OrderCommand::Insert(Box::new(row))))
            .await?;
        let row = parse_first::<OrderRow>(rows)?
            .ok_or_else(|| ServiceError::new(ErrorCode::Internal, "insert returned no row"))?;
        Ok(order_from_row(row))
    }

    /// Snapshots the cart into an order and clears it - but only after the
    /// insert succeeded, so a failed checkout keeps the cart intact.
    pub async fn checkout(
        &self,
        cart: &CartState,
        details: CheckoutDetails,
    ) -> ServiceResult<Order> {
        let (items, total_cents) = cart.with_cart(|cart| {
            let items: Vec<OrderItem> = cart
                .items
                .iter()
                .map(|item| OrderItem {
                    product_id: item.product_id.clone(),
                    title: item.name.clone(),
                    unit_price_cents: item.unit_price_cents,
                    quantity: item.quantity,
                })
                .collect();
            (items, cart.subtotal_cents())
        });

        let order = self
            .create_order(NewOrder {
                details,
                items,
                total_cents,
            })
            .await?;

        cart.with_cart_mut(|cart| cart.clear());
        info!(id = %order.id, "checkout complete, cart cleared");
        Ok(order)
    }

    pub async fn update_status(&self, id: &str, status: OrderStatus) -> ServiceResult<Order> {
        let rows = self
            .router
            .execute(Command::Order(OrderCommand::SetStatus {
                id: id.to_string(),
                status,
            }))
            .await?;
        let row =
            parse_first::<OrderRow>(rows)?.ok_or_else(|| ServiceError::not_found("Order", id))?;
        info!(id = %id, status = %status, "order status updated");
        Ok(order_from_row(row))
    }

    pub async fn update_payment_status(
        &self,
        id: &str,
        status: PaymentStatus,
    ) -> ServiceResult<Order> {
        let rows = self
            .router
            .execute(Command::Order(OrderCommand::SetPaymentStatus {
                id: id.to_string(),
                status,
            }))
            .await?;
        let row =
            parse_first::<OrderRow>(rows)?.ok_or_else(|| ServiceError::not_found("Order", id))?;
        info!(id = %id, payment_status = %status, "payment status updated");
        Ok(order_from_row(row))
    }

    /// One statement for the whole selection. Empty selection is a no-op.
    pub async fn bulk_update_status(
        &self,
        ids: &[String],
        status: OrderStatus,
    ) -> ServiceResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let rows = self
            .router
            .execute(Command::Order(OrderCommand::SetStatusMany {
                ids: ids.to_vec(),
                status,
            }))
            .await?;
        info!(requested = ids.len(), updated = rows.len(), status = %status, "bulk status update");
        Ok(rows.len())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use oprema_core::{Localized, Product, ProductStatus};
    use oprema_store::{DbConfig, DirectBackend, StorageHandle};

    async fn direct_service() -> OrderService {
        let backend = DirectBackend::connect(DbConfig::in_memory()).await.unwrap();
        OrderService::new(QueryRouter::with_backend(StorageHandle::Direct(backend)))
    }

    fn details() -> CheckoutDetails {
        CheckoutDetails {
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
            payment_method: "pouzećem".into(),
            notes: None,
        }
    }

    fn two_line_order(total_cents: i64) -> NewOrder {
        NewOrder {
            details: details(),
            items: vec![
                OrderItem {
                    product_id: "p-1".into(),
                    title: "Maska".into(),
                    unit_price_cents: 1000,
                    quantity: 2,
                },
                OrderItem {
                    product_id: "p-2".into(),
                    title: "Kabl".into(),
                    unit_price_cents: 500,
                    quantity: 1,
                },
            ],
            total_cents,
        }
    }

    #[tokio::test]
    async fn test_supplied_total_stored_unchanged_and_status_pending() {
        let service = direct_service().await;

        let order = service.create_order(two_line_order(2500)).await.unwrap();

        assert_eq!(order.total_cents, 2500);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Pending);
        assert_eq!(order.items.len(), 2);

        let fetched = service.get_order(&order.id).await.unwrap();
        assert_eq!(fetched.total_cents, 2500);
        assert_eq!(fetched.items_total_cents(), 2500);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_item_list() {
        let service = direct_service().await;
        let mut order = two_line_order(0);
        order.items.clear();

        let err = service.create_order(order).await.unwrap_err();
        assert!(matches!(err.code, ErrorCode::CartError));
    }

    #[tokio::test]
    async fn test_bulk_update_empty_is_noop() {
        let service = direct_service().await;
        let updated = service
            .bulk_update_status(&[], OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(updated, 0);
    }

    #[tokio::test]
    async fn test_status_and_payment_move_independently() {
        let service = direct_service().await;
        let order = service.create_order(two_line_order(2500)).await.unwrap();

        let shipped = service
            .update_status(&order.id, OrderStatus::Shipped)
            .await
            .unwrap();
        assert_eq!(shipped.status, OrderStatus::Shipped);
        assert_eq!(shipped.payment_status, PaymentStatus::Pending);

        let paid = service
            .update_payment_status(&order.id, PaymentStatus::Paid)
            .await
            .unwrap();
        assert_eq!(paid.status, OrderStatus::Shipped);
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
    }

    #[tokio::test]
    async fn test_checkout_snapshots_cart_and_clears_it() {
        let service = direct_service().await;
        let cart = CartState::new();

        let product = Product {
            id: "p-1".into(),
            title: Localized::new("Silikonska maska", "Silicone case"),
            price_cents: 149_900,
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
        };
        cart.with_cart_mut(|c| c.add_item(&product, 2, "sr")).unwrap();

        let order = service.checkout(&cart, details()).await.unwrap();

        assert_eq!(order.total_cents, 299_800);
        assert_eq!(order.items[0].title, "Silikonska maska");
        assert_eq!(order.items[0].quantity, 2);
        assert!(cart.with_cart(|c| c.is_empty()));
    }

    #[tokio::test]
    async fn test_checkout_with_empty_cart_fails_and_cart_survives() {
        let service = direct_service().await;
        let cart = CartState::new();

        let err = service.checkout(&cart, details()).await.unwrap_err();
        assert!(matches!(err.code, ErrorCode::CartError));
    }

    #[tokio::test]
    async fn test_checkout_with_bad_email_keeps_cart() {
        let service = direct_service().await;
        let cart = CartState::new();

        let product = Product {
            id: "p-1".into(),
            title: Localized::new("Maska", "Case"),
            price_cents: 1000,
            old_price_cents: None,
            category: None,
            stock: 5,
            status: ProductStatus::Active,
            is_new: false,
            is_on_sale: false,
            description: Localized::default(),
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        cart.with_cart_mut(|c| c.add_item(&product, 1, "sr")).unwrap();

        let mut bad = details();
        bad.customer_email = "nije-mejl".into();
        let err = service.checkout(&cart, bad).await.unwrap_err();
        assert!(matches!(err.code, ErrorCode::ValidationError));

        // Failed checkout must not destroy the cart.
        assert_eq!(cart.with_cart(|c| c.item_count()), 1);
    }
}
