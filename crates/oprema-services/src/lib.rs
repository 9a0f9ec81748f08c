//! # oprema-services: Domain Service Layer for the Oprema Storefront
//!
//! One module per entity, each exposing use-case-shaped functions to the
//! frontend and owning the translation between application-facing field
//! names (camelCase, bilingual nested objects) and storage column names
//! (snake_case, separate `_sr`/`_en` columns).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Oprema Service Surface                           │
//! │                                                                         │
//! │  Storefront                         Admin                               │
//! │  ──────────                         ─────                               │
//! │  get_products(filters)              list_all / create / update /        │
//! │  get_category_by_slug(slug)         delete / bulk_delete                │
//! │  get_banners(position)              move_banner(id, direction)          │
//! │  cart + checkout(details)           update_status / export / import     │
//! │       │                                  │                              │
//! │       └───────────────┬──────────────────┘                              │
//! │                       ▼                                                 │
//! │                  QueryRouter (oprema-store)                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Policy
//! Reads degrade silently (`warn!` + empty list / `None` - the storefront
//! shows an empty state, never an error banner); writes surface a
//! [`ServiceError`] with a machine-readable code so the admin UI can show
//! a toast naming the failed operation.
//!
//! ## Modules
//!
//! - [`product`] - catalog CRUD, bulk delete, JSON import/export
//! - [`category`] - category CRUD, slug lookups, detach-on-delete
//! - [`order`] - checkout, status pipeline, bulk status updates
//! - [`customer`] - customer profiles
//! - [`banner`] - banners/promotions and pairwise reordering
//! - [`cart`] - the client-only cart state
//! - [`settings`] - local-data reset and health probe
//! - [`mapping`] - the single row ⇄ domain translation layer
//! - [`error`] - the service error envelope

// =============================================================================
// Module Declarations
// =============================================================================

pub mod banner;
pub mod cart;
pub mod category;
pub mod customer;
pub mod error;
mod mapping;
pub mod order;
pub mod product;
pub mod settings;

// =============================================================================
// Re-exports
// =============================================================================

pub use banner::{BannerService, BannerUpdate, MoveDirection, NewBanner};
pub use cart::{Cart, CartItem, CartState};
pub use category::{CategoryService, CategoryUpdate, NewCategory};
pub use customer::{CustomerService, CustomerUpdate, NewCustomer};
pub use error::{ErrorCode, ServiceError, ServiceResult};
pub use order::{CheckoutDetails, NewOrder, OrderService};
pub use product::{NewProduct, ProductFilters, ProductService, ProductUpdate};
pub use settings::SettingsService;
