//! # Storage Commands
//!
//! The typed command vocabulary every caller of the storage layer speaks.
//!
//! ## Why Commands Instead of SQL Strings?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Dispatch                                     │
//! │                                                                         │
//! │  Services build:   Command::Product(ProductCommand::List(query))       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  QueryRouter ──► which backend?                                        │
//! │       │                                                                 │
//! │       ├── DirectBackend ──► sql::render(&cmd) ──► SQLite               │
//! │       ├── RemoteBackend ──► sql::render(&cmd) ──► POST /api/db         │
//! │       │        └── on failure ──► LocalStore (typed match, no SQL)     │
//! │       └── LocalStore ──────► typed match over collections              │
//! │                                                                         │
//! │  SQL text exists ONLY at the true backend boundary. A command either   │
//! │  matches an arm of the dispatcher or is a hard Unsupported error -     │
//! │  there is no substring matching and no silent no-match.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use oprema_core::{BannerPosition, OrderStatus, PaymentStatus, ProductStatus};

use crate::rows::{
    BannerPatch, BannerRow, CategoryPatch, CategoryRow, CustomerPatch, CustomerRow, OrderRow,
    ProductPatch, ProductRow,
};

// =============================================================================
// Product Commands
// =============================================================================

/// Storefront product listing filter.
///
/// Predicates apply in declaration order: status equality is the mandatory
/// first predicate, then the optional equality filters, then the limit as a
/// final slice. Collection order is preserved throughout.
#[derive(Debug, Clone)]
pub struct ProductQuery {
    /// Mandatory status predicate. The storefront always asks for `active`;
    /// the admin uses [`ProductCommand::ListNewest`] instead.
    pub status: ProductStatus,
    /// Optional category slug equality.
    pub category: Option<String>,
    /// Optional `is_on_sale` equality.
    pub on_sale: Option<bool>,
    /// Optional `is_new` equality.
    pub is_new: Option<bool>,
    /// Optional row cap, applied last.
    pub limit: Option<u32>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        ProductQuery {
            status: ProductStatus::Active,
            category: None,
            on_sale: None,
            is_new: None,
            limit: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ProductCommand {
    /// Filtered storefront listing.
    List(ProductQuery),
    /// Single product by id.
    Get { id: String },
    /// Products whose id is in the given list (cart hydration).
    GetMany { ids: Vec<String> },
    /// Admin listing, newest first, all statuses.
    ListNewest,
    Insert(Box<ProductRow>),
    Update { id: String, patch: ProductPatch },
    Delete { id: String },
    /// Bulk delete; an empty id list is a no-op upstream.
    DeleteMany { ids: Vec<String> },
}

// =============================================================================
// Category Commands
// =============================================================================

#[derive(Debug, Clone)]
pub enum CategoryCommand {
    /// All categories ordered by `display_order`; `active` filters when set.
    List { active: Option<bool> },
    Get { id: String },
    GetBySlug { slug: String },
    /// Name-columns projection used for breadcrumb lookups.
    NameOf { id: String },
    Insert(Box<CategoryRow>),
    Update { id: String, patch: CategoryPatch },
    /// Nulls `parent_id` on every child of the given category. Issued
    /// before `Delete` so removing a parent detaches instead of cascading.
    DetachChildren { parent_id: String },
    Delete { id: String },
}

// =============================================================================
// Order Commands
// =============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    /// All orders, newest first.
    List,
    Get { id: String },
    Insert(Box<OrderRow>),
    SetStatus { id: String, status: OrderStatus },
    SetPaymentStatus { id: String, status: PaymentStatus },
    /// One statement with an IN-list sized to the id array.
    SetStatusMany { ids: Vec<String>, status: OrderStatus },
}

// =============================================================================
// Customer Commands
// =============================================================================

#[derive(Debug, Clone)]
pub enum CustomerCommand {
    List,
    Get { id: String },
    Insert(Box<CustomerRow>),
    Update { id: String, patch: CustomerPatch },
    Delete { id: String },
}

// =============================================================================
// Banner Commands
// =============================================================================

#[derive(Debug, Clone)]
pub enum BannerCommand {
    /// Banners ordered by `display_order`, optionally scoped to a position
    /// slot; `only_active` hides drafts from the storefront.
    List {
        position: Option<BannerPosition>,
        only_active: bool,
    },
    Get { id: String },
    Insert(Box<BannerRow>),
    Update { id: String, patch: BannerPatch },
    Delete { id: String },
}

// =============================================================================
// Top-Level Command
// =============================================================================

/// A storage command, grouped per entity.
#[derive(Debug, Clone)]
pub enum Command {
    Product(ProductCommand),
    Category(CategoryCommand),
    Order(OrderCommand),
    Customer(CustomerCommand),
    Banner(BannerCommand),
}

impl Command {
    /// Whether this command writes (INSERT/UPDATE/DELETE territory).
    ///
    /// Used by the remote backend to decide when to replay results into
    /// the local store.
    pub fn is_mutating(&self) -> bool {
        match self {
            Command::Product(cmd) => matches!(
                cmd,
                ProductCommand::Insert(_)
                    | ProductCommand::Update { .. }
                    | ProductCommand::Delete { .. }
                    | ProductCommand::DeleteMany { .. }
            ),
            Command::Category(cmd) => matches!(
                cmd,
                CategoryCommand::Insert(_)
                    | CategoryCommand::Update { .. }
                    | CategoryCommand::DetachChildren { .. }
                    | CategoryCommand::Delete { .. }
            ),
            Command::Order(cmd) => matches!(
                cmd,
                OrderCommand::Insert(_)
                    | OrderCommand::SetStatus { .. }
                    | OrderCommand::SetPaymentStatus { .. }
                    | OrderCommand::SetStatusMany { .. }
            ),
            Command::Customer(cmd) => matches!(
                cmd,
                CustomerCommand::Insert(_)
                    | CustomerCommand::Update { .. }
                    | CustomerCommand::Delete { .. }
            ),
            Command::Banner(cmd) => matches!(
                cmd,
                BannerCommand::Insert(_)
                    | BannerCommand::Update { .. }
                    | BannerCommand::Delete { .. }
            ),
        }
    }

    /// Whether this command touches the catalog collections the local
    /// store shadows (products, categories).
    pub fn touches_catalog(&self) -> bool {
        matches!(self, Command::Product(_) | Command::Category(_))
    }

    /// Short dotted name for logs and Unsupported errors.
    pub fn describe(&self) -> &'static str {
        match self {
            Command::Product(cmd) => match cmd {
                ProductCommand::List(_) => "products.list",
                ProductCommand::Get { .. } => "products.get",
                ProductCommand::GetMany { .. } => "products.get_many",
                ProductCommand::ListNewest => "products.list_newest",
                ProductCommand::Insert(_) => "products.insert",
                ProductCommand::Update { .. } => "products.update",
                ProductCommand::Delete { .. } => "products.delete",
                ProductCommand::DeleteMany { .. } => "products.delete_many",
            },
            Command::Category(cmd) => match cmd {
                CategoryCommand::List { .. } => "categories.list",
                CategoryCommand::Get { .. } => "categories.get",
                CategoryCommand::GetBySlug { .. } => "categories.get_by_slug",
                CategoryCommand::NameOf { .. } => "categories.name_of",
                CategoryCommand::Insert(_) => "categories.insert",
                CategoryCommand::Update { .. } => "categories.update",
                CategoryCommand::DetachChildren { .. } => "categories.detach_children",
                CategoryCommand::Delete { .. } => "categories.delete",
            },
            Command::Order(cmd) => match cmd {
                OrderCommand::List => "orders.list",
                OrderCommand::Get { .. } => "orders.get",
                OrderCommand::Insert(_) => "orders.insert",
                OrderCommand::SetStatus { .. } => "orders.set_status",
                OrderCommand::SetPaymentStatus { .. } => "orders.set_payment_status",
                OrderCommand::SetStatusMany { .. } => "orders.set_status_many",
            },
            Command::Customer(cmd) => match cmd {
                CustomerCommand::List => "customers.list",
                CustomerCommand::Get { .. } => "customers.get",
                CustomerCommand::Insert(_) => "customers.insert",
                CustomerCommand::Update { .. } => "customers.update",
                CustomerCommand::Delete { .. } => "customers.delete",
            },
            Command::Banner(cmd) => match cmd {
                BannerCommand::List { .. } => "banners.list",
                BannerCommand::Get { .. } => "banners.get",
                BannerCommand::Insert(_) => "banners.insert",
                BannerCommand::Update { .. } => "banners.update",
                BannerCommand::Delete { .. } => "banners.delete",
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_classification() {
        let read = Command::Product(ProductCommand::List(ProductQuery::default()));
        assert!(!read.is_mutating());

        let write = Command::Product(ProductCommand::Delete { id: "p-1".into() });
        assert!(write.is_mutating());

        let detach = Command::Category(CategoryCommand::DetachChildren {
            parent_id: "c-1".into(),
        });
        assert!(detach.is_mutating());
    }

    #[test]
    fn test_catalog_classification() {
        let product = Command::Product(ProductCommand::ListNewest);
        let order = Command::Order(OrderCommand::List);
        assert!(product.touches_catalog());
        assert!(!order.touches_catalog());
    }

    #[test]
    fn test_default_product_query_targets_active() {
        let query = ProductQuery::default();
        assert_eq!(query.status, ProductStatus::Active);
        assert!(query.category.is_none());
        assert!(query.limit.is_none());
    }
}
