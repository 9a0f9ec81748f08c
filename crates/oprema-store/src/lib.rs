//! # oprema-store: Storage Layer for the Oprema Storefront
//!
//! This crate provides data access for the bilingual storefront: typed
//! storage commands routed to one of two interchangeable production
//! backends, with a durable local emulation store as the browser-context
//! fallback.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Oprema Data Flow                                 │
//! │                                                                         │
//! │  Domain service (get_products, create_order, ...)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     oprema-store (THIS CRATE)                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │  QueryRouter  │    │  sql adapter   │    │  migrations  │  │   │
//! │  │   │  (router.rs)  │    │  ($n params)   │    │  (embedded)  │  │   │
//! │  │   └───────┬───────┘    └────────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │   ┌───────┴──────────────┬──────────────────────┐              │   │
//! │  │   ▼                      ▼                      ▼              │   │
//! │  │  DirectBackend      RemoteBackend          LocalStore          │   │
//! │  │  (SQLite pool)      (POST /api/db)         (durable JSON,      │   │
//! │  │                       │ fallback             single-writer     │   │
//! │  │                       └────────────────────► actor)            │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`command`] - the typed command vocabulary callers speak
//! - [`rows`] - storage-shaped records and per-entity patch mappings
//! - [`sql`] - command → parameterized statement rendering (the only SQL)
//! - [`backend`] - the capability interface all backends implement
//! - [`pool`] - DbConfig + the direct SQLite backend
//! - [`remote`] - the HTTP query proxy with local fallback
//! - [`local`] - the durable offline emulation store
//! - [`router`] - execution-context selection and the service-facing API
//! - [`migrations`] - embedded schema migrations
//! - [`error`] - storage error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oprema_store::{Command, ProductCommand, ProductQuery, QueryRouter, StoreConfig};
//!
//! let router = QueryRouter::connect(StoreConfig::from_env()).await?;
//! let rows = router
//!     .execute(Command::Product(ProductCommand::List(ProductQuery::default())))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod command;
pub mod error;
pub mod local;
pub mod migrations;
pub mod pool;
pub mod remote;
pub mod router;
pub mod rows;
pub mod sql;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{Backend, Rows};
pub use command::{
    BannerCommand, CategoryCommand, Command, CustomerCommand, OrderCommand, ProductCommand,
    ProductQuery,
};
pub use error::{StoreError, StoreResult};
pub use local::LocalStore;
pub use pool::{DbConfig, DirectBackend};
pub use remote::RemoteBackend;
pub use router::{ExecutionContext, QueryRouter, StorageHandle, StoreConfig};
pub use rows::{
    new_row_id, BannerPatch, BannerRow, CategoryPatch, CategoryRow, CustomerPatch, CustomerRow,
    OrderRow, ProductPatch, ProductRow,
};
pub use sql::{render, SqlValue, Statement};
