//! # SQL Adapter
//!
//! Renders a [`Command`](crate::command::Command) into a parameterized SQL
//! statement. This is the ONLY module in the workspace that contains SQL
//! text; callers everywhere else speak the typed command vocabulary.
//!
//! ## Placeholder Convention
//! Statements use `$1..$n` positional placeholders - the form the `/api/db`
//! wire contract carries and one SQLite parses natively. The parameter list
//! length always matches the placeholder count by construction: every
//! placeholder is minted by [`StatementBuilder::bind`] at the moment its
//! value is pushed.
//!
//! ## Mutations Return Rows
//! Every INSERT/UPDATE/DELETE ends in `RETURNING *`, so all statements,
//! read or write, come back as a row list. The remote backend relies on
//! this to replay written rows into the local store.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::command::{
    BannerCommand, CategoryCommand, Command, CustomerCommand, OrderCommand, ProductCommand,
};
use crate::rows::{BannerRow, CategoryRow, CustomerRow, OrderRow, ProductRow};

// =============================================================================
// Parameter Values
// =============================================================================

/// A positional statement parameter.
///
/// The wire form (see `Serialize`) is plain JSON: null, boolean, number,
/// or string. Timestamps travel as RFC 3339 strings, which is also exactly
/// what the TEXT timestamp columns store.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// NULL-or-integer helper for `Option<Option<i64>>` patch fields.
    pub fn nullable_int(value: Option<i64>) -> Self {
        value.map(SqlValue::Int).unwrap_or(SqlValue::Null)
    }

    /// NULL-or-text helper for `Option<Option<String>>` patch fields.
    pub fn nullable_text(value: Option<String>) -> Self {
        value.map(SqlValue::Text).unwrap_or(SqlValue::Null)
    }

    /// Encodes an embedded document into its TEXT-column form.
    pub fn encoded_json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(text) => SqlValue::Text(text),
            Err(_) => SqlValue::Null,
        }
    }
}

impl Serialize for SqlValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SqlValue::Null => serializer.serialize_none(),
            SqlValue::Bool(v) => serializer.serialize_bool(*v),
            SqlValue::Int(v) => serializer.serialize_i64(*v),
            SqlValue::Text(v) => serializer.serialize_str(v),
            SqlValue::Timestamp(v) => serializer.serialize_str(&v.to_rfc3339()),
        }
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<DateTime<Utc>> for SqlValue {
    fn from(value: DateTime<Utc>) -> Self {
        SqlValue::Timestamp(value)
    }
}

// =============================================================================
// Statements
// =============================================================================

/// A rendered statement: SQL text plus its positional parameters.
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// Incremental statement builder that keeps placeholders and parameters in
/// lockstep.
struct StatementBuilder {
    sql: String,
    params: Vec<SqlValue>,
}

impl StatementBuilder {
    fn new(prefix: &str) -> Self {
        StatementBuilder {
            sql: prefix.to_string(),
            params: Vec::new(),
        }
    }

    /// Pushes a parameter and returns its freshly minted placeholder.
    fn bind(&mut self, value: SqlValue) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    fn push(&mut self, fragment: &str) {
        self.sql.push_str(fragment);
    }

    fn finish(self) -> Statement {
        Statement {
            sql: self.sql,
            params: self.params,
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Renders a command into its SQL statement.
pub fn render(command: &Command) -> Statement {
    match command {
        Command::Product(cmd) => render_product(cmd),
        Command::Category(cmd) => render_category(cmd),
        Command::Order(cmd) => render_order(cmd),
        Command::Customer(cmd) => render_customer(cmd),
        Command::Banner(cmd) => render_banner(cmd),
    }
}

fn render_product(cmd: &ProductCommand) -> Statement {
    match cmd {
        ProductCommand::List(query) => {
            let mut b = StatementBuilder::new("SELECT * FROM products");
            let status = b.bind(SqlValue::Text(query.status.to_string()));
            b.push(&format!(" WHERE status = {}", status));
            if let Some(category) = &query.category {
                let p = b.bind(SqlValue::Text(category.clone()));
                b.push(&format!(" AND category = {}", p));
            }
            if let Some(on_sale) = query.on_sale {
                let p = b.bind(SqlValue::Bool(on_sale));
                b.push(&format!(" AND is_on_sale = {}", p));
            }
            if let Some(is_new) = query.is_new {
                let p = b.bind(SqlValue::Bool(is_new));
                b.push(&format!(" AND is_new = {}", p));
            }
            if let Some(limit) = query.limit {
                let p = b.bind(SqlValue::Int(i64::from(limit)));
                b.push(&format!(" LIMIT {}", p));
            }
            b.finish()
        }
        ProductCommand::Get { id } => get_statement("products", id),
        ProductCommand::GetMany { ids } => {
            let mut b = StatementBuilder::new("SELECT * FROM products WHERE id IN (");
            push_id_list(&mut b, ids);
            b.push(")");
            b.finish()
        }
        ProductCommand::ListNewest => Statement {
            sql: "SELECT * FROM products ORDER BY created_at DESC".to_string(),
            params: Vec::new(),
        },
        ProductCommand::Insert(row) => insert_statement("products", product_values(row)),
        ProductCommand::Update { id, patch } => {
            update_statement("products", patch.assignments(), id)
        }
        ProductCommand::Delete { id } => delete_statement("products", id),
        ProductCommand::DeleteMany { ids } => {
            let mut b = StatementBuilder::new("DELETE FROM products WHERE id IN (");
            push_id_list(&mut b, ids);
            b.push(") RETURNING *");
            b.finish()
        }
    }
}

fn render_category(cmd: &CategoryCommand) -> Statement {
    match cmd {
        CategoryCommand::List { active } => {
            let mut b = StatementBuilder::new("SELECT * FROM categories");
            if let Some(active) = active {
                let p = b.bind(SqlValue::Bool(*active));
                b.push(&format!(" WHERE is_active = {}", p));
            }
            b.push(" ORDER BY display_order");
            b.finish()
        }
        CategoryCommand::Get { id } => get_statement("categories", id),
        CategoryCommand::GetBySlug { slug } => {
            let mut b = StatementBuilder::new("SELECT * FROM categories WHERE slug = ");
            let p = b.bind(SqlValue::Text(slug.clone()));
            b.push(&p);
            b.finish()
        }
        CategoryCommand::NameOf { id } => {
            let mut b =
                StatementBuilder::new("SELECT name_sr, name_en FROM categories WHERE id = ");
            let p = b.bind(SqlValue::Text(id.clone()));
            b.push(&p);
            b.finish()
        }
        CategoryCommand::Insert(row) => insert_statement("categories", category_values(row)),
        CategoryCommand::Update { id, patch } => {
            update_statement("categories", patch.assignments(), id)
        }
        CategoryCommand::DetachChildren { parent_id } => {
            let mut b = StatementBuilder::new("UPDATE categories SET parent_id = NULL");
            let stamp = b.bind(SqlValue::Timestamp(Utc::now()));
            b.push(&format!(", updated_at = {}", stamp));
            let parent = b.bind(SqlValue::Text(parent_id.clone()));
            b.push(&format!(" WHERE parent_id = {} RETURNING *", parent));
            b.finish()
        }
        CategoryCommand::Delete { id } => delete_statement("categories", id),
    }
}

fn render_order(cmd: &OrderCommand) -> Statement {
    match cmd {
        OrderCommand::List => Statement {
            sql: "SELECT * FROM orders ORDER BY created_at DESC".to_string(),
            params: Vec::new(),
        },
        OrderCommand::Get { id } => get_statement("orders", id),
        OrderCommand::Insert(row) => insert_statement("orders", order_values(row)),
        OrderCommand::SetStatus { id, status } => update_statement(
            "orders",
            vec![("status", SqlValue::Text(status.to_string()))],
            id,
        ),
        OrderCommand::SetPaymentStatus { id, status } => update_statement(
            "orders",
            vec![("payment_status", SqlValue::Text(status.to_string()))],
            id,
        ),
        OrderCommand::SetStatusMany { ids, status } => {
            let mut b = StatementBuilder::new("UPDATE orders SET status = ");
            let p = b.bind(SqlValue::Text(status.to_string()));
            b.push(&p);
            let stamp = b.bind(SqlValue::Timestamp(Utc::now()));
            b.push(&format!(", updated_at = {}", stamp));
            b.push(" WHERE id IN (");
            push_id_list(&mut b, ids);
            b.push(") RETURNING *");
            b.finish()
        }
    }
}

fn render_customer(cmd: &CustomerCommand) -> Statement {
    match cmd {
        CustomerCommand::List => Statement {
            sql: "SELECT * FROM customers ORDER BY created_at DESC".to_string(),
            params: Vec::new(),
        },
        CustomerCommand::Get { id } => get_statement("customers", id),
        CustomerCommand::Insert(row) => insert_statement("customers", customer_values(row)),
        CustomerCommand::Update { id, patch } => {
            update_statement("customers", patch.assignments(), id)
        }
        CustomerCommand::Delete { id } => delete_statement("customers", id),
    }
}

fn render_banner(cmd: &BannerCommand) -> Statement {
    match cmd {
        BannerCommand::List {
            position,
            only_active,
        } => {
            let mut b = StatementBuilder::new("SELECT * FROM banners");
            let mut clauses: Vec<String> = Vec::new();
            if *only_active {
                let p = b.bind(SqlValue::Bool(true));
                clauses.push(format!("is_active = {}", p));
            }
            if let Some(position) = position {
                let p = b.bind(SqlValue::Text(position.to_string()));
                clauses.push(format!("position = {}", p));
            }
            if !clauses.is_empty() {
                b.push(&format!(" WHERE {}", clauses.join(" AND ")));
            }
            b.push(" ORDER BY display_order");
            b.finish()
        }
        BannerCommand::Get { id } => get_statement("banners", id),
        BannerCommand::Insert(row) => insert_statement("banners", banner_values(row)),
        BannerCommand::Update { id, patch } => {
            update_statement("banners", patch.assignments(), id)
        }
        BannerCommand::Delete { id } => delete_statement("banners", id),
    }
}

// =============================================================================
// Shared Statement Shapes
// =============================================================================

fn get_statement(table: &str, id: &str) -> Statement {
    let mut b = StatementBuilder::new(&format!("SELECT * FROM {} WHERE id = ", table));
    let p = b.bind(SqlValue::Text(id.to_string()));
    b.push(&p);
    b.finish()
}

fn delete_statement(table: &str, id: &str) -> Statement {
    let mut b = StatementBuilder::new(&format!("DELETE FROM {} WHERE id = ", table));
    let p = b.bind(SqlValue::Text(id.to_string()));
    b.push(&p);
    b.push(" RETURNING *");
    b.finish()
}

fn insert_statement(table: &str, values: Vec<(&'static str, SqlValue)>) -> Statement {
    let mut b = StatementBuilder::new(&format!("INSERT INTO {} (", table));
    let columns: Vec<&str> = values.iter().map(|(col, _)| *col).collect();
    b.push(&columns.join(", "));
    b.push(") VALUES (");
    let placeholders: Vec<String> = values
        .into_iter()
        .map(|(_, value)| b.bind(value))
        .collect();
    b.push(&placeholders.join(", "));
    b.push(") RETURNING *");
    b.finish()
}

/// Builds `UPDATE t SET ... WHERE id = $n RETURNING *`.
///
/// The update-timestamp assignment is always appended, and the id is always
/// the final positional parameter. An empty assignment list still stamps
/// `updated_at` - that is what makes an empty patch an "idempotent touch".
fn update_statement(
    table: &str,
    assignments: Vec<(&'static str, SqlValue)>,
    id: &str,
) -> Statement {
    let mut b = StatementBuilder::new(&format!("UPDATE {} SET ", table));
    let mut fragments: Vec<String> = Vec::new();
    for (column, value) in assignments {
        let p = b.bind(value);
        fragments.push(format!("{} = {}", column, p));
    }
    let stamp = b.bind(SqlValue::Timestamp(Utc::now()));
    fragments.push(format!("updated_at = {}", stamp));
    b.push(&fragments.join(", "));
    let id_param = b.bind(SqlValue::Text(id.to_string()));
    b.push(&format!(" WHERE id = {} RETURNING *", id_param));
    b.finish()
}

/// Pushes an IN-list of placeholders sized to the id array. An empty array
/// renders a single NULL so the statement stays valid and matches nothing
/// (callers short-circuit empty bulk operations before getting here).
fn push_id_list(b: &mut StatementBuilder, ids: &[String]) {
    if ids.is_empty() {
        b.push("NULL");
        return;
    }
    let placeholders: Vec<String> = ids
        .iter()
        .map(|id| b.bind(SqlValue::Text(id.clone())))
        .collect();
    b.push(&placeholders.join(", "));
}

// =============================================================================
// Row Column Lists
// =============================================================================
// Insert column order is declaration order in rows.rs; each list is written
// once and only here.

fn product_values(row: &ProductRow) -> Vec<(&'static str, SqlValue)> {
    vec![
        ("id", SqlValue::Text(row.id.clone())),
        ("title_sr", SqlValue::Text(row.title_sr.clone())),
        ("title_en", SqlValue::Text(row.title_en.clone())),
        ("price_cents", SqlValue::Int(row.price_cents)),
        ("old_price_cents", SqlValue::nullable_int(row.old_price_cents)),
        ("category", SqlValue::nullable_text(row.category.clone())),
        ("stock", SqlValue::Int(row.stock)),
        ("status", SqlValue::Text(row.status.to_string())),
        ("is_new", SqlValue::Bool(row.is_new)),
        ("is_on_sale", SqlValue::Bool(row.is_on_sale)),
        ("description_sr", SqlValue::Text(row.description_sr.clone())),
        ("description_en", SqlValue::Text(row.description_en.clone())),
        ("image_url", SqlValue::nullable_text(row.image_url.clone())),
        ("created_at", SqlValue::Timestamp(row.created_at)),
        ("updated_at", SqlValue::Timestamp(row.updated_at)),
    ]
}

fn category_values(row: &CategoryRow) -> Vec<(&'static str, SqlValue)> {
    vec![
        ("id", SqlValue::Text(row.id.clone())),
        ("slug", SqlValue::Text(row.slug.clone())),
        ("name_sr", SqlValue::Text(row.name_sr.clone())),
        ("name_en", SqlValue::Text(row.name_en.clone())),
        ("description_sr", SqlValue::Text(row.description_sr.clone())),
        ("description_en", SqlValue::Text(row.description_en.clone())),
        ("parent_id", SqlValue::nullable_text(row.parent_id.clone())),
        ("is_active", SqlValue::Bool(row.is_active)),
        ("display_order", SqlValue::Int(row.display_order)),
        ("created_at", SqlValue::Timestamp(row.created_at)),
        ("updated_at", SqlValue::Timestamp(row.updated_at)),
    ]
}

fn order_values(row: &OrderRow) -> Vec<(&'static str, SqlValue)> {
    vec![
        ("id", SqlValue::Text(row.id.clone())),
        ("customer_id", SqlValue::nullable_text(row.customer_id.clone())),
        ("customer_name", SqlValue::Text(row.customer_name.clone())),
        ("customer_email", SqlValue::Text(row.customer_email.clone())),
        ("customer_phone", SqlValue::Text(row.customer_phone.clone())),
        ("shipping_address", SqlValue::encoded_json(&row.shipping_address)),
        ("items", SqlValue::encoded_json(&row.items)),
        ("total_cents", SqlValue::Int(row.total_cents)),
        ("status", SqlValue::Text(row.status.to_string())),
        ("payment_method", SqlValue::Text(row.payment_method.clone())),
        ("payment_status", SqlValue::Text(row.payment_status.to_string())),
        ("notes", SqlValue::nullable_text(row.notes.clone())),
        ("created_at", SqlValue::Timestamp(row.created_at)),
        ("updated_at", SqlValue::Timestamp(row.updated_at)),
    ]
}

fn customer_values(row: &CustomerRow) -> Vec<(&'static str, SqlValue)> {
    let address = match &row.address {
        Some(address) => SqlValue::encoded_json(address),
        None => SqlValue::Null,
    };
    vec![
        ("id", SqlValue::Text(row.id.clone())),
        ("first_name", SqlValue::Text(row.first_name.clone())),
        ("last_name", SqlValue::Text(row.last_name.clone())),
        ("email", SqlValue::Text(row.email.clone())),
        ("phone", SqlValue::Text(row.phone.clone())),
        ("address", address),
        ("created_at", SqlValue::Timestamp(row.created_at)),
        ("updated_at", SqlValue::Timestamp(row.updated_at)),
    ]
}

fn banner_values(row: &BannerRow) -> Vec<(&'static str, SqlValue)> {
    vec![
        ("id", SqlValue::Text(row.id.clone())),
        ("title_sr", SqlValue::Text(row.title_sr.clone())),
        ("title_en", SqlValue::Text(row.title_en.clone())),
        ("description_sr", SqlValue::Text(row.description_sr.clone())),
        ("description_en", SqlValue::Text(row.description_en.clone())),
        ("image_url", SqlValue::nullable_text(row.image_url.clone())),
        ("target_url", SqlValue::nullable_text(row.target_url.clone())),
        ("is_active", SqlValue::Bool(row.is_active)),
        ("position", SqlValue::Text(row.position.to_string())),
        ("display_order", SqlValue::Int(row.display_order)),
        ("discount_percent", SqlValue::nullable_int(row.discount_percent)),
        ("created_at", SqlValue::Timestamp(row.created_at)),
        ("updated_at", SqlValue::Timestamp(row.updated_at)),
    ]
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ProductQuery;
    use crate::rows::ProductPatch;
    use oprema_core::ProductStatus;

    #[test]
    fn test_product_list_predicates_in_order() {
        let query = ProductQuery {
            status: ProductStatus::Active,
            category: Some("maske".into()),
            on_sale: Some(true),
            is_new: Some(false),
            limit: Some(8),
        };
        let stmt = render(&Command::Product(ProductCommand::List(query)));

        assert_eq!(
            stmt.sql,
            "SELECT * FROM products WHERE status = $1 AND category = $2 \
             AND is_on_sale = $3 AND is_new = $4 LIMIT $5"
        );
        assert_eq!(stmt.params.len(), 5);
        assert_eq!(stmt.params[0], SqlValue::Text("active".into()));
        assert_eq!(stmt.params[4], SqlValue::Int(8));
    }

    #[test]
    fn test_empty_patch_still_stamps_updated_at() {
        let stmt = render(&Command::Product(ProductCommand::Update {
            id: "p-1".into(),
            patch: ProductPatch::default(),
        }));

        assert_eq!(
            stmt.sql,
            "UPDATE products SET updated_at = $1 WHERE id = $2 RETURNING *"
        );
        assert_eq!(stmt.params.len(), 2);
        assert_eq!(stmt.params[1], SqlValue::Text("p-1".into()));
    }

    #[test]
    fn test_update_id_is_final_parameter() {
        let patch = ProductPatch {
            price_cents: Some(999),
            old_price_cents: Some(None),
            ..Default::default()
        };
        let stmt = render(&Command::Product(ProductCommand::Update {
            id: "p-9".into(),
            patch,
        }));

        assert_eq!(
            stmt.sql,
            "UPDATE products SET price_cents = $1, old_price_cents = $2, \
             updated_at = $3 WHERE id = $4 RETURNING *"
        );
        assert_eq!(stmt.params[1], SqlValue::Null);
        assert_eq!(*stmt.params.last().unwrap(), SqlValue::Text("p-9".into()));
    }

    #[test]
    fn test_in_list_sized_to_ids() {
        let stmt = render(&Command::Product(ProductCommand::DeleteMany {
            ids: vec!["a".into(), "b".into(), "c".into()],
        }));
        assert_eq!(
            stmt.sql,
            "DELETE FROM products WHERE id IN ($1, $2, $3) RETURNING *"
        );
        assert_eq!(stmt.params.len(), 3);
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let stmt = render(&Command::Product(ProductCommand::GetMany { ids: vec![] }));
        assert_eq!(stmt.sql, "SELECT * FROM products WHERE id IN (NULL)");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_detach_children_statement() {
        let stmt = render(&Command::Category(CategoryCommand::DetachChildren {
            parent_id: "c-1".into(),
        }));
        assert_eq!(
            stmt.sql,
            "UPDATE categories SET parent_id = NULL, updated_at = $1 \
             WHERE parent_id = $2 RETURNING *"
        );
    }

    #[test]
    fn test_insert_columns_match_params() {
        let row = ProductRow {
            id: "p-1".into(),
            title_sr: "Maska".into(),
            title_en: "Case".into(),
            price_cents: 1500,
            old_price_cents: None,
            category: Some("maske".into()),
            stock: 3,
            status: ProductStatus::Active,
            is_new: true,
            is_on_sale: false,
            description_sr: String::new(),
            description_en: String::new(),
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let stmt = render(&Command::Product(ProductCommand::Insert(Box::new(row))));

        let columns = stmt.sql.matches(',').count();
        // 15 columns -> 14 commas in the column list and 14 in VALUES.
        assert_eq!(columns, 28);
        assert_eq!(stmt.params.len(), 15);
        assert!(stmt.sql.ends_with("RETURNING *"));
    }

    #[test]
    fn test_wire_serialization_of_params() {
        let params = vec![
            SqlValue::Null,
            SqlValue::Bool(true),
            SqlValue::Int(42),
            SqlValue::Text("maske".into()),
        ];
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, "[null,true,42,\"maske\"]");
    }
}
