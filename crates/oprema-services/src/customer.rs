//! # Customer Service
//!
//! Customer profiles: created at checkout (when the shopper opts to be
//! remembered) or by the admin, mutated by admin edits.

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use oprema_core::validation::{validate_email, validate_phone};
use oprema_core::{Address, Customer};
use oprema_store::{new_row_id, Command, CustomerCommand, CustomerPatch, CustomerRow, QueryRouter};

use crate::error::{ErrorCode, ServiceError, ServiceResult};
use crate::mapping::{customer_from_row, double_option, parse_first, parse_rows};

// =============================================================================
// Inputs
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub address: Option<Address>,
}

/// Partial customer update; `address: null` removes the saved address.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(deserialize_with = "double_option")]
    pub address: Option<Option<Address>>,
}

fn row_from_new(input: NewCustomer) -> CustomerRow {
    let now = Utc::now();
    CustomerRow {
        id: new_row_id(),
        first_name: input.first_name,
        last_name: input.last_name,
        email: input.email,
        phone: input.phone,
        address: input.address,
        created_at: now,
        updated_at: now,
    }
}

fn patch_from_update(update: CustomerUpdate) -> CustomerPatch {
    CustomerPatch {
        first_name: update.first_name,
        last_name: update.last_name,
        email: update.email,
        phone: update.phone,
        address: update.address,
    }
}

// =============================================================================
// Service
// =============================================================================

/// Customer use cases over the query router.
#[derive(Debug, Clone)]
pub struct CustomerService {
    router: QueryRouter,
}

impl CustomerService {
    pub fn new(router: QueryRouter) -> Self {
        CustomerService { router }
    }

    // -------------------------------------------------------------------------
    // Reads (degrade silently)
    // -------------------------------------------------------------------------

    pub async fn get_customers(&self) -> Vec<Customer> {
        let result: ServiceResult<Vec<Customer>> = async {
            let rows = self
                .router
                .execute(Command::Customer(CustomerCommand::List))
                .await?;
            Ok(parse_rows::<CustomerRow>(rows)?
                .into_iter()
                .map(customer_from_row)
                .collect())
        }
        .await;

        match result {
            Ok(customers) => customers,
            Err(err) => {
                warn!(error = %err, "get_customers failed, returning empty list");
                Vec::new()
            }
        }
    }

    pub async fn get_customer(&self, id: &str) -> Option<Customer> {
        let result: ServiceResult<Option<Customer>> = async {
            let rows = self
                .router
                .execute(Command::Customer(CustomerCommand::Get {
                    id: id.to_string(),
                }))
                .await?;
            Ok(parse_first::<CustomerRow>(rows)?.map(customer_from_row))
        }
        .await;

        match result {
            Ok(customer) => customer,
            Err(err) => {
                warn!(id = %id, error = %err, "get_customer failed");
                None
            }
        }
    }

    // -------------------------------------------------------------------------
    // Writes (surface errors)
    // -------------------------------------------------------------------------

    pub async fn create_customer(&self, input: NewCustomer) -> ServiceResult<Customer> {
        validate_email(&input.email)?;
        validate_phone(&input.phone)?;

        let row = row_from_new(input);
        info!(id = %row.id, "creating customer");

        let rows = self
            .router
            .execute(Command::Customer(CustomerCommand::Insert(Box::new(row))))
            .await?;
        let row = parse_first::<CustomerRow>(rows)?
            .ok_or_else(|| ServiceError::new(ErrorCode::Internal, "insert returned no row"))?;
        Ok(customer_from_row(row))
    }

    pub async fn update_customer(
        &self,
        id: &str,
        update: CustomerUpdate,
    ) -> ServiceResult<Customer> {
        if let Some(email) = &update.email {
            validate_email(email)?;
        }
        if let Some(phone) = &update.phone {
            validate_phone(phone)?;
        }

        let rows = self
            .router
            .execute(Command::Customer(CustomerCommand::Update {
                id: id.to_string(),
                patch: patch_from_update(update),
            }))
            .await?;
        let row = parse_first::<CustomerRow>(rows)?
            .ok_or_else(|| ServiceError::not_found("Customer", id))?;
        Ok(customer_from_row(row))
    }

    pub async fn delete_customer(&self, id: &str) -> ServiceResult<()> {
        let rows = self
            .router
            .execute(Command::Customer(CustomerCommand::Delete {
                id: id.to_string(),
            }))
            .await?;
        info!(id = %id, removed = rows.len(), "delete_customer");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use oprema_store::{DbConfig, DirectBackend, StorageHandle};

    async fn direct_service() -> CustomerService {
        let backend = DirectBackend::connect(DbConfig::in_memory()).await.unwrap();
        CustomerService::new(QueryRouter::with_backend(StorageHandle::Direct(backend)))
    }

    fn sample_customer() -> NewCustomer {
        NewCustomer {
            first_name: "Mira".into(),
            last_name: "Petrović".into(),
            email: "mira@example.com".into(),
            phone: "+381641234567".into(),
            address: Some(Address {
                street: "Knez Mihailova 1".into(),
                city: "Beograd".into(),
                postal_code: "11000".into(),
                country: "Srbija".into(),
            }),
        }
    }

    #[tokio::test]
    async fn test_create_and_fetch_round_trip() {
        let service = direct_service().await;

        let created = service.create_customer(sample_customer()).await.unwrap();
        assert_eq!(created.full_name(), "Mira Petrović");

        let fetched = service.get_customer(&created.id).await.unwrap();
        assert_eq!(fetched.email, "mira@example.com");
        assert_eq!(fetched.address.as_ref().unwrap().city, "Beograd");
    }

    #[tokio::test]
    async fn test_partial_update_keeps_untouched_fields() {
        let service = direct_service().await;
        let created = service.create_customer(sample_customer()).await.unwrap();

        let update: CustomerUpdate =
            serde_json::from_str(r#"{ "phone": "+381601112223" }"#).unwrap();
        let updated = service.update_customer(&created.id, update).await.unwrap();

        assert_eq!(updated.phone, "+381601112223");
        assert_eq!(updated.email, created.email);
        assert!(updated.address.is_some());
    }

    #[tokio::test]
    async fn test_explicit_null_clears_saved_address() {
        let service = direct_service().await;
        let created = service.create_customer(sample_customer()).await.unwrap();

        let update: CustomerUpdate = serde_json::from_str(r#"{ "address": null }"#).unwrap();
        let updated = service.update_customer(&created.id, update).await.unwrap();

        assert!(updated.address.is_none());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_email() {
        let service = direct_service().await;
        let mut input = sample_customer();
        input.email = "nije-mejl".into();

        let err = service.create_customer(input).await.unwrap_err();
        assert!(matches!(err.code, ErrorCode::ValidationError));
    }
}
