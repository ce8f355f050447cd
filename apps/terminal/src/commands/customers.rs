//! Customer directory commands.

use tracing::{debug, info};

use kaya_core::validation::validate_customer;
use kaya_core::{Customer, LocalId, NewCustomer};
use kaya_db::Database;

use crate::error::{ApiError, ApiResult};

pub async fn list_customers(db: &Database) -> ApiResult<Vec<Customer>> {
    debug!("list_customers command");
    Ok(db.customers().list().await?)
}

pub async fn get_customer(db: &Database, id: LocalId) -> ApiResult<Customer> {
    debug!(id = %id, "get_customer command");
    db.customers()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer", id))
}

pub async fn create_customer(db: &Database, new: NewCustomer) -> ApiResult<Customer> {
    debug!(name = %new.name, "create_customer command");
    validate_customer(&new)?;

    let customer = db.customers().insert(&new).await?;
    info!(id = %customer.id, "Customer created");
    Ok(customer)
}

pub async fn update_customer(db: &Database, id: LocalId, update: NewCustomer) -> ApiResult<Customer> {
    debug!(id = %id, "update_customer command");
    validate_customer(&update)?;
    Ok(db.customers().update(id, &update).await?)
}

/// Removes a customer. Past orders keep their customer id.
pub async fn delete_customer(db: &Database, id: LocalId) -> ApiResult<()> {
    debug!(id = %id, "delete_customer command");
    Ok(db.customers().delete(id).await?)
}
