//! # Batch Commands
//!
//! Received lots of stock. Each write moves the product's stock:
//!
//! ```text
//! create_batch   stock += quantity
//! update_batch   stock += (new remaining − old remaining), floored at 0
//! delete_batch   stock −= remaining, floored at 0
//! ```
//!
//! Sales never touch batches, so the sum of remaining quantities and the
//! product's stock can drift apart.

use tracing::{debug, info};

use kaya_core::validation::{validate_batch, validate_remaining};
use kaya_core::{Batch, BatchUpdate, LocalId, NewBatch, ValidationError};
use kaya_db::Database;

use crate::error::{ApiError, ApiResult};

/// Batches, soonest expiry first. Optionally limited to one product.
pub async fn list_batches(db: &Database, product_id: Option<LocalId>) -> ApiResult<Vec<Batch>> {
    debug!(product_id = ?product_id, "list_batches command");

    let batches = match product_id {
        Some(id) => db.batches().list_for_product(id).await?,
        None => db.batches().list().await?,
    };
    Ok(batches)
}

pub async fn create_batch(db: &Database, new: NewBatch) -> ApiResult<Batch> {
    debug!(product_id = %new.product_id, batch_number = %new.batch_number, "create_batch command");

    validate_batch(&new)?;
    let batch = db.batches().insert(&new).await?;

    info!(
        batch_id = %batch.id,
        product_id = %batch.product_id,
        quantity = batch.quantity,
        "Batch received"
    );
    Ok(batch)
}

/// Applies the fields present in `update`. The merged quantities are
/// checked against each other before the write.
pub async fn update_batch(db: &Database, id: LocalId, update: BatchUpdate) -> ApiResult<Batch> {
    debug!(batch_id = %id, "update_batch command");

    let current = db
        .batches()
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Batch", id))?;

    if let Some(number) = &update.batch_number {
        if number.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "batch number".to_string(),
            }
            .into());
        }
    }
    if let Some(cost) = update.cost_price {
        if cost.is_negative() {
            return Err(ValidationError::Negative {
                field: "cost price".to_string(),
            }
            .into());
        }
    }

    let quantity = update.quantity.unwrap_or(current.quantity);
    let remaining = update
        .remaining_quantity
        .unwrap_or(current.remaining_quantity);
    validate_remaining(remaining, quantity)?;

    Ok(db.batches().update(id, &update).await?)
}

pub async fn delete_batch(db: &Database, id: LocalId) -> ApiResult<()> {
    debug!(batch_id = %id, "delete_batch command");
    db.batches().delete(id).await?;
    info!(batch_id = %id, "Batch deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::tests::{product_id, test_state};
    use crate::state::AppState;
    use kaya_core::Money;

    fn receipt(product_id: LocalId, quantity: i64) -> NewBatch {
        NewBatch {
            product_id,
            variant_id: None,
            batch_number: "B-001".into(),
            quantity,
            remaining_quantity: None,
            cost_price: Money::from_major(6),
            expiry_date: None,
            manufacturing_date: None,
            supplier: Some("Accra Bottlers".into()),
            notes: None,
        }
    }

    async fn stock(state: &AppState, id: LocalId) -> i64 {
        state.db.products().get(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_batch_lifecycle_moves_stock() {
        let state = test_state().await;
        let coke = product_id(&state, "2002").await;

        let batch = create_batch(&state.db, receipt(coke, 24)).await.unwrap();
        assert_eq!(batch.remaining_quantity, 24);
        assert_eq!(stock(&state, coke).await, 124);

        update_batch(
            &state.db,
            batch.id,
            BatchUpdate {
                remaining_quantity: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(stock(&state, coke).await, 110);

        delete_batch(&state.db, batch.id).await.unwrap();
        assert_eq!(stock(&state, coke).await, 100);
        assert!(list_batches(&state.db, Some(coke)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stock_floors_at_zero() {
        let state = test_state().await;
        let banku = product_id(&state, "1003").await;
        let batch = create_batch(&state.db, receipt(banku, 40)).await.unwrap();

        state
            .db
            .products()
            .update(
                banku,
                &kaya_core::ProductUpdate {
                    stock: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        delete_batch(&state.db, batch.id).await.unwrap();
        assert_eq!(stock(&state, banku).await, 0);
    }

    #[tokio::test]
    async fn test_remaining_cannot_exceed_quantity() {
        let state = test_state().await;
        let water = product_id(&state, "2004").await;

        let err = create_batch(
            &state.db,
            NewBatch {
                remaining_quantity: Some(30),
                ..receipt(water, 20)
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let batch = create_batch(&state.db, receipt(water, 20)).await.unwrap();
        let err = update_batch(
            &state.db,
            batch.id,
            BatchUpdate {
                quantity: Some(10),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(stock(&state, water).await, 520);
    }

    #[tokio::test]
    async fn test_unknown_product_or_batch() {
        let state = test_state().await;

        let err = create_batch(&state.db, receipt(9999, 5)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = update_batch(&state.db, 9999, BatchUpdate::default())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
