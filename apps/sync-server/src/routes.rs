//! Sync routes.
//!
//! Bodies are taken as raw bytes, whatever the content type, so a missing
//! header, malformed JSON or a non-array body all get the
//! `{"error": "Expected array of <kind>"}` reply.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::info;

use kaya_sync::protocol::{
    CustomerPayload, OrderPayload, ProductPayload, StatusResponse, SyncKind, SyncResponse,
};

use crate::db::SyncStore;
use crate::error::{ServerError, ServerResult};

pub fn router() -> Router<SyncStore> {
    Router::new()
        .route("/api/sync/products", post(sync_products))
        .route("/api/sync/orders", post(sync_orders))
        .route("/api/sync/customers", post(sync_customers))
        .route("/api/sync/status", get(sync_status))
}

/// Decodes `body` as a JSON array of `T`.
fn parse_array<T: DeserializeOwned>(kind: SyncKind, body: &[u8]) -> ServerResult<Vec<T>> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value @ Value::Array(_)) => value,
        _ => return Err(ServerError::BadRequest(kind.expected_array_message())),
    };
    serde_json::from_value(value)
        .map_err(|e| ServerError::BadRequest(format!("Invalid {}: {}", kind, e)))
}

pub async fn sync_products(
    State(store): State<SyncStore>,
    body: Bytes,
) -> ServerResult<Json<SyncResponse>> {
    let products: Vec<ProductPayload> = parse_array(SyncKind::Products, &body)?;
    let response = store.upsert_products(&products).await?;
    info!(received = products.len(), synced = response.synced, "Products synced");
    Ok(Json(response))
}

pub async fn sync_orders(
    State(store): State<SyncStore>,
    body: Bytes,
) -> ServerResult<Json<SyncResponse>> {
    let orders: Vec<OrderPayload> = parse_array(SyncKind::Orders, &body)?;
    let response = store.insert_orders(&orders).await?;
    info!(received = orders.len(), synced = response.synced, "Orders synced");
    Ok(Json(response))
}

pub async fn sync_customers(
    State(store): State<SyncStore>,
    body: Bytes,
) -> ServerResult<Json<SyncResponse>> {
    let customers: Vec<CustomerPayload> = parse_array(SyncKind::Customers, &body)?;
    let response = store.upsert_customers(&customers).await?;
    info!(received = customers.len(), synced = response.synced, "Customers synced");
    Ok(Json(response))
}

pub async fn sync_status(State(store): State<SyncStore>) -> ServerResult<Json<StatusResponse>> {
    Ok(Json(store.status().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;
    use serde_json::json;
    use std::time::Duration;
    use tower::ServiceExt;

    use kaya_sync::protocol::SyncAction;
    use kaya_sync::{SyncClient, SyncTransport};

    fn body(value: Value) -> Bytes {
        Bytes::from(value.to_string())
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn order_json(client_id: i64) -> Value {
        json!({
            "clientId": client_id,
            "items": [{"productId": 1, "name": "Waakye Special", "price": 35, "quantity": 2}],
            "subtotal": 70,
            "tax": 10.5,
            "taxRuleName": "VAT",
            "taxRate": 0.15,
            "discount": 0,
            "discountType": "flat",
            "total": 80.5,
            "status": "completed",
            "paymentMethods": [{"method": "cash", "amount": 80.5}],
            "createdAt": "2026-03-01T10:00:00Z"
        })
    }

    fn product_json(client_id: i64, price: f64) -> Value {
        json!({
            "clientId": client_id,
            "name": "Sobolo (500ml)",
            "price": price,
            "category": "Drinks",
            "stock": 100,
            "lowStockThreshold": 20,
            "barcode": "2001",
            "isActive": true,
            "createdAt": "2026-03-01T10:00:00Z",
            "updatedAt": "2026-03-01T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_orders_insert_if_absent() {
        let store = SyncStore::in_memory().await.unwrap();

        let Json(first) = sync_orders(State(store.clone()), body(json!([order_json(1)])))
            .await
            .unwrap();
        assert_eq!(first.synced, 1);
        assert_eq!(first.results[0].action, SyncAction::Created);

        let Json(second) = sync_orders(
            State(store.clone()),
            body(json!([order_json(1), order_json(2)])),
        )
        .await
        .unwrap();
        assert_eq!(second.synced, 1);
        assert_eq!(second.results[0].action, SyncAction::Exists);
        assert_eq!(second.results[1].action, SyncAction::Created);

        let Json(status) = sync_status(State(store)).await.unwrap();
        assert_eq!(status.orders, 2);
    }

    #[tokio::test]
    async fn test_products_upsert() {
        let store = SyncStore::in_memory().await.unwrap();

        sync_products(State(store.clone()), body(json!([product_json(5, 10.0)])))
            .await
            .unwrap();
        let Json(response) =
            sync_products(State(store.clone()), body(json!([product_json(5, 12.5)])))
                .await
                .unwrap();

        assert_eq!(response.synced, 1);
        assert_eq!(response.results[0].action, SyncAction::Updated);

        let price: String =
            sqlx::query_scalar("SELECT price FROM synced_products WHERE client_id = 5")
                .fetch_one(store.pool())
                .await
                .unwrap();
        assert_eq!(price, "12.5");
    }

    #[tokio::test]
    async fn test_customers_upsert_counts_all() {
        let store = SyncStore::in_memory().await.unwrap();
        let customer = json!({"clientId": 3, "name": "Akua", "phone": "0201112222", "balance": 0});

        let Json(first) = sync_customers(State(store.clone()), body(json!([customer.clone()])))
            .await
            .unwrap();
        let Json(second) = sync_customers(State(store.clone()), body(json!([customer])))
            .await
            .unwrap();

        assert_eq!(first.results[0].action, SyncAction::Created);
        assert_eq!(second.results[0].action, SyncAction::Updated);
        assert_eq!(second.synced, 1);
    }

    #[tokio::test]
    async fn test_non_array_body_is_rejected() {
        let store = SyncStore::in_memory().await.unwrap();

        let err = sync_customers(State(store), body(json!({"clientId": 1})))
            .await
            .unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Expected array of customers"})
        );
    }

    #[tokio::test]
    async fn test_router_accepts_any_content_type() {
        let store = SyncStore::in_memory().await.unwrap();
        let app = router().with_state(store);

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sync/orders")
                    .body(Body::from("[]"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"synced": 0, "results": []})
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sync/orders")
                    .header("content-type", "application/json")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Expected array of orders"})
        );
    }

    #[tokio::test]
    async fn test_store_failure_is_json_500() {
        let store = SyncStore::in_memory().await.unwrap();
        sqlx::query("DROP TABLE synced_orders")
            .execute(store.pool())
            .await
            .unwrap();
        let app = router().with_state(store);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/sync/orders")
                    .header("content-type", "application/json")
                    .body(Body::from(json!([order_json(1)]).to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = json_body(response).await;
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("synced_orders"), "{message}");
    }

    #[tokio::test]
    async fn test_router_serves_status() {
        let store = SyncStore::in_memory().await.unwrap();
        let app = router().with_state(store);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/sync/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"products": 0, "orders": 0, "customers": 0})
        );
    }

    #[tokio::test]
    async fn test_terminal_client_against_live_server() {
        let store = SyncStore::in_memory().await.unwrap();
        let app = router().with_state(store);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client =
            SyncClient::new(&format!("http://{addr}"), Some(Duration::from_secs(5))).unwrap();
        let orders: Vec<OrderPayload> = serde_json::from_value(json!([order_json(9)])).unwrap();

        let response = client.push_orders(&orders).await.unwrap();
        assert_eq!(response.acknowledged_ids(), vec![9]);

        let status = client.status().await.unwrap();
        assert_eq!(status.orders, 1);
    }
}
