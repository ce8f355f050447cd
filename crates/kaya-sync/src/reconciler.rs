//! # Sync Reconciler
//!
//! One pass pushes the three categories independently. A failure in one is
//! recorded and the others still run.
//!
//! ## Pass Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          sync_all()                                     │
//! │                                                                         │
//! │  products  ── list all ──────────────────► POST ──► report.products     │
//! │     │ (error ► "Products: <msg>")                                        │
//! │     ▼                                                                   │
//! │  orders    ── list_unsynced (no drafts) ─► POST ──► mark_synced(        │
//! │     │                                              created | exists)    │
//! │     │ (error ► "Orders: <msg>")                                          │
//! │     ▼                                                                   │
//! │  customers ── list all ──────────────────► POST ──► report.customers    │
//! │       (error ► "Customers: <msg>")                                       │
//! │                                                                         │
//! │  Empty category ──► no request, SyncResponse { synced: 0 }              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Orders that were sent but are missing from the results stay unsynced and
//! go out again next pass. The server answers `exists` for those it already
//! holds, so a retry never duplicates.

use std::future::Future;

use tracing::{debug, info, warn};

use kaya_db::Database;

use crate::error::SyncResult;
use crate::protocol::{
    CustomerPayload, OrderPayload, ProductPayload, SyncKind, SyncResponse,
};

// =============================================================================
// Transport Seam
// =============================================================================

/// The network half of a pass. [`SyncClient`](crate::SyncClient) is the
/// production implementation.
pub trait SyncTransport: Send + Sync + 'static {
    fn push_products(
        &self,
        products: &[ProductPayload],
    ) -> impl Future<Output = SyncResult<SyncResponse>> + Send;

    fn push_orders(
        &self,
        orders: &[OrderPayload],
    ) -> impl Future<Output = SyncResult<SyncResponse>> + Send;

    fn push_customers(
        &self,
        customers: &[CustomerPayload],
    ) -> impl Future<Output = SyncResult<SyncResponse>> + Send;
}

// =============================================================================
// Sync Report
// =============================================================================

/// Outcome of one pass. A category is `None` when it failed; its message is
/// in `errors` as `"<Category>: <message>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub products: Option<SyncResponse>,
    pub orders: Option<SyncResponse>,
    pub customers: Option<SyncResponse>,
    pub errors: Vec<String>,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records pushed across all categories.
    pub fn total_synced(&self) -> u64 {
        [&self.products, &self.orders, &self.customers]
            .into_iter()
            .flatten()
            .map(|r| r.synced)
            .sum()
    }

    fn record(&mut self, kind: SyncKind, outcome: SyncResult<SyncResponse>) {
        match outcome {
            Ok(response) => {
                let slot = match kind {
                    SyncKind::Products => &mut self.products,
                    SyncKind::Orders => &mut self.orders,
                    SyncKind::Customers => &mut self.customers,
                };
                *slot = Some(response);
            }
            Err(e) => {
                warn!(kind = %kind, error = %e, "Sync category failed");
                self.errors.push(format!("{}: {}", kind.label(), e));
            }
        }
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// Reads the sync set from the ledger and pushes it through a transport.
pub struct SyncReconciler<T> {
    db: Database,
    transport: T,
}

impl<T: SyncTransport> SyncReconciler<T> {
    pub fn new(db: Database, transport: T) -> Self {
        SyncReconciler { db, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Pushes every product, active or not.
    pub async fn sync_products(&self) -> SyncResult<SyncResponse> {
        let products = self.db.products().list().await?;
        if products.is_empty() {
            return Ok(SyncResponse::empty());
        }

        let payload: Vec<ProductPayload> = products.iter().map(ProductPayload::from).collect();
        self.transport.push_products(&payload).await
    }

    /// Pushes unsynced, non-draft orders and marks the acknowledged ones.
    pub async fn sync_orders(&self) -> SyncResult<SyncResponse> {
        let orders = self.db.orders().list_unsynced().await?;
        if orders.is_empty() {
            return Ok(SyncResponse::empty());
        }

        let payload: Vec<OrderPayload> = orders.iter().map(OrderPayload::from).collect();
        let response = self.transport.push_orders(&payload).await?;

        let sent: Vec<_> = orders.iter().map(|o| o.id).collect();
        let acknowledged: Vec<_> = response
            .acknowledged_ids()
            .into_iter()
            .filter(|id| sent.contains(id))
            .collect();

        let marked = self.db.orders().mark_synced(&acknowledged).await?;
        debug!(sent = sent.len(), marked, "Orders acknowledged");

        Ok(response)
    }

    /// Pushes every customer.
    pub async fn sync_customers(&self) -> SyncResult<SyncResponse> {
        let customers = self.db.customers().list().await?;
        if customers.is_empty() {
            return Ok(SyncResponse::empty());
        }

        let payload: Vec<CustomerPayload> = customers.iter().map(CustomerPayload::from).collect();
        self.transport.push_customers(&payload).await
    }

    /// Runs the three categories in order, collecting failures.
    pub async fn sync_all(&self) -> SyncReport {
        let mut report = SyncReport::default();

        report.record(SyncKind::Products, self.sync_products().await);
        report.record(SyncKind::Orders, self.sync_orders().await);
        report.record(SyncKind::Customers, self.sync_customers().await);

        info!(
            synced = report.total_synced(),
            errors = report.errors.len(),
            "Sync pass finished"
        );
        report
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::protocol::{ItemResult, SyncAction};
    use chrono::Utc;
    use kaya_core::{
        CategoryRef, Money, NewCustomer, NewOrder, NewProduct, OrderItem, OrderStatus,
        PaymentMethod, PaymentSplit,
    };
    use kaya_db::DbConfig;
    use std::collections::{HashMap, HashSet};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory stand-in for the sync server: upserts products and
    /// customers, inserts orders only once.
    #[derive(Default)]
    pub(crate) struct FakeServer {
        pub products: Mutex<HashMap<i64, ProductPayload>>,
        pub orders: Mutex<HashMap<i64, OrderPayload>>,
        pub customers: Mutex<HashMap<i64, CustomerPayload>>,
        pub fail: Mutex<HashSet<SyncKind>>,
        pub requests: AtomicUsize,
    }

    impl FakeServer {
        pub fn failing(kind: SyncKind) -> Self {
            let server = FakeServer::default();
            server.fail.lock().unwrap().insert(kind);
            server
        }

        fn check(&self, kind: SyncKind) -> SyncResult<()> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            if self.fail.lock().unwrap().contains(&kind) {
                return Err(SyncError::ConnectionFailed("connection refused".into()));
            }
            Ok(())
        }
    }

    fn upsert<P: Clone>(
        store: &Mutex<HashMap<i64, P>>,
        records: &[P],
        id: impl Fn(&P) -> i64,
    ) -> SyncResponse {
        let mut store = store.lock().unwrap();
        let results: Vec<ItemResult> = records
            .iter()
            .map(|r| {
                let action = match store.insert(id(r), r.clone()) {
                    Some(_) => SyncAction::Updated,
                    None => SyncAction::Created,
                };
                ItemResult {
                    client_id: id(r),
                    action,
                }
            })
            .collect();
        SyncResponse {
            synced: results.len() as u64,
            results,
        }
    }

    impl SyncTransport for FakeServer {
        async fn push_products(&self, products: &[ProductPayload]) -> SyncResult<SyncResponse> {
            self.check(SyncKind::Products)?;
            Ok(upsert(&self.products, products, |p| p.client_id))
        }

        async fn push_orders(&self, orders: &[OrderPayload]) -> SyncResult<SyncResponse> {
            self.check(SyncKind::Orders)?;
            let mut store = self.orders.lock().unwrap();
            let results: Vec<ItemResult> = orders
                .iter()
                .map(|o| {
                    let action = if store.contains_key(&o.client_id) {
                        SyncAction::Exists
                    } else {
                        store.insert(o.client_id, o.clone());
                        SyncAction::Created
                    };
                    ItemResult {
                        client_id: o.client_id,
                        action,
                    }
                })
                .collect();
            let synced = results
                .iter()
                .filter(|r| r.action == SyncAction::Created)
                .count() as u64;
            Ok(SyncResponse { synced, results })
        }

        async fn push_customers(&self, customers: &[CustomerPayload]) -> SyncResult<SyncResponse> {
            self.check(SyncKind::Customers)?;
            Ok(upsert(&self.customers, customers, |c| c.client_id))
        }
    }

    pub(crate) fn sale(status: OrderStatus) -> NewOrder {
        NewOrder {
            items: vec![OrderItem {
                product_id: 1,
                name: "Waakye Special".into(),
                price: Money::from_major(35),
                quantity: 1,
                discount: Money::ZERO,
            }],
            subtotal: Money::from_major(35),
            tax: Money::ZERO,
            tax_rule_name: None,
            tax_rate: None,
            discount: Money::ZERO,
            discount_type: None,
            total: Money::from_major(35),
            status,
            payments: vec![PaymentSplit::new(PaymentMethod::Momo, Money::from_major(35))],
            customer_id: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_empty_ledger_makes_no_requests() {
        let reconciler = SyncReconciler::new(setup().await, FakeServer::default());

        let report = reconciler.sync_all().await;

        assert!(report.is_success());
        assert_eq!(report.orders, Some(SyncResponse::empty()));
        assert_eq!(reconciler.transport().requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_orders_marked_synced_and_drafts_kept_local() {
        let db = setup().await;
        let sold = db.orders().insert(&sale(OrderStatus::Completed)).await.unwrap();
        let draft = db.orders().insert(&sale(OrderStatus::Draft)).await.unwrap();

        let reconciler = SyncReconciler::new(db.clone(), FakeServer::default());
        let report = reconciler.sync_all().await;

        assert!(report.is_success());
        assert_eq!(report.orders.as_ref().map(|r| r.synced), Some(1));
        assert!(db.orders().get(sold.id).await.unwrap().unwrap().synced);
        assert!(!db.orders().get(draft.id).await.unwrap().unwrap().synced);

        let server = reconciler.transport();
        assert!(server.orders.lock().unwrap().contains_key(&sold.id));
        assert!(!server.orders.lock().unwrap().contains_key(&draft.id));
    }

    #[tokio::test]
    async fn test_retry_after_lost_ack_does_not_duplicate() {
        let db = setup().await;
        let sold = db.orders().insert(&sale(OrderStatus::Completed)).await.unwrap();

        // The server already holds the order but the device never saw the ack
        let server = FakeServer::default();
        server
            .orders
            .lock()
            .unwrap()
            .insert(sold.id, OrderPayload::from(&sold));

        let reconciler = SyncReconciler::new(db.clone(), server);
        let response = reconciler.sync_orders().await.unwrap();

        assert_eq!(response.synced, 0);
        assert_eq!(response.results[0].action, SyncAction::Exists);
        assert!(db.orders().get(sold.id).await.unwrap().unwrap().synced);
        assert_eq!(reconciler.transport().orders.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_category_does_not_block_others() {
        let db = setup().await;
        db.products()
            .insert(&NewProduct::new(
                "Alvaro",
                Money::from_major(10),
                CategoryRef::New {
                    name: "Drinks".into(),
                },
            ))
            .await
            .unwrap();
        let sold = db.orders().insert(&sale(OrderStatus::Refunded)).await.unwrap();
        db.customers()
            .insert(&NewCustomer {
                name: "Efua".into(),
                phone: "0200000000".into(),
                balance: Money::ZERO,
            })
            .await
            .unwrap();

        let reconciler =
            SyncReconciler::new(db.clone(), FakeServer::failing(SyncKind::Orders));
        let report = reconciler.sync_all().await;

        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("Orders: "));
        assert!(report.orders.is_none());
        assert_eq!(report.products.as_ref().map(|r| r.synced), Some(1));
        assert_eq!(report.customers.as_ref().map(|r| r.synced), Some(1));
        assert!(!db.orders().get(sold.id).await.unwrap().unwrap().synced);
    }

    #[tokio::test]
    async fn test_products_resent_in_full_each_pass() {
        let db = setup().await;
        db.products()
            .insert(&NewProduct::new(
                "Pure Water",
                Money::from_major(2),
                CategoryRef::New {
                    name: "Drinks".into(),
                },
            ))
            .await
            .unwrap();

        let reconciler = SyncReconciler::new(db, FakeServer::default());
        let first = reconciler.sync_products().await.unwrap();
        let second = reconciler.sync_products().await.unwrap();

        assert_eq!(first.results[0].action, SyncAction::Created);
        assert_eq!(second.results[0].action, SyncAction::Updated);
        assert_eq!(second.synced, 1);
    }
}
