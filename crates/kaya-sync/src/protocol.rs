//! # Sync Wire Protocol
//!
//! JSON payloads exchanged with the sync server. Field names are camelCase
//! on the wire; every record carries its device-local id as `clientId`.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Sync Endpoints                                 │
//! │                                                                         │
//! │  POST /api/sync/products   [ProductPayload]  ──► upsert by clientId     │
//! │  POST /api/sync/orders     [OrderPayload]    ──► insert if absent       │
//! │  POST /api/sync/customers  [CustomerPayload] ──► upsert by clientId     │
//! │                                                                         │
//! │       ◄── { "synced": n, "results": [{ "clientId": 7,                   │
//! │                                         "action": "created" }] }        │
//! │                                                                         │
//! │  GET  /api/sync/status     ──► { "products": n, "orders": n,            │
//! │                                  "customers": n }                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! For orders `synced` counts only the `created` results. A body that is
//! not a JSON array is answered with 400 and `{"error": "Expected array of
//! <kind>"}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kaya_core::{
    Customer, DiscountType, LocalId, Money, Order, OrderItem, OrderStatus, PaymentSplit, Product,
    TaxRate,
};

/// Path prefix shared by every sync endpoint.
pub const SYNC_PATH: &str = "/api/sync";

// =============================================================================
// Sync Kind
// =============================================================================

/// The three record kinds that are pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    Products,
    Orders,
    Customers,
}

impl SyncKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncKind::Products => "products",
            SyncKind::Orders => "orders",
            SyncKind::Customers => "customers",
        }
    }

    /// Label used when a failure is reported in a [`SyncReport`](crate::SyncReport).
    pub fn label(&self) -> &'static str {
        match self {
            SyncKind::Products => "Products",
            SyncKind::Orders => "Orders",
            SyncKind::Customers => "Customers",
        }
    }

    /// `/api/sync/<kind>`
    pub fn path(&self) -> String {
        format!("{}/{}", SYNC_PATH, self.as_str())
    }

    /// Message sent back when the body is not an array.
    pub fn expected_array_message(&self) -> String {
        format!("Expected array of {}", self.as_str())
    }
}

impl std::fmt::Display for SyncKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Product Payload
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    pub client_id: LocalId,
    pub name: String,
    pub price: Money,
    pub category: String,
    pub stock: i64,
    pub low_stock_threshold: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Product> for ProductPayload {
    fn from(product: &Product) -> Self {
        ProductPayload {
            client_id: product.id,
            name: product.name.clone(),
            price: product.price,
            category: product.category.clone(),
            stock: product.stock,
            low_stock_threshold: product.low_stock_threshold,
            barcode: product.barcode.clone(),
            sku: product.sku.clone(),
            image: product.image.clone(),
            description: product.description.clone(),
            is_active: product.is_active,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

// =============================================================================
// Order Payload
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemPayload {
    pub product_id: LocalId,
    pub name: String,
    pub price: Money,
    pub quantity: i64,
    #[serde(default)]
    pub discount: Money,
}

impl From<&OrderItem> for OrderItemPayload {
    fn from(item: &OrderItem) -> Self {
        OrderItemPayload {
            product_id: item.product_id,
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
            discount: item.discount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayload {
    pub client_id: LocalId,
    pub items: Vec<OrderItemPayload>,
    pub subtotal: Money,
    pub tax: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rule_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_rate: Option<TaxRate>,
    pub discount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_type: Option<DiscountType>,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_methods: Vec<PaymentSplit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<LocalId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderPayload {
    fn from(order: &Order) -> Self {
        OrderPayload {
            client_id: order.id,
            items: order.items.iter().map(OrderItemPayload::from).collect(),
            subtotal: order.subtotal,
            tax: order.tax,
            tax_rule_name: order.tax_rule_name.clone(),
            tax_rate: order.tax_rate,
            discount: order.discount,
            discount_type: order.discount_type,
            total: order.total,
            status: order.status,
            payment_methods: order.payments.clone(),
            customer_id: order.customer_id,
            notes: order.notes.clone(),
            created_at: order.created_at,
        }
    }
}

// =============================================================================
// Customer Payload
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    pub client_id: LocalId,
    pub name: String,
    pub phone: String,
    pub balance: Money,
}

impl From<&Customer> for CustomerPayload {
    fn from(customer: &Customer) -> Self {
        CustomerPayload {
            client_id: customer.id,
            name: customer.name.clone(),
            phone: customer.phone.clone(),
            balance: customer.balance,
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// What the server did with one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncAction {
    Created,
    Updated,
    /// The order was already on the server; nothing was written.
    Exists,
}

impl SyncAction {
    /// True if an order result means the server now holds the order.
    pub fn is_acknowledged(&self) -> bool {
        matches!(self, SyncAction::Created | SyncAction::Exists)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResult {
    pub client_id: LocalId,
    pub action: SyncAction,
}

/// Response to a push.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SyncResponse {
    pub synced: u64,
    #[serde(default)]
    pub results: Vec<ItemResult>,
}

impl SyncResponse {
    /// Response for a category with nothing to push.
    pub fn empty() -> Self {
        SyncResponse::default()
    }

    /// Client ids whose order the server created or already had.
    pub fn acknowledged_ids(&self) -> Vec<LocalId> {
        self.results
            .iter()
            .filter(|r| r.action.is_acknowledged())
            .map(|r| r.client_id)
            .collect()
    }
}

/// Record counts held by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusResponse {
    pub products: i64,
    pub orders: i64,
    pub customers: i64,
}

/// Body of a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
