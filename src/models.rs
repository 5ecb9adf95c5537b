use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Order lifecycle states staff may move an order through. Orders are never
/// deleted, only transitioned.
pub const ORDER_STATUSES: [&str; 5] = ["pending", "preparing", "ready", "completed", "cancelled"];

#[derive(Debug, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Number of products referencing this category; computed on read.
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Unit price in cents.
    pub price: i64,
    pub images: Vec<String>,
    pub category_id: Uuid,
    pub gender: String,
    pub sizes: Vec<String>,
    pub materials: Vec<String>,
    pub in_stock: bool,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    /// Client-minted reference, e.g. `FAF-1719238123456-9C2F`. Unique.
    pub reference: String,
    pub customer_id: Uuid,
    pub payment_method: String,
    /// `tax` or `deposit`; fixed at creation, decides which amount fields apply.
    pub pricing_flow: String,
    pub subtotal: i64,
    pub tax: Option<i64>,
    pub deposit: Option<i64>,
    pub total: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub person_name: String,
    pub gender: String,
    pub age_group: String,
    pub occasion: String,
    /// Catalog design id as selected in the wizard (snapshot, not a FK).
    pub design_id: String,
    pub design_name: String,
    pub unit_price: i64,
    /// Sizing snapshot: standard label or full measurement set.
    pub sizing: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
