use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Customer, Order, OrderItem};

/// Customer contact block as submitted from the checkout form.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CustomerPayload {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 10))]
    pub phone: String,
    #[validate(length(min = 1))]
    pub address: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub state: String,
    #[validate(length(min = 1))]
    pub zip: String,
    pub notes: Option<String>,
}

/// One person's line of the order, snapshotted from the draft.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemPayload {
    pub person_name: String,
    pub gender: String,
    pub age_group: String,
    pub occasion: String,
    pub design_id: String,
    pub design_name: String,
    pub unit_price: i64,
    pub sizing: serde_json::Value,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Client-minted reference (`FAF-...`), unique per order.
    pub reference: String,
    pub customer: CustomerPayload,
    pub items: Vec<OrderItemPayload>,
    pub payment_method: String,
    /// `tax` or `deposit`.
    pub pricing_flow: String,
    pub subtotal: i64,
    pub tax: Option<i64>,
    pub deposit: Option<i64>,
    pub total: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCreated {
    pub order_id: Uuid,
    pub reference: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithDetails {
    pub order: Order,
    pub customer: Customer,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}
