use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    /// Unit price in cents.
    pub price: i64,
    #[serde(default)]
    pub images: Vec<String>,
    pub category_id: Uuid,
    pub gender: String,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
    #[serde(default)]
    pub featured: bool,
}

fn default_in_stock() -> bool {
    true
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub images: Option<Vec<String>>,
    pub category_id: Option<Uuid>,
    pub gender: Option<String>,
    pub sizes: Option<Vec<String>>,
    pub materials: Option<Vec<String>>,
    pub in_stock: Option<bool>,
    pub featured: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}
