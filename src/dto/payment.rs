use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PaymentLineItem {
    pub name: String,
    pub quantity: u32,
    /// Line amount in minor units.
    pub amount: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SquarePaymentRequest {
    /// One-time card token from the Square web SDK.
    pub source_id: String,
    /// Charge amount in the currency's minor units.
    pub amount: i64,
    pub order_reference: String,
    pub customer_email: String,
    /// Optional line detail used for the provider-side order record.
    #[serde(default)]
    pub line_items: Vec<PaymentLineItem>,
}

/// Declines come back as `success: false` with a retryable message; only
/// transport failures produce an error status.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentResult {
    pub success: bool,
    pub payment_id: Option<String>,
    pub status: Option<String>,
    pub error: Option<String>,
}
