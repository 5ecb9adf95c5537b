use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::payment::{PaymentResult, SquarePaymentRequest},
    error::AppResult,
    response::ApiResponse,
    services::payment_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/square", post(square_payment))
}

#[utoipa::path(
    post,
    path = "/api/payments/square",
    request_body = SquarePaymentRequest,
    responses(
        (status = 200, description = "Charge outcome; declines carry success=false", body = ApiResponse<PaymentResult>),
        (status = 400, description = "Missing token or non-positive amount"),
        (status = 500, description = "Payment gateway unreachable"),
    ),
    tag = "Payments"
)]
pub async fn square_payment(
    State(state): State<AppState>,
    Json(payload): Json<SquarePaymentRequest>,
) -> AppResult<Json<ApiResponse<PaymentResult>>> {
    let resp = payment_service::process_square_payment(&state, payload).await?;
    Ok(Json(resp))
}
