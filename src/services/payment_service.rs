use chrono::Utc;

use crate::{
    checkout::{CURRENCY, idempotency_key},
    dto::payment::{PaymentResult, SquarePaymentRequest},
    error::{AppError, AppResult},
    gateway::{ChargeOutcome, ChargeRequest, GatewayLineItem, GatewayOrderRequest},
    notify::{ConfirmationSummary, spawn_logged},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Charge sequence for one checkout submission. The provider-side order
/// record is best-effort; the charge alone decides the outcome. Declines
/// come back in the body so the client can let the user retry.
pub async fn process_square_payment(
    state: &AppState,
    payload: SquarePaymentRequest,
) -> AppResult<ApiResponse<PaymentResult>> {
    if payload.source_id.trim().is_empty() {
        return Err(AppError::BadRequest("Missing payment token".into()));
    }
    if payload.amount <= 0 {
        return Err(AppError::BadRequest("Amount must be positive".into()));
    }

    let order_req = GatewayOrderRequest {
        reference: payload.order_reference.clone(),
        customer_email: payload.customer_email.clone(),
        line_items: payload
            .line_items
            .iter()
            .map(|item| GatewayLineItem {
                name: item.name.clone(),
                quantity: item.quantity,
                amount: item.amount,
            })
            .collect(),
    };
    if let Err(err) = state.gateway.create_gateway_order(&order_req).await {
        tracing::warn!(error = %err, reference = %payload.order_reference, "gateway order creation failed");
    }

    let charge_req = ChargeRequest {
        source_id: payload.source_id.clone(),
        amount: payload.amount,
        currency: CURRENCY.to_string(),
        idempotency_key: idempotency_key(
            &payload.order_reference,
            Utc::now().timestamp_millis(),
        ),
        reference: payload.order_reference.clone(),
        buyer_email: Some(payload.customer_email.clone()),
    };

    match state.gateway.charge(&charge_req).await {
        Ok(ChargeOutcome::Captured { payment_id, status }) => {
            let notifier = state.notifier.clone();
            let reference = payload.order_reference.clone();
            let email = payload.customer_email.clone();
            let line_subtotal: i64 = payload.line_items.iter().map(|i| i.amount).sum();
            let summary = ConfirmationSummary {
                subtotal: if line_subtotal > 0 { line_subtotal } else { payload.amount },
                charge_label: "Amount charged".into(),
                charge_amount: payload.amount,
                total: payload.amount,
            };
            spawn_logged("order_confirmation_email", async move {
                notifier
                    .send_order_confirmation(&reference, &email, &summary)
                    .await
            });

            Ok(ApiResponse::success(
                "Payment captured",
                PaymentResult {
                    success: true,
                    payment_id: Some(payment_id),
                    status: Some(status),
                    error: None,
                },
                Some(Meta::empty()),
            ))
        }
        Ok(ChargeOutcome::Declined { reason }) => Ok(ApiResponse::success(
            "Payment declined",
            PaymentResult {
                success: false,
                payment_id: None,
                status: None,
                error: Some(reason),
            },
            Some(Meta::empty()),
        )),
        Err(err) => Err(AppError::Gateway(err.to_string())),
    }
}
