use std::sync::Mutex;

use faf_apparel_api::checkout::{
    CheckoutError, CheckoutFlow, CheckoutState, PricingPolicy,
};
use faf_apparel_api::draft::measurements::{AgeGroup, Gender};
use faf_apparel_api::draft::{
    CustomerInfo, DesignChoice, DraftStore, Sizing, keys,
    storage::{MemoryStorage, StorageAdapter},
};
use faf_apparel_api::gateway::{
    BoxFuture, ChargeOutcome, ChargeRequest, GatewayError, GatewayOrderRequest, PaymentGateway,
};

/// Gateway double that records every call and can be told to decline or to
/// fail order creation.
#[derive(Default)]
struct RecordingGateway {
    decline_reason: Option<String>,
    fail_order_create: bool,
    order_calls: Mutex<Vec<String>>,
    charge_calls: Mutex<Vec<ChargeRequest>>,
}

impl RecordingGateway {
    fn approving() -> Self {
        Self::default()
    }

    fn declining(reason: &str) -> Self {
        Self {
            decline_reason: Some(reason.to_string()),
            ..Self::default()
        }
    }

    fn charge_count(&self) -> usize {
        self.charge_calls.lock().unwrap().len()
    }

    fn order_count(&self) -> usize {
        self.order_calls.lock().unwrap().len()
    }
}

impl PaymentGateway for RecordingGateway {
    fn create_gateway_order<'a>(
        &'a self,
        req: &'a GatewayOrderRequest,
    ) -> BoxFuture<'a, Result<String, GatewayError>> {
        Box::pin(async move {
            self.order_calls.lock().unwrap().push(req.reference.clone());
            if self.fail_order_create {
                return Err(GatewayError::Api("order endpoint down".into()));
            }
            Ok(format!("gw-{}", req.reference))
        })
    }

    fn charge<'a>(
        &'a self,
        req: &'a ChargeRequest,
    ) -> BoxFuture<'a, Result<ChargeOutcome, GatewayError>> {
        Box::pin(async move {
            self.charge_calls.lock().unwrap().push(req.clone());
            match &self.decline_reason {
                Some(reason) => Ok(ChargeOutcome::Declined {
                    reason: reason.clone(),
                }),
                None => Ok(ChargeOutcome::Captured {
                    payment_id: format!("pay-{}", req.idempotency_key),
                    status: "COMPLETED".into(),
                }),
            }
        })
    }
}

fn abel_draft() -> DraftStore<MemoryStorage> {
    let mut draft = DraftStore::new(MemoryStorage::new());
    let abel = draft.add_person("Abel", Gender::Men, AgeGroup::Adult);
    draft.set_design(
        abel,
        DesignChoice {
            design_id: "mt1".into(),
            name: "Classic Suit".into(),
            unit_price: 29999,
            occasion: "wedding".into(),
        },
    );
    draft
        .set_measurements(abel, Sizing::Standard { label: "L".into() })
        .unwrap();
    draft
}

fn abel_customer() -> CustomerInfo {
    CustomerInfo {
        first_name: "Abel".into(),
        last_name: "Mengistu".into(),
        email: "abel@example.com".into(),
        phone: "0911234567".into(),
        address: "Bole Road".into(),
        city: "Addis Ababa".into(),
        state: "AA".into(),
        zip: "1000".into(),
        notes: None,
    }
}

fn assert_reference_shape(reference: &str) {
    let mut parts = reference.splitn(3, '-');
    assert_eq!(parts.next(), Some("FAF"));
    let millis = parts.next().expect("timestamp part");
    assert!(!millis.is_empty() && millis.chars().all(|c| c.is_ascii_digit()));
    let suffix = parts.next().expect("suffix part");
    assert_eq!(suffix.len(), 4);
    assert!(
        suffix
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    );
}

#[tokio::test]
async fn tax_flow_checkout_succeeds_and_clears_the_draft() {
    let draft = abel_draft();
    let summary = draft.summary();
    assert_eq!(summary.subtotal, 29999);
    assert_eq!(summary.tax, 2400);
    assert_eq!(summary.total, 32399);

    let mut flow = CheckoutFlow::new(draft, PricingPolicy::Tax);
    flow.submit_customer_info(abel_customer()).unwrap();
    let reference = flow
        .build_pending_order(1719238123456)
        .unwrap()
        .reference
        .clone();
    assert_reference_shape(&reference);
    assert_eq!(flow.amount_due(), Some(32399));

    let gateway = RecordingGateway::approving();
    let state = flow
        .submit_payment(&gateway, "cnon:card-ok", 1719238123999)
        .await
        .unwrap();
    assert!(matches!(state, CheckoutState::Succeeded { .. }));

    // The charge carried the exact minor-unit total and the minted key.
    let charges = gateway.charge_calls.lock().unwrap();
    assert_eq!(charges.len(), 1);
    assert_eq!(charges[0].amount, 32399);
    assert_eq!(
        charges[0].idempotency_key,
        format!("{reference}-1719238123999")
    );
    drop(charges);
    assert_eq!(gateway.order_count(), 1);

    for key in keys::ALL {
        assert!(
            flow.draft().storage().get(key).is_none(),
            "{key} should be cleared after payment"
        );
    }
}

#[tokio::test]
async fn deposit_flow_charges_half_up_front() {
    let mut flow = CheckoutFlow::new(abel_draft(), PricingPolicy::Deposit);
    flow.submit_customer_info(abel_customer()).unwrap();
    flow.build_pending_order(1).unwrap();
    assert_eq!(flow.amount_due(), Some(15000));

    let gateway = RecordingGateway::approving();
    flow.submit_payment(&gateway, "cnon:card-ok", 2)
        .await
        .unwrap();

    let charges = gateway.charge_calls.lock().unwrap();
    assert_eq!(charges[0].amount, 15000);
}

#[tokio::test]
async fn invalid_email_blocks_before_any_network_call() {
    let mut flow = CheckoutFlow::new(abel_draft(), PricingPolicy::Tax);
    let mut info = abel_customer();
    info.email = "not-an-email".into();

    let err = flow.submit_customer_info(info).unwrap_err();
    assert!(matches!(err, CheckoutError::InvalidCustomer(_)));

    // Still in the form step: no pending order, and nothing ever reached
    // the gateway.
    assert!(matches!(
        flow.build_pending_order(1),
        Err(CheckoutError::InvalidTransition(_))
    ));
    let gateway = RecordingGateway::approving();
    assert!(
        flow.submit_payment(&gateway, "cnon:card-ok", 1)
            .await
            .is_err()
    );
    assert_eq!(gateway.order_count(), 0);
    assert_eq!(gateway.charge_count(), 0);
}

#[tokio::test]
async fn declined_charge_keeps_draft_and_allows_manual_retry() {
    let mut flow = CheckoutFlow::new(abel_draft(), PricingPolicy::Tax);
    flow.submit_customer_info(abel_customer()).unwrap();
    let reference = flow.build_pending_order(5000).unwrap().reference.clone();

    let declining = RecordingGateway::declining("Card declined");
    let state = flow
        .submit_payment(&declining, "cnon:card-bad", 6000)
        .await
        .unwrap();
    match state {
        CheckoutState::Failed { message } => assert_eq!(message.as_str(), "Card declined"),
        other => panic!("expected failure, got {other:?}"),
    }

    // Draft and pending order survive a decline.
    for key in keys::ALL {
        assert!(flow.draft().storage().get(key).is_some(), "{key} should remain");
    }

    // Manual resubmit mints a fresh idempotency key and can succeed.
    let approving = RecordingGateway::approving();
    let state = flow
        .submit_payment(&approving, "cnon:card-ok", 7000)
        .await
        .unwrap();
    assert!(matches!(state, CheckoutState::Succeeded { .. }));

    let first_key = declining.charge_calls.lock().unwrap()[0].idempotency_key.clone();
    let second_key = approving.charge_calls.lock().unwrap()[0].idempotency_key.clone();
    assert_eq!(first_key, format!("{reference}-6000"));
    assert_eq!(second_key, format!("{reference}-7000"));
    assert_ne!(first_key, second_key);
}

#[tokio::test]
async fn gateway_order_failure_does_not_abort_the_charge() {
    let mut flow = CheckoutFlow::new(abel_draft(), PricingPolicy::Tax);
    flow.submit_customer_info(abel_customer()).unwrap();
    flow.build_pending_order(1).unwrap();

    let gateway = RecordingGateway {
        fail_order_create: true,
        ..RecordingGateway::default()
    };
    let state = flow
        .submit_payment(&gateway, "cnon:card-ok", 2)
        .await
        .unwrap();
    assert!(matches!(state, CheckoutState::Succeeded { .. }));
    assert_eq!(gateway.order_count(), 1);
    assert_eq!(gateway.charge_count(), 1);
}

#[tokio::test]
async fn restored_draft_feeds_checkout_like_the_original() {
    let draft = abel_draft();
    let storage = draft.into_storage();

    // A new page mount restores from the same session storage.
    let restored = DraftStore::restore(storage).expect("draft present");
    assert_eq!(restored.summary().total, 32399);
    assert!(restored.ensure_complete().is_ok());
}
