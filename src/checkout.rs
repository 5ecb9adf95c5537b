//! Checkout orchestrator: turns a complete draft into a paid order through
//! a strictly linear state machine. One pricing policy per checkout; the
//! tax and deposit flows never combine.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::draft::{
    CustomerInfo, DraftError, DraftItem, DraftStore, Person, TAX_RATE, keys,
    storage::StorageAdapter,
};
use crate::gateway::{
    ChargeOutcome, ChargeRequest, GatewayError, GatewayLineItem, GatewayOrderRequest,
    PaymentGateway,
};

pub const ORDER_REF_PREFIX: &str = "FAF";

/// Deposit flow charges half up front; the balance is due at pickup.
pub const DEPOSIT_RATE: f64 = 0.50;

pub const CURRENCY: &str = "USD";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingPolicy {
    /// Ready-made shop checkout: subtotal + 8 % tax, all due now.
    Tax,
    /// Made-to-order wizard: 50 % deposit now, balance at pickup.
    Deposit,
}

impl PricingPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingPolicy::Tax => "tax",
            PricingPolicy::Deposit => "deposit",
        }
    }
}

/// Amounts for one checkout, all in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub subtotal: i64,
    pub tax: Option<i64>,
    pub deposit: Option<i64>,
    pub total: i64,
    /// What the card is charged in this checkout.
    pub due_now: i64,
}

impl PricingPolicy {
    pub fn quote(&self, subtotal: i64) -> Quote {
        match self {
            PricingPolicy::Tax => {
                let tax = (subtotal as f64 * TAX_RATE).round() as i64;
                Quote {
                    subtotal,
                    tax: Some(tax),
                    deposit: None,
                    total: subtotal + tax,
                    due_now: subtotal + tax,
                }
            }
            PricingPolicy::Deposit => {
                let deposit = (subtotal as f64 * DEPOSIT_RATE).round() as i64;
                Quote {
                    subtotal,
                    tax: None,
                    deposit: Some(deposit),
                    total: subtotal,
                    due_now: deposit,
                }
            }
        }
    }
}

/// `FAF-<millis>-<suffix>`, suffix drawn from a v4 uuid so rapid
/// concurrent minting stays collision-safe.
pub fn mint_order_reference(now_millis: i64) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    let suffix = uuid[..4].to_uppercase();
    format!("{ORDER_REF_PREFIX}-{now_millis}-{suffix}")
}

/// Same reference and submission instant produce the same key, so a
/// double-submit within one tick cannot double-charge; a deliberate retry
/// (new instant) mints a fresh key.
pub fn idempotency_key(reference: &str, submitted_at_millis: i64) -> String {
    format!("{reference}-{submitted_at_millis}")
}

/// Render minor units as a 2-decimal display amount.
pub fn format_cents(cents: i64) -> String {
    format!("{}.{:02}", cents / 100, (cents % 100).abs())
}

/// The fully assembled, not-yet-paid order held in session storage while
/// the card element is up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingOrder {
    pub reference: String,
    pub customer: CustomerInfo,
    pub people: Vec<Person>,
    pub items: Vec<DraftItem>,
    pub policy: PricingPolicy,
    pub quote: Quote,
    pub payment_method: String,
    pub created_at_millis: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    /// Customer info form.
    Collecting,
    /// Info accepted; pending order not yet assembled.
    Pending,
    /// Pending order stashed; card element live.
    AwaitingPayment,
    /// Charge in flight; submit control disabled.
    Submitting,
    Succeeded { payment_id: String },
    /// Retryable; the pending order and draft are intact.
    Failed { message: String },
}

impl CheckoutState {
    fn name(&self) -> &'static str {
        match self {
            CheckoutState::Collecting => "collecting",
            CheckoutState::Pending => "pending",
            CheckoutState::AwaitingPayment => "awaiting-payment",
            CheckoutState::Submitting => "submitting",
            CheckoutState::Succeeded { .. } => "succeeded",
            CheckoutState::Failed { .. } => "failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("customer info is invalid")]
    InvalidCustomer(ValidationErrors),

    #[error(transparent)]
    IncompleteDraft(#[from] DraftError),

    #[error("operation not valid in the {0} state")]
    InvalidTransition(&'static str),
}

pub struct CheckoutFlow<S: StorageAdapter> {
    draft: DraftStore<S>,
    policy: PricingPolicy,
    state: CheckoutState,
    pending: Option<PendingOrder>,
}

impl<S: StorageAdapter> CheckoutFlow<S> {
    pub fn new(draft: DraftStore<S>, policy: PricingPolicy) -> Self {
        Self {
            draft,
            policy,
            state: CheckoutState::Collecting,
            pending: None,
        }
    }

    pub fn state(&self) -> &CheckoutState {
        &self.state
    }

    pub fn pending_order(&self) -> Option<&PendingOrder> {
        self.pending.as_ref()
    }

    pub fn draft(&self) -> &DraftStore<S> {
        &self.draft
    }

    pub fn amount_due(&self) -> Option<i64> {
        self.pending.as_ref().map(|p| p.quote.due_now)
    }

    /// Collecting → Pending on a valid submit; invalid info keeps the form
    /// state and hands field errors back.
    pub fn submit_customer_info(&mut self, info: CustomerInfo) -> Result<(), CheckoutError> {
        if self.state != CheckoutState::Collecting {
            return Err(CheckoutError::InvalidTransition(self.state.name()));
        }
        info.validate().map_err(CheckoutError::InvalidCustomer)?;
        self.draft.set_customer_info(info);
        self.state = CheckoutState::Pending;
        Ok(())
    }

    /// Pending → AwaitingPayment. Requires a complete draft; mints the
    /// reference and stashes the pending order under its storage key.
    pub fn build_pending_order(&mut self, now_millis: i64) -> Result<&PendingOrder, CheckoutError> {
        if self.state != CheckoutState::Pending {
            return Err(CheckoutError::InvalidTransition(self.state.name()));
        }
        self.draft.ensure_complete()?;

        let customer = self
            .draft
            .customer_info()
            .cloned()
            .ok_or(CheckoutError::InvalidTransition("pending"))?;
        let quote = self.policy.quote(self.draft.summary().subtotal);
        let pending = PendingOrder {
            reference: mint_order_reference(now_millis),
            customer,
            people: self.draft.people().to_vec(),
            items: self.draft.items().to_vec(),
            policy: self.policy,
            quote,
            payment_method: "card".to_string(),
            created_at_millis: now_millis,
        };

        if let Ok(raw) = serde_json::to_string(&pending) {
            self.draft.storage_mut().set(keys::PENDING_ORDER, raw);
        }
        self.state = CheckoutState::AwaitingPayment;
        Ok(&*self.pending.insert(pending))
    }

    /// AwaitingPayment/Failed → Submitting → Succeeded or Failed. Gateway
    /// order creation is best-effort; only the charge decides the outcome.
    /// There is no automatic retry: a Failed state waits for the user to
    /// resubmit.
    pub async fn submit_payment(
        &mut self,
        gateway: &dyn PaymentGateway,
        source_token: &str,
        submitted_at_millis: i64,
    ) -> Result<&CheckoutState, CheckoutError> {
        match self.state {
            CheckoutState::AwaitingPayment | CheckoutState::Failed { .. } => {}
            _ => return Err(CheckoutError::InvalidTransition(self.state.name())),
        }
        let pending = self
            .pending
            .as_ref()
            .ok_or(CheckoutError::InvalidTransition("awaiting-payment"))?;
        self.state = CheckoutState::Submitting;

        let order_req = GatewayOrderRequest {
            reference: pending.reference.clone(),
            customer_email: pending.customer.email.clone(),
            line_items: pending
                .items
                .iter()
                .filter_map(|item| item.design.as_ref())
                .map(|design| GatewayLineItem {
                    name: design.name.clone(),
                    quantity: 1,
                    amount: design.unit_price,
                })
                .collect(),
        };
        if let Err(err) = gateway.create_gateway_order(&order_req).await {
            tracing::warn!(error = %err, reference = %pending.reference, "gateway order creation failed");
        }

        let charge_req = ChargeRequest {
            source_id: source_token.to_string(),
            amount: pending.quote.due_now,
            currency: CURRENCY.to_string(),
            idempotency_key: idempotency_key(&pending.reference, submitted_at_millis),
            reference: pending.reference.clone(),
            buyer_email: Some(pending.customer.email.clone()),
        };

        self.state = match gateway.charge(&charge_req).await {
            Ok(ChargeOutcome::Captured { payment_id, .. }) => {
                self.draft.clear();
                CheckoutState::Succeeded { payment_id }
            }
            Ok(ChargeOutcome::Declined { reason }) => CheckoutState::Failed { message: reason },
            Err(GatewayError::Http(_)) => CheckoutState::Failed {
                message: "We could not reach the payment service. Please try again.".to_string(),
            },
            Err(GatewayError::Api(detail)) => {
                tracing::error!(detail = %detail, "charge failed");
                CheckoutState::Failed {
                    message: "Payment could not be processed. Please try again.".to_string(),
                }
            }
        };

        Ok(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::measurements::{AgeGroup, Gender};
    use crate::draft::{DesignChoice, Sizing, storage::MemoryStorage};

    fn complete_draft() -> DraftStore<MemoryStorage> {
        let mut draft = DraftStore::new(MemoryStorage::new());
        let id = draft.add_person("Abel", Gender::Men, AgeGroup::Adult);
        draft.set_design(
            id,
            DesignChoice {
                design_id: "mt1".into(),
                name: "Classic Suit".into(),
                unit_price: 29999,
                occasion: "wedding".into(),
            },
        );
        draft
            .set_measurements(id, Sizing::Standard { label: "L".into() })
            .unwrap();
        draft
    }

    fn customer() -> CustomerInfo {
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

    #[test]
    fn tax_quote_rounds_to_nearest_cent() {
        let quote = PricingPolicy::Tax.quote(29999);
        assert_eq!(quote.tax, Some(2400));
        assert_eq!(quote.total, 32399);
        assert_eq!(quote.due_now, 32399);
        assert_eq!(format_cents(quote.total), "323.99");
    }

    #[test]
    fn deposit_quote_charges_half_now() {
        let quote = PricingPolicy::Deposit.quote(29999);
        assert_eq!(quote.deposit, Some(15000));
        assert_eq!(quote.tax, None);
        assert_eq!(quote.total, 29999);
        assert_eq!(quote.due_now, 15000);
    }

    #[test]
    fn order_reference_shape() {
        let reference = mint_order_reference(1719238123456);
        let mut parts = reference.splitn(3, '-');
        assert_eq!(parts.next(), Some("FAF"));
        assert_eq!(parts.next(), Some("1719238123456"));
        let suffix = parts.next().unwrap();
        assert_eq!(suffix.len(), 4);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn idempotency_key_varies_with_timestamp_only() {
        let a = idempotency_key("FAF-1-AAAA", 1000);
        let b = idempotency_key("FAF-1-AAAA", 1000);
        let c = idempotency_key("FAF-1-AAAA", 1001);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn invalid_email_keeps_collecting_state() {
        let mut flow = CheckoutFlow::new(complete_draft(), PricingPolicy::Tax);
        let mut info = customer();
        info.email = "not-an-email".into();
        let err = flow.submit_customer_info(info).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidCustomer(_)));
        assert_eq!(flow.state(), &CheckoutState::Collecting);
    }

    #[test]
    fn incomplete_draft_cannot_build_pending_order() {
        let mut draft = DraftStore::new(MemoryStorage::new());
        draft.add_person("Abel", Gender::Men, AgeGroup::Adult);
        let mut flow = CheckoutFlow::new(draft, PricingPolicy::Deposit);
        flow.submit_customer_info(customer()).unwrap();
        let err = flow.build_pending_order(1).unwrap_err();
        assert!(matches!(err, CheckoutError::IncompleteDraft(_)));
    }

    #[test]
    fn pending_order_is_stashed_under_its_key() {
        let mut flow = CheckoutFlow::new(complete_draft(), PricingPolicy::Tax);
        flow.submit_customer_info(customer()).unwrap();
        let reference = flow.build_pending_order(1719238123456).unwrap().reference.clone();

        assert_eq!(flow.state(), &CheckoutState::AwaitingPayment);
        assert_eq!(flow.amount_due(), Some(32399));
        let raw = flow
            .draft()
            .storage()
            .get(keys::PENDING_ORDER)
            .expect("pending order stashed");
        let stashed: PendingOrder = serde_json::from_str(&raw).unwrap();
        assert_eq!(stashed.reference, reference);
    }

    #[test]
    fn payment_before_pending_order_is_rejected() {
        let mut flow = CheckoutFlow::new(complete_draft(), PricingPolicy::Tax);
        let err = flow.build_pending_order(1).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidTransition("collecting")));
    }
}
