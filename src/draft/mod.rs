//! Client-held order draft: the multi-step wizard accumulates people,
//! design picks and measurements here, persisting to session storage after
//! every mutation. Nothing reaches the server until checkout.

pub mod measurements;
pub mod storage;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use measurements::{AgeGroup, FieldError, Gender, MeasurementUnit, validate_measurements};
use storage::StorageAdapter;

/// Fixed tax rate applied by the shop summary (tax flow).
pub const TAX_RATE: f64 = 0.08;

/// Session-storage keys owned by the order flow. `clear` removes all of
/// them together.
pub mod keys {
    pub const PEOPLE: &str = "orderPeople";
    pub const ITEMS: &str = "orderItems";
    pub const CUSTOMER: &str = "customerInfo";
    pub const PENDING_ORDER: &str = "pendingOrder";

    pub const ALL: [&str; 4] = [PEOPLE, ITEMS, CUSTOMER, PENDING_ORDER];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: Uuid,
    pub name: String,
    pub gender: Gender,
    pub age_group: AgeGroup,
}

/// Snapshot of the catalog design chosen for one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignChoice {
    pub design_id: String,
    pub name: String,
    /// Unit price in cents at selection time.
    pub unit_price: i64,
    pub occasion: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Sizing {
    Standard {
        label: String,
    },
    Custom {
        unit: MeasurementUnit,
        values: BTreeMap<String, f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftItem {
    pub person_id: Uuid,
    pub design: Option<DesignChoice>,
    pub sizing: Option<Sizing>,
}

impl DraftItem {
    fn empty(person_id: Uuid) -> Self {
        Self {
            person_id,
            design: None,
            sizing: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.design.is_some() && self.sizing.is_some()
    }
}

/// Derived totals in cents. Recomputed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftSummary {
    pub subtotal: i64,
    pub tax: i64,
    pub total: i64,
}

/// Contact details collected at checkout; validated before payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct CustomerInfo {
    #[validate(length(min = 1, message = "is required"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "is required"))]
    pub last_name: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(min = 10, message = "must have at least 10 digits"))]
    pub phone: String,
    #[validate(length(min = 1, message = "is required"))]
    pub address: String,
    #[validate(length(min = 1, message = "is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "is required"))]
    pub zip: String,
    pub notes: Option<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum DraftError {
    #[error("every person needs a design and sizing before checkout")]
    Incomplete { missing: Vec<Uuid> },
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedDraft {
    people: Vec<Person>,
    items: Vec<DraftItem>,
}

/// The draft store owns the wizard state for one browser session and writes
/// through to its storage adapter on every mutation.
pub struct DraftStore<S: StorageAdapter> {
    storage: S,
    people: Vec<Person>,
    items: Vec<DraftItem>,
    customer: Option<CustomerInfo>,
}

impl<S: StorageAdapter> DraftStore<S> {
    /// Fresh, empty draft. Nothing is persisted until the first mutation.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            people: Vec::new(),
            items: Vec::new(),
            customer: None,
        }
    }

    /// Rehydrate a draft from storage. `None` means no draft exists (or it
    /// does not parse) and the caller must send the user back to the first
    /// step.
    pub fn restore(storage: S) -> Option<Self> {
        let people_raw = storage.get(keys::PEOPLE)?;
        let people: Vec<Person> = serde_json::from_str(&people_raw).ok()?;
        let items = storage
            .get(keys::ITEMS)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        let customer = storage
            .get(keys::CUSTOMER)
            .and_then(|raw| serde_json::from_str(&raw).ok());

        Some(Self {
            storage,
            people,
            items,
            customer,
        })
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn items(&self) -> &[DraftItem] {
        &self.items
    }

    pub fn customer_info(&self) -> Option<&CustomerInfo> {
        self.customer.as_ref()
    }

    pub fn add_person(
        &mut self,
        name: impl Into<String>,
        gender: Gender,
        age_group: AgeGroup,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.people.push(Person {
            id,
            name: name.into(),
            gender,
            age_group,
        });
        self.persist();
        id
    }

    /// Removes the person and whatever draft item they had.
    pub fn remove_person(&mut self, id: Uuid) {
        self.people.retain(|p| p.id != id);
        self.items.retain(|i| i.person_id != id);
        self.persist();
    }

    /// Upserts the design on the person's draft item. Unknown ids are a
    /// silent no-op.
    pub fn set_design(&mut self, person_id: Uuid, design: DesignChoice) {
        if !self.people.iter().any(|p| p.id == person_id) {
            return;
        }
        self.item_mut(person_id).design = Some(design);
        self.persist();
    }

    /// Sets sizing for a person. Custom measurements are validated against
    /// the person's profile; on rejection the draft is left untouched and
    /// the field errors go back to the caller. Unknown ids are a silent
    /// no-op, mirroring `set_design`.
    pub fn set_measurements(
        &mut self,
        person_id: Uuid,
        sizing: Sizing,
    ) -> Result<(), Vec<FieldError>> {
        let Some(person) = self.people.iter().find(|p| p.id == person_id) else {
            return Ok(());
        };

        match &sizing {
            Sizing::Standard { label } => {
                if label.trim().is_empty() {
                    return Err(vec![FieldError {
                        field: "size".into(),
                        message: "is required".into(),
                    }]);
                }
            }
            Sizing::Custom { values, .. } => {
                validate_measurements(person.gender, person.age_group, values)?;
            }
        }

        self.item_mut(person_id).sizing = Some(sizing);
        self.persist();
        Ok(())
    }

    pub fn set_customer_info(&mut self, info: CustomerInfo) {
        self.customer = Some(info);
        self.persist();
    }

    /// Totals over the currently selected designs. Pure; drafts are small
    /// enough that recomputing per call beats caching.
    pub fn summary(&self) -> DraftSummary {
        let subtotal: i64 = self
            .items
            .iter()
            .filter_map(|i| i.design.as_ref())
            .map(|d| d.unit_price)
            .sum();
        let tax = (subtotal as f64 * TAX_RATE).round() as i64;
        DraftSummary {
            subtotal,
            tax,
            total: subtotal + tax,
        }
    }

    /// Checkout gate: every person must have exactly one complete item.
    pub fn ensure_complete(&self) -> Result<(), DraftError> {
        let missing: Vec<Uuid> = self
            .people
            .iter()
            .filter(|p| {
                !self
                    .items
                    .iter()
                    .any(|i| i.person_id == p.id && i.is_complete())
            })
            .map(|p| p.id)
            .collect();

        if self.people.is_empty() || !missing.is_empty() {
            return Err(DraftError::Incomplete { missing });
        }
        Ok(())
    }

    /// Writes the whole draft to storage under the flow keys.
    pub fn persist(&mut self) {
        let people = serde_json::to_string(&self.people).unwrap_or_else(|_| "[]".into());
        let items = serde_json::to_string(&self.items).unwrap_or_else(|_| "[]".into());
        self.storage.set(keys::PEOPLE, people);
        self.storage.set(keys::ITEMS, items);
        if let Some(customer) = &self.customer {
            if let Ok(raw) = serde_json::to_string(customer) {
                self.storage.set(keys::CUSTOMER, raw);
            }
        }
    }

    /// Drops every flow key and the in-memory state. Only called once a
    /// payment has been confirmed.
    pub fn clear(&mut self) {
        for key in keys::ALL {
            self.storage.remove(key);
        }
        self.people.clear();
        self.items.clear();
        self.customer = None;
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    fn item_mut(&mut self, person_id: Uuid) -> &mut DraftItem {
        let idx = match self.items.iter().position(|i| i.person_id == person_id) {
            Some(idx) => idx,
            None => {
                self.items.push(DraftItem::empty(person_id));
                self.items.len() - 1
            }
        };
        &mut self.items[idx]
    }
}
