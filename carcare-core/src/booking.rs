use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::email::validate_email;
use crate::results::UpdateResult;
use crate::{CoreError, CoreResult};

const RESERVED_KEYS: &[&str] = &["_id"];

/// A customer's booking of a car service.
///
/// Only `email` is structural: it scopes listings to their owner. The rest of the
/// document (customerName, date, service, price, img, status, ...) is stored as sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub email: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    pub email: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Partial update. Fields present here overwrite the stored ones; absent fields are kept.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingFilter {
    All,
    ByEmail(String),
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        match self {
            BookingFilter::All => true,
            BookingFilter::ByEmail(email) => booking.email == *email,
        }
    }
}

fn reject_reserved(details: &Map<String, Value>) -> CoreResult<()> {
    for key in RESERVED_KEYS {
        if details.contains_key(*key) {
            return Err(CoreError::ValidationError(format!("Field '{}' is assigned by the server", key)));
        }
    }
    Ok(())
}

impl NewBooking {
    pub fn validate(&self) -> CoreResult<()> {
        validate_email(&self.email)?;
        reject_reserved(&self.details)
    }

    pub fn into_booking(self, id: Uuid) -> Booking {
        Booking {
            id,
            email: self.email,
            details: self.details,
        }
    }
}

impl BookingPatch {
    pub fn validate(&self) -> CoreResult<()> {
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        reject_reserved(&self.details)
    }
}

impl Booking {
    /// Merges `patch` into this booking. Returns whether anything changed.
    pub fn apply(&mut self, patch: BookingPatch) -> bool {
        let mut changed = false;

        if let Some(email) = patch.email {
            if email != self.email {
                self.email = email;
                changed = true;
            }
        }

        for (key, value) in patch.details {
            if self.details.get(&key) != Some(&value) {
                self.details.insert(key, value);
                changed = true;
            }
        }

        changed
    }

    /// The stored document body: everything except the primary key.
    pub fn document(&self) -> Value {
        let mut doc = self.details.clone();
        doc.insert("email".to_string(), Value::String(self.email.clone()));
        Value::Object(doc)
    }
}

/// What a store has to do to apply a PATCH, decided from the current document.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertPlan {
    Insert(Booking),
    Update(Booking),
    Unchanged,
}

impl UpsertPlan {
    pub fn new(current: Option<Booking>, id: Uuid, patch: BookingPatch) -> CoreResult<Self> {
        patch.validate()?;

        match current {
            Some(mut booking) => {
                if booking.apply(patch) {
                    Ok(UpsertPlan::Update(booking))
                } else {
                    Ok(UpsertPlan::Unchanged)
                }
            }
            None => {
                let email = patch.email.ok_or_else(|| {
                    CoreError::ValidationError("email is required to create a booking".to_string())
                })?;
                Ok(UpsertPlan::Insert(Booking {
                    id,
                    email,
                    details: patch.details,
                }))
            }
        }
    }

    pub fn result(&self, id: Uuid) -> UpdateResult {
        match self {
            UpsertPlan::Insert(_) => UpdateResult::upserted(id),
            UpsertPlan::Update(_) => UpdateResult::matched(true),
            UpsertPlan::Unchanged => UpdateResult::matched(false),
        }
    }
}
