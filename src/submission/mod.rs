//! Contact submissions: validation, the persisted record, and storage.

mod outcome;
mod store;
mod validate;

pub use outcome::{ContactOutcome, GENERIC_FAILURE_MESSAGE};
pub use store::{FileSubmissionStore, MemorySubmissionStore, StoreFuture, SubmissionStore};
pub use validate::{is_email_shaped, is_phone_shaped, truthy, validate, ContactForm, FieldErrors};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One accepted contact-form entry as written to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
    pub message: String,
    pub consent: bool,
    pub submitted_at: DateTime<Utc>,
    pub ip: Option<String>,
}

impl Submission {
    /// Stamp a validated form with the current time and the peer address
    pub fn accept(form: ContactForm, ip: Option<String>) -> Self {
        Self::accept_at(form, ip, Utc::now())
    }

    pub fn accept_at(form: ContactForm, ip: Option<String>, submitted_at: DateTime<Utc>) -> Self {
        Self {
            name: form.name,
            email: form.email,
            company: form.company,
            phone: form.phone,
            message: form.message,
            consent: form.consent,
            submitted_at,
            ip,
        }
    }

    /// The normalized form this submission was built from
    pub fn form(&self) -> ContactForm {
        ContactForm {
            name: self.name.clone(),
            email: self.email.clone(),
            company: self.company.clone(),
            phone: self.phone.clone(),
            message: self.message.clone(),
            consent: self.consent,
        }
    }
}
