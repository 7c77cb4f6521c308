//! Contact form handler.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use gadzilla_core::Email;

use crate::checkout::ValidationErrors;
use crate::db::contact::{ContactRepository, NewContact};
use crate::error::{ApiJson, Result};
use crate::services::conversions::{self, ConversionEvent, HashedCustomer};
use crate::state::AppState;

const MAX_NAME_LEN: usize = 255;
const MAX_PHONE_LEN: usize = 20;

/// `POST /api/contact` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ContactRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub message: Option<String>,
}

impl ContactRequest {
    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(self) -> std::result::Result<NewContact, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let trimmed = |v: Option<String>| v.map(|s| s.trim().to_owned()).unwrap_or_default();

        let name = trimmed(self.name);
        if name.is_empty() {
            errors.add("name", "Required.");
        } else if name.chars().count() > MAX_NAME_LEN {
            errors.add(
                "name",
                format!("Ensure this field has no more than {MAX_NAME_LEN} characters."),
            );
        }

        let phone = trimmed(self.phone);
        if phone.chars().count() > MAX_PHONE_LEN {
            errors.add(
                "phone",
                format!("Ensure this field has no more than {MAX_PHONE_LEN} characters."),
            );
        }

        let email = trimmed(self.email);
        let email = if email.is_empty() {
            String::new()
        } else {
            match Email::parse(&email) {
                Ok(email) => email.into_inner(),
                Err(_) => {
                    errors.add("email", "Enter a valid email address.");
                    String::new()
                }
            }
        };

        let message = trimmed(self.message);
        if message.is_empty() {
            errors.add("message", "Required.");
        }

        errors.into_result(NewContact {
            name,
            phone,
            email,
            message,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct SentResponse {
    pub status: &'static str,
}

/// Store a contact form message.
#[instrument(skip(state, body))]
pub async fn submit(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ContactRequest>,
) -> Result<(StatusCode, Json<SentResponse>)> {
    let contact = body.validate()?;
    let id = ContactRepository::new(state.pool()).create(&contact).await?;
    tracing::info!(contact_id = %id, "Contact form submitted");

    conversions::dispatch(
        state.conversions(),
        ConversionEvent::Contact {
            customer: HashedCustomer::new(Some(&contact.email), Some(&contact.phone)),
        },
    );

    Ok((StatusCode::CREATED, Json(SentResponse { status: "sent" })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_contact_is_trimmed() {
        let contact = ContactRequest {
            name: Some(" Karim ".to_owned()),
            phone: Some("01712345678".to_owned()),
            email: None,
            message: Some(" Is the S24 in stock? ".to_owned()),
        }
        .validate()
        .unwrap();

        assert_eq!(contact.name, "Karim");
        assert_eq!(contact.email, "");
        assert_eq!(contact.message, "Is the S24 in stock?");
    }

    #[test]
    fn test_missing_fields_and_bad_email() {
        let errors = ContactRequest {
            email: Some("nope".to_owned()),
            ..ContactRequest::default()
        }
        .validate()
        .unwrap_err();

        assert!(errors.field("name").is_some());
        assert!(errors.field("message").is_some());
        assert_eq!(errors.field("email").unwrap(), ["Enter a valid email address."]);
    }
}
