//! Typed view of the identity provider's user webhooks.

use serde::Deserialize;

use super::webhook::WebhookError;
use crate::domain::{onboarding::NewIdentity, validation};

#[derive(Debug, Clone, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmailAddress {
    pub id: String,
    pub email_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PhoneNumber {
    pub id: String,
    pub phone_number: String,
}

/// The `data` object of `user.created` / `user.updated` deliveries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    pub primary_email_address_id: Option<String>,
    #[serde(default)]
    pub phone_numbers: Vec<PhoneNumber>,
    #[serde(default)]
    pub primary_phone_number_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl IdentityUser {
    /// The address flagged primary, falling back to the first one listed.
    pub fn primary_email(&self) -> Option<&str> {
        let primary = self.primary_email_address_id.as_deref().and_then(|id| {
            self.email_addresses.iter().find(|address| address.id == id)
        });
        primary
            .or_else(|| self.email_addresses.first())
            .map(|address| address.email_address.as_str())
    }

    pub fn primary_phone(&self) -> Option<&str> {
        let primary = self.primary_phone_number_id.as_deref().and_then(|id| {
            self.phone_numbers.iter().find(|number| number.id == id)
        });
        primary
            .or_else(|| self.phone_numbers.first())
            .map(|number| number.phone_number.as_str())
    }

    /// Normalise into the shape onboarding works with. Identities without a
    /// usable email cannot be matched to member rows and are rejected.
    pub fn to_new_identity(&self) -> Result<NewIdentity, WebhookError> {
        let raw = self.primary_email().ok_or_else(|| {
            WebhookError::InvalidPayload(format!(
                "identity {} has no email address",
                self.id
            ))
        })?;
        let email = validation::normalize_email(raw)
            .map_err(|err| WebhookError::InvalidPayload(err.to_string()))?;
        let clean = |value: Option<&str>, max| {
            validation::optional_text("name", value, max).ok().flatten()
        };

        Ok(NewIdentity {
            identity_id: self.id.clone(),
            email,
            first_name: clean(self.first_name.as_deref(), validation::PERSON_NAME_MAX),
            last_name: clean(self.last_name.as_deref(), validation::PERSON_NAME_MAX),
            phone: clean(self.primary_phone(), validation::PHONE_MAX),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct DeletedUser {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    UserCreated(IdentityUser),
    UserUpdated(IdentityUser),
    UserDeleted { identity_id: String },
    Other(String),
}

impl IdentityEvent {
    pub const USER_CREATED: &'static str = "user.created";
    pub const USER_UPDATED: &'static str = "user.updated";
    pub const USER_DELETED: &'static str = "user.deleted";

    pub fn parse(body: &[u8]) -> Result<Self, WebhookError> {
        let envelope: Envelope = serde_json::from_slice(body)
            .map_err(|err| WebhookError::InvalidPayload(err.to_string()))?;
        let user = |data: serde_json::Value| {
            serde_json::from_value::<IdentityUser>(data)
                .map_err(|err| WebhookError::InvalidPayload(err.to_string()))
        };

        match envelope.event_type.as_str() {
            Self::USER_CREATED => Ok(Self::UserCreated(user(envelope.data)?)),
            Self::USER_UPDATED => Ok(Self::UserUpdated(user(envelope.data)?)),
            Self::USER_DELETED => {
                let deleted: DeletedUser = serde_json::from_value(envelope.data)
                    .map_err(|err| WebhookError::InvalidPayload(err.to_string()))?;
                let identity_id = deleted.id.ok_or_else(|| {
                    WebhookError::InvalidPayload("user.deleted without id".into())
                })?;
                Ok(Self::UserDeleted { identity_id })
            }
            _ => Ok(Self::Other(envelope.event_type)),
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            Self::UserCreated(_) => Self::USER_CREATED,
            Self::UserUpdated(_) => Self::USER_UPDATED,
            Self::UserDeleted { .. } => Self::USER_DELETED,
            Self::Other(kind) => kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_created_user_and_picks_primary_email() {
        let body = br#"{
            "type": "user.created",
            "data": {
                "id": "user_2abc",
                "first_name": "Ada",
                "last_name": null,
                "primary_email_address_id": "idn_2",
                "email_addresses": [
                    {"id": "idn_1", "email_address": "old@example.com"},
                    {"id": "idn_2", "email_address": " Ada@Example.com "}
                ]
            }
        }"#;

        let IdentityEvent::UserCreated(user) = IdentityEvent::parse(body).unwrap()
        else {
            panic!("expected user.created");
        };
        let identity = user.to_new_identity().unwrap();
        assert_eq!(identity.identity_id, "user_2abc");
        assert_eq!(identity.email, "ada@example.com");
        assert_eq!(identity.first_name.as_deref(), Some("Ada"));
        assert_eq!(identity.last_name, None);
    }

    #[test]
    fn falls_back_to_first_email() {
        let user = IdentityUser {
            id: "user_1".into(),
            email_addresses: vec![EmailAddress {
                id: "idn_9".into(),
                email_address: "first@example.com".into(),
            }],
            primary_email_address_id: Some("idn_missing".into()),
            phone_numbers: Vec::new(),
            primary_phone_number_id: None,
            first_name: None,
            last_name: None,
        };
        assert_eq!(user.primary_email(), Some("first@example.com"));
    }

    #[test]
    fn identity_without_email_is_rejected() {
        let body = br#"{"type":"user.created","data":{"id":"user_x"}}"#;
        let IdentityEvent::UserCreated(user) = IdentityEvent::parse(body).unwrap()
        else {
            panic!("expected user.created");
        };
        assert!(matches!(
            user.to_new_identity(),
            Err(WebhookError::InvalidPayload(_))
        ));
    }

    #[test]
    fn parses_deleted_and_unknown_events() {
        let deleted = br#"{"type":"user.deleted","data":{"id":"user_gone","deleted":true}}"#;
        assert_eq!(
            IdentityEvent::parse(deleted).unwrap(),
            IdentityEvent::UserDeleted {
                identity_id: "user_gone".into()
            }
        );

        let other = br#"{"type":"session.created","data":{}}"#;
        assert_eq!(
            IdentityEvent::parse(other).unwrap().event_type(),
            "session.created"
        );

        assert!(IdentityEvent::parse(b"not json").is_err());
    }
}
