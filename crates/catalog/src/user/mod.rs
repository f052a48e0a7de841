//! Store customers and sellers.

mod service;

pub use service::UserService;

use chrono::{DateTime, Utc};
use common::DocumentId;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::validation::{Violations, char_len, is_email, is_strong_password};

/// Field holding the normalized email address.
pub const EMAIL_FIELD: &str = "email";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Buyer,
    Seller,
}

impl AccountType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "buyer" => Some(AccountType::Buyer),
            "seller" => Some(AccountType::Seller),
            _ => None,
        }
    }
}

/// The client-supplied fields of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFields {
    #[serde(rename = "type")]
    pub kind: AccountType,
    pub email: String,
    pub phone: String,
    pub address: String,
    /// Stored as provided.
    pub password: String,
}

/// A user document as written to the store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoredUser<'a> {
    #[serde(flatten)]
    pub fields: &'a UserFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user as returned to callers. The password never leaves the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(rename = "type")]
    pub kind: AccountType,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User create/update request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInput {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub password: Option<String>,
}

/// Lowercases and trims an email address for storage and comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl UserInput {
    pub fn validate(&self) -> Result<UserFields, CatalogError> {
        let mut v = Violations::new();

        let kind = v
            .require(self.kind.as_deref(), "Type field cannot be empty")
            .and_then(|raw| {
                let parsed = AccountType::parse(raw);
                v.check(
                    parsed.is_some(),
                    r#"Account type must be either "buyer" or "seller""#,
                );
                parsed
            });

        let email = v
            .require(self.email.as_deref(), "Email field cannot be empty")
            .and_then(|raw| {
                v.check(is_email(raw), "Email must be a valid email address")
                    .then(|| normalize_email(raw))
            });

        let phone = v
            .require(self.phone.as_deref(), "Phone number field cannot be empty")
            .and_then(|raw| {
                let long_enough = v.check(
                    char_len(raw) >= 10,
                    "Phone number must be at least 10 characters long",
                );
                let numeric = v.check(
                    raw.chars().all(|c| c.is_ascii_digit()),
                    "Please enter only numbers for the phone number",
                );
                (long_enough && numeric).then(|| raw.to_string())
            });

        let address = v
            .require(self.address.as_deref(), "Address field cannot be empty")
            .and_then(|raw| {
                v.check(
                    char_len(raw) >= 10,
                    "Address must be at least 10 characters long",
                )
                .then(|| raw.to_string())
            });

        // Passwords are not trimmed.
        let password = match self.password.as_deref() {
            None | Some("") => {
                v.check(false, "Please enter a valid password");
                None
            }
            Some(raw) if char_len(raw) < 8 => {
                v.check(false, "Password must be at least 8 characters long");
                None
            }
            Some(raw) => v
                .check(
                    is_strong_password(raw),
                    "Password must contain at least one lowercase letter, one uppercase letter, one number, and one special character",
                )
                .then(|| raw.to_string()),
        };

        v.finish()?;
        let (Some(kind), Some(email), Some(phone), Some(address), Some(password)) =
            (kind, email, phone, address, password)
        else {
            return Err(CatalogError::Validation(vec![
                "Missing required user fields".to_string(),
            ]));
        };

        Ok(UserFields {
            kind,
            email,
            phone,
            address,
            password,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_input() -> UserInput {
        UserInput {
            kind: Some("buyer".into()),
            email: Some("  Reader@Example.COM ".into()),
            phone: Some("5551234567".into()),
            address: Some("221B Baker Street".into()),
            password: Some("Secr3t!pass".into()),
        }
    }

    #[test]
    fn email_is_normalized() {
        let fields = valid_input().validate().unwrap();
        assert_eq!(fields.email, "reader@example.com");
        assert_eq!(fields.kind, AccountType::Buyer);
    }

    #[test]
    fn invalid_fields_are_collected() {
        let input = UserInput {
            kind: Some("admin".into()),
            phone: Some("555-1234".into()),
            password: Some("weakpassword".into()),
            ..valid_input()
        };
        let CatalogError::Validation(messages) = input.validate().unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(
            messages,
            vec![
                r#"Account type must be either "buyer" or "seller""#,
                "Phone number must be at least 10 characters long",
                "Please enter only numbers for the phone number",
                "Password must contain at least one lowercase letter, one uppercase letter, one number, and one special character",
            ]
        );
    }

    #[test]
    fn view_has_no_password() {
        let fields = valid_input().validate().unwrap();
        let now = Utc::now();
        let stored = serde_json::to_value(StoredUser {
            fields: &fields,
            created_at: now,
            updated_at: now,
        })
        .unwrap();
        assert_eq!(stored["password"], "Secr3t!pass");

        let mut with_id = stored.clone();
        with_id["_id"] = serde_json::json!(DocumentId::new());
        let view: UserView = serde_json::from_value(with_id).unwrap();
        let rendered = serde_json::to_value(view).unwrap();
        assert!(rendered.get("password").is_none());
        assert_eq!(rendered["createdAt"], stored["createdAt"]);
    }
}
