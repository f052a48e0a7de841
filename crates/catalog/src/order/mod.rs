//! Orders placed by users for one or more books.

mod service;

pub use service::OrderService;

use chrono::{DateTime, NaiveDate, Utc};
use common::DocumentId;
use serde::{Deserialize, Serialize};

use crate::error::CatalogError;
use crate::validation::{Violations, char_len};

/// Field referencing the ordering user.
pub const USER_ID_FIELD: &str = "userId";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "Credit Card")]
    CreditCard,
    #[serde(rename = "Debit Card")]
    DebitCard,
    #[serde(rename = "PayPal")]
    PayPal,
    #[serde(rename = "Cash on Delivery")]
    CashOnDelivery,
}

impl PaymentMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Credit Card" => Some(PaymentMethod::CreditCard),
            "Debit Card" => Some(PaymentMethod::DebitCard),
            "PayPal" => Some(PaymentMethod::PayPal),
            "Cash on Delivery" => Some(PaymentMethod::CashOnDelivery),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFields {
    pub user_id: DocumentId,
    pub shipping_address: String,
    pub date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
    pub book_ids: Vec<DocumentId>,
}

/// A stored order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(flatten)]
    pub fields: OrderFields,
}

/// Order create/update request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderInput {
    pub user_id: Option<String>,
    pub shipping_address: Option<String>,
    pub date: Option<String>,
    pub payment_method: Option<String>,
    pub tracking_number: Option<String>,
    pub book_ids: Option<Vec<String>>,
}

/// Accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|date| date.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|day| day.and_hms_opt(0, 0, 0))
                .map(|midnight| midnight.and_utc())
        })
}

impl OrderInput {
    /// Validates a new order. A missing date means now.
    pub fn validate_for_create(&self) -> Result<OrderFields, CatalogError> {
        self.validate(false)
    }

    /// Validates a replacement order. The date is required.
    pub fn validate_for_update(&self) -> Result<OrderFields, CatalogError> {
        self.validate(true)
    }

    fn validate(&self, date_required: bool) -> Result<OrderFields, CatalogError> {
        let mut v = Violations::new();

        let user_id = v
            .require(self.user_id.as_deref(), "User ID is required")
            .and_then(|raw| {
                let parsed = DocumentId::parse(raw).ok();
                v.check(parsed.is_some(), "User ID must be a valid ID");
                parsed
            });

        let shipping_address = v
            .require(
                self.shipping_address.as_deref(),
                "Shipping address is required",
            )
            .and_then(|raw| {
                v.check(
                    (10..=500).contains(&char_len(raw)),
                    "Shipping address must be between 10 and 500 characters",
                )
                .then(|| raw.to_string())
            });

        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") if date_required => {
                v.check(false, "Date is required");
                None
            }
            None | Some("") => Some(Utc::now()),
            Some(raw) => {
                let parsed = parse_date(raw);
                v.check(
                    parsed.is_some(),
                    "Date must be a valid ISO 8601 date format",
                );
                parsed
            }
        };

        let payment_method = v
            .require(self.payment_method.as_deref(), "Payment method is required")
            .and_then(|raw| {
                let parsed = PaymentMethod::parse(raw);
                v.check(
                    parsed.is_some(),
                    "Payment method must be one of: Credit Card, Debit Card, PayPal, Cash on Delivery",
                );
                parsed
            });

        let tracking_number = match self.tracking_number.as_deref().map(str::trim) {
            None => None,
            Some(raw) => {
                let sized = v.check(
                    (5..=50).contains(&char_len(raw)),
                    "Tracking number must be between 5 and 50 characters",
                );
                let alphanumeric = v.check(
                    raw.chars().all(|c| c.is_ascii_alphanumeric()),
                    "Tracking number must contain only letters and numbers",
                );
                (sized && alphanumeric).then(|| raw.to_string())
            }
        };

        let book_ids = match self.book_ids.as_deref() {
            None | Some([]) => {
                v.check(false, "Book IDs must be an array with at least one book");
                None
            }
            Some(raw) => {
                let parsed: Option<Vec<DocumentId>> = raw
                    .iter()
                    .map(|id| DocumentId::parse(id).ok())
                    .collect();
                v.check(parsed.is_some(), "Each Book ID must be a valid ID");
                parsed
            }
        };

        v.finish()?;
        let (
            Some(user_id),
            Some(shipping_address),
            Some(date),
            Some(payment_method),
            Some(book_ids),
        ) = (user_id, shipping_address, date, payment_method, book_ids)
        else {
            return Err(CatalogError::Validation(vec![
                "Missing required order fields".to_string(),
            ]));
        };

        Ok(OrderFields {
            user_id,
            shipping_address,
            date,
            payment_method,
            tracking_number,
            book_ids,
        })
    }
}
