//! Domain types exchanged with the embedding commerce application.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A monetary value in major currency units together with its currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub number: Decimal,
    pub currency_code: String,
}

impl Price {
    pub fn new(number: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            number,
            currency_code: currency_code.into(),
        }
    }
}

/// Billing address of the paying customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub given_name: String,
    pub family_name: String,
    pub address_line1: String,
    pub postal_code: String,
    pub locality: String,
    pub country_code: String,
}

/// A commerce order as seen by the gateway integration.
///
/// The order is owned by the embedding application; this crate only reads its
/// totals and billing data and mutates the order-scoped `data` map (retry
/// counter, recorded post-sale parameters). Durable persistence goes through
/// [`crate::storage::OrderRepository`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub total_price: Price,
    pub email: String,
    pub billing_address: Address,
    #[serde(default)]
    data: HashMap<String, serde_json::Value>,
}

impl Order {
    pub fn new(id: u64, total_price: Price, email: impl Into<String>, billing_address: Address) -> Self {
        Self {
            id,
            total_price,
            email: email.into(),
            billing_address,
            data: HashMap::new(),
        }
    }

    /// Read a value from the order-scoped data map.
    pub fn get_data(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Write a value into the order-scoped data map. The change becomes
    /// durable once the order is saved through its repository.
    pub fn set_data(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }
}

/// State of one payment attempt.
///
/// The synchronous reconciliation path only ever persists [`Completed`];
/// declines fail without a record. The remaining states exist for storage
/// backends with audit requirements.
///
/// [`Completed`]: PaymentState::Completed
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentState {
    Completed,
    Declined,
    Incomplete,
    Error,
}

/// One payment attempt, keyed by the gateway's transaction id (`PAYID`).
///
/// Multiple attempts may exist per order; replayed notifications for the same
/// attempt converge on the same record via the remote id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Gateway transaction id this record is keyed by.
    pub remote_id: String,
    /// Gateway configuration the attempt was made through.
    pub payment_gateway: String,
    pub order_id: u64,
    pub state: PaymentState,
    /// Amount as reported by the gateway, in the gateway's response currency.
    pub amount: Price,
    /// Raw gateway status code of the last processed response.
    pub remote_state: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub modified_at: OffsetDateTime,
}
