//! Parsing and verification of post-sale feedback parameters.

use std::collections::BTreeMap;

use error_stack::{Report, ResultExt};
use masking::PeekInterface;
use rust_decimal::Decimal;

use super::{crypto, params, Environment};
use crate::errors::{CustomResult, EPaymentError};

/// Raw gateway status code of a payment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(u32);

impl StatusCode {
    /// Payment authorized.
    pub const AUTHORIZED: Self = Self(5);
    /// Payment requested (captured).
    pub const PAYMENT_REQUESTED: Self = Self(9);
    /// Invalid or incomplete attempt.
    pub const INCOMPLETE: Self = Self(0);
    /// Cancelled by the customer.
    pub const CANCELLED: Self = Self(1);
    /// Authorization declined by the acquirer.
    pub const DECLINED: Self = Self(2);

    pub fn new(code: u32) -> Self {
        Self(code)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The attempt went through; nothing left to reconcile.
    pub fn is_success(self) -> bool {
        matches!(self.0, 5 | 9)
    }

    /// The outcome is not final yet (e.g. the acquirer is unavailable); a
    /// later post-sale notification may still complete the payment.
    pub fn is_partially_successful(self) -> bool {
        matches!(self.0, 51..=59 | 91 | 92 | 99)
    }

    /// Anything that is neither a success nor provisionally successful.
    pub fn is_error(self) -> bool {
        !self.is_success()
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A verified post-sale response.
///
/// Only constructed after the `SHASIGN` of the received parameters checked
/// out against the SHA-OUT passphrase.
#[derive(Debug, Clone)]
pub struct PostSaleResponse {
    /// The remote order reference the attempt was made under.
    pub order_reference: String,
    /// Gateway transaction id (`PAYID`).
    pub payment_id: String,
    pub status: StatusCode,
    /// Amount in major units of [`currency`] — the gateway's response
    /// currency, which may differ from the order currency on conversion.
    ///
    /// [`currency`]: PostSaleResponse::currency
    pub amount: Decimal,
    pub currency: String,
}

/// Parse post-sale parameters, verifying their signature first.
///
/// The gateway delivers feedback parameter names in mixed case (`orderID`,
/// `amount`, …); they are uppercased before anything else. The digest is then
/// recomputed over the post-sale whitelist
/// ([`params::POST_SALE_PARAMETERS`]), sorted, without empty values, and
/// compared case-insensitively against the received `SHASIGN`. Verification
/// failure is reported as [`EPaymentError::InvalidSignature`], distinct from
/// the parse errors, so callers can treat it as a fraud signal.
pub fn parse(
    environment: &Environment,
    parameters: &BTreeMap<String, String>,
) -> CustomResult<PostSaleResponse, EPaymentError> {
    let parameters: BTreeMap<String, String> = parameters
        .iter()
        .map(|(key, value)| (key.to_uppercase(), value.clone()))
        .collect();
    let parameters = &parameters;

    let received_signature = require(parameters, params::SIGNATURE)?;

    let signed: BTreeMap<String, String> = parameters
        .iter()
        .filter(|(key, _)| params::POST_SALE_PARAMETERS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    let expected_signature = crypto::hashed_signature(
        &signed,
        environment.sha_out.peek(),
        environment.hash_algorithm,
    )
    .change_context(EPaymentError::SignatureComputationFailed)?;

    if !received_signature.eq_ignore_ascii_case(&expected_signature) {
        return Err(Report::new(EPaymentError::InvalidSignature));
    }

    let status = require(parameters, params::STATUS)?
        .parse::<u32>()
        .change_context(EPaymentError::MalformedParameter {
            field_name: params::STATUS,
        })?;
    let amount = require(parameters, params::AMOUNT)?
        .parse::<Decimal>()
        .change_context(EPaymentError::MalformedParameter {
            field_name: params::AMOUNT,
        })?;

    Ok(PostSaleResponse {
        order_reference: require(parameters, params::ORDER_ID)?.to_string(),
        payment_id: require(parameters, params::PAYMENT_ID)?.to_string(),
        status: StatusCode::new(status),
        amount,
        currency: require(parameters, params::CURRENCY)?.to_string(),
    })
}

fn require<'a>(
    parameters: &'a BTreeMap<String, String>,
    field_name: &'static str,
) -> CustomResult<&'a str, EPaymentError> {
    parameters
        .get(field_name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Report::new(EPaymentError::MissingParameter { field_name }))
}
