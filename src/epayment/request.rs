//! Assembly of the signed outgoing payment field set.

use std::collections::BTreeMap;

use error_stack::ResultExt;
use masking::PeekInterface;
use rust_decimal::{prelude::ToPrimitive, Decimal};

use super::{crypto, params, Environment};
use crate::errors::{CustomResult, EPaymentError};

/// The paying customer as sent to the gateway.
#[derive(Debug, Clone, Default)]
pub struct Client {
    pub name: String,
    pub address: String,
    pub zip: String,
    pub town: String,
    pub country: String,
    pub email: String,
    /// Locale of the hosted payment page, `{lang}_{REGION}`.
    pub locale: String,
}

/// The order as sent to the gateway.
#[derive(Debug, Clone)]
pub struct PaymentOrder {
    /// Remote order reference, unique per attempt.
    pub reference: String,
    /// Amount in major currency units; converted to minor units on the wire.
    pub amount: Decimal,
    pub currency: String,
}

/// Assemble the full signed hidden-field set for the redirect to the hosted
/// payment page.
///
/// Extra parameters are additive: a key already computed from the client,
/// order or environment is never overridden. Empty values are left out, both
/// from the field set and therefore from the signature.
pub fn create_payment(
    environment: &Environment,
    client: &Client,
    order: &PaymentOrder,
    extra_parameters: &BTreeMap<String, String>,
) -> CustomResult<BTreeMap<String, String>, EPaymentError> {
    let mut fields = BTreeMap::new();

    insert_non_empty(&mut fields, params::PSPID, &environment.psp_id);
    insert_non_empty(&mut fields, params::ORDER_ID, &order.reference);
    insert_non_empty(&mut fields, params::AMOUNT, &minor_units(order.amount)?);
    insert_non_empty(&mut fields, params::CURRENCY, &order.currency);
    insert_non_empty(&mut fields, params::LANGUAGE, &client.locale);
    insert_non_empty(&mut fields, params::CLIENT_NAME, &client.name);
    insert_non_empty(&mut fields, params::CLIENT_EMAIL, &client.email);
    insert_non_empty(&mut fields, params::CLIENT_ADDRESS, &client.address);
    insert_non_empty(&mut fields, params::CLIENT_ZIP, &client.zip);
    insert_non_empty(&mut fields, params::CLIENT_TOWN, &client.town);
    insert_non_empty(&mut fields, params::CLIENT_COUNTRY, &client.country);
    insert_non_empty(&mut fields, params::CATALOG_URL, &environment.catalog_url);
    insert_non_empty(&mut fields, params::HOME_URL, &environment.home_url);

    for (key, url) in [
        (params::ACCEPT_URL, &environment.accept_url),
        (params::DECLINE_URL, &environment.decline_url),
        (params::CANCEL_URL, &environment.cancel_url),
        (params::EXCEPTION_URL, &environment.exception_url),
    ] {
        if let Some(url) = url {
            insert_non_empty(&mut fields, key, url);
        }
    }

    for (key, value) in extra_parameters {
        if !value.is_empty() {
            fields.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    let signature = crypto::hashed_signature(
        &fields,
        environment.sha_in.peek(),
        environment.hash_algorithm,
    )
    .change_context(EPaymentError::SignatureComputationFailed)?;
    fields.insert(params::SIGNATURE.to_string(), signature);

    Ok(fields)
}

fn insert_non_empty(fields: &mut BTreeMap<String, String>, key: &str, value: &str) {
    if !value.is_empty() {
        fields.insert(key.to_string(), value.to_string());
    }
}

/// The gateway expects amounts multiplied by 100 and stripped of decimals.
fn minor_units(amount: Decimal) -> CustomResult<String, EPaymentError> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|minor| minor.round())
        .and_then(|minor| minor.to_i64())
        .map(|minor| minor.to_string())
        .ok_or_else(|| error_stack::Report::new(EPaymentError::InvalidAmount))
}
