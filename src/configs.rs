//! Gateway account configuration.
//!
//! Assembled once at the boundary from the merchant's stored settings and
//! threaded through the builders by value; none of the core reaches into a
//! global configuration source.

use masking::Secret;
use serde::Deserialize;
use url::Url;

use crate::consts;

/// Whether requests are sent to the gateway's test or production endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    Test,
    Live,
}

/// Parameter encoding agreed with the gateway; selects the endpoint flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display, strum::EnumString)]
pub enum Charset {
    #[serde(rename = "utf-8")]
    #[strum(serialize = "utf-8")]
    Utf8,
    #[serde(rename = "iso-8859-1")]
    #[strum(serialize = "iso-8859-1")]
    Iso8859_1,
}

/// Digest algorithm used for the SHA-IN / SHA-OUT signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::Display, strum::EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha512,
}

/// Configuration of one redirect-checkout gateway account.
#[derive(Debug, Clone, Deserialize)]
pub struct RedirectCheckoutConfig {
    /// Identifier of this gateway configuration, stamped onto payment records.
    pub gateway_id: String,
    /// The merchant's PSPID with PostFinance.
    pub psp_id: String,
    /// Passphrase for signing outgoing requests (SHA-IN).
    pub sha_in: Secret<String>,
    /// Passphrase for verifying post-sale responses (SHA-OUT).
    pub sha_out: Secret<String>,
    pub hash_algorithm: HashAlgorithm,
    pub charset: Charset,
    pub mode: Mode,
    /// Shop catalog url advertised to the gateway; empty when unset.
    pub catalog_url: Option<Url>,
    /// Shop home url advertised to the gateway; empty when unset.
    pub home_url: Option<Url>,
}

impl RedirectCheckoutConfig {
    /// The hosted payment page this configuration redirects to.
    pub fn gateway_url(&self) -> &'static str {
        match (self.mode, self.charset) {
            (Mode::Test, Charset::Iso8859_1) => consts::GATEWAY_URL_TEST,
            (Mode::Test, Charset::Utf8) => consts::GATEWAY_URL_TEST_UTF8,
            (Mode::Live, Charset::Iso8859_1) => consts::GATEWAY_URL_PROD,
            (Mode::Live, Charset::Utf8) => consts::GATEWAY_URL_PROD_UTF8,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn config(mode: Mode, charset: Charset) -> RedirectCheckoutConfig {
        RedirectCheckoutConfig {
            gateway_id: "postfinance".to_string(),
            psp_id: "Gridonic_TEST".to_string(),
            sha_in: Secret::new("S3cr3t!".to_string()),
            sha_out: Secret::new("S3cr3t!".to_string()),
            hash_algorithm: HashAlgorithm::Sha1,
            charset,
            mode,
            catalog_url: None,
            home_url: None,
        }
    }

    #[test]
    fn gateway_url_covers_mode_and_charset() {
        assert_eq!(
            config(Mode::Test, Charset::Utf8).gateway_url(),
            "https://e-payment.postfinance.ch/ncol/test/orderstandard_utf8.asp"
        );
        assert_eq!(
            config(Mode::Live, Charset::Utf8).gateway_url(),
            "https://e-payment.postfinance.ch/ncol/prod/orderstandard_utf8.asp"
        );
        assert_eq!(
            config(Mode::Test, Charset::Iso8859_1).gateway_url(),
            "https://e-payment.postfinance.ch/ncol/test/orderstandard.asp"
        );
        assert_eq!(
            config(Mode::Live, Charset::Iso8859_1).gateway_url(),
            "https://e-payment.postfinance.ch/ncol/prod/orderstandard.asp"
        );
    }

    #[test]
    fn config_deserializes_from_stored_settings() {
        let config: RedirectCheckoutConfig = serde_json::from_value(serde_json::json!({
            "gateway_id": "postfinance",
            "psp_id": "Gridonic_TEST",
            "sha_in": "S3cr3t!",
            "sha_out": "S3cr3t!",
            "hash_algorithm": "sha1",
            "charset": "utf-8",
            "mode": "test",
            "catalog_url": "https://shop.example.com/catalog",
            "home_url": null,
        }))
        .unwrap();

        assert_eq!(config.mode, Mode::Test);
        assert_eq!(config.charset, Charset::Utf8);
        assert_eq!(config.hash_algorithm, HashAlgorithm::Sha1);
        assert!(config.home_url.is_none());
    }
}
