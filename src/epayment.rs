//! Parameter codec for the PostFinance e-payment redirect protocol.
//!
//! Assembles the signed hidden-field set sent to the hosted payment page and
//! parses/verifies the signed post-sale feedback. Both directions digest the
//! sorted, non-empty parameter set with a shared passphrase appended to each
//! `KEY=value` pair ([`crypto::hashed_signature`]); the orchestration layers
//! above treat this module as the gateway's parameter schema and nothing
//! else.

pub mod crypto;
pub mod request;
pub mod response;

use masking::Secret;

use crate::configs::{Charset, HashAlgorithm, Mode, RedirectCheckoutConfig};

/// Gateway parameter names.
pub mod params {
    pub const PSPID: &str = "PSPID";
    pub const ORDER_ID: &str = "ORDERID";
    pub const AMOUNT: &str = "AMOUNT";
    pub const CURRENCY: &str = "CURRENCY";
    pub const LANGUAGE: &str = "LANGUAGE";
    pub const CLIENT_NAME: &str = "CN";
    pub const CLIENT_EMAIL: &str = "EMAIL";
    pub const CLIENT_ADDRESS: &str = "OWNERADDRESS";
    pub const CLIENT_ZIP: &str = "OWNERZIP";
    pub const CLIENT_TOWN: &str = "OWNERTOWN";
    pub const CLIENT_COUNTRY: &str = "OWNERCTY";
    pub const CATALOG_URL: &str = "CATALOGURL";
    pub const HOME_URL: &str = "HOMEURL";
    pub const ACCEPT_URL: &str = "ACCEPTURL";
    pub const DECLINE_URL: &str = "DECLINEURL";
    pub const CANCEL_URL: &str = "CANCELURL";
    pub const EXCEPTION_URL: &str = "EXCEPTIONURL";
    pub const SIGNATURE: &str = "SHASIGN";
    pub const STATUS: &str = "STATUS";
    pub const PAYMENT_ID: &str = "PAYID";

    /// Post-sale parameters covered by the SHA-OUT signature.
    ///
    /// Only these enter the inbound digest; parameters outside the list never
    /// influence verification.
    pub const POST_SALE_PARAMETERS: &[&str] = &[
        "AAVADDRESS",
        "AAVCHECK",
        "AAVZIP",
        "ACCEPTANCE",
        "ALIAS",
        "AMOUNT",
        "BIN",
        "BRAND",
        "CARDNO",
        "CCCTY",
        "CN",
        "COMPLUS",
        "CREATION_STATUS",
        "CURRENCY",
        "CVCCHECK",
        "DCC_COMMPERCENTAGE",
        "DCC_CONVAMOUNT",
        "DCC_CONVCCY",
        "DCC_EXCHRATE",
        "DCC_EXCHRATESOURCE",
        "DCC_EXCHRATETS",
        "DCC_INDICATOR",
        "DCC_MARGINPERCENTAGE",
        "DCC_VALIDHOURS",
        "DIGESTCARDNO",
        "ECI",
        "ED",
        "ENCCARDNO",
        "FXAMOUNT",
        "FXCURRENCY",
        "IP",
        "IPCTY",
        "NBREMAILUSAGE",
        "NBRIPUSAGE",
        "NBRIPUSAGE_ALLTX",
        "NBRUSAGE",
        "NCERROR",
        "ORDERID",
        "PAYID",
        "PM",
        "SCO_CATEGORY",
        "SCORING",
        "STATUS",
        "SUBBRAND",
        "SUBSCRIPTION_ID",
        "TRXDATE",
        "VC",
    ];
}

/// Account and endpoint data the codec needs for one request or response.
///
/// Built from the stored gateway configuration; the callback urls are only
/// filled in when assembling an outgoing request, inbound verification does
/// not need them.
#[derive(Debug, Clone)]
pub struct Environment {
    pub psp_id: String,
    pub sha_in: Secret<String>,
    pub sha_out: Secret<String>,
    pub hash_algorithm: HashAlgorithm,
    pub charset: Charset,
    pub mode: Mode,
    pub catalog_url: String,
    pub home_url: String,
    pub accept_url: Option<String>,
    pub decline_url: Option<String>,
    pub cancel_url: Option<String>,
    pub exception_url: Option<String>,
}

impl Environment {
    pub fn from_config(config: &RedirectCheckoutConfig) -> Self {
        Self {
            psp_id: config.psp_id.clone(),
            sha_in: config.sha_in.clone(),
            sha_out: config.sha_out.clone(),
            hash_algorithm: config.hash_algorithm,
            charset: config.charset,
            mode: config.mode,
            catalog_url: config
                .catalog_url
                .as_ref()
                .map(url::Url::to_string)
                .unwrap_or_default(),
            home_url: config
                .home_url
                .as_ref()
                .map(url::Url::to_string)
                .unwrap_or_default(),
            accept_url: None,
            decline_url: None,
            cancel_url: None,
            exception_url: None,
        }
    }
}
