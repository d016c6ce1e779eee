//! Gateway related const declarations

/// Test endpoint, ISO 8859-1 parameter encoding
pub const GATEWAY_URL_TEST: &str = "https://e-payment.postfinance.ch/ncol/test/orderstandard.asp";

/// Test endpoint, UTF-8 parameter encoding
pub const GATEWAY_URL_TEST_UTF8: &str =
    "https://e-payment.postfinance.ch/ncol/test/orderstandard_utf8.asp";

/// Production endpoint, ISO 8859-1 parameter encoding
pub const GATEWAY_URL_PROD: &str = "https://e-payment.postfinance.ch/ncol/prod/orderstandard.asp";

/// Production endpoint, UTF-8 parameter encoding
pub const GATEWAY_URL_PROD_UTF8: &str =
    "https://e-payment.postfinance.ch/ncol/prod/orderstandard_utf8.asp";

/// Parameter correlating an inbound callback with an order
pub const ORDER_ID_PARAMETER: &str = "orderID";

/// Order data key holding the retry counter woven into the remote reference
pub const KEY_NUMBER_MINOR: &str = "commerce_postfinance_number_minor";

/// Order data key under which the post-sale parameters are recorded
pub const KEY_PAYMENT_DATA: &str = "commerce_postfinance_payment";
