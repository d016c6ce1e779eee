//! Errors and error specific types for the gateway integration.

/// Custom Result
/// A custom datatype that wraps the error variant <E> into a report, allowing
/// error_stack::Report<E> specific extendability
///
/// Effectively, equivalent to `Result<T, error_stack::Report<E>>`
pub type CustomResult<T, E> = error_stack::Result<T, E>;

/// Errors that make the gateway configuration unusable for a payment request.
///
/// Caller-recoverable: the merchant fixes the configuration, nothing is
/// retried automatically.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// One of the three callback urls the gateway requires is not configured.
    #[error("missing required callback url: {field_name}")]
    MissingCallbackUrl {
        /// Which callback url is absent.
        field_name: &'static str,
    },
}

/// Failures while assembling or signing an outgoing payment request.
///
/// Surfaced to the checkout ui; the order stays in its pre-payment state and
/// the retry counter is not touched, since no attempt reached the gateway.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("invalid gateway configuration")]
    InvalidConfiguration,
    #[error("failed to encode the payment request")]
    RequestEncodingFailed,
    #[error("failed to sign the payment request")]
    SigningFailed,
}

/// Outcomes of inbound post-sale processing that the caller must tell apart.
#[derive(Debug, thiserror::Error)]
pub enum ResponseError {
    /// The response could not be trusted or understood: signature mismatch,
    /// missing parameter, or an internal failure while reconciling. No order
    /// or payment state has been changed.
    #[error("invalid payment response: {message}")]
    InvalidResponse { message: String },
    /// The gateway reported the attempt as incomplete, declined or errored.
    /// The retry counter has been bumped and the response event dispatched;
    /// the payment can be retried with a fresh order reference.
    #[error("payment incomplete or declined by the gateway")]
    Declined,
}

/// Failures of the order/payment storage ports.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to load entity from storage")]
    LoadFailed,
    #[error("failed to persist entity")]
    SaveFailed,
}

/// Cryptograpic algorithm errors
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// The cryptographic algorithm was unable to generate the digest
    #[error("Failed to generate digest for given message")]
    DigestFailed,
}

/// Errors raised by the e-payment parameter codec.
#[derive(Debug, thiserror::Error)]
pub enum EPaymentError {
    /// The `SHASIGN` of a post-sale response does not match the digest
    /// recomputed from the received parameters.
    #[error("signature does not match the received parameters")]
    InvalidSignature,
    #[error("missing required post-sale parameter: {field_name}")]
    MissingParameter { field_name: &'static str },
    #[error("malformed value for post-sale parameter: {field_name}")]
    MalformedParameter { field_name: &'static str },
    /// The order amount cannot be expressed as integer minor units.
    #[error("order amount cannot be expressed in minor units")]
    InvalidAmount,
    #[error("failed to compute the parameter signature")]
    SignatureComputationFailed,
}

/// Errors mapping a remote order reference back to an internal order id.
#[derive(Debug, thiserror::Error)]
pub enum OrderReferenceError {
    #[error("malformed remote order reference: {reference}")]
    Malformed { reference: String },
}
