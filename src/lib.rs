//! PostFinance (Ogone) e-payment redirect integration for commerce orders.
//!
//! The gateway rejects an order reference it has already seen, so failed
//! attempts bump a per-order retry counter which is woven into the reference
//! sent upstream ([`order_number`]). Outgoing requests are signed hidden form
//! fields ([`request`]), inbound post-sale feedback is signature-checked and
//! reconciled against orders and payment records ([`response`]), and the
//! callback entry points translate reconciliation outcomes into the
//! acknowledgements the gateway expects ([`notification`]).

pub mod configs;
pub mod consts;
pub mod epayment;
pub mod errors;
pub mod events;
pub mod notification;
pub mod order_number;
pub mod request;
pub mod response;
pub mod storage;
pub mod types;

pub use self::{
    configs::RedirectCheckoutConfig,
    notification::{Acknowledgement, IncomingRequest, NotificationGateway},
    request::{CallbackUrls, PaymentRequestBuilder, RedirectForm},
    response::{PaymentRecordSync, PaymentResponseProcessor},
};
