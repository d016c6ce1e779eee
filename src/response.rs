//! Reconciliation of post-sale feedback against orders and payment records.

use std::{collections::BTreeMap, sync::Arc};

use error_stack::{Report, ResultExt};
use time::OffsetDateTime;

use crate::{
    configs::RedirectCheckoutConfig,
    epayment::{
        self,
        response::{PostSaleResponse, StatusCode},
        Environment,
    },
    errors::{CustomResult, EPaymentError, ResponseError, StorageError},
    events::{EventDispatcher, PaymentResponseEvent},
    order_number::OrderNumberMapper,
    storage::{OrderRepository, PaymentRepository},
    types::{Order, PaymentRecord, PaymentState, Price},
};

/// Which branch of the reconciliation state machine a response takes.
///
/// Every inbound response is classified independently; there is no stored
/// state between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// Final success, payment record is written as completed.
    Success,
    /// Not final yet; treated optimistically as completed, a later
    /// notification may reconcile further.
    PartialSuccess,
    /// Incomplete, cancelled or declined by the acquirer.
    Declined,
    /// Any other gateway error status.
    Error,
}

impl From<StatusCode> for ResponseClass {
    fn from(status: StatusCode) -> Self {
        if status.is_success() {
            Self::Success
        } else if status.is_partially_successful() {
            Self::PartialSuccess
        } else if matches!(status.get(), 0 | 1 | 2) {
            Self::Declined
        } else {
            Self::Error
        }
    }
}

/// Creates or updates the payment record belonging to one gateway
/// transaction.
///
/// The lookup by remote id is the idempotency mechanism: replays of the same
/// notification converge on the same record instead of duplicating it.
pub struct PaymentRecordSync {
    payments: Arc<dyn PaymentRepository>,
    gateway_id: String,
}

impl PaymentRecordSync {
    pub fn new(payments: Arc<dyn PaymentRepository>, gateway_id: impl Into<String>) -> Self {
        Self {
            payments,
            gateway_id: gateway_id.into(),
        }
    }

    /// Upsert the record keyed by the response's `PAYID`.
    ///
    /// Amount and currency are taken from the response, not the order, in
    /// case the gateway converted currencies.
    pub async fn upsert(
        &self,
        order: &Order,
        response: &PostSaleResponse,
        state: PaymentState,
    ) -> CustomResult<(), StorageError> {
        let existing = self
            .payments
            .find_by_remote_id(&response.payment_id)
            .await?;

        let mut record = existing.unwrap_or_else(|| PaymentRecord {
            remote_id: response.payment_id.clone(),
            payment_gateway: self.gateway_id.clone(),
            order_id: order.id,
            state,
            amount: Price::new(response.amount, response.currency.clone()),
            remote_state: response.status.get(),
            modified_at: OffsetDateTime::now_utc(),
        });

        record.state = state;
        record.amount = Price::new(response.amount, response.currency.clone());
        record.remote_state = response.status.get();
        record.modified_at = OffsetDateTime::now_utc();

        self.payments.save(&record).await
    }
}

impl std::fmt::Debug for PaymentRecordSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentRecordSync")
            .field("gateway_id", &self.gateway_id)
            .finish()
    }
}

/// Drives the reconciliation state machine for inbound post-sale feedback.
pub struct PaymentResponseProcessor {
    config: RedirectCheckoutConfig,
    order_numbers: OrderNumberMapper,
    records: PaymentRecordSync,
    events: Arc<dyn EventDispatcher>,
}

impl PaymentResponseProcessor {
    pub fn new(
        config: RedirectCheckoutConfig,
        orders: Arc<dyn OrderRepository>,
        payments: Arc<dyn PaymentRepository>,
        events: Arc<dyn EventDispatcher>,
    ) -> Self {
        let records = PaymentRecordSync::new(payments, config.gateway_id.clone());
        Self {
            order_numbers: OrderNumberMapper::new(orders),
            records,
            events,
            config,
        }
    }

    /// Handle the return from the hosted payment page or an asynchronous
    /// post-sale notification.
    ///
    /// Fails with [`ResponseError::InvalidResponse`] when the response cannot
    /// be trusted or an internal step fails, and with
    /// [`ResponseError::Declined`] when the gateway reports the attempt as
    /// incomplete, declined or errored (after bumping the retry counter so
    /// the next attempt gets a fresh order reference).
    pub async fn on_return(
        &self,
        order: &mut Order,
        parameters: &BTreeMap<String, String>,
    ) -> CustomResult<(), ResponseError> {
        let environment = Environment::from_config(&self.config);

        let response = match epayment::response::parse(&environment, parameters) {
            Ok(response) => response,
            Err(report) => {
                let message = match report.current_context() {
                    EPaymentError::InvalidSignature => {
                        tracing::error!(
                            order_id = order.id,
                            "signature mismatch, possible attempt to fraud the payment request data"
                        );
                        "signature mismatch, possible attempt to fraud the payment request data"
                            .to_string()
                    }
                    other => {
                        let message = other.to_string();
                        tracing::warn!(
                            order_id = order.id,
                            error = %message,
                            "could not read the payment response"
                        );
                        message
                    }
                };
                return Err(report.change_context(ResponseError::InvalidResponse { message }));
            }
        };

        match ResponseClass::from(response.status) {
            ResponseClass::Success => self.handle_success(order, &response, parameters).await,
            ResponseClass::PartialSuccess => {
                self.handle_partial_success(order, &response, parameters)
                    .await
            }
            ResponseClass::Declined | ResponseClass::Error => {
                self.handle_error(order, &response, parameters).await
            }
        }
    }

    /// Handle the customer cancelling on the hosted payment page.
    ///
    /// Bumps the retry counter (the reference was submitted and is burnt) and
    /// dispatches the response event; there is no payment attempt to record.
    pub async fn on_cancel(
        &self,
        order: &mut Order,
        parameters: &BTreeMap<String, String>,
    ) -> CustomResult<(), ResponseError> {
        self.order_numbers
            .bump_retry_counter(order)
            .await
            .change_context(ResponseError::InvalidResponse {
                message: "failed to bump the order retry counter".to_string(),
            })?;
        self.dispatch_event(order, parameters).await;
        Ok(())
    }

    async fn handle_success(
        &self,
        order: &Order,
        response: &PostSaleResponse,
        parameters: &BTreeMap<String, String>,
    ) -> CustomResult<(), ResponseError> {
        self.dispatch_event(order, parameters).await;
        self.upsert_completed(order, response).await
    }

    async fn handle_partial_success(
        &self,
        order: &Order,
        response: &PostSaleResponse,
        parameters: &BTreeMap<String, String>,
    ) -> CustomResult<(), ResponseError> {
        tracing::info!(
            order_id = order.id,
            status = %response.status,
            parameters = ?parameters,
            "received a partially successful payment response"
        );
        self.dispatch_event(order, parameters).await;
        self.upsert_completed(order, response).await
    }

    async fn handle_error(
        &self,
        order: &mut Order,
        response: &PostSaleResponse,
        parameters: &BTreeMap<String, String>,
    ) -> CustomResult<(), ResponseError> {
        tracing::warn!(
            order_id = order.id,
            status = %response.status,
            parameters = ?parameters,
            "received an error payment response"
        );
        self.order_numbers
            .bump_retry_counter(order)
            .await
            .change_context(ResponseError::InvalidResponse {
                message: "failed to bump the order retry counter".to_string(),
            })?;
        self.dispatch_event(order, parameters).await;
        Err(Report::new(ResponseError::Declined))
    }

    async fn upsert_completed(
        &self,
        order: &Order,
        response: &PostSaleResponse,
    ) -> CustomResult<(), ResponseError> {
        self.records
            .upsert(order, response, PaymentState::Completed)
            .await
            .change_context(ResponseError::InvalidResponse {
                message: "failed to persist the payment record".to_string(),
            })
    }

    async fn dispatch_event(&self, order: &Order, parameters: &BTreeMap<String, String>) {
        let event = PaymentResponseEvent {
            order_id: order.id,
            parameters: parameters.clone(),
        };
        self.events.payment_response(&event).await;
    }
}

impl std::fmt::Debug for PaymentResponseProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentResponseProcessor")
            .field("config", &self.config)
            .finish()
    }
}
