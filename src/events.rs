//! Payment event payloads and the dispatcher port.
//!
//! The dispatcher replaces the event bus of the embedding framework with an
//! explicit, construction-time injected port. The request event is the sole
//! customization point for vendor-specific outgoing parameters not covered by
//! the base client model (a missing e-mail field, acquirer-specific flags);
//! the response event is the order's durable payment-metadata sink.

use std::{collections::BTreeMap, sync::Arc};

use crate::{
    consts,
    storage::OrderRepository,
    types::Order,
};

/// Dispatched while assembling the outgoing payment request.
///
/// Listeners may add parameters to [`parameters`]; the additions are merged
/// into the request without overriding core-computed fields.
///
/// [`parameters`]: PaymentRequestEvent::parameters
#[derive(Debug)]
pub struct PaymentRequestEvent {
    pub order: Order,
    /// Additional gateway parameters contributed by listeners.
    pub parameters: BTreeMap<String, String>,
}

impl PaymentRequestEvent {
    pub fn new(order: Order) -> Self {
        Self {
            order,
            parameters: BTreeMap::new(),
        }
    }

    /// Add a single outgoing parameter.
    pub fn add_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.parameters.insert(key.into(), value.into());
    }
}

/// Dispatched after receiving a post-sale callback from the gateway.
///
/// Always dispatched, regardless of the payment status (success, partial
/// success, error, cancel); listeners are responsible for checking the status
/// parameters and acting accordingly.
#[derive(Debug, Clone)]
pub struct PaymentResponseEvent {
    pub order_id: u64,
    /// The received post-sale parameters, verbatim.
    pub parameters: BTreeMap<String, String>,
}

/// Port receiving the payment events.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait EventDispatcher: Send + Sync {
    async fn payment_request(&self, event: &mut PaymentRequestEvent);
    async fn payment_response(&self, event: &PaymentResponseEvent);
}

/// Dispatcher that ignores all events.
#[derive(Debug, Default)]
pub struct NoopDispatcher;

#[async_trait::async_trait]
impl EventDispatcher for NoopDispatcher {
    async fn payment_request(&self, _event: &mut PaymentRequestEvent) {}
    async fn payment_response(&self, _event: &PaymentResponseEvent) {}
}

/// Listener recording every post-sale parameter set onto the order.
///
/// Stores the parameters in the order's data map under
/// [`consts::KEY_PAYMENT_DATA`], which allows the shop to look up e.g. the
/// payment method or card brand used. Recording failures are logged and
/// swallowed; event delivery must not fail the reconciliation path.
pub struct OrderDataRecorder {
    orders: Arc<dyn OrderRepository>,
}

impl OrderDataRecorder {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }
}

impl std::fmt::Debug for OrderDataRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderDataRecorder").finish()
    }
}

#[async_trait::async_trait]
impl EventDispatcher for OrderDataRecorder {
    async fn payment_request(&self, _event: &mut PaymentRequestEvent) {}

    async fn payment_response(&self, event: &PaymentResponseEvent) {
        let order = match self.orders.find_by_id(event.order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                tracing::warn!(
                    order_id = event.order_id,
                    "cannot record post-sale parameters, order not found"
                );
                return;
            }
            Err(error) => {
                tracing::warn!(
                    order_id = event.order_id,
                    ?error,
                    "cannot record post-sale parameters, order load failed"
                );
                return;
            }
        };

        let mut order = order;
        order.set_data(
            consts::KEY_PAYMENT_DATA,
            serde_json::json!(event.parameters),
        );
        if let Err(error) = self.orders.save(&order).await {
            tracing::warn!(
                order_id = event.order_id,
                ?error,
                "failed to record post-sale parameters on the order"
            );
        }
    }
}
