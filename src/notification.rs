//! Entry points for the gateway's callback urls.
//!
//! The gateway calls back in three ways: the browser returning from the
//! hosted payment page (accept/decline url), the customer cancelling, and
//! the asynchronous post-sale notification configured in the back office.
//! The notification is delivered at-least-once — the gateway retries
//! indefinitely until it sees a success acknowledgement — so every entry
//! point acknowledges success whenever the callback could be correlated with
//! an order, even if reconciliation failed; failures surface through logs and
//! order state instead. Only a missing or unmappable order reference is
//! rejected.

use std::{collections::BTreeMap, sync::Arc};

use http::Method;

use crate::{
    consts,
    order_number::OrderNumberMapper,
    response::PaymentResponseProcessor,
    storage::OrderRepository,
    types::Order,
};

/// What the embedding http layer should answer to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acknowledgement {
    /// Answer with a success status (2xx).
    Received,
    /// The callback could not be correlated with an order; answer with a
    /// rejection status.
    Rejected,
}

/// An inbound callback, reduced to what the protocol needs.
///
/// The gateway sends its parameters in the query string on GET and in the
/// form body on POST; [`parameters`] picks the right source.
///
/// [`parameters`]: IncomingRequest::parameters
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub query: BTreeMap<String, String>,
    pub form: BTreeMap<String, String>,
}

impl IncomingRequest {
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        if self.method == Method::GET {
            &self.query
        } else {
            &self.form
        }
    }
}

/// Maps inbound callbacks to orders and feeds them into the response
/// processor.
pub struct NotificationGateway {
    orders: Arc<dyn OrderRepository>,
    processor: PaymentResponseProcessor,
}

impl NotificationGateway {
    pub fn new(orders: Arc<dyn OrderRepository>, processor: PaymentResponseProcessor) -> Self {
        Self { orders, processor }
    }

    /// Handle the browser returning from the hosted payment page.
    pub async fn handle_return(&self, request: &IncomingRequest) -> Acknowledgement {
        let parameters = request.parameters();
        let Some(mut order) = self.resolve_order(parameters).await else {
            return Acknowledgement::Rejected;
        };

        if let Err(error) = self.processor.on_return(&mut order, parameters).await {
            tracing::warn!(
                order_id = order.id,
                ?error,
                "return callback did not reconcile cleanly"
            );
        }
        Acknowledgement::Received
    }

    /// Handle the customer cancelling on the hosted payment page.
    pub async fn handle_cancel(&self, request: &IncomingRequest) -> Acknowledgement {
        let parameters = request.parameters();
        let Some(mut order) = self.resolve_order(parameters).await else {
            return Acknowledgement::Rejected;
        };

        if let Err(error) = self.processor.on_cancel(&mut order, parameters).await {
            tracing::warn!(order_id = order.id, ?error, "cancel callback failed");
        }
        Acknowledgement::Received
    }

    /// Handle the asynchronous post-sale notification.
    ///
    /// Must acknowledge success even when reconciliation fails; the gateway
    /// would otherwise redeliver forever. Redeliveries of an already
    /// processed notification converge through the idempotent record upsert.
    pub async fn handle_notification(&self, request: &IncomingRequest) -> Acknowledgement {
        let parameters = request.parameters();
        let Some(mut order) = self.resolve_order(parameters).await else {
            return Acknowledgement::Rejected;
        };

        if let Err(error) = self.processor.on_return(&mut order, parameters).await {
            tracing::warn!(
                order_id = order.id,
                ?error,
                "post-sale notification did not reconcile cleanly"
            );
        }
        Acknowledgement::Received
    }

    async fn resolve_order(&self, parameters: &BTreeMap<String, String>) -> Option<Order> {
        let Some(reference) = parameters.get(consts::ORDER_ID_PARAMETER) else {
            tracing::warn!("received a callback with missing orderID parameter");
            return None;
        };

        let order_id = match OrderNumberMapper::order_id_from_remote(reference) {
            Ok(order_id) => order_id,
            Err(error) => {
                tracing::warn!(%reference, ?error, "callback orderID could not be mapped");
                return None;
            }
        };

        match self.orders.find_by_id(order_id).await {
            Ok(Some(order)) => Some(order),
            Ok(None) => {
                tracing::warn!(order_id, "callback references an unknown order");
                None
            }
            Err(error) => {
                tracing::warn!(order_id, ?error, "failed to load order for callback");
                None
            }
        }
    }
}

impl std::fmt::Debug for NotificationGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationGateway").finish()
    }
}
