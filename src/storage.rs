//! Storage ports implemented by the embedding application.
//!
//! Uniqueness of the remote payment id and per-order read-your-writes
//! consistency are the backing store's responsibility.

use crate::{
    errors::{CustomResult, StorageError},
    types::{Order, PaymentRecord},
};

/// Port for loading and saving commerce orders.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, order_id: u64) -> CustomResult<Option<Order>, StorageError>;
    async fn save(&self, order: &Order) -> CustomResult<(), StorageError>;
}

/// Port for loading and saving payment records.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Look up the payment attempt keyed by the gateway transaction id.
    async fn find_by_remote_id(
        &self,
        remote_id: &str,
    ) -> CustomResult<Option<PaymentRecord>, StorageError>;
    async fn save(&self, payment: &PaymentRecord) -> CustomResult<(), StorageError>;
}
