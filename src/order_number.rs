//! Retry-aware mapping between internal order ids and remote order references.
//!
//! PostFinance refuses to process an order reference it has already seen.
//! When a payment attempt fails or is cancelled, the order gets a minor
//! number appended to its reference (`1024-1`, `1024-2`, …) so the next
//! attempt can be processed again. The minor number only ever increases.

use std::sync::Arc;

use error_stack::Report;

use crate::{
    consts,
    errors::{CustomResult, OrderReferenceError, StorageError},
    storage::OrderRepository,
    types::Order,
};

/// Derives remote order references and maintains the per-order retry counter.
pub struct OrderNumberMapper {
    orders: Arc<dyn OrderRepository>,
}

impl OrderNumberMapper {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    /// The reference sent to the gateway in lieu of the raw order id.
    pub fn remote_order_id(&self, order: &Order) -> String {
        match minor_number(order) {
            0 => order.id.to_string(),
            minor => format!("{}-{}", order.id, minor),
        }
    }

    /// Increase the minor number of the order's remote reference and save the
    /// order durably. Called exactly once per failed, declined or cancelled
    /// attempt, never on success.
    pub async fn bump_retry_counter(&self, order: &mut Order) -> CustomResult<(), StorageError> {
        let minor = minor_number(order) + 1;
        order.set_data(consts::KEY_NUMBER_MINOR, serde_json::json!(minor));
        self.orders.save(order).await
    }

    /// Recover the internal order id from a remote order reference.
    ///
    /// The reference is either the bare order id or `"{id}-{minor}"`; the
    /// segment before the first `-` is always the id.
    pub fn order_id_from_remote(reference: &str) -> CustomResult<u64, OrderReferenceError> {
        let id_segment = reference.split('-').next().unwrap_or(reference);
        id_segment.parse::<u64>().map_err(|_| {
            Report::new(OrderReferenceError::Malformed {
                reference: reference.to_string(),
            })
        })
    }
}

impl std::fmt::Debug for OrderNumberMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderNumberMapper").finish()
    }
}

fn minor_number(order: &Order) -> u64 {
    order
        .get_data(consts::KEY_NUMBER_MINOR)
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::{
        storage::MockOrderRepository,
        types::{Address, Price},
    };

    fn order(id: u64) -> Order {
        Order::new(
            id,
            Price::new("20".parse().unwrap(), "CHF"),
            "john.doe@example.com",
            Address::default(),
        )
    }

    fn mapper_with_save_count(times: usize) -> OrderNumberMapper {
        let mut orders = MockOrderRepository::new();
        orders.expect_save().times(times).returning(|_| Ok(()));
        OrderNumberMapper::new(Arc::new(orders))
    }

    #[test]
    fn remote_reference_without_minor_number_is_the_order_id() {
        let mapper = mapper_with_save_count(0);
        assert_eq!(mapper.remote_order_id(&order(199)), "199");
    }

    #[test]
    fn remote_reference_with_minor_number_carries_the_suffix() {
        let mapper = mapper_with_save_count(0);
        let mut order = order(199);
        order.set_data(consts::KEY_NUMBER_MINOR, serde_json::json!(2));
        assert_eq!(mapper.remote_order_id(&order), "199-2");
    }

    #[tokio::test]
    async fn bumping_starts_at_one_and_saves_the_order() {
        let mapper = mapper_with_save_count(1);
        let mut order = order(199);
        mapper.bump_retry_counter(&mut order).await.unwrap();
        assert_eq!(
            order.get_data(consts::KEY_NUMBER_MINOR),
            Some(&serde_json::json!(1))
        );
    }

    #[tokio::test]
    async fn bumping_only_ever_increases() {
        let mapper = mapper_with_save_count(3);
        let mut order = order(199);
        for expected in 1..=3 {
            mapper.bump_retry_counter(&mut order).await.unwrap();
            assert_eq!(
                order.get_data(consts::KEY_NUMBER_MINOR),
                Some(&serde_json::json!(expected))
            );
        }
        assert_eq!(mapper.remote_order_id(&order), "199-3");
    }

    #[test]
    fn reference_round_trips_for_any_minor_number() {
        let mapper = mapper_with_save_count(0);
        for minor in [0_u64, 1, 2, 17, 4096] {
            let mut order = order(2467);
            if minor > 0 {
                order.set_data(consts::KEY_NUMBER_MINOR, serde_json::json!(minor));
            }
            let reference = mapper.remote_order_id(&order);
            assert_eq!(
                OrderNumberMapper::order_id_from_remote(&reference).unwrap(),
                2467
            );
        }
    }

    #[test]
    fn bare_numeric_reference_parses_as_the_id() {
        assert_eq!(OrderNumberMapper::order_id_from_remote("199").unwrap(), 199);
        assert_eq!(
            OrderNumberMapper::order_id_from_remote("199-3").unwrap(),
            199
        );
    }

    #[test]
    fn garbage_reference_is_rejected() {
        assert!(OrderNumberMapper::order_id_from_remote("abc").is_err());
        assert!(OrderNumberMapper::order_id_from_remote("-1").is_err());
    }
}
