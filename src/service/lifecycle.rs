//! Order Lifecycle
//!
//! Applies status transitions under the per-order lock and performs the
//! compensating stock release when an order is cancelled or refunded.

use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::Order;
use crate::domain::value_objects::Money;
use crate::store::{Catalog, OrderStore};
use crate::{Result, StorefrontError};

#[derive(Clone)]
pub struct OrderLifecycle {
    catalog: Arc<Catalog>,
    orders: Arc<OrderStore>,
}

impl OrderLifecycle {
    pub fn new(catalog: Arc<Catalog>, orders: Arc<OrderStore>) -> Self {
        Self { catalog, orders }
    }

    pub fn get(&self, order_id: Uuid) -> Result<Order> {
        self.orders.get(order_id)
    }

    /// Ownership check for user-facing reads: a mismatch is `Forbidden`.
    pub fn get_for_user(&self, order_id: Uuid, user_id: Uuid) -> Result<Order> {
        let order = self.orders.get(order_id)?;
        if order.user_id() != user_id {
            return Err(StorefrontError::Forbidden);
        }
        Ok(order)
    }

    pub fn list_for_user(&self, user_id: Uuid) -> Vec<Order> {
        self.orders.list_for_user(user_id)
    }

    pub fn confirm(&self, order_id: Uuid) -> Result<Order> {
        self.transition(order_id, "confirmed", Order::confirm, false)
    }

    pub fn cancel(&self, order_id: Uuid) -> Result<Order> {
        self.transition(order_id, "cancelled", Order::cancel, true)
    }

    pub fn process(&self, order_id: Uuid) -> Result<Order> {
        self.transition(order_id, "processing", Order::process, false)
    }

    pub fn ship(&self, order_id: Uuid) -> Result<Order> {
        self.transition(order_id, "shipped", Order::ship, false)
    }

    pub fn deliver(&self, order_id: Uuid) -> Result<Order> {
        self.transition(order_id, "delivered", Order::deliver, false)
    }

    pub fn refund(&self, order_id: Uuid) -> Result<Order> {
        self.transition(order_id, "refunded", Order::refund, true)
    }

    /// Administrative discount on a single order line.
    pub fn apply_line_discount(
        &self,
        order_id: Uuid,
        product_id: Uuid,
        discounted_price: Money,
    ) -> Result<Order> {
        let slot = self.orders.slot(order_id)?;
        let mut order = slot.lock();
        let savings = order.apply_line_discount(product_id, discounted_price)?;
        for event in order.take_events() {
            tracing::debug!(?event, "domain event");
        }
        tracing::info!(%order_id, %product_id, savings = %savings, "line discount applied");
        Ok(order.clone())
    }

    fn transition(
        &self,
        order_id: Uuid,
        verb: &'static str,
        apply: fn(&mut Order) -> Result<()>,
        release_stock: bool,
    ) -> Result<Order> {
        let slot = self.orders.slot(order_id)?;
        let mut order = slot.lock();
        apply(&mut order)?;
        for event in order.take_events() {
            tracing::debug!(?event, "domain event");
        }
        // The order lock is still held here, so a racing transition cannot
        // observe the new status before its reservations are returned.
        if release_stock {
            for line in order.lines() {
                if let Err(err) = self.catalog.release_stock(line.product_id, line.quantity) {
                    // Products are never deleted, so this should be unreachable.
                    tracing::error!(
                        product_id = %line.product_id,
                        quantity = line.quantity,
                        %err,
                        "failed to release reserved stock"
                    );
                }
            }
        }
        tracing::info!(%order_id, status = %order.status(), "order {verb}");
        Ok(order.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{OrderLine, OrderStatus, Product};
    use rust_decimal::Decimal;

    struct Fixture {
        catalog: Arc<Catalog>,
        orders: Arc<OrderStore>,
        lifecycle: OrderLifecycle,
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(Catalog::new());
        let orders = Arc::new(OrderStore::new());
        let lifecycle = OrderLifecycle::new(catalog.clone(), orders.clone());
        Fixture { catalog, orders, lifecycle }
    }

    /// Seeds a product with `stock` units remaining after `reserved` were
    /// taken by the returned order.
    fn seed_order(f: &Fixture, stock: u32, reserved: u32) -> (Uuid, Uuid) {
        let product = f
            .catalog
            .insert(
                Product::create("Widget", "", Money::usd(Decimal::new(10, 0)), stock + reserved, Uuid::new_v4())
                    .unwrap(),
            );
        f.catalog.reserve_stock(product.id(), reserved).unwrap();
        let order = f
            .orders
            .insert(
                Order::create(
                    Uuid::new_v4(),
                    vec![OrderLine::new(product.id(), "Widget", reserved, Money::usd(Decimal::new(10, 0)))],
                    "1 Main St",
                    "card",
                    None,
                )
                .unwrap(),
            )
            .unwrap();
        (order.id(), product.id())
    }

    #[test]
    fn test_cancel_releases_reserved_stock() {
        let f = fixture();
        let (order_id, product_id) = seed_order(&f, 2, 3);
        f.lifecycle.confirm(order_id).unwrap();
        assert_eq!(f.catalog.get(product_id).unwrap().stock(), 2);

        let order = f.lifecycle.cancel(order_id).unwrap();
        assert_eq!(order.status(), OrderStatus::Cancelled);
        assert_eq!(f.catalog.get(product_id).unwrap().stock(), 5);
    }

    #[test]
    fn test_confirm_and_ship_do_not_touch_stock() {
        let f = fixture();
        let (order_id, product_id) = seed_order(&f, 4, 1);
        f.lifecycle.confirm(order_id).unwrap();
        f.lifecycle.process(order_id).unwrap();
        f.lifecycle.ship(order_id).unwrap();
        f.lifecycle.deliver(order_id).unwrap();
        assert_eq!(f.catalog.get(product_id).unwrap().stock(), 4);
    }

    #[test]
    fn test_refund_after_delivery_releases_stock() {
        let f = fixture();
        let (order_id, product_id) = seed_order(&f, 0, 2);
        f.lifecycle.confirm(order_id).unwrap();
        f.lifecycle.process(order_id).unwrap();
        f.lifecycle.ship(order_id).unwrap();
        f.lifecycle.deliver(order_id).unwrap();
        f.lifecycle.refund(order_id).unwrap();
        assert_eq!(f.catalog.get(product_id).unwrap().stock(), 2);
    }

    #[test]
    fn test_illegal_transition_leaves_stock_alone() {
        let f = fixture();
        let (order_id, product_id) = seed_order(&f, 1, 2);
        f.lifecycle.confirm(order_id).unwrap();
        f.lifecycle.process(order_id).unwrap();

        let err = f.lifecycle.cancel(order_id).unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidStateTransition { .. }));
        assert_eq!(f.catalog.get(product_id).unwrap().stock(), 1);
    }

    #[test]
    fn test_get_for_user_checks_ownership() {
        let f = fixture();
        let (order_id, _) = seed_order(&f, 1, 1);
        let err = f.lifecycle.get_for_user(order_id, Uuid::new_v4()).unwrap_err();
        assert_eq!(err, StorefrontError::Forbidden);
    }

    #[test]
    fn test_unknown_order_is_not_found() {
        let f = fixture();
        let err = f.lifecycle.confirm(Uuid::new_v4()).unwrap_err();
        assert_eq!(err, StorefrontError::not_found("order"));
    }
}
