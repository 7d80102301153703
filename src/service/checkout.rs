//! Order Builder
//!
//! Converts a cart into a `PENDING` order. Stock reservation across all cart
//! lines is all-or-nothing: reservations already applied in an attempt are
//! released before any failure surfaces, so partial stock consumption is never
//! observable by other operations.

use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{Order, OrderLine, Product};
use crate::store::{CartStore, Catalog, OrderStore};
use crate::{Result, StorefrontError};

#[derive(Clone, Debug, Deserialize)]
pub struct CheckoutRequest {
    pub shipping_address: String,
    pub payment_method: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct OrderBuilder {
    catalog: Arc<Catalog>,
    carts: Arc<CartStore>,
    orders: Arc<OrderStore>,
}

impl OrderBuilder {
    pub fn new(catalog: Arc<Catalog>, carts: Arc<CartStore>, orders: Arc<OrderStore>) -> Self {
        Self { catalog, carts, orders }
    }

    pub fn checkout(&self, user_id: Uuid, request: CheckoutRequest) -> Result<Order> {
        if request.shipping_address.trim().is_empty() {
            return Err(StorefrontError::invalid_input("shipping address is required"));
        }

        // Hold the cart lock for the whole attempt so a concurrent mutation of
        // the same cart cannot interleave with the reservation.
        let slot = self.carts.for_user(user_id);
        let mut cart = slot.lock();
        if cart.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }

        // Reserve in ascending product-id order so two checkouts over an
        // overlapping product set always contend in the same sequence.
        let mut plan = cart.lines().to_vec();
        plan.sort_by_key(|l| l.product_id);

        let mut applied: Vec<(Uuid, u32)> = Vec::with_capacity(plan.len());
        let mut snapshots: HashMap<Uuid, Product> = HashMap::with_capacity(plan.len());
        for line in &plan {
            match self.catalog.reserve_stock(line.product_id, line.quantity) {
                Ok(product) => {
                    applied.push((line.product_id, line.quantity));
                    snapshots.insert(line.product_id, product);
                }
                Err(err) => {
                    self.rollback(&applied);
                    return Err(err);
                }
            }
        }

        // Snapshot lines in cart insertion order; price and quantity are
        // frozen here and never re-read from the catalog.
        let lines: Vec<OrderLine> = cart
            .lines()
            .iter()
            .map(|l| {
                let product = &snapshots[&l.product_id];
                OrderLine::new(product.id(), product.name(), l.quantity, product.price().clone())
            })
            .collect();

        let order = match Order::create(
            user_id,
            lines,
            request.shipping_address,
            request.payment_method,
            request.notes,
        )
        .and_then(|order| self.orders.insert(order))
        {
            Ok(order) => order,
            Err(err) => {
                self.rollback(&applied);
                return Err(err);
            }
        };

        cart.clear();
        tracing::info!(
            order_id = %order.id(),
            user_id = %user_id,
            total = %order.total(),
            lines = order.lines().len(),
            "order created"
        );
        Ok(order)
    }

    fn rollback(&self, applied: &[(Uuid, u32)]) {
        for (product_id, quantity) in applied.iter().rev() {
            if let Err(err) = self.catalog.release_stock(*product_id, *quantity) {
                // Products are never deleted, so this should be unreachable.
                tracing::error!(%product_id, quantity, %err, "failed to roll back reservation");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::OrderStatus;
    use crate::domain::value_objects::Money;
    use rust_decimal::Decimal;

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            shipping_address: "1 Main St".into(),
            payment_method: "card".into(),
            notes: None,
        }
    }

    struct Fixture {
        catalog: Arc<Catalog>,
        carts: Arc<CartStore>,
        builder: OrderBuilder,
    }

    fn fixture() -> Fixture {
        let catalog = Arc::new(Catalog::new());
        let carts = Arc::new(CartStore::new());
        let orders = Arc::new(OrderStore::new());
        let builder = OrderBuilder::new(catalog.clone(), carts.clone(), orders);
        Fixture { catalog, carts, builder }
    }

    fn product(f: &Fixture, name: &str, price: i64, stock: u32) -> Uuid {
        f.catalog
            .insert(
                Product::create(name, "", Money::usd(Decimal::new(price, 0)), stock, Uuid::new_v4())
                    .unwrap(),
            )
            .id()
    }

    #[test]
    fn test_checkout_empty_cart_fails() {
        let f = fixture();
        let err = f.builder.checkout(Uuid::new_v4(), request()).unwrap_err();
        assert_eq!(err, StorefrontError::EmptyCart);
    }

    #[test]
    fn test_checkout_snapshots_and_clears_cart() {
        let f = fixture();
        let a = product(&f, "Product A", 10, 5);
        let b = product(&f, "Product B", 5, 5);
        let user = Uuid::new_v4();
        {
            let slot = f.carts.for_user(user);
            let mut cart = slot.lock();
            cart.add_line(a, 2).unwrap();
            cart.add_line(b, 1).unwrap();
        }

        let order = f.builder.checkout(user, request()).unwrap();
        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.lines().len(), 2);
        assert_eq!(order.total().amount(), Decimal::new(25, 0));
        assert!(f.carts.for_user(user).lock().is_empty());
        assert_eq!(f.catalog.get(a).unwrap().stock(), 3);
        assert_eq!(f.catalog.get(b).unwrap().stock(), 4);
    }

    #[test]
    fn test_checkout_is_all_or_nothing() {
        let f = fixture();
        let plenty = product(&f, "Plenty", 10, 100);
        let scarce = product(&f, "Scarce", 10, 1);
        let user = Uuid::new_v4();
        {
            let slot = f.carts.for_user(user);
            let mut cart = slot.lock();
            cart.add_line(plenty, 3).unwrap();
            cart.add_line(scarce, 2).unwrap();
        }

        let err = f.builder.checkout(user, request()).unwrap_err();
        assert!(matches!(err, StorefrontError::InsufficientStock { ref product, .. } if product == "Scarce"));
        // No net stock change and the cart is untouched
        assert_eq!(f.catalog.get(plenty).unwrap().stock(), 100);
        assert_eq!(f.catalog.get(scarce).unwrap().stock(), 1);
        assert_eq!(f.carts.for_user(user).lock().line_count(), 2);
    }

    #[test]
    fn test_checkout_requires_shipping_address() {
        let f = fixture();
        let p = product(&f, "Widget", 10, 5);
        let user = Uuid::new_v4();
        f.carts.for_user(user).lock().add_line(p, 1).unwrap();

        let err = f
            .builder
            .checkout(
                user,
                CheckoutRequest {
                    shipping_address: "  ".into(),
                    payment_method: "card".into(),
                    notes: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, StorefrontError::InvalidInput(_)));
        assert_eq!(f.catalog.get(p).unwrap().stock(), 5);
    }

    #[test]
    fn test_order_prices_frozen_against_catalog_changes() {
        let f = fixture();
        let p = product(&f, "Widget", 10, 5);
        let user = Uuid::new_v4();
        f.carts.for_user(user).lock().add_line(p, 2).unwrap();
        let order = f.builder.checkout(user, request()).unwrap();

        f.catalog.update_price(p, Money::usd(Decimal::new(99, 0))).unwrap();
        assert_eq!(order.total().amount(), Decimal::new(20, 0));
        assert_eq!(order.lines()[0].unit_price.amount(), Decimal::new(10, 0));
    }
}
