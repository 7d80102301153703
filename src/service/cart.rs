//! Cart Manager
//!
//! Cart mutations never touch stock: availability is only checked and consumed
//! at checkout. Totals are priced live against the catalog on every read.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::Cart;
use crate::domain::value_objects::Money;
use crate::store::{CartStore, Catalog};
use crate::{Result, StorefrontError};

#[derive(Clone)]
pub struct CartManager {
    catalog: Arc<Catalog>,
    carts: Arc<CartStore>,
}

/// Cart projection with live catalog prices.
#[derive(Clone, Debug, Serialize)]
pub struct CartView {
    pub user_id: Uuid,
    pub lines: Vec<CartLineView>,
    pub total_price: Decimal,
    pub currency: String,
    pub total_items: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct CartLineView {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

impl CartManager {
    pub fn new(catalog: Arc<Catalog>, carts: Arc<CartStore>) -> Self {
        Self { catalog, carts }
    }

    pub fn add_item(&self, user_id: Uuid, product_id: Uuid, quantity: u32) -> Result<CartView> {
        let product = self.catalog.get(product_id)?;
        if !product.is_active() {
            return Err(StorefrontError::not_found("product"));
        }
        let slot = self.carts.for_user(user_id);
        let mut cart = slot.lock();
        cart.add_line(product_id, quantity)?;
        self.price_cart(&cart)
    }

    pub fn remove_item(&self, user_id: Uuid, product_id: Uuid) -> Result<CartView> {
        let slot = self.carts.for_user(user_id);
        let mut cart = slot.lock();
        cart.remove_line(product_id);
        self.price_cart(&cart)
    }

    pub fn update_item_quantity(&self, user_id: Uuid, product_id: Uuid, quantity: u32) -> Result<CartView> {
        let slot = self.carts.for_user(user_id);
        let mut cart = slot.lock();
        cart.update_line_quantity(product_id, quantity);
        self.price_cart(&cart)
    }

    pub fn clear(&self, user_id: Uuid) -> Result<CartView> {
        let slot = self.carts.for_user(user_id);
        let mut cart = slot.lock();
        cart.clear();
        self.price_cart(&cart)
    }

    pub fn view(&self, user_id: Uuid) -> Result<CartView> {
        let slot = self.carts.for_user(user_id);
        let cart = slot.lock();
        self.price_cart(&cart)
    }

    pub fn total_price(&self, user_id: Uuid) -> Result<Money> {
        let view = self.view(user_id)?;
        Ok(Money::new(view.total_price, &view.currency))
    }

    pub fn total_item_count(&self, user_id: Uuid) -> u32 {
        self.carts.snapshot(user_id).total_item_count()
    }

    fn price_cart(&self, cart: &Cart) -> Result<CartView> {
        let mut lines = Vec::with_capacity(cart.line_count());
        let mut total = Money::zero("USD");
        for line in cart.lines() {
            let product = self.catalog.get(line.product_id)?;
            let line_total = product.price().multiply(line.quantity);
            if lines.is_empty() {
                total = Money::zero(line_total.currency());
            }
            total = total
                .add(&line_total)
                .map_err(|_| StorefrontError::invalid_input("currency mismatch across cart lines"))?;
            lines.push(CartLineView {
                product_id: product.id(),
                product_name: product.name().to_string(),
                quantity: line.quantity,
                unit_price: product.price().amount(),
                line_total: line_total.amount(),
            });
        }
        Ok(CartView {
            user_id: cart.user_id(),
            lines,
            total_price: total.amount(),
            currency: total.currency().to_string(),
            total_items: cart.total_item_count(),
            updated_at: cart.updated_at(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::Product;

    fn setup() -> (CartManager, Arc<Catalog>, Uuid) {
        let catalog = Arc::new(Catalog::new());
        let manager = CartManager::new(catalog.clone(), Arc::new(CartStore::new()));
        let p = catalog.insert(
            Product::create("Widget", "", Money::usd(Decimal::new(10, 0)), 100, Uuid::new_v4())
                .unwrap(),
        );
        (manager, catalog, p.id())
    }

    #[test]
    fn test_totals_follow_live_prices() {
        let (manager, catalog, product_id) = setup();
        let user = Uuid::new_v4();
        manager.add_item(user, product_id, 2).unwrap();
        assert_eq!(manager.view(user).unwrap().total_price, Decimal::new(20, 0));

        // Cart prices float with the catalog until checkout
        catalog.update_price(product_id, Money::usd(Decimal::new(15, 0))).unwrap();
        assert_eq!(manager.view(user).unwrap().total_price, Decimal::new(30, 0));
    }

    #[test]
    fn test_add_unknown_product_fails() {
        let (manager, _, _) = setup();
        let err = manager.add_item(Uuid::new_v4(), Uuid::new_v4(), 1).unwrap_err();
        assert_eq!(err, StorefrontError::not_found("product"));
    }

    #[test]
    fn test_add_inactive_product_fails() {
        let (manager, catalog, product_id) = setup();
        catalog.deactivate(product_id).unwrap();
        let err = manager.add_item(Uuid::new_v4(), product_id, 1).unwrap_err();
        assert_eq!(err, StorefrontError::not_found("product"));
    }

    #[test]
    fn test_add_does_not_reserve_stock() {
        let (manager, catalog, product_id) = setup();
        manager.add_item(Uuid::new_v4(), product_id, 5).unwrap();
        assert_eq!(catalog.get(product_id).unwrap().stock(), 100);
    }

    #[test]
    fn test_item_count_sums_quantities() {
        let (manager, catalog, product_id) = setup();
        let other = catalog.insert(
            Product::create("Gadget", "", Money::usd(Decimal::new(5, 0)), 10, Uuid::new_v4())
                .unwrap(),
        );
        let user = Uuid::new_v4();
        manager.add_item(user, product_id, 2).unwrap();
        manager.add_item(user, other.id(), 3).unwrap();
        assert_eq!(manager.total_item_count(user), 5);
    }
}
