//! In-memory repositories
//!
//! Each store provides the atomic read-modify-write contract the surrounding
//! persistence layer is expected to offer: stock mutations run inside a
//! per-product critical section, order transitions inside a per-order one.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, Category, Order, Product};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::Money;
use crate::{Result, StorefrontError};

fn log_events(events: Vec<DomainEvent>) {
    for event in events {
        tracing::debug!(?event, "domain event");
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Product repository. Every stock mutation is a check-and-set under the
/// product's own mutex, so concurrent reservations against the same product
/// can never overdraw its stock.
#[derive(Default)]
pub struct Catalog {
    products: RwLock<HashMap<Uuid, Arc<Mutex<Product>>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, mut product: Product) -> Product {
        log_events(product.take_events());
        let snapshot = product.clone();
        self.products.write().insert(product.id(), Arc::new(Mutex::new(product)));
        snapshot
    }

    fn slot(&self, id: Uuid) -> Result<Arc<Mutex<Product>>> {
        self.products
            .read()
            .get(&id)
            .cloned()
            .ok_or(StorefrontError::not_found("product"))
    }

    pub fn get(&self, id: Uuid) -> Result<Product> {
        Ok(self.slot(id)?.lock().clone())
    }

    /// Newest first.
    pub fn list(&self) -> Vec<Product> {
        let mut products: Vec<Product> =
            self.products.read().values().map(|p| p.lock().clone()).collect();
        products.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        products
    }

    /// Atomic check-and-decrement. Returns the post-reservation snapshot so
    /// checkout can freeze the name and price without a second read.
    /// Inactive products cannot be reserved.
    pub fn reserve_stock(&self, id: Uuid, quantity: u32) -> Result<Product> {
        let slot = self.slot(id)?;
        let mut product = slot.lock();
        if !product.is_active() {
            return Err(StorefrontError::not_found("product"));
        }
        product.reserve(quantity)?;
        log_events(product.take_events());
        Ok(product.clone())
    }

    /// Compensating increment. Works on inactive products too, since an order
    /// whose product was deactivated can still be cancelled or refunded.
    pub fn release_stock(&self, id: Uuid, quantity: u32) -> Result<Product> {
        let slot = self.slot(id)?;
        let mut product = slot.lock();
        product.release(quantity)?;
        log_events(product.take_events());
        Ok(product.clone())
    }

    pub fn add_stock(&self, id: Uuid, quantity: u32) -> Result<Product> {
        let slot = self.slot(id)?;
        let mut product = slot.lock();
        product.add_stock(quantity)?;
        log_events(product.take_events());
        Ok(product.clone())
    }

    pub fn reduce_stock(&self, id: Uuid, quantity: u32) -> Result<Product> {
        let slot = self.slot(id)?;
        let mut product = slot.lock();
        product.reduce_stock(quantity)?;
        log_events(product.take_events());
        Ok(product.clone())
    }

    pub fn update_price(&self, id: Uuid, price: Money) -> Result<Product> {
        let slot = self.slot(id)?;
        let mut product = slot.lock();
        product.update_price(price)?;
        Ok(product.clone())
    }

    pub fn deactivate(&self, id: Uuid) -> Result<Product> {
        let slot = self.slot(id)?;
        let mut product = slot.lock();
        product.deactivate();
        log_events(product.take_events());
        Ok(product.clone())
    }
}

// =============================================================================
// Carts
// =============================================================================

/// One cart per user, created lazily on first access.
#[derive(Default)]
pub struct CartStore {
    carts: RwLock<HashMap<Uuid, Arc<Mutex<Cart>>>>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(&self, user_id: Uuid) -> Arc<Mutex<Cart>> {
        if let Some(cart) = self.carts.read().get(&user_id) {
            return cart.clone();
        }
        self.carts
            .write()
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(Cart::for_user(user_id))))
            .clone()
    }

    pub fn snapshot(&self, user_id: Uuid) -> Cart {
        self.for_user(user_id).lock().clone()
    }
}

// =============================================================================
// Orders
// =============================================================================

#[derive(Default)]
pub struct OrderStore {
    orders: RwLock<HashMap<Uuid, Arc<Mutex<Order>>>>,
}

impl OrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, mut order: Order) -> Result<Order> {
        log_events(order.take_events());
        let snapshot = order.clone();
        let mut orders = self.orders.write();
        if orders.contains_key(&order.id()) {
            return Err(StorefrontError::Conflict(format!("order {} already exists", order.id())));
        }
        orders.insert(order.id(), Arc::new(Mutex::new(order)));
        Ok(snapshot)
    }

    pub fn slot(&self, id: Uuid) -> Result<Arc<Mutex<Order>>> {
        self.orders
            .read()
            .get(&id)
            .cloned()
            .ok_or(StorefrontError::not_found("order"))
    }

    pub fn get(&self, id: Uuid) -> Result<Order> {
        Ok(self.slot(id)?.lock().clone())
    }

    /// Newest first.
    pub fn list_for_user(&self, user_id: Uuid) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .read()
            .values()
            .map(|o| o.lock().clone())
            .filter(|o| o.user_id() == user_id)
            .collect();
        orders.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        orders
    }
}

// =============================================================================
// Categories
// =============================================================================

#[derive(Default)]
pub struct CategoryStore {
    categories: RwLock<HashMap<Uuid, Category>>,
}

impl CategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Category names are unique, case-insensitive.
    pub fn insert(&self, category: Category) -> Result<Category> {
        let mut categories = self.categories.write();
        if categories.values().any(|c| c.name().eq_ignore_ascii_case(category.name())) {
            return Err(StorefrontError::Conflict(format!(
                "category '{}' already exists",
                category.name()
            )));
        }
        categories.insert(category.id(), category.clone());
        Ok(category)
    }

    pub fn get(&self, id: Uuid) -> Result<Category> {
        self.categories
            .read()
            .get(&id)
            .cloned()
            .ok_or(StorefrontError::not_found("category"))
    }

    pub fn list(&self) -> Vec<Category> {
        let mut categories: Vec<Category> = self.categories.read().values().cloned().collect();
        categories.sort_by(|a, b| a.name().cmp(b.name()));
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::thread;

    fn seed(stock: u32) -> (Catalog, Uuid) {
        let catalog = Catalog::new();
        let p = catalog.insert(
            Product::create("Widget", "", Money::usd(Decimal::new(10, 0)), stock, Uuid::new_v4())
                .unwrap(),
        );
        (catalog, p.id())
    }

    #[test]
    fn test_reserve_release_accounting() {
        let (catalog, id) = seed(10);
        catalog.reserve_stock(id, 4).unwrap();
        catalog.reserve_stock(id, 3).unwrap();
        catalog.release_stock(id, 3).unwrap();
        assert_eq!(catalog.get(id).unwrap().stock(), 6);
    }

    #[test]
    fn test_reserve_inactive_is_not_found() {
        let (catalog, id) = seed(10);
        catalog.deactivate(id).unwrap();
        assert_eq!(catalog.reserve_stock(id, 1).unwrap_err(), StorefrontError::not_found("product"));
        // release still works so cancelled orders can restore stock
        catalog.release_stock(id, 1).unwrap();
        assert_eq!(catalog.get(id).unwrap().stock(), 11);
    }

    #[test]
    fn test_concurrent_reservations_never_overdraw() {
        let (catalog, id) = seed(1);
        let catalog = Arc::new(catalog);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let catalog = catalog.clone();
                thread::spawn(move || catalog.reserve_stock(id, 1).is_ok())
            })
            .collect();
        let successes = handles.into_iter().map(|h| h.join().unwrap()).filter(|&ok| ok).count();
        assert_eq!(successes, 1);
        assert_eq!(catalog.get(id).unwrap().stock(), 0);
    }

    #[test]
    fn test_cart_store_is_one_cart_per_user() {
        let store = CartStore::new();
        let user = Uuid::new_v4();
        let a = store.for_user(user);
        let b = store.for_user(user);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.lock().user_id(), user);
    }

    #[test]
    fn test_category_names_unique() {
        let store = CategoryStore::new();
        store.insert(Category::create("Books", "").unwrap()).unwrap();
        let dup = store.insert(Category::create("books", "").unwrap());
        assert!(matches!(dup, Err(StorefrontError::Conflict(_))));
    }
}
