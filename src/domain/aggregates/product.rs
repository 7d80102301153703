//! Product Aggregate

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::events::{DomainEvent, ProductEvent};
use crate::domain::value_objects::{Money, Quantity};
use crate::{Result, StorefrontError};

/// Catalog product. Stock only moves through [`Product::reserve`],
/// [`Product::release`], [`Product::add_stock`] and [`Product::reduce_stock`].
#[derive(Clone, Debug)]
pub struct Product {
    id: Uuid,
    name: String,
    description: String,
    price: Money,
    stock: Quantity,
    active: bool,
    category_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl Product {
    pub fn create(
        name: impl Into<String>,
        description: impl Into<String>,
        price: Money,
        stock: u32,
        category_id: Uuid,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StorefrontError::invalid_input("product name is required"));
        }
        if !price.is_positive() {
            return Err(StorefrontError::invalid_input("price must be greater than 0"));
        }
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut product = Self {
            id,
            name: name.clone(),
            description: description.into(),
            price,
            stock: Quantity::new(stock),
            active: true,
            category_id,
            created_at: now,
            updated_at: now,
            events: vec![],
        };
        product.raise_event(DomainEvent::Product(ProductEvent::Created { product_id: id, name }));
        Ok(product)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn description(&self) -> &str {
        &self.description
    }
    pub fn price(&self) -> &Money {
        &self.price
    }
    pub fn stock(&self) -> u32 {
        self.stock.value()
    }
    pub fn is_active(&self) -> bool {
        self.active
    }
    pub fn category_id(&self) -> Uuid {
        self.category_id
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
    pub fn is_in_stock(&self) -> bool {
        !self.stock.is_zero()
    }
    pub fn has_stock(&self, quantity: u32) -> bool {
        self.stock.value() >= quantity
    }

    pub fn update_price(&mut self, new_price: Money) -> Result<()> {
        if !new_price.is_positive() {
            return Err(StorefrontError::invalid_input("price must be greater than 0"));
        }
        self.price = new_price;
        self.touch();
        Ok(())
    }

    /// Soft-deactivate. Products referenced by order lines are never deleted.
    pub fn deactivate(&mut self) {
        self.active = false;
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::Deactivated { product_id: self.id }));
    }

    /// Check-and-decrement for checkout. The caller holds the per-product
    /// critical section, so this check cannot race another reservation.
    pub fn reserve(&mut self, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(StorefrontError::invalid_input("quantity must be greater than 0"));
        }
        self.stock = self.stock.subtract(quantity).ok_or_else(|| {
            StorefrontError::InsufficientStock {
                product: self.name.clone(),
                requested: quantity,
                available: self.stock.value(),
            }
        })?;
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::StockReserved {
            product_id: self.id,
            quantity,
        }));
        Ok(())
    }

    /// Compensating increment for a cancelled or refunded reservation.
    /// No upper bound: released stock can always be restored.
    pub fn release(&mut self, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(StorefrontError::invalid_input("quantity must be greater than 0"));
        }
        self.stock = self.stock.add(quantity);
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::StockReleased {
            product_id: self.id,
            quantity,
        }));
        Ok(())
    }

    pub fn add_stock(&mut self, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(StorefrontError::invalid_input("quantity must be greater than 0"));
        }
        self.stock = self.stock.add(quantity);
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::StockAdded {
            product_id: self.id,
            quantity,
        }));
        Ok(())
    }

    pub fn reduce_stock(&mut self, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(StorefrontError::invalid_input("quantity must be greater than 0"));
        }
        self.stock = self.stock.subtract(quantity).ok_or_else(|| {
            StorefrontError::InsufficientStock {
                product: self.name.clone(),
                requested: quantity,
                available: self.stock.value(),
            }
        })?;
        self.touch();
        self.raise_event(DomainEvent::Product(ProductEvent::StockReduced {
            product_id: self.id,
            quantity,
        }));
        Ok(())
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }
    fn raise_event(&mut self, e: DomainEvent) {
        self.events.push(e);
    }
    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
