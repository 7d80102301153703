//! Order Aggregate
//!
//! Orders are created from a cart snapshot and are immutable afterwards except
//! for status transitions and administrative line discounts. The status state
//! machine:
//!
//! ```text
//! PENDING -> CONFIRMED -> PROCESSING -> SHIPPED -> DELIVERED -> REFUNDED
//!    \           |                                     (terminal)  (terminal)
//!     \---------cancel--------> CANCELLED (terminal)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::value_objects::Money;
use crate::{Result, StorefrontError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Processing => "PROCESSING",
            Self::Shipped => "SHIPPED",
            Self::Delivered => "DELIVERED",
            Self::Cancelled => "CANCELLED",
            Self::Refunded => "REFUNDED",
        };
        f.write_str(s)
    }
}

/// Line snapshot frozen at checkout. `list_price` keeps the catalog price at
/// checkout time so savings from an administrative discount can be reported.
#[derive(Clone, Debug)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    pub list_price: Money,
    pub unit_price: Money,
}

impl OrderLine {
    pub fn new(product_id: Uuid, product_name: impl Into<String>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            list_price: unit_price.clone(),
            unit_price,
        }
    }

    pub fn line_total(&self) -> Money {
        self.unit_price.multiply(self.quantity)
    }

    pub fn is_discounted(&self) -> bool {
        self.unit_price.amount() < self.list_price.amount()
    }

    pub fn savings(&self) -> Money {
        if self.is_discounted() {
            self.list_price
                .subtract(&self.unit_price)
                .map(|per_unit| per_unit.multiply(self.quantity))
                .unwrap_or_else(|_| Money::zero(self.list_price.currency()))
        } else {
            Money::zero(self.list_price.currency())
        }
    }
}

#[derive(Clone, Debug)]
pub struct Order {
    id: Uuid,
    user_id: Uuid,
    status: OrderStatus,
    lines: Vec<OrderLine>,
    total: Money,
    shipping_address: String,
    payment_method: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<DomainEvent>,
}

impl Order {
    /// Creates a `PENDING` order from already-reserved line snapshots. The line
    /// collection is fixed at creation and never mutated afterwards.
    pub fn create(
        user_id: Uuid,
        lines: Vec<OrderLine>,
        shipping_address: impl Into<String>,
        payment_method: impl Into<String>,
        notes: Option<String>,
    ) -> Result<Self> {
        if lines.is_empty() {
            return Err(StorefrontError::EmptyCart);
        }
        let shipping_address = shipping_address.into();
        if shipping_address.trim().is_empty() {
            return Err(StorefrontError::invalid_input("shipping address is required"));
        }
        let total = Self::sum_lines(&lines)?;
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut order = Self {
            id,
            user_id,
            status: OrderStatus::Pending,
            lines,
            total: total.clone(),
            shipping_address,
            payment_method: payment_method.into(),
            notes,
            created_at: now,
            updated_at: now,
            events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Created {
            order_id: id,
            user_id,
            total: total.amount(),
        }));
        Ok(order)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
    pub fn status(&self) -> OrderStatus {
        self.status
    }
    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }
    pub fn total(&self) -> &Money {
        &self.total
    }
    pub fn shipping_address(&self) -> &str {
        &self.shipping_address
    }
    pub fn payment_method(&self) -> &str {
        &self.payment_method
    }
    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn total_items(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn can_be_cancelled(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::Confirmed)
    }

    pub fn is_active(&self) -> bool {
        !matches!(
            self.status,
            OrderStatus::Cancelled | OrderStatus::Refunded | OrderStatus::Delivered
        )
    }

    pub fn is_completed(&self) -> bool {
        self.status == OrderStatus::Delivered
    }

    pub fn confirm(&mut self) -> Result<()> {
        if self.status != OrderStatus::Pending {
            return Err(self.illegal("confirm"));
        }
        self.set_status(OrderStatus::Confirmed);
        self.raise_event(DomainEvent::Order(OrderEvent::Confirmed { order_id: self.id }));
        Ok(())
    }

    /// Legal from `PENDING` or `CONFIRMED` only. The caller is responsible for
    /// releasing the reserved stock of every line after a successful cancel.
    pub fn cancel(&mut self) -> Result<()> {
        if !self.can_be_cancelled() {
            return Err(self.illegal("cancel"));
        }
        self.set_status(OrderStatus::Cancelled);
        self.raise_event(DomainEvent::Order(OrderEvent::Cancelled { order_id: self.id }));
        Ok(())
    }

    pub fn process(&mut self) -> Result<()> {
        if self.status != OrderStatus::Confirmed {
            return Err(self.illegal("process"));
        }
        self.set_status(OrderStatus::Processing);
        self.raise_event(DomainEvent::Order(OrderEvent::Processing { order_id: self.id }));
        Ok(())
    }

    pub fn ship(&mut self) -> Result<()> {
        if self.status != OrderStatus::Processing {
            return Err(self.illegal("ship"));
        }
        self.set_status(OrderStatus::Shipped);
        self.raise_event(DomainEvent::Order(OrderEvent::Shipped { order_id: self.id }));
        Ok(())
    }

    pub fn deliver(&mut self) -> Result<()> {
        if self.status != OrderStatus::Shipped {
            return Err(self.illegal("deliver"));
        }
        self.set_status(OrderStatus::Delivered);
        self.raise_event(DomainEvent::Order(OrderEvent::Delivered { order_id: self.id }));
        Ok(())
    }

    /// Legal from `DELIVERED` only. The caller releases the line stock.
    pub fn refund(&mut self) -> Result<()> {
        if self.status != OrderStatus::Delivered {
            return Err(self.illegal("refund"));
        }
        self.set_status(OrderStatus::Refunded);
        self.raise_event(DomainEvent::Order(OrderEvent::Refunded { order_id: self.id }));
        Ok(())
    }

    /// Administrative discount: lowers a line's unit price below its frozen
    /// list price, recalculates the total and returns the line's savings.
    pub fn apply_line_discount(&mut self, product_id: Uuid, discounted_price: Money) -> Result<Money> {
        if !self.is_active() {
            return Err(self.illegal("discount"));
        }
        if !discounted_price.is_positive() {
            return Err(StorefrontError::invalid_input("discounted price must be greater than 0"));
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or(StorefrontError::not_found("order line"))?;
        if discounted_price.currency() != line.list_price.currency() {
            return Err(StorefrontError::invalid_input("currency mismatch"));
        }
        if discounted_price.amount() > line.list_price.amount() {
            return Err(StorefrontError::invalid_input(
                "discounted price cannot exceed the original unit price",
            ));
        }
        line.unit_price = discounted_price;
        let savings = line.savings();
        self.total = Self::sum_lines(&self.lines)?;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::LineDiscounted {
            order_id: self.id,
            product_id,
            savings: savings.amount(),
        }));
        Ok(savings)
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.events)
    }

    fn sum_lines(lines: &[OrderLine]) -> Result<Money> {
        let currency = lines[0].unit_price.currency().to_string();
        lines.iter().try_fold(Money::zero(&currency), |acc, l| {
            acc.add(&l.line_total())
                .map_err(|_| StorefrontError::invalid_input("currency mismatch across order lines"))
        })
    }

    fn illegal(&self, action: &'static str) -> StorefrontError {
        StorefrontError::InvalidStateTransition {
            entity: "order",
            current: self.status.to_string(),
            action,
        }
    }

    fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.touch();
    }

    fn raise_event(&mut self, e: DomainEvent) {
        self.events.push(e);
    }
    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
