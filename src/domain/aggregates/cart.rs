//! Cart Aggregate

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Result, StorefrontError};

/// Shopping cart, one per user. Lines hold product references and quantities
/// only; prices are always read live from the catalog, never cached here.
#[derive(Clone, Debug)]
pub struct Cart {
    id: Uuid,
    user_id: Uuid,
    lines: Vec<CartLine>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: Uuid,
    pub quantity: u32,
}

impl Cart {
    pub fn for_user(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            lines: vec![],
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }
    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Total units across all lines.
    pub fn total_item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Adding a product already in the cart merges quantities instead of
    /// creating a duplicate line. Insertion order is preserved.
    pub fn add_line(&mut self, product_id: Uuid, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(StorefrontError::invalid_input("quantity must be at least 1"));
        }
        if let Some(existing) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            existing.quantity += quantity;
        } else {
            self.lines.push(CartLine { product_id, quantity });
        }
        self.touch();
        Ok(())
    }

    /// No-op if the product has no line.
    pub fn remove_line(&mut self, product_id: Uuid) {
        self.lines.retain(|l| l.product_id != product_id);
        self.touch();
    }

    /// Sets the quantity directly (not additive). Zero removes the line.
    pub fn update_line_quantity(&mut self, product_id: Uuid, quantity: u32) {
        if quantity == 0 {
            self.remove_line(product_id);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
            self.touch();
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
